use std::convert::TryFrom;

use arbor_data::{ColType, DataPartition, MAX_CONTINUOUS_MAGNITUDE};
use arbor_utils::{argmax, logsumexp, stats::Moments};
use rand::Rng;
use rv::dist::{Categorical, Gaussian};
use rv::traits::Rv;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A univariate distribution over a single column
///
/// Categorical leaves carry log weights over the column's arity; continuous
/// leaves are Gaussian. Values are passed as `f64` with categories encoded as
/// their index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LeafParams", into = "LeafParams")]
pub enum LeafModel {
    Categorical { col_ix: usize, fx: Categorical },
    Gaussian { col_ix: usize, fx: Gaussian },
}

impl LeafModel {
    /// Fit the distribution of column `col_ix` over the rows in `partition`
    ///
    /// Categorical columns get a smoothed frequency histogram: `alpha` is
    /// added to every category count before normalizing. An empty partition
    /// with no smoothing gives the uniform distribution.
    ///
    /// Continuous columns get the sample mean and unbiased variance, the
    /// variance floored at `epsilon`. Fewer than two rows give variance
    /// `epsilon`, and zero rows give mean zero.
    ///
    /// # Example
    ///
    /// ```
    /// # use arbor_data::DataMatrix;
    /// # use arbor_stats::LeafModel;
    /// let data: DataMatrix = "category_counts: 2\n0\n0\n0\n1\n".parse().unwrap();
    /// let leaf = LeafModel::fit(&data.partition(), 0, 1.0, 1E-6);
    ///
    /// let p0 = leaf.ln_f(0.0).exp();
    /// assert!((p0 - 4.0 / 6.0).abs() < 1E-12);
    /// ```
    pub fn fit(
        partition: &DataPartition,
        col_ix: usize,
        alpha: f64,
        epsilon: f64,
    ) -> Self {
        match partition.data().coltype(col_ix) {
            ColType::Categorical { k } => {
                let mut counts = vec![0_usize; k];
                partition
                    .values(col_ix)
                    .for_each(|x| counts[x as usize] += 1);

                let total = alpha.mul_add(k as f64, partition.n_rows() as f64);
                let ln_weights: Vec<f64> = if total > 0.0 {
                    let ln_total = total.ln();
                    counts
                        .iter()
                        .map(|&ct| (ct as f64 + alpha).ln() - ln_total)
                        .collect()
                } else {
                    vec![-(k as f64).ln(); k]
                };

                LeafModel::Categorical {
                    col_ix,
                    fx: Categorical::new_unchecked(ln_weights),
                }
            }
            ColType::Continuous => {
                let moments = Moments::from_values(partition.values(col_ix));
                let var = moments
                    .var_unbiased()
                    .map_or(epsilon, |var| var.max(epsilon));
                LeafModel::Gaussian {
                    col_ix,
                    fx: Gaussian::new_unchecked(moments.mean(), var.sqrt()),
                }
            }
        }
    }

    /// The index of the column this leaf is defined over
    #[inline]
    pub fn column(&self) -> usize {
        match self {
            Self::Categorical { col_ix, .. } | Self::Gaussian { col_ix, .. } => {
                *col_ix
            }
        }
    }

    /// The column type this leaf models
    pub fn kind(&self) -> ColType {
        match self {
            Self::Categorical { fx, .. } => ColType::Categorical {
                k: fx.ln_weights().len(),
            },
            Self::Gaussian { .. } => ColType::Continuous,
        }
    }

    /// Log probability mass (categorical) or density (continuous) of `x`.
    ///
    /// `x` must already be valid for [`kind`](Self::kind).
    #[inline]
    pub fn ln_f(&self, x: f64) -> f64 {
        match self {
            Self::Categorical { fx, .. } => fx.ln_f(&(x as usize)),
            Self::Gaussian { fx, .. } => fx.ln_f(&x),
        }
    }

    /// The most likely value. The lowest index on categorical ties.
    pub fn mode(&self) -> f64 {
        match self {
            Self::Categorical { fx, .. } => argmax(fx.ln_weights()) as f64,
            Self::Gaussian { fx, .. } => fx.mu(),
        }
    }

    /// Draw a value. Gaussian draws are clamped to
    /// `±MAX_CONTINUOUS_MAGNITUDE`, so every draw is a legal column value
    /// even for very wide leaves.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Categorical { fx, .. } => {
                let x: usize = fx.draw(rng);
                x as f64
            }
            Self::Gaussian { fx, .. } => {
                let x: f64 = fx.draw(rng);
                x.clamp(-MAX_CONTINUOUS_MAGNITUDE, MAX_CONTINUOUS_MAGNITUDE)
            }
        }
    }

    /// Check that the parameters describe a proper distribution
    pub fn validate(&self) -> Result<(), LeafParamsError> {
        match self {
            Self::Categorical { fx, .. } => {
                let ln_weights = fx.ln_weights();
                if ln_weights.len() < 2 {
                    return Err(LeafParamsError::TooFewWeights {
                        n_weights: ln_weights.len(),
                    });
                }
                if let Some(&ln_w) = ln_weights
                    .iter()
                    .find(|ln_w| ln_w.is_nan() || **ln_w == f64::INFINITY)
                {
                    return Err(LeafParamsError::InvalidWeight {
                        weight: ln_w.exp(),
                    });
                }
                let ln_sum = logsumexp(ln_weights);
                if ln_sum.abs() > WEIGHT_SUM_TOL {
                    return Err(LeafParamsError::WeightsNotNormalized {
                        sum: ln_sum.exp(),
                    });
                }
                Ok(())
            }
            Self::Gaussian { fx, .. } => check_gaussian(fx.mu(), fx.sigma()),
        }
    }
}

const WEIGHT_SUM_TOL: f64 = 1E-8;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LeafParamsError {
    #[error("a categorical leaf needs at least two weights, found {n_weights}")]
    TooFewWeights { n_weights: usize },
    #[error("categorical weights must be finite and non-negative, found {weight}")]
    InvalidWeight { weight: f64 },
    #[error("categorical weights sum to {sum} rather than 1")]
    WeightsNotNormalized { sum: f64 },
    #[error("gaussian mean must be finite, found {mu}")]
    NonFiniteMean { mu: f64 },
    #[error("gaussian mean {mu} exceeds the largest supported magnitude, {max}")]
    MeanOutOfRange { mu: f64, max: f64 },
    #[error("gaussian standard deviation must be finite and positive, found {sigma}")]
    InvalidSigma { sigma: f64 },
}

fn check_gaussian(mu: f64, sigma: f64) -> Result<(), LeafParamsError> {
    if !mu.is_finite() {
        Err(LeafParamsError::NonFiniteMean { mu })
    } else if mu.abs() > MAX_CONTINUOUS_MAGNITUDE {
        Err(LeafParamsError::MeanOutOfRange {
            mu,
            max: MAX_CONTINUOUS_MAGNITUDE,
        })
    } else if !(sigma.is_finite() && sigma > 0.0) {
        Err(LeafParamsError::InvalidSigma { sigma })
    } else {
        Ok(())
    }
}

/// On-disk form of a leaf. Weights are stored on the linear scale so that
/// zero-probability categories survive formats without infinities.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LeafParams {
    Categorical { column: usize, weights: Vec<f64> },
    Gaussian { column: usize, mu: f64, sigma: f64 },
}

impl From<LeafModel> for LeafParams {
    fn from(leaf: LeafModel) -> Self {
        match leaf {
            LeafModel::Categorical { col_ix, fx } => LeafParams::Categorical {
                column: col_ix,
                weights: fx.ln_weights().iter().map(|ln_w| ln_w.exp()).collect(),
            },
            LeafModel::Gaussian { col_ix, fx } => LeafParams::Gaussian {
                column: col_ix,
                mu: fx.mu(),
                sigma: fx.sigma(),
            },
        }
    }
}

impl TryFrom<LeafParams> for LeafModel {
    type Error = LeafParamsError;

    fn try_from(params: LeafParams) -> Result<Self, Self::Error> {
        match params {
            LeafParams::Categorical { column, weights } => {
                if weights.len() < 2 {
                    return Err(LeafParamsError::TooFewWeights {
                        n_weights: weights.len(),
                    });
                }
                if let Some(&weight) =
                    weights.iter().find(|w| !(w.is_finite() && **w >= 0.0))
                {
                    return Err(LeafParamsError::InvalidWeight { weight });
                }
                let sum: f64 = weights.iter().sum();
                if (sum - 1.0).abs() > WEIGHT_SUM_TOL {
                    return Err(LeafParamsError::WeightsNotNormalized { sum });
                }
                let ln_sum = sum.ln();
                let ln_weights =
                    weights.iter().map(|w| w.ln() - ln_sum).collect();
                Ok(LeafModel::Categorical {
                    col_ix: column,
                    fx: Categorical::new_unchecked(ln_weights),
                })
            }
            LeafParams::Gaussian { column, mu, sigma } => {
                check_gaussian(mu, sigma)?;
                Ok(LeafModel::Gaussian {
                    col_ix: column,
                    fx: Gaussian::new_unchecked(mu, sigma),
                })
            }
        }
    }
}
