use arbor_data::DataMatrix;
use arbor_utils::{argmax, logsumexp, pflip, stats::mean};
use rand::Rng;
use rayon::prelude::*;

use crate::node::Node;
use crate::{Circuit, InvalidValueError};

impl Node {
    /// Log density of the observed values, marginalizing the rest.
    /// `value(col_ix)` returns `None` for unobserved columns.
    fn ln_f_with<F>(&self, value: &F) -> f64
    where
        F: Fn(usize) -> Option<f64>,
    {
        match self {
            Node::Leaf(leaf) => leaf
                .factors()
                .iter()
                .filter_map(|fx| value(fx.column()).map(|x| fx.ln_f(x)))
                .sum(),
            Node::Product { children } => {
                children.iter().map(|child| child.ln_f_with(value)).sum()
            }
            Node::Sum { children, weights } => {
                let terms: Vec<f64> = children
                    .iter()
                    .zip(weights.iter())
                    .map(|(child, w)| w.ln() + child.ln_f_with(value))
                    .collect();
                logsumexp(&terms)
            }
        }
    }

    fn map_into(&self, evidence: &[Option<f64>], out: &mut [f64]) {
        match self {
            Node::Leaf(leaf) => leaf.factors().iter().for_each(|fx| {
                let col_ix = fx.column();
                out[col_ix] = evidence[col_ix].unwrap_or_else(|| fx.mode());
            }),
            Node::Product { children } => children
                .iter()
                .for_each(|child| child.map_into(evidence, out)),
            Node::Sum { children, weights } => {
                let value = |col_ix: usize| evidence[col_ix];
                let scores: Vec<f64> = children
                    .iter()
                    .zip(weights.iter())
                    .map(|(child, w)| w.ln() + child.ln_f_with(&value))
                    .collect();
                children[argmax(&scores)].map_into(evidence, out);
            }
        }
    }

    fn draw_into<R: Rng>(&self, rng: &mut R, out: &mut [f64]) {
        match self {
            Node::Leaf(leaf) => leaf
                .factors()
                .iter()
                .for_each(|fx| out[fx.column()] = fx.draw(rng)),
            Node::Product { children } => children
                .iter()
                .for_each(|child| child.draw_into(rng, out)),
            Node::Sum { children, weights } => {
                children[pflip(weights, rng)].draw_into(rng, out)
            }
        }
    }
}

impl Circuit {
    fn check_value(
        &self,
        col_ix: usize,
        value: f64,
    ) -> Result<(), InvalidValueError> {
        let coltype = self.schema().coltype(col_ix);
        coltype.validate(value).map_err(|source| {
            InvalidValueError::InvalidValue {
                col_ix,
                coltype,
                value,
                source,
            }
        })
    }

    fn check_len(&self, n_values: usize) -> Result<(), InvalidValueError> {
        if n_values == self.n_cols() {
            Ok(())
        } else {
            Err(InvalidValueError::RowLengthMismatch {
                n_cols: self.n_cols(),
                n_values,
            })
        }
    }

    fn check_schema(&self, data: &DataMatrix) -> Result<(), InvalidValueError> {
        if data.n_cols() != self.n_cols() {
            return Err(InvalidValueError::ColumnCountMismatch {
                n_cols: self.n_cols(),
                n_data_cols: data.n_cols(),
            });
        }
        self.schema()
            .coltypes()
            .iter()
            .zip(data.schema().coltypes())
            .enumerate()
            .find(|(_, (expected, found))| expected != found)
            .map_or(Ok(()), |(col_ix, (&expected, &found))| {
                Err(InvalidValueError::ColTypeMismatch {
                    col_ix,
                    expected,
                    found,
                })
            })
    }

    /// Log likelihood of a full row
    ///
    /// # Example
    ///
    /// ```
    /// # use arbor_data::DataMatrix;
    /// # use arbor_pc::{build, BuildConfig, InvalidValueError};
    /// let data: DataMatrix = "category_counts: 2\n0\n0\n0\n1\n".parse().unwrap();
    /// let config = BuildConfig {
    ///     min_instances_slice: 1,
    ///     independence_threshold: 0.3,
    ///     min_gain: 0.0,
    ///     max_depth: 4,
    ///     leaf_smoothing_alpha: 0.0,
    ///     variance_floor_epsilon: 1E-6,
    ///     n_threads: None,
    /// };
    /// let circuit = build(&data, &config).unwrap();
    ///
    /// let ln_p = circuit.ln_likelihood(&[1.0]).unwrap();
    /// assert!((ln_p - 0.25_f64.ln()).abs() < 1E-12);
    ///
    /// assert!(matches!(
    ///     circuit.ln_likelihood(&[2.0]),
    ///     Err(InvalidValueError::InvalidValue { col_ix: 0, .. })
    /// ));
    /// ```
    pub fn ln_likelihood(&self, row: &[f64]) -> Result<f64, InvalidValueError> {
        self.check_len(row.len())?;
        row.iter()
            .enumerate()
            .try_for_each(|(col_ix, &x)| self.check_value(col_ix, x))?;
        Ok(self.root().ln_f_with(&|col_ix| Some(row[col_ix])))
    }

    /// Log marginal likelihood of the values in `row` whose entry in
    /// `observed` is `true`. Unobserved entries are ignored, so may hold any
    /// value. Marginalizing every column gives zero.
    pub fn ln_marginal(
        &self,
        row: &[f64],
        observed: &[bool],
    ) -> Result<f64, InvalidValueError> {
        self.check_len(row.len())?;
        if observed.len() != self.n_cols() {
            return Err(InvalidValueError::MaskLengthMismatch {
                n_cols: self.n_cols(),
                n_mask: observed.len(),
            });
        }
        row.iter()
            .zip(observed.iter())
            .enumerate()
            .filter(|(_, (_, &is_obs))| is_obs)
            .try_for_each(|(col_ix, (&x, _))| self.check_value(col_ix, x))?;

        Ok(self
            .root()
            .ln_f_with(&|col_ix| observed[col_ix].then(|| row[col_ix])))
    }

    /// Complete a partial row with its most probable explanation
    ///
    /// Observed (`Some`) values are kept. At each sum node the branch with the
    /// highest weighted likelihood of the evidence is followed, and leaves
    /// fill missing values with their mode.
    pub fn map(
        &self,
        partial_row: &[Option<f64>],
    ) -> Result<Vec<f64>, InvalidValueError> {
        self.check_len(partial_row.len())?;
        partial_row
            .iter()
            .enumerate()
            .filter_map(|(col_ix, x)| x.map(|x| (col_ix, x)))
            .try_for_each(|(col_ix, x)| self.check_value(col_ix, x))?;

        let mut out: Vec<f64> = partial_row
            .iter()
            .map(|x| x.unwrap_or(f64::NAN))
            .collect();
        self.root().map_into(partial_row, &mut out);
        Ok(out)
    }

    /// Draw one row from the circuit
    ///
    /// Every entry is a legal value for its column. Gaussian leaves clamp
    /// their draws to `±MAX_CONTINUOUS_MAGNITUDE`, so a very wide leaf gives
    /// a saturated value rather than an infinity.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        let mut out = vec![0.0; self.n_cols()];
        self.root().draw_into(rng, &mut out);
        out
    }

    /// Draw `n` rows into a matrix with the circuit's schema
    pub fn sample_n<R: Rng>(&self, n: usize, rng: &mut R) -> DataMatrix {
        let rows = (0..n).map(|_| self.sample(rng)).collect();
        // leaf draws are finite, in range, and match the leaf's column type
        DataMatrix::new(self.schema().clone(), rows)
            .expect("sampled rows match the circuit schema")
    }

    /// Log likelihood of every row of `data`, in row order
    pub fn ln_likelihoods(
        &self,
        data: &DataMatrix,
    ) -> Result<Vec<f64>, InvalidValueError> {
        self.check_schema(data)?;
        let lls = (0..data.n_rows())
            .into_par_iter()
            .map(|row_ix| {
                self.ln_likelihood(data.row(row_ix)).map_err(|err| {
                    InvalidValueError::InRow {
                        row_ix,
                        source: Box::new(err),
                    }
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        Ok(lls)
    }

    /// Mean log likelihood of the rows of `data`. Zero if `data` has no rows.
    pub fn mean_ln_likelihood(
        &self,
        data: &DataMatrix,
    ) -> Result<f64, InvalidValueError> {
        self.ln_likelihoods(data).map(mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Leaf;
    use approx::*;
    use arbor_data::Schema;
    use arbor_stats::rv::dist::{Categorical, Gaussian};
    use arbor_stats::LeafModel;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn gauss(col_ix: usize, mu: f64, sigma: f64) -> LeafModel {
        LeafModel::Gaussian {
            col_ix,
            fx: Gaussian::new_unchecked(mu, sigma),
        }
    }

    fn cat(col_ix: usize, ps: &[f64]) -> LeafModel {
        LeafModel::Categorical {
            col_ix,
            fx: Categorical::new_unchecked(ps.iter().map(|p| p.ln()).collect()),
        }
    }

    /// 0.3 * N(x; -5, 1) C(y; [0.9, 0.1]) + 0.7 * N(x; 5, 1) C(y; [0.2, 0.8])
    fn mixture() -> Circuit {
        let schema = Schema::from_category_counts(&[0, 2]).unwrap();
        let root = Node::Sum {
            children: vec![
                Node::Product {
                    children: vec![
                        Node::Leaf(Leaf::new(vec![gauss(0, -5.0, 1.0)])),
                        Node::Leaf(Leaf::new(vec![cat(1, &[0.9, 0.1])])),
                    ],
                },
                Node::Leaf(Leaf::new(vec![
                    gauss(0, 5.0, 1.0),
                    cat(1, &[0.2, 0.8]),
                ])),
            ],
            weights: vec![0.3, 0.7],
        };
        Circuit::new(schema, root).unwrap()
    }

    fn ln_normal(x: f64, mu: f64) -> f64 {
        -0.5 * (2.0 * std::f64::consts::PI).ln() - 0.5 * (x - mu) * (x - mu)
    }

    #[test]
    fn ln_likelihood_of_mixture() {
        let circuit = mixture();
        let ll = circuit.ln_likelihood(&[1.0, 1.0]).unwrap();
        let expected = (0.3 * (ln_normal(1.0, -5.0)).exp() * 0.1
            + 0.7 * (ln_normal(1.0, 5.0)).exp() * 0.8)
            .ln();
        assert_relative_eq!(ll, expected, epsilon = 1E-10);
    }

    #[test]
    fn marginal_over_continuous_column() {
        let circuit = mixture();
        let ll = circuit.ln_marginal(&[f64::NAN, 0.0], &[false, true]).unwrap();
        assert_relative_eq!(ll, (0.3 * 0.9 + 0.7 * 0.2_f64).ln(), epsilon = 1E-12);
    }

    #[test]
    fn marginalizing_everything_gives_zero() {
        let circuit = mixture();
        let ll = circuit
            .ln_marginal(&[f64::NAN, f64::NAN], &[false, false])
            .unwrap();
        assert_relative_eq!(ll, 0.0, epsilon = 1E-12);
    }

    #[test]
    fn full_mask_marginal_equals_likelihood() {
        let circuit = mixture();
        let row = [-4.2, 0.0];
        assert_relative_eq!(
            circuit.ln_marginal(&row, &[true, true]).unwrap(),
            circuit.ln_likelihood(&row).unwrap(),
            epsilon = 1E-12
        );
    }

    #[test]
    fn invalid_values_are_reported() {
        let circuit = mixture();
        assert!(matches!(
            circuit.ln_likelihood(&[f64::INFINITY, 0.0]),
            Err(InvalidValueError::InvalidValue { col_ix: 0, .. })
        ));
        assert!(matches!(
            circuit.ln_likelihood(&[0.0, 0.5]),
            Err(InvalidValueError::InvalidValue { col_ix: 1, .. })
        ));
        assert!(matches!(
            circuit.ln_likelihood(&[0.0]),
            Err(InvalidValueError::RowLengthMismatch {
                n_cols: 2,
                n_values: 1
            })
        ));
        assert!(matches!(
            circuit.ln_marginal(&[0.0, 0.0], &[true]),
            Err(InvalidValueError::MaskLengthMismatch { .. })
        ));
        assert!(matches!(
            circuit.map(&[None, Some(-1.0)]),
            Err(InvalidValueError::InvalidValue { col_ix: 1, .. })
        ));
    }

    #[test]
    fn map_without_evidence_follows_the_heaviest_branch() {
        let circuit = mixture();
        assert_eq!(circuit.map(&[None, None]).unwrap(), vec![5.0, 1.0]);
    }

    #[test]
    fn map_uses_the_evidence_to_pick_a_branch() {
        let circuit = mixture();
        assert_eq!(
            circuit.map(&[Some(-4.5), None]).unwrap(),
            vec![-4.5, 0.0]
        );
        // 0.3 * 0.9 = 0.27 > 0.7 * 0.2 = 0.14
        assert_eq!(circuit.map(&[None, Some(0.0)]).unwrap(), vec![-5.0, 0.0]);
    }

    #[test]
    fn samples_follow_the_weights() {
        let circuit = mixture();
        let mut rng = Xoshiro256Plus::seed_from_u64(1337);
        let data = circuit.sample_n(2_000, &mut rng);
        assert_eq!(data.n_rows(), 2_000);

        let n_right = data.column_values(0).filter(|&x| x > 0.0).count();
        let frac = n_right as f64 / 2_000.0;
        assert!((frac - 0.7).abs() < 0.05, "frac = {frac}");
    }

    #[test]
    fn samples_from_a_very_wide_leaf_are_finite() {
        let schema = Schema::from_category_counts(&[0]).unwrap();
        let root = Node::Leaf(Leaf::new(vec![gauss(0, 0.0, 1E308)]));
        let circuit = Circuit::new(schema, root).unwrap();

        let mut rng = Xoshiro256Plus::seed_from_u64(1337);
        let data = circuit.sample_n(200, &mut rng);
        assert_eq!(data.n_rows(), 200);
        assert!(data.column_values(0).all(f64::is_finite));
    }

    #[test]
    fn batch_likelihoods_match_single_rows() {
        let circuit = mixture();
        let schema = Schema::from_category_counts(&[0, 2]).unwrap();
        let data = DataMatrix::new(
            schema,
            vec![vec![-5.0, 0.0], vec![5.0, 1.0], vec![0.0, 1.0]],
        )
        .unwrap();
        let lls = circuit.ln_likelihoods(&data).unwrap();
        for (row_ix, ll) in lls.iter().enumerate() {
            assert_eq!(*ll, circuit.ln_likelihood(data.row(row_ix)).unwrap());
        }
        assert_relative_eq!(
            circuit.mean_ln_likelihood(&data).unwrap(),
            lls.iter().sum::<f64>() / 3.0,
            epsilon = 1E-12
        );
    }

    #[test]
    fn batch_requires_matching_schema() {
        let circuit = mixture();
        let data = DataMatrix::new(
            Schema::from_category_counts(&[0, 3]).unwrap(),
            vec![vec![0.0, 2.0]],
        )
        .unwrap();
        assert!(matches!(
            circuit.ln_likelihoods(&data),
            Err(InvalidValueError::ColTypeMismatch { col_ix: 1, .. })
        ));

        let narrow = DataMatrix::new(
            Schema::from_category_counts(&[0]).unwrap(),
            vec![vec![0.0]],
        )
        .unwrap();
        assert!(matches!(
            circuit.mean_ln_likelihood(&narrow),
            Err(InvalidValueError::ColumnCountMismatch { .. })
        ));
    }
}
