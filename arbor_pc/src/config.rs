use serde::{Deserialize, Serialize};

use crate::{BuildError, MAX_CIRCUIT_DEPTH};

/// Configuration for learning a circuit
///
/// There are no defaults; every numeric knob must be chosen by the caller.
///
/// # Example
///
/// ```
/// # use arbor_pc::BuildConfig;
/// let yaml = "\
/// min_instances_slice: 50
/// independence_threshold: 0.3
/// min_gain: 0.01
/// max_depth: 12
/// leaf_smoothing_alpha: 1.0
/// variance_floor_epsilon: 0.000001
/// ";
/// let config: BuildConfig = serde_yaml::from_str(yaml).unwrap();
///
/// assert_eq!(config.n_threads, None);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Partitions with fewer rows than this become fully factorized leaves
    pub min_instances_slice: usize,
    /// Columns whose dependence score exceeds this are kept in the same
    /// product child
    pub independence_threshold: f64,
    /// A row split must score strictly above this to become a sum node
    pub min_gain: f64,
    /// The deepest a node may sit. The root is at depth 0. At most
    /// [`MAX_CIRCUIT_DEPTH`].
    pub max_depth: usize,
    /// Pseudo-count added to every category when fitting categorical leaves
    pub leaf_smoothing_alpha: f64,
    /// Lower bound on the variance of continuous leaves
    pub variance_floor_epsilon: f64,
    /// Number of worker threads. `None` uses the global rayon pool.
    #[serde(default)]
    pub n_threads: Option<usize>,
}

fn invalid(field: &'static str, reason: String) -> BuildError {
    BuildError::InvalidConfig { field, reason }
}

impl BuildConfig {
    /// Check that every field is usable
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.min_instances_slice == 0 {
            return Err(invalid(
                "min_instances_slice",
                "must be at least 1".into(),
            ));
        }
        if self.independence_threshold.is_nan() {
            return Err(invalid("independence_threshold", "is NaN".into()));
        }
        if self.min_gain.is_nan() {
            return Err(invalid("min_gain", "is NaN".into()));
        }
        if self.max_depth > MAX_CIRCUIT_DEPTH {
            return Err(invalid(
                "max_depth",
                format!(
                    "must be at most {MAX_CIRCUIT_DEPTH}, got {}",
                    self.max_depth
                ),
            ));
        }
        let alpha = self.leaf_smoothing_alpha;
        if !(alpha.is_finite() && alpha >= 0.0) {
            return Err(invalid(
                "leaf_smoothing_alpha",
                format!("must be finite and non-negative, got {alpha}"),
            ));
        }
        let epsilon = self.variance_floor_epsilon;
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(invalid(
                "variance_floor_epsilon",
                format!("must be finite and positive, got {epsilon}"),
            ));
        }
        if self.n_threads == Some(0) {
            return Err(invalid("n_threads", "must be at least 1".into()));
        }
        Ok(())
    }
}
