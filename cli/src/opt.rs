use std::path::PathBuf;

use arbor::metadata::{load_build_config, SerializedType};
use arbor::{BuildConfig, ImpurityMeasure, IndependenceTest};
use clap::Parser;

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// The path to the dataset to describe
    #[clap(name = "DATA")]
    pub data: PathBuf,
}

#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// The path to the training dataset
    #[clap(name = "DATA")]
    pub data: PathBuf,
    /// Where to save the circuit. The extension (yaml, json, or bincode)
    /// picks the format unless --output-format is given.
    #[clap(name = "CIRCUIT_OUT")]
    pub output: PathBuf,
    /// Path to a YAML or JSON build config. Flags given alongside it
    /// override the file's values.
    #[clap(long, short = 'c')]
    pub config: Option<PathBuf>,
    /// Partitions with fewer rows become leaves
    #[clap(long, required_unless_present = "config")]
    pub min_instances_slice: Option<usize>,
    /// Columns whose dependence exceeds this stay together
    #[clap(long, required_unless_present = "config")]
    pub independence_threshold: Option<f64>,
    /// The smallest row-split score that makes a sum node
    #[clap(long, required_unless_present = "config")]
    pub min_gain: Option<f64>,
    /// The deepest a node may sit
    #[clap(long, required_unless_present = "config")]
    pub max_depth: Option<usize>,
    /// Pseudo-count added to every category of a categorical leaf
    #[clap(long, required_unless_present = "config")]
    pub leaf_smoothing_alpha: Option<f64>,
    /// Lower bound on the variance of continuous leaves
    #[clap(long, required_unless_present = "config")]
    pub variance_floor_epsilon: Option<f64>,
    /// Number of worker threads
    #[clap(long, short = 'j')]
    pub n_threads: Option<usize>,
    /// How column dependence is measured: association or chi_square
    #[clap(long, default_value = "association")]
    pub independence_test: IndependenceTest,
    /// Impurity of categorical columns when scoring row splits: entropy,
    /// gini, or misclassification
    #[clap(long, default_value = "entropy")]
    pub impurity: ImpurityMeasure,
    /// Format to save the output
    #[clap(short = 'f', long = "output-format")]
    pub output_format: Option<SerializedType>,
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("--{flag} is required without --config"))
}

impl BuildArgs {
    pub fn build_config(&self) -> Result<BuildConfig, String> {
        let mut config = match self.config {
            Some(ref path) => {
                load_build_config(path).map_err(|err| err.to_string())?
            }
            None => BuildConfig {
                min_instances_slice: required(
                    self.min_instances_slice,
                    "min-instances-slice",
                )?,
                independence_threshold: required(
                    self.independence_threshold,
                    "independence-threshold",
                )?,
                min_gain: required(self.min_gain, "min-gain")?,
                max_depth: required(self.max_depth, "max-depth")?,
                leaf_smoothing_alpha: required(
                    self.leaf_smoothing_alpha,
                    "leaf-smoothing-alpha",
                )?,
                variance_floor_epsilon: required(
                    self.variance_floor_epsilon,
                    "variance-floor-epsilon",
                )?,
                n_threads: None,
            },
        };

        if let Some(x) = self.min_instances_slice {
            config.min_instances_slice = x;
        }
        if let Some(x) = self.independence_threshold {
            config.independence_threshold = x;
        }
        if let Some(x) = self.min_gain {
            config.min_gain = x;
        }
        if let Some(x) = self.max_depth {
            config.max_depth = x;
        }
        if let Some(x) = self.leaf_smoothing_alpha {
            config.leaf_smoothing_alpha = x;
        }
        if let Some(x) = self.variance_floor_epsilon {
            config.variance_floor_epsilon = x;
        }
        if self.n_threads.is_some() {
            config.n_threads = self.n_threads;
        }

        Ok(config)
    }
}

#[derive(Parser, Debug)]
pub struct LoglikeArgs {
    /// The path to a saved circuit
    #[clap(name = "CIRCUIT")]
    pub circuit: PathBuf,
    /// The path to the dataset to score
    #[clap(name = "DATA")]
    pub data: PathBuf,
    /// Print the log likelihood of every row instead of the mean
    #[clap(long)]
    pub per_row: bool,
}

#[derive(Parser, Debug)]
pub struct SampleArgs {
    /// The path to a saved circuit
    #[clap(name = "CIRCUIT")]
    pub circuit: PathBuf,
    /// Where to write the sampled dataset
    #[clap(name = "DATA_OUT")]
    pub output: PathBuf,
    /// The number of rows to draw
    #[clap(long = "n-samples", short = 'n')]
    pub n: usize,
    /// The PRNG seed
    #[clap(long = "seed")]
    pub seed: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// The path to a saved circuit
    #[clap(name = "CIRCUIT")]
    pub circuit: PathBuf,
}

#[derive(Parser, Debug)]
#[clap(
    name = "arbor",
    author = "The Arbor Developers",
    about = "Learn and query probabilistic circuits",
    version
)]
pub enum Opt {
    /// Describe the columns of a dataset
    #[clap(name = "info")]
    Info(InfoArgs),
    /// Learn a circuit from a dataset and save it
    #[clap(name = "build")]
    Build(BuildArgs),
    /// Score a dataset under a saved circuit
    #[clap(name = "loglike")]
    Loglike(LoglikeArgs),
    /// Draw rows from a saved circuit
    #[clap(name = "sample")]
    Sample(SampleArgs),
    /// Check that a saved circuit is smooth, decomposable, and normalized
    #[clap(name = "check")]
    Check(CheckArgs),
}
