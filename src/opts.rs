//! CLI options.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Parser};

use crate::engine::ExecutionMode;
use crate::prelude::*;

pub mod parsers;

/// Factorizes a sparse matrix with the bias stochastic gradient descent
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    /// Sentry DSN
    #[arg(long, env = "BIAS_SGD_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    /// Performance monitoring sample rate
    #[arg(
        long,
        default_value = "0",
        env = "BIAS_SGD_TRACES_SAMPLE_RATE",
        value_parser = parsers::sample_rate,
    )]
    pub traces_sample_rate: f32,

    #[command(flatten)]
    pub trainer: TrainerOpts,
}

#[derive(Args)]
pub struct TrainerOpts {
    /// Matrix file, directory, or file name prefix to load
    pub matrix: PathBuf,

    /// Number of latent factors
    #[arg(
        short = 'd',
        long = "n-latent",
        default_value = "20",
        value_parser = parsers::non_zero_usize,
    )]
    pub n_factors: usize,

    /// Regularization
    #[arg(long, default_value = "0.001", value_parser = parsers::non_negative_f64)]
    pub lambda: f64,

    /// Initial learning rate
    #[arg(long, default_value = "0.001", value_parser = parsers::positive_f64)]
    pub gamma: f64,

    /// Learning rate multiplier applied on every error report
    #[arg(long, default_value = "0.9", value_parser = parsers::positive_f64)]
    pub step_dec: f64,

    /// Lower bound of a prediction
    #[arg(long, default_value = "1e-100", allow_hyphen_values = true)]
    pub min_value: f64,

    /// Upper bound of a prediction
    #[arg(long, default_value = "1e100", allow_hyphen_values = true)]
    pub max_value: f64,

    /// Update budget of a single vertex
    #[arg(long, default_value = "10")]
    pub max_updates: u32,

    /// Execution mode
    #[arg(long, value_enum, default_value_t = ExecutionMode::Synchronous)]
    pub engine: ExecutionMode,

    /// Minimal interval between error aggregations
    #[arg(long, default_value = "0s", value_parser = humantime::parse_duration)]
    pub interval: StdDuration,

    /// Every N-th error aggregation is reported and decays the learning rate
    #[arg(long, default_value = "2")]
    pub report_cadence: NonZeroUsize,

    /// Output path of the predictions
    #[arg(long)]
    pub predictions: Option<PathBuf>,

    /// Output path of the learned vertex data, as JSON lines
    #[arg(long)]
    pub factors: Option<PathBuf>,

    /// Move the target IDs into a separate number space
    #[arg(long)]
    pub remap_target: bool,

    /// Initialize the factors with ones
    #[arg(long)]
    pub debug: bool,

    /// Random number generator seed
    #[arg(long)]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_ok() {
        Opts::command().debug_assert();
    }

    #[test]
    fn defaults_ok() -> Result {
        let opts = Opts::try_parse_from(["bias-sgd", "ratings"])?;
        let trainer = opts.trainer;
        assert_eq!(trainer.matrix, PathBuf::from("ratings"));
        assert_eq!(trainer.n_factors, 20);
        assert_eq!(trainer.max_updates, 10);
        assert_eq!(trainer.engine, ExecutionMode::Synchronous);
        assert_eq!(trainer.interval, StdDuration::ZERO);
        assert_eq!(trainer.report_cadence.get(), 2);
        assert!(!trainer.remap_target);
        Ok(())
    }

    #[test]
    fn parse_ok() -> Result {
        let opts = Opts::try_parse_from([
            "bias-sgd",
            "ratings",
            "-d",
            "5",
            "--engine",
            "asynchronous",
            "--interval",
            "1m",
            "--min-value",
            "-10",
            "--remap-target",
        ])?;
        let trainer = opts.trainer;
        assert_eq!(trainer.n_factors, 5);
        assert_eq!(trainer.engine, ExecutionMode::Asynchronous);
        assert_eq!(trainer.interval, StdDuration::from_secs(60));
        assert!((trainer.min_value + 10.0).abs() < f64::EPSILON);
        assert!(trainer.remap_target);
        Ok(())
    }

    #[test]
    fn parse_error() {
        assert!(Opts::try_parse_from(["bias-sgd"]).is_err());
        assert!(Opts::try_parse_from(["bias-sgd", "ratings", "-d", "0"]).is_err());
        assert!(Opts::try_parse_from(["bias-sgd", "ratings", "--gamma", "0"]).is_err());
        assert!(Opts::try_parse_from(["bias-sgd", "ratings", "--report-cadence", "0"]).is_err());
    }
}
