//! SaleScope CLI: descriptive statistics and charts for a product sales CSV.
//!
//! Loads the dataset, cleans it, prints a text summary and writes three SVG
//! charts plus `summary.json` to the output directory. Exits non-zero when
//! the config or dataset cannot be used.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use salescope_core::data::AnomalyPolicy;
use salescope_runner::{format_report, run_analysis, AnalysisConfig};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "salescope",
    version,
    about = "SaleScope: exploratory analysis of a product sales dataset"
)]
struct Cli {
    /// Dataset path. Defaults to data/amazon_sales.csv.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory for charts and summary.json. Defaults to ./graphs.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// TOML config file; flags given here override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of most-reviewed products to list.
    #[arg(long)]
    top_n: Option<usize>,

    /// What to do with rows whose discounted price exceeds the list price:
    /// drop, clamp or keep.
    #[arg(long)]
    anomaly_policy: Option<AnomalyPolicy>,

    /// Skip chart rendering.
    #[arg(long, default_value_t = false)]
    no_charts: bool,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = resolve_config(&cli)?;
    let outcome = run_analysis(&config)
        .with_context(|| format!("analysis of {} failed", config.input.display()))?;

    print!("{}", format_report(&outcome, config.chart_top_k));
    if !outcome.is_clean() {
        warn!("finished with non-fatal errors");
    }
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn resolve_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(input) = &cli.input {
        config.input = input.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(n) = cli.top_n {
        config.top_n = n;
    }
    if let Some(policy) = cli.anomaly_policy {
        config.anomaly_policy = policy;
    }
    if cli.no_charts {
        config.render_charts = false;
    }

    config.validate().context("invalid settings")?;
    Ok(config)
}

/// Logs go to stderr so stdout carries only the report.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("salescope").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_without_flags() {
        let config = resolve_config(&parse(&[])).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--input",
            "sales.csv",
            "--output-dir",
            "out",
            "--top-n",
            "3",
            "--anomaly-policy",
            "keep",
            "--no-charts",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.input, PathBuf::from("sales.csv"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.top_n, 3);
        assert_eq!(config.anomaly_policy, AnomalyPolicy::Keep);
        assert!(!config.render_charts);
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salescope.toml");
        std::fs::write(&path, "top_n = 9\nanomaly_policy = \"clamp\"\n").unwrap();

        let cli = parse(&["--config", path.to_str().unwrap(), "--top-n", "2"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.top_n, 2);
        assert_eq!(config.anomaly_policy, AnomalyPolicy::Clamp);
    }

    #[test]
    fn zero_top_n_is_rejected() {
        assert!(resolve_config(&parse(&["--top-n", "0"])).is_err());
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let args = ["salescope", "--anomaly-policy", "ignore"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
