//! factorfit CLI binary.
//!
//! Regresses monthly excess returns of one or more equities on the
//! Fama-French five factors.

mod integration;

use clap::{Parser, ValueEnum};
use factorfit::data::{CachedQuoteSource, FrenchCsvOptions, YahooQuoteProvider};
use factorfit::regression::CovarianceType;
use factorfit::{
    AnalysisConfig, Pipeline, TickerAnalysis, collect_successes, config::DEFAULT_FACTOR_FILE,
    config::DEFAULT_TICKER, write_artifacts,
};
use indicatif::{ProgressBar, ProgressStyle};
use integration::cache_manager::{describe_cache, open_cache};
use integration::console::{print_analysis, print_factor_overview};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "warn,factorfit=info,factorfit_data=info,factorfit_regression=info,factorfit_output=info";

#[derive(Parser)]
#[command(name = "factorfit")]
#[command(about = "Fama-French five-factor regression for single equities", long_about = None)]
#[command(version)]
struct Cli {
    /// Fama-French 2x3 five-factor CSV
    #[arg(long, default_value = DEFAULT_FACTOR_FILE)]
    factors: PathBuf,

    /// Ticker to analyze (repeatable)
    #[arg(long = "ticker", default_value = DEFAULT_TICKER)]
    tickers: Vec<String>,

    /// Parameter covariance estimator
    #[arg(long, value_enum, default_value_t = CovType::Hc3)]
    cov_type: CovType,

    /// Newey-West lag count for `--cov-type hac` (automatic when omitted)
    #[arg(long)]
    hac_lags: Option<usize>,

    /// Lines before the factor file header (auto-detected when omitted)
    #[arg(long)]
    skip_rows: Option<usize>,

    /// Lines to drop from the end of the factor file (auto-detected when omitted)
    #[arg(long)]
    skip_footer: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write sample, coefficient and report files to this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Do not draw terminal charts
    #[arg(long)]
    no_plots: bool,

    /// Disable caching (always fetch fresh data)
    #[arg(long)]
    no_cache: bool,

    /// Force refresh cached data
    #[arg(long)]
    refresh: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CovType {
    Nonrobust,
    Hc0,
    Hc1,
    Hc2,
    Hc3,
    Hac,
}

impl CovType {
    const fn into_covariance(self, hac_lags: Option<usize>) -> CovarianceType {
        match self {
            Self::Nonrobust => CovarianceType::NonRobust,
            Self::Hc0 => CovarianceType::HC0,
            Self::Hc1 => CovarianceType::HC1,
            Self::Hc2 => CovarianceType::HC2,
            Self::Hc3 => CovarianceType::HC3,
            Self::Hac => CovarianceType::Hac { max_lags: hac_lags },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn analysis_config(&self) -> factorfit::Result<AnalysisConfig> {
        if self.hac_lags.is_some() && self.cov_type != CovType::Hac {
            warn!("--hac-lags only applies to --cov-type hac; ignoring");
        }
        AnalysisConfig {
            factor_path: self.factors.clone(),
            tickers: self.tickers.clone(),
            csv: FrenchCsvOptions {
                skip_rows: self.skip_rows,
                skip_footer: self.skip_footer,
            },
            cov_type: self.cov_type.into_covariance(self.hac_lags),
            ..Default::default()
        }
        .validate()
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.analysis_config()?;
    let text = cli.format == OutputFormat::Text;

    let cache = if cli.no_cache {
        None
    } else {
        match open_cache() {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %e, "quote cache unavailable, fetching without it");
                None
            }
        }
    };
    if text {
        match &cache {
            Some(cache) => println!("Quote cache: {}", describe_cache(cache)),
            None => println!("Quote cache: disabled"),
        }
        if cli.refresh {
            println!("  Mode: Force refresh (re-fetching all data)");
        }
    }

    let source = CachedQuoteSource::new(YahooQuoteProvider::try_new()?, cache, cli.refresh);
    let pipeline = Pipeline::new(source, config);

    let factors = pipeline.load_factors()?;
    if text {
        print_factor_overview(&factors)?;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!(
        "Fetching quotes for {}...",
        pipeline.config().tickers.join(", ")
    ));
    let outcomes = pipeline.run(&factors).await;
    let succeeded = outcomes.iter().filter(|(_, o)| o.is_ok()).count();
    pb.finish_with_message(format!(
        "Analyzed {succeeded}/{} ticker(s)",
        outcomes.len()
    ));

    let analyses = collect_successes(outcomes)?;

    if text {
        for analysis in &analyses {
            print_analysis(analysis, !cli.no_plots)?;
        }
    } else {
        print_reports(&analyses)?;
    }

    if let Some(dir) = &cli.export_dir {
        for analysis in &analyses {
            let paths = write_artifacts(analysis, dir)?;
            if text {
                println!(
                    "Wrote {}, {}, {}",
                    paths.sample.display(),
                    paths.coefficients.display(),
                    paths.report.display()
                );
            }
        }
    }

    Ok(())
}

fn print_reports(analyses: &[TickerAnalysis]) -> Result<(), Box<dyn std::error::Error>> {
    let reports = analyses
        .iter()
        .map(TickerAnalysis::report)
        .collect::<factorfit::Result<Vec<_>>>()?;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
