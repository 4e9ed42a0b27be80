//! Text rendering of the factor file overview and per-ticker results.

use factorfit::data::FactorTable;
use factorfit::output::{
    ChartSize, dtypes_table, frame_preview, histogram_with_density, line_chart, missing_table,
    pair_plot,
};
use factorfit::{SampleOverview, TickerAnalysis};

const PREVIEW_ROWS: usize = 5;
const HISTOGRAM_BINS: usize = 20;
const PAIRS_PER_ROW: usize = 4;

fn section(title: &str) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{title}");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

/// Preview, column types, missing values and statistics of the factor file.
pub(crate) fn print_factor_overview(factors: &FactorTable) -> Result<(), Box<dyn std::error::Error>> {
    let df = factors.to_dataframe()?;

    println!(
        "Loaded {} monthly factor rows ({} to {})\n",
        factors.len(),
        factors.first_date(),
        factors.last_date()
    );

    section("FACTOR DATA");
    println!("{}", frame_preview(&df, PREVIEW_ROWS)?);
    println!("Column types:");
    println!("{}", dtypes_table(&df));

    let missing: Vec<(String, usize)> = factors
        .missing_counts()
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    println!("Missing values:");
    println!("{}", missing_table(&missing));

    let overview = SampleOverview::from_factor_table(factors)?;
    println!("Descriptive statistics:");
    println!("{}", overview.describe_table());
    println!("Correlation matrix:");
    println!("{}", overview.correlation_table());

    Ok(())
}

/// Merge diagnostics, regression summary and residual charts of one ticker.
pub(crate) fn print_analysis(
    analysis: &TickerAnalysis,
    plots: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let sample = &analysis.sample;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", format!("FIVE-FACTOR REGRESSION: {}", analysis.symbol));
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    section("MERGED SAMPLE");
    println!("{}", frame_preview(&sample.preview, PREVIEW_ROWS)?);
    println!("Missing values after merge:");
    println!("{}", missing_table(&sample.missing_after_join));
    let (rows, cols) = sample.shape();
    println!("Shape after dropping missing values: ({rows}, {cols})\n");

    if plots {
        let columns = sample.named_columns();
        let grid: Vec<(&str, &[f64])> = columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
            .collect();

        section("PAIR PLOT");
        println!(
            "{}",
            pair_plot(
                "Pairplot of Factors and Stock Returns",
                &grid,
                PAIRS_PER_ROW,
                ChartSize::panel()
            )
        );
    }

    section("REGRESSION RESULTS");
    println!("{}", analysis.summary.to_ascii_table());

    if plots {
        let resid = analysis.results.resid.to_vec();
        let (first, last) = sample
            .date_range()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .unwrap_or_default();

        section("RESIDUALS");
        println!(
            "{}",
            line_chart(
                "Residuals over time",
                &resid,
                (first.as_str(), last.as_str()),
                true,
                ChartSize::default()
            )
        );
        println!(
            "{}",
            histogram_with_density(
                "Distribution of residuals",
                &resid,
                HISTOGRAM_BINS,
                ChartSize::default()
            )
        );
    }

    Ok(())
}
