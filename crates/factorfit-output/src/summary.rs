//! Regression summary table.
//!
//! Lays out an OLS fit in the familiar three-block format: model and fit
//! statistics, the coefficient table, and residual diagnostics, followed by
//! notes on the covariance estimator.

use chrono::NaiveDate;
use factorfit_regression::{Coefficient, CovarianceType, OlsResults, ResidualDiagnostics};
use serde::{Deserialize, Serialize};
use std::fmt;

const WIDTH: usize = 78;

/// Condition numbers above this trigger a collinearity note.
const CONDITION_WARNING: f64 = 1000.0;

/// Everything shown in a regression summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionSummary {
    /// Name of the dependent variable.
    pub dep_variable: String,

    /// First month in the sample.
    pub sample_start: Option<NaiveDate>,

    /// Last month in the sample.
    pub sample_end: Option<NaiveDate>,

    /// Number of observations.
    pub nobs: usize,

    /// Residual degrees of freedom.
    pub df_resid: usize,

    /// Model degrees of freedom (slopes).
    pub df_model: usize,

    /// Covariance estimator label.
    pub cov_type: String,

    /// Test statistic label, `t` or `z`.
    pub statistic_label: String,

    /// R².
    pub rsquared: f64,

    /// Adjusted R².
    pub rsquared_adj: f64,

    /// Joint F statistic for all slopes.
    pub fvalue: f64,

    /// p-value of the F statistic.
    pub f_pvalue: f64,

    /// Log-likelihood.
    pub llf: f64,

    /// Akaike information criterion.
    pub aic: f64,

    /// Bayesian information criterion.
    pub bic: f64,

    /// Coefficient table.
    pub coefficients: Vec<Coefficient>,

    /// Residual diagnostics.
    pub diagnostics: ResidualDiagnostics,

    /// Condition number of the design matrix.
    pub condition_number: f64,

    /// Footnotes.
    pub notes: Vec<String>,
}

fn covariance_note(cov_type: CovarianceType) -> String {
    match cov_type {
        CovarianceType::NonRobust => {
            "Standard Errors assume that the covariance matrix of the errors is correctly specified."
                .to_string()
        }
        CovarianceType::Hac { .. } => format!(
            "Standard Errors are heteroscedasticity and autocorrelation robust ({})",
            cov_type
        ),
        _ => format!("Standard Errors are heteroscedasticity robust ({})", cov_type),
    }
}

impl RegressionSummary {
    /// Collect a summary from a fitted model.
    pub fn from_results(
        dep_variable: &str,
        results: &OlsResults,
        sample: Option<(NaiveDate, NaiveDate)>,
    ) -> Self {
        let mut notes = vec![covariance_note(results.cov_type)];
        if results.condition_number > CONDITION_WARNING {
            notes.push(format!(
                "The condition number is large, {:.3e}. This might indicate that there are strong multicollinearity or other numerical problems.",
                results.condition_number
            ));
        }

        Self {
            dep_variable: dep_variable.to_string(),
            sample_start: sample.map(|(start, _)| start),
            sample_end: sample.map(|(_, end)| end),
            nobs: results.nobs,
            df_resid: results.df_resid,
            df_model: results.df_model,
            cov_type: results.cov_type.to_string(),
            statistic_label: results.distribution.label().to_string(),
            rsquared: results.rsquared,
            rsquared_adj: results.rsquared_adj,
            fvalue: results.fvalue,
            f_pvalue: results.f_pvalue,
            llf: results.llf,
            aic: results.aic,
            bic: results.bic,
            coefficients: results.coefficients(),
            diagnostics: results.diagnostics,
            condition_number: results.condition_number,
            notes,
        }
    }

    /// Look up a coefficient row by regressor name.
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    fn pair_line(left: (&str, String), right: (&str, String)) -> String {
        format!(
            "{:<19}{:>17}   {:<22}{:>17}\n",
            left.0, left.1, right.0, right.1
        )
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();
        let date_or_blank =
            |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m").to_string()).unwrap_or_default();

        output.push_str(&format!(
            "{:^width$}\n",
            "OLS Regression Results",
            width = WIDTH
        ));
        output.push_str(&"=".repeat(WIDTH));
        output.push('\n');

        output.push_str(&Self::pair_line(
            ("Dep. Variable:", self.dep_variable.clone()),
            ("R-squared:", format!("{:.3}", self.rsquared)),
        ));
        output.push_str(&Self::pair_line(
            ("Model:", "OLS".to_string()),
            ("Adj. R-squared:", format!("{:.3}", self.rsquared_adj)),
        ));
        output.push_str(&Self::pair_line(
            ("Method:", "Least Squares".to_string()),
            ("F-statistic:", format!("{:.2}", self.fvalue)),
        ));
        output.push_str(&Self::pair_line(
            ("Sample start:", date_or_blank(self.sample_start)),
            ("Prob (F-statistic):", format!("{:.3e}", self.f_pvalue)),
        ));
        output.push_str(&Self::pair_line(
            ("Sample end:", date_or_blank(self.sample_end)),
            ("Log-Likelihood:", format!("{:.2}", self.llf)),
        ));
        output.push_str(&Self::pair_line(
            ("No. Observations:", self.nobs.to_string()),
            ("AIC:", format!("{:.1}", self.aic)),
        ));
        output.push_str(&Self::pair_line(
            ("Df Residuals:", self.df_resid.to_string()),
            ("BIC:", format!("{:.1}", self.bic)),
        ));
        output.push_str(&Self::pair_line(
            ("Df Model:", self.df_model.to_string()),
            ("", String::new()),
        ));
        output.push_str(&Self::pair_line(
            ("Covariance Type:", self.cov_type.clone()),
            ("", String::new()),
        ));

        output.push_str(&"=".repeat(WIDTH));
        output.push('\n');
        output.push_str(&format!(
            "{:<14}{:>10}{:>10}{:>10}{:>10}{:>12}{:>12}\n",
            "",
            "coef",
            "std err",
            self.statistic_label,
            format!("P>|{}|", self.statistic_label),
            "[0.025",
            "0.975]"
        ));
        output.push_str(&"-".repeat(WIDTH));
        output.push('\n');

        for c in &self.coefficients {
            output.push_str(&format!(
                "{:<14}{:>10.4}{:>10.3}{:>10.3}{:>10.3}{:>12.3}{:>12.3}\n",
                c.name, c.coef, c.std_err, c.statistic, c.pvalue, c.ci_lower, c.ci_upper
            ));
        }

        output.push_str(&"=".repeat(WIDTH));
        output.push('\n');

        let d = &self.diagnostics;
        output.push_str(&Self::pair_line(
            ("Omnibus:", format!("{:.3}", d.omnibus)),
            ("Durbin-Watson:", format!("{:.3}", d.durbin_watson)),
        ));
        output.push_str(&Self::pair_line(
            ("Prob(Omnibus):", format!("{:.3}", d.omnibus_pvalue)),
            ("Jarque-Bera (JB):", format!("{:.3}", d.jarque_bera)),
        ));
        output.push_str(&Self::pair_line(
            ("Skew:", format!("{:.3}", d.skew)),
            ("Prob(JB):", format!("{:.3e}", d.jarque_bera_pvalue)),
        ));
        output.push_str(&Self::pair_line(
            ("Kurtosis:", format!("{:.3}", d.kurtosis)),
            ("Cond. No.", format!("{:.3}", self.condition_number)),
        ));
        output.push_str(&"=".repeat(WIDTH));
        output.push('\n');

        if !self.notes.is_empty() {
            output.push_str("\nNotes:\n");
            for (i, note) in self.notes.iter().enumerate() {
                output.push_str(&format!("[{}] {}\n", i + 1, note));
            }
        }

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# OLS: {}\n\n", self.dep_variable));
        if let (Some(start), Some(end)) = (self.sample_start, self.sample_end) {
            output.push_str(&format!("**Sample:** {} to {}\n\n", start, end));
        }
        output.push_str(&format!(
            "- **Observations:** {}\n- **R²:** {:.4} (adj. {:.4})\n- **F:** {:.3} (p = {:.3e})\n- **Covariance:** {}\n\n",
            self.nobs, self.rsquared, self.rsquared_adj, self.fvalue, self.f_pvalue, self.cov_type
        ));

        output.push_str(&format!(
            "| Regressor | Coef | Std Err | {} | P>\\|{}\\| | [0.025 | 0.975] |\n",
            self.statistic_label, self.statistic_label
        ));
        output.push_str("|---|---|---|---|---|---|---|\n");
        for c in &self.coefficients {
            output.push_str(&format!(
                "| {} | {:.4} | {:.4} | {:.3} | {:.3} | {:.4} | {:.4} |\n",
                c.name, c.coef, c.std_err, c.statistic, c.pvalue, c.ci_lower, c.ci_upper
            ));
        }

        output
    }
}

impl fmt::Display for RegressionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii_table())
    }
}
