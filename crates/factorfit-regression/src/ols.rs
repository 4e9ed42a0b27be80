//! Ordinary least squares with selectable parameter covariance.
//!
//! ```text
//! β̂ = (XᵀX)⁻¹ Xᵀy
//! ```
//!
//! Fit statistics follow the usual conventions for regressions with an
//! intercept: centered R², adjusted R² on `n − k` residual degrees of
//! freedom, Gaussian log-likelihood, and a joint Wald test of all slopes.

use crate::covariance::{CovarianceType, FitContext};
use crate::diagnostics::ResidualDiagnostics;
use crate::error::{RegressionError, Result};
use crate::inference::{TestDistribution, wald_f_test};
use crate::linalg::{condition_number, invert_spd};
use ndarray::{Array1, Array2, Axis, concatenate};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Name given to the intercept column.
pub const CONSTANT_NAME: &str = "const";

/// Significance level of the reported confidence intervals.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Linear model `y = Xβ + ε`.
#[derive(Debug, Clone)]
pub struct Ols {
    endog: Array1<f64>,
    exog: Array2<f64>,
    names: Vec<String>,
    constant: Option<usize>,
}

impl Ols {
    /// Build a model from a response, a design matrix, and one name per column.
    pub fn new(endog: Array1<f64>, exog: Array2<f64>, names: Vec<String>) -> Result<Self> {
        if endog.len() != exog.nrows() {
            return Err(RegressionError::DimensionMismatch {
                expected: endog.len(),
                actual: exog.nrows(),
            });
        }
        if names.len() != exog.ncols() {
            return Err(RegressionError::NameMismatch {
                expected: exog.ncols(),
                actual: names.len(),
            });
        }
        if endog.iter().any(|v| !v.is_finite()) {
            return Err(RegressionError::NonFinite("response"));
        }
        if exog.iter().any(|v| !v.is_finite()) {
            return Err(RegressionError::NonFinite("regressors"));
        }
        let constant = exog
            .columns()
            .into_iter()
            .position(|c| !c.is_empty() && c.iter().all(|&v| v == 1.0));
        Ok(Self {
            endog,
            exog,
            names,
            constant,
        })
    }

    /// Prepend an intercept column named `const`, unless one is already present.
    pub fn add_constant(mut self) -> Self {
        if self.constant.is_some() {
            return self;
        }
        let ones = Array2::<f64>::ones((self.exog.nrows(), 1));
        // Row counts match by construction
        if let Ok(exog) = concatenate(Axis(1), &[ones.view(), self.exog.view()]) {
            self.exog = exog;
            self.names.insert(0, CONSTANT_NAME.to_string());
            self.constant = Some(0);
        }
        self
    }

    /// Number of observations.
    pub fn nobs(&self) -> usize {
        self.endog.len()
    }

    /// Column names in design order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Design matrix.
    pub fn exog(&self) -> &Array2<f64> {
        &self.exog
    }

    /// Response vector.
    pub fn endog(&self) -> &Array1<f64> {
        &self.endog
    }

    /// Estimate the model.
    pub fn fit(&self, cov_type: CovarianceType) -> Result<OlsResults> {
        let (n, k) = self.exog.dim();
        if n <= k {
            return Err(RegressionError::InsufficientData {
                required: k,
                actual: n,
            });
        }

        let xtx = self.exog.t().dot(&self.exog);
        let xtx_inv = invert_spd(&xtx)?;
        let params = xtx_inv.dot(&self.exog.t().dot(&self.endog));
        let fittedvalues = self.exog.dot(&params);
        let resid = &self.endog - &fittedvalues;

        let df_resid = n - k;
        let k_constant = usize::from(self.constant.is_some());
        let df_model = k - k_constant;

        let ssr = resid.dot(&resid);
        let scale = ssr / df_resid as f64;
        let tss = if self.constant.is_some() {
            let mean = self.endog.mean().unwrap_or(0.0);
            self.endog.iter().map(|y| (y - mean).powi(2)).sum::<f64>()
        } else {
            self.endog.dot(&self.endog)
        };
        let rsquared = 1.0 - ssr / tss;
        let rsquared_adj = 1.0 - (n - k_constant) as f64 / df_resid as f64 * (1.0 - rsquared);

        let estimator = cov_type.estimator();
        let ctx = FitContext {
            exog: &self.exog,
            resid: &resid,
            xtx_inv: &xtx_inv,
            df_resid,
        };
        let cov_params = estimator.estimate(&ctx)?;
        let distribution = TestDistribution::for_fit(estimator.is_robust(), df_resid);

        let bse = cov_params.diag().mapv(|v| v.max(0.0).sqrt());
        let statistics = &params / &bse;
        let pvalues = statistics
            .iter()
            .map(|&s| distribution.two_sided_pvalue(s))
            .collect::<Result<Array1<f64>>>()?;

        let critical = distribution.critical_value(DEFAULT_ALPHA)?;
        let mut conf_int = Array2::<f64>::zeros((k, 2));
        for j in 0..k {
            conf_int[[j, 0]] = params[j] - critical * bse[j];
            conf_int[[j, 1]] = params[j] + critical * bse[j];
        }

        let slopes: Vec<usize> = (0..k).filter(|&j| Some(j) != self.constant).collect();
        let (fvalue, f_pvalue) = wald_f_test(&params, &cov_params, &slopes, df_resid)?;

        let nobs = n as f64;
        let llf = -nobs / 2.0 * ((2.0 * PI).ln() + (ssr / nobs).ln() + 1.0);
        let n_params = (df_model + k_constant) as f64;
        let aic = -2.0 * llf + 2.0 * n_params;
        let bic = -2.0 * llf + nobs.ln() * n_params;

        let diagnostics = ResidualDiagnostics::from_residuals(&resid.to_vec())?;

        debug!(
            nobs = n,
            regressors = k,
            cov_type = %cov_type,
            rsquared,
            "OLS fit complete"
        );

        Ok(OlsResults {
            names: self.names.clone(),
            params,
            bse,
            statistics,
            pvalues,
            conf_int,
            cov_params,
            cov_type,
            distribution,
            nobs: n,
            df_model,
            df_resid,
            k_constant,
            rsquared,
            rsquared_adj,
            fvalue,
            f_pvalue,
            llf,
            aic,
            bic,
            ssr,
            scale,
            fittedvalues,
            resid,
            diagnostics,
            condition_number: condition_number(&self.exog),
        })
    }
}

/// One row of the coefficient table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Regressor name
    pub name: String,
    /// Point estimate
    pub coef: f64,
    /// Standard error
    pub std_err: f64,
    /// t or z statistic
    pub statistic: f64,
    /// Two-sided p-value
    pub pvalue: f64,
    /// Lower bound of the 95% interval
    pub ci_lower: f64,
    /// Upper bound of the 95% interval
    pub ci_upper: f64,
}

/// Fitted OLS model.
#[derive(Debug, Clone)]
pub struct OlsResults {
    /// Column names in design order
    pub names: Vec<String>,
    /// Estimated coefficients
    pub params: Array1<f64>,
    /// Standard errors
    pub bse: Array1<f64>,
    /// Coefficient over standard error
    pub statistics: Array1<f64>,
    /// Two-sided p-values
    pub pvalues: Array1<f64>,
    /// 95% confidence intervals (k × 2)
    pub conf_int: Array2<f64>,
    /// Parameter covariance matrix
    pub cov_params: Array2<f64>,
    /// Covariance estimator used
    pub cov_type: CovarianceType,
    /// Reference distribution of the statistics
    pub distribution: TestDistribution,
    /// Number of observations
    pub nobs: usize,
    /// Regressors excluding the constant
    pub df_model: usize,
    /// `n − k`
    pub df_resid: usize,
    /// 1 when the design has an intercept
    pub k_constant: usize,
    /// Coefficient of determination
    pub rsquared: f64,
    /// Adjusted R²
    pub rsquared_adj: f64,
    /// Wald F statistic for all slopes
    pub fvalue: f64,
    /// p-value of the F statistic
    pub f_pvalue: f64,
    /// Gaussian log-likelihood
    pub llf: f64,
    /// Akaike information criterion
    pub aic: f64,
    /// Bayesian information criterion
    pub bic: f64,
    /// Sum of squared residuals
    pub ssr: f64,
    /// `SSR / df_resid`
    pub scale: f64,
    /// `Xβ̂`
    pub fittedvalues: Array1<f64>,
    /// `y − Xβ̂`
    pub resid: Array1<f64>,
    /// Residual normality and autocorrelation tests
    pub diagnostics: ResidualDiagnostics,
    /// Condition number of the design
    pub condition_number: f64,
}

impl OlsResults {
    /// Coefficient table rows in design order.
    pub fn coefficients(&self) -> Vec<Coefficient> {
        self.names
            .iter()
            .enumerate()
            .map(|(j, name)| Coefficient {
                name: name.clone(),
                coef: self.params[j],
                std_err: self.bse[j],
                statistic: self.statistics[j],
                pvalue: self.pvalues[j],
                ci_lower: self.conf_int[[j, 0]],
                ci_upper: self.conf_int[[j, 1]],
            })
            .collect()
    }

    /// Look up a coefficient by name.
    pub fn coefficient(&self, name: &str) -> Option<Coefficient> {
        self.coefficients().into_iter().find(|c| c.name == name)
    }
}
