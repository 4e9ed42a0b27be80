//! Classical (homoskedastic) OLS covariance.

use super::{CovarianceError, FitContext, ParameterCovariance};
use ndarray::Array2;

/// `σ² (XᵀX)⁻¹` with `σ² = SSR / (n − k)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicalCovariance;

impl ParameterCovariance for ClassicalCovariance {
    fn estimate(&self, ctx: &FitContext<'_>) -> Result<Array2<f64>, CovarianceError> {
        ctx.check()?;
        if ctx.df_resid == 0 {
            return Err(CovarianceError::InsufficientData {
                required: ctx.exog.ncols() + 1,
                actual: ctx.exog.nrows(),
            });
        }
        let ssr = ctx.resid.dot(ctx.resid);
        let scale = ssr / ctx.df_resid as f64;
        Ok(ctx.xtx_inv * scale)
    }

    fn is_robust(&self) -> bool {
        false
    }
}
