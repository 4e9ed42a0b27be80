#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorfit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chart;
pub mod export;
pub mod report;
pub mod summary;
pub mod table;

pub use chart::{ChartSize, histogram_with_density, line_chart, pair_plot, scatter_plot};
pub use export::{CoefficientRecord, ExportError, ExportFormat, Exporter, SampleRecord};
pub use report::{Report, ReportBuilder, ReportError};
pub use summary::RegressionSummary;
pub use table::{
    TableError, correlation_table, describe_table, dtypes_table, frame_preview, missing_table,
    render_table,
};
