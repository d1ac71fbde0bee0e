//! Before/after intervention analysis of a treated series against a control
//! series sharing the same index.
//!
//! [`ControlledIntervention`] splits both series and their difference at the
//! intervention point, derives means, standard deviations and counts, and
//! runs a two-sample t-test from summary statistics and an ANCOVA.

pub mod analyzer;
pub mod ancova;
pub mod error;
pub mod plot;
pub mod report;
pub mod series;
pub mod stats;
pub mod ttest;

pub use analyzer::{
    Analysis, AnalysisOptions, ApplyTo, ControlledIntervention, Covariate, Intervention,
};
pub use ancova::{AncovaTable, EffectSize};
pub use error::{AnalysisError, Result};
pub use series::Series;
pub use ttest::{Alternative, TTestResult};
