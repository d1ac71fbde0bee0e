//! Analysis of covariance on a tabular dataset.
//!
//! Fits `dv ~ 1 + between + covariates` by ordinary least squares and tests
//! every term with Type II sums of squares: the sum of squares of a term is
//! the increase in residual sum of squares when that term alone is dropped
//! from the full model. The between factor is a binary 0/1 indicator, so
//! every term carries one degree of freedom.
//!
//! A rank-deficient design (e.g. a group indicator with a single level, or a
//! covariate that is constant), non-finite data, or no residual degrees of
//! freedom yield a table of NaN statistics instead of an error.

use crate::error::{AnalysisError, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use std::{fmt, str::FromStr};

/// Effect-size metric reported for each term.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectSize {
    /// `SS_term / (SS_term + SS_residual)`.
    #[default]
    #[serde(rename = "np2")]
    PartialEtaSquared,
    /// `SS_term / (sum of every SS in the table, residual included)`.
    #[serde(rename = "n2")]
    EtaSquared,
}

impl FromStr for EffectSize {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "np2" => Ok(Self::PartialEtaSquared),
            "n2" => Ok(Self::EtaSquared),
            other => Err(AnalysisError::InvalidArgument(format!(
                "effect size must be one of np2, n2, but is {other:?}"
            ))),
        }
    }
}

impl fmt::Display for EffectSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartialEtaSquared => write!(f, "np2"),
            Self::EtaSquared => write!(f, "n2"),
        }
    }
}

/// Named column of observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Dataset with its column bindings: one row per observation.
#[derive(Debug, Clone, PartialEq)]
pub struct AncovaData {
    /// Dependent variable.
    pub dv: Column,
    /// Binary grouping factor (0 or 1).
    pub between: Column,
    pub covariates: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncovaRow {
    pub source: String,
    pub ss: f64,
    pub df: usize,
    pub f: f64,
    pub p_unc: f64,
    pub effect_size: f64,
}

/// One row for the between factor, one per covariate, then `Residual`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncovaTable {
    pub rows: Vec<AncovaRow>,
    pub effect_size: EffectSize,
}

impl AncovaTable {
    pub fn row(&self, source: &str) -> Option<&AncovaRow> {
        self.rows.iter().find(|row| row.source == source)
    }
}

pub const RESIDUAL: &str = "Residual";

/// Run the ANCOVA.
///
/// # Errors
/// Returns [`AnalysisError::LengthMismatch`] if a column length differs
/// from the dependent variable.
pub fn ancova(data: &AncovaData, effect_size: EffectSize) -> Result<AncovaTable> {
    let n_obs = data.dv.values.len();
    for col in std::iter::once(&data.between).chain(&data.covariates) {
        if col.values.len() != n_obs {
            return Err(AnalysisError::LengthMismatch {
                what: format!("column {}", col.name),
                expected: n_obs,
                found: col.values.len(),
            });
        }
    }

    let terms: Vec<&Column> = std::iter::once(&data.between)
        .chain(&data.covariates)
        .collect();
    let df_resid = n_obs as isize - 1 - terms.len() as isize;

    let y = DVector::from_column_slice(&data.dv.values);
    let all_finite = terms
        .iter()
        .flat_map(|col| col.values.iter())
        .chain(y.iter())
        .all(|val| val.is_finite());

    let fits = if df_resid > 0 && all_finite {
        fit_terms(&y, &terms)
    } else {
        None
    };

    let df_resid = df_resid.max(0) as usize;
    let (sse_full, ss_terms) = match fits {
        Some(fits) => fits,
        None => (f64::NAN, vec![f64::NAN; terms.len()]),
    };
    // Type II SS need not add up to the total sum of squares; eta squared
    // divides by the sum of the table's SS column instead.
    let ss_table = ss_terms.iter().sum::<f64>() + sse_full;

    let ms_resid = sse_full / df_resid as f64;
    let mut rows: Vec<AncovaRow> = terms
        .iter()
        .zip(ss_terms)
        .map(|(col, ss)| {
            let f = ss / ms_resid;
            AncovaRow {
                source: col.name.clone(),
                ss,
                df: 1,
                f,
                p_unc: f_upper_tail(f, 1.0, df_resid as f64),
                effect_size: match effect_size {
                    EffectSize::PartialEtaSquared => ss / (ss + sse_full),
                    EffectSize::EtaSquared => ss / ss_table,
                },
            }
        })
        .collect();

    rows.push(AncovaRow {
        source: RESIDUAL.to_string(),
        ss: sse_full,
        df: df_resid,
        f: f64::NAN,
        p_unc: f64::NAN,
        effect_size: f64::NAN,
    });

    Ok(AncovaTable { rows, effect_size })
}

/// Residual sum of squares of the full model and the Type II sum of squares
/// of every term, or `None` if the full design is rank deficient.
fn fit_terms(y: &DVector<f64>, terms: &[&Column]) -> Option<(f64, Vec<f64>)> {
    let sse_full = residual_ss(y, &design(y.len(), terms))?;

    let ss_terms = (0..terms.len())
        .map(|i_drop| {
            let reduced: Vec<&Column> = terms
                .iter()
                .enumerate()
                .filter(|&(i_term, _)| i_term != i_drop)
                .map(|(_, &col)| col)
                .collect();
            let sse_reduced = residual_ss(y, &design(y.len(), &reduced))?;
            // Clamp round-off below zero.
            Some((sse_reduced - sse_full).max(0.0))
        })
        .collect::<Option<Vec<_>>>()?;

    Some((sse_full, ss_terms))
}

/// Design matrix with a leading intercept column.
fn design(n_obs: usize, terms: &[&Column]) -> DMatrix<f64> {
    DMatrix::from_fn(n_obs, terms.len() + 1, |i_row, i_col| match i_col {
        0 => 1.0,
        _ => terms[i_col - 1].values[i_row],
    })
}

fn residual_ss(y: &DVector<f64>, x: &DMatrix<f64>) -> Option<f64> {
    let n_cols = x.ncols();
    let svd = x.clone().svd(true, true);

    let max_sv = svd.singular_values.max();
    let eps = max_sv * 1e-10 * x.nrows().max(n_cols) as f64;
    if svd.rank(eps) < n_cols {
        return None;
    }

    let beta = svd.solve(y, eps).ok()?;
    let resid = y - x * beta;
    Some(resid.norm_squared())
}

fn f_upper_tail(f: f64, df_num: f64, df_den: f64) -> f64 {
    if f.is_nan() || df_den <= 0.0 {
        return f64::NAN;
    }
    if f == f64::INFINITY {
        return 0.0;
    }
    match FisherSnedecor::new(df_num, df_den) {
        Ok(dist) => dist.sf(f),
        Err(_) => f64::NAN,
    }
}
