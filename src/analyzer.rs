//! Controlled intervention analyzer.
//!
//! Owns a treated series, a control series sharing its index, the
//! intervention point and optional covariates. Every query recomputes from
//! the source series, so results always reflect the analyzer's inputs.

use crate::ancova::{self, AncovaData, AncovaTable, Column, EffectSize};
use crate::error::{AnalysisError, Result};
use crate::plot::Figure;
use crate::report;
use crate::series::Series;
use crate::stats::{Counts, GroupStats, SeriesStats, Triple, compute_mean, compute_std};
use crate::ttest::{self, Alternative, TTestResult};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const GROUP_COLUMN: &str = "intervention";

/// Cut point separating before from after observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intervention {
    /// Integer offset into the series.
    Position(usize),
    /// Index label; the cut falls at the first observation labelled `>=` it.
    Label(i64),
}

/// Which split supplies the before/after groups of a t-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyTo {
    Series,
    ControlSeries,
    Difference,
}

impl ApplyTo {
    pub const ALL: [ApplyTo; 3] = [Self::Series, Self::ControlSeries, Self::Difference];
}

impl FromStr for ApplyTo {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "series" => Ok(Self::Series),
            "control_series" => Ok(Self::ControlSeries),
            "difference" => Ok(Self::Difference),
            other => Err(AnalysisError::InvalidArgument(format!(
                "apply_to must be one of series, control_series, difference, but is {other:?}"
            ))),
        }
    }
}

impl fmt::Display for ApplyTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Series => write!(f, "series"),
            Self::ControlSeries => write!(f, "control_series"),
            Self::Difference => write!(f, "difference"),
        }
    }
}

/// Additional regressor for the ANCOVA, aligned to the treated series.
#[derive(Debug, Clone, PartialEq)]
pub struct Covariate {
    pub name: String,
    pub series: Series,
}

impl Covariate {
    pub fn new(name: impl Into<String>, series: Series) -> Self {
        Self {
            name: name.into(),
            series,
        }
    }
}

/// Analysis settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub covariates: Vec<Covariate>,
    pub effect_size: EffectSize,
    /// Pooled (`true`) or Welch (`false`) variance in the t-tests.
    pub equal_var: bool,
    pub alternative: Alternative,
    pub confidence_level: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            covariates: Vec::new(),
            effect_size: EffectSize::default(),
            equal_var: true,
            alternative: Alternative::default(),
            confidence_level: 0.95,
        }
    }
}

/// Every statistic of one analysis, ready for formatting or export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub cut: usize,
    pub sample_sizes: Counts,
    pub means: SeriesStats,
    pub stds: SeriesStats,
    pub difference_means: Triple,
    pub difference_stds: Triple,
    pub ttest_series: TTestResult,
    pub ttest_control_series: TTestResult,
    pub ttest_difference: TTestResult,
    pub alternative: Alternative,
    pub equal_var: bool,
    pub ancova: Option<AncovaTable>,
}

impl Analysis {
    pub fn ttest(&self, apply_to: ApplyTo) -> &TTestResult {
        match apply_to {
            ApplyTo::Series => &self.ttest_series,
            ApplyTo::ControlSeries => &self.ttest_control_series,
            ApplyTo::Difference => &self.ttest_difference,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControlledIntervention {
    series: Series,
    control_series: Series,
    intervention: Intervention,
    options: AnalysisOptions,
}

impl ControlledIntervention {
    /// Create an analyzer with default options and no covariates.
    ///
    /// # Errors
    /// Returns [`AnalysisError::Alignment`] if the two indices differ.
    pub fn new(series: Series, control_series: Series, intervention: Intervention) -> Result<Self> {
        Self::with_options(series, control_series, intervention, AnalysisOptions::default())
    }

    /// Create an analyzer with explicit options.
    ///
    /// The full ordered indices of the series, the control series and every
    /// covariate must be identical. An out-of-range intervention is accepted
    /// and yields an empty group; a label intervention needs a strictly
    /// ascending index.
    ///
    /// # Errors
    /// Returns [`AnalysisError::Alignment`] on any index mismatch and
    /// [`AnalysisError::InvalidArgument`] if the confidence level is not in
    /// `(0, 1)` or a label intervention meets a non-ascending index.
    pub fn with_options(
        series: Series,
        control_series: Series,
        intervention: Intervention,
        options: AnalysisOptions,
    ) -> Result<Self> {
        if !series.is_aligned_with(&control_series) {
            return Err(AnalysisError::alignment("series and control series"));
        }
        if let Some(cov) = options
            .covariates
            .iter()
            .find(|cov| !series.is_aligned_with(&cov.series))
        {
            return Err(AnalysisError::alignment(format!(
                "series and covariate {}",
                cov.name
            )));
        }
        if let Intervention::Label(label) = intervention
            && !series.is_strictly_ascending()
        {
            return Err(AnalysisError::InvalidArgument(format!(
                "intervention label {label} needs a strictly ascending index"
            )));
        }
        let level = options.confidence_level;
        if !(level > 0.0 && level < 1.0) {
            return Err(AnalysisError::InvalidArgument(format!(
                "confidence level must be in (0, 1), but is {level}"
            )));
        }

        let analyzer = Self {
            series,
            control_series,
            intervention,
            options,
        };
        log::debug!(
            "analyzer over {} observations, cut at {}, {} covariates",
            analyzer.series.len(),
            analyzer.cut(),
            analyzer.options.covariates.len()
        );
        Ok(analyzer)
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn control_series(&self) -> &Series {
        &self.control_series
    }

    pub fn intervention(&self) -> Intervention {
        self.intervention
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Resolved cut position, clamped to `0..=len`.
    pub fn cut(&self) -> usize {
        match self.intervention {
            Intervention::Position(pos) => pos.min(self.series.len()),
            Intervention::Label(label) => self.series.position_of_label(label),
        }
    }

    pub fn split_series(&self) -> (&[f64], &[f64]) {
        self.series.split_at(self.cut())
    }

    pub fn split_control_series(&self) -> (&[f64], &[f64]) {
        self.control_series.split_at(self.cut())
    }

    pub fn split_difference(&self) -> Result<(Vec<f64>, Vec<f64>)> {
        let difference = self.difference()?;
        let (before, after) = difference.split_at(self.cut());
        Ok((before.to_vec(), after.to_vec()))
    }

    /// Before/after groups of the selected series.
    pub fn split(&self, apply_to: ApplyTo) -> Result<(Vec<f64>, Vec<f64>)> {
        let (before, after) = match apply_to {
            ApplyTo::Series => self.split_series(),
            ApplyTo::ControlSeries => self.split_control_series(),
            ApplyTo::Difference => return self.split_difference(),
        };
        Ok((before.to_vec(), after.to_vec()))
    }

    /// Elementwise `series - control_series` on the shared index.
    pub fn difference(&self) -> Result<Series> {
        self.series.sub(&self.control_series)
    }

    pub fn means(&self) -> SeriesStats {
        SeriesStats {
            series: triple(&self.series, self.cut(), compute_mean),
            control_series: triple(&self.control_series, self.cut(), compute_mean),
        }
    }

    /// Sample standard deviations (ddof = 1).
    pub fn stds(&self) -> SeriesStats {
        SeriesStats {
            series: triple(&self.series, self.cut(), compute_std),
            control_series: triple(&self.control_series, self.cut(), compute_std),
        }
    }

    pub fn difference_means(&self) -> Result<Triple> {
        Ok(triple(&self.difference()?, self.cut(), compute_mean))
    }

    pub fn difference_stds(&self) -> Result<Triple> {
        Ok(triple(&self.difference()?, self.cut(), compute_std))
    }

    /// Counts of the treated series; both groups are counted explicitly.
    pub fn sample_sizes(&self) -> Counts {
        let (before, after) = self.split_series();
        Counts {
            overall: self.series.len(),
            before: before.len(),
            after: after.len(),
        }
    }

    /// Two-sample t-test of after against before on the selected split.
    ///
    /// Only the groups' means, standard deviations and sizes enter the test.
    /// A positive statistic means the after mean is larger. Groups with
    /// fewer than two observations yield NaN results.
    pub fn ttest_ind_from_stats(
        &self,
        apply_to: ApplyTo,
        equal_var: bool,
        alternative: Alternative,
    ) -> Result<TTestResult> {
        let (before, after) = self.split(apply_to)?;
        if before.len() < 2 || after.len() < 2 {
            log::warn!(
                "{apply_to}: groups of {} and {} observations, t-test is undefined",
                before.len(),
                after.len()
            );
        }
        Ok(ttest::ttest_ind_from_stats(
            &GroupStats::from_slice(&after),
            &GroupStats::from_slice(&before),
            equal_var,
            alternative,
            self.options.confidence_level,
        ))
    }

    /// Dataset handed to the ANCOVA: the treated series as dependent
    /// variable, a 0/1 intervention indicator, and the control series
    /// followed by the configured covariates.
    pub fn ancova_data(&self) -> AncovaData {
        let cut = self.cut();
        let group = (0..self.series.len())
            .map(|pos| if pos < cut { 0.0 } else { 1.0 })
            .collect();

        let covariates = std::iter::once(Column::new(
            "control_series",
            self.control_series.values().to_vec(),
        ))
        .chain(
            self.options
                .covariates
                .iter()
                .map(|cov| Column::new(cov.name.clone(), cov.series.values().to_vec())),
        )
        .collect();

        AncovaData {
            dv: Column::new("series", self.series.values().to_vec()),
            between: Column::new(GROUP_COLUMN, group),
            covariates,
        }
    }

    pub fn ancova(&self) -> Result<AncovaTable> {
        ancova::ancova(&self.ancova_data(), self.options.effect_size)
    }

    /// Compute every statistic with the configured options.
    ///
    /// The ANCOVA table is included only when covariates are configured.
    pub fn analyze(&self) -> Result<Analysis> {
        let AnalysisOptions {
            equal_var,
            alternative,
            ..
        } = self.options;
        let ttest = |apply_to| self.ttest_ind_from_stats(apply_to, equal_var, alternative);

        let ancova = if self.options.covariates.is_empty() {
            None
        } else {
            Some(self.ancova()?)
        };

        Ok(Analysis {
            cut: self.cut(),
            sample_sizes: self.sample_sizes(),
            means: self.means(),
            stds: self.stds(),
            difference_means: self.difference_means()?,
            difference_stds: self.difference_stds()?,
            ttest_series: ttest(ApplyTo::Series)?,
            ttest_control_series: ttest(ApplyTo::ControlSeries)?,
            ttest_difference: ttest(ApplyTo::Difference)?,
            alternative,
            equal_var,
            ancova,
        })
    }

    pub fn report(&self) -> Result<String> {
        Ok(report::render(&self.analyze()?))
    }

    /// Line chart of both series with a marker at the intervention.
    ///
    /// Nothing is displayed here: the caller renders the returned figure with
    /// [`Figure::to_svg`] or writes it out with [`Figure::save`].
    pub fn plot(&self, title: &str) -> Figure {
        let cut = self.cut();
        let index = self.series.index();
        let marker = match index.get(cut) {
            Some(&label) => label as f64,
            None => index.last().map_or(0.0, |&label| label as f64 + 0.5),
        };
        Figure::new(title, index.iter().map(|&label| label as f64).collect(), marker)
            .with_line("series", self.series.values().to_vec())
            .with_line("control_series", self.control_series.values().to_vec())
    }
}

fn triple(series: &Series, cut: usize, stat: fn(&[f64]) -> f64) -> Triple {
    let (before, after) = series.split_at(cut);
    Triple {
        overall: stat(series.values()),
        before: stat(before),
        after: stat(after),
    }
}
