use anyhow::{Context, Result, bail};
use intervention::{
    Alternative, AnalysisOptions, ControlledIntervention, Covariate, EffectSize, Intervention,
    Series,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Analysis configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Title of the figure.
    #[serde(default)]
    pub title: Option<String>,

    /// Index labels shared by every series (positional when absent).
    #[serde(default)]
    pub index: Option<Vec<i64>>,

    /// Treated series.
    pub series: Vec<f64>,
    /// Control series.
    pub control_series: Vec<f64>,

    /// Intervention as a position into the series.
    #[serde(default)]
    pub intervention_index: Option<usize>,
    /// Intervention as an index label.
    #[serde(default)]
    pub intervention_label: Option<i64>,

    /// Additional ANCOVA covariates.
    #[serde(default)]
    pub covariates: Vec<CovariateConfig>,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CovariateConfig {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Pooled (`true`) or Welch (`false`) variance.
    pub equal_var: bool,
    pub alternative: Alternative,
    pub effect_size: EffectSize,
    pub confidence_level: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let options = AnalysisOptions::default();
        Self {
            equal_var: options.equal_var,
            alternative: options.alternative,
            effect_size: options.effect_size,
            confidence_level: options.confidence_level,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let n_obs = self.series.len();
        check_num(n_obs, 1..).context("invalid number of observations")?;

        check_vec(&self.series, n_obs).context("invalid series")?;
        check_vec(&self.control_series, n_obs).context("invalid control series")?;
        if let Some(index) = &self.index {
            check_len(index.len(), n_obs).context("invalid index")?;
        }
        for cov in &self.covariates {
            check_vec(&cov.values, n_obs)
                .with_context(|| format!("invalid covariate {}", cov.name))?;
        }

        match (self.intervention_index, self.intervention_label) {
            (Some(_), Some(_)) => {
                bail!("intervention_index and intervention_label are mutually exclusive")
            }
            (None, None) => bail!("one of intervention_index or intervention_label is required"),
            _ => {}
        }

        let level = self.analysis.confidence_level;
        if level <= 0.0 {
            bail!("confidence level must be positive, but is {level}");
        }
        check_num(level, ..1.0).context("invalid confidence level")?;

        Ok(())
    }

    pub fn intervention(&self) -> Intervention {
        match (self.intervention_index, self.intervention_label) {
            (_, Some(label)) => Intervention::Label(label),
            (pos, None) => Intervention::Position(pos.unwrap_or_default()),
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("intervention")
    }

    /// Build the analyzer described by this configuration.
    pub fn build_analyzer(&self) -> Result<ControlledIntervention> {
        let series = |values: &[f64]| -> Result<Series> {
            let series = match &self.index {
                Some(index) => Series::new(index.clone(), values.to_vec())?,
                None => Series::from_values(values.to_vec()),
            };
            Ok(series)
        };

        let covariates = self
            .covariates
            .iter()
            .map(|cov| -> Result<Covariate> {
                Ok(Covariate::new(cov.name.clone(), series(&cov.values)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let options = AnalysisOptions {
            covariates,
            effect_size: self.analysis.effect_size,
            equal_var: self.analysis.equal_var,
            alternative: self.analysis.alternative,
            confidence_level: self.analysis.confidence_level,
        };

        let analyzer = ControlledIntervention::with_options(
            series(&self.series)?,
            series(&self.control_series)?,
            self.intervention(),
            options,
        )?;
        Ok(analyzer)
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_len(len: usize, exp_len: usize) -> Result<()> {
    if len != exp_len {
        bail!("vector length must be {exp_len}, but is {len}");
    }
    Ok(())
}

fn check_vec(vec: &[f64], exp_len: usize) -> Result<()> {
    check_len(vec.len(), exp_len)?;
    if let Some(pos) = vec.iter().position(|ele| !ele.is_finite()) {
        bail!("vector must have only finite elements, but element {pos} is {}", vec[pos]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
series = [1.0, 2.0, 1.0, 2.0, 1.0, 2.0]
control_series = [3.0, 4.0, 3.0, 4.0, 3.0, 4.0]
"#;

    fn parse(extra: &str) -> Result<Config> {
        let config: Config = toml::from_str(&format!("{BASE}{extra}"))?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn defaults_follow_analysis_options() {
        let config = parse("intervention_index = 3\n").unwrap();
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert_eq!(config.intervention(), Intervention::Position(3));
        assert_eq!(config.title(), "intervention");
    }

    #[test]
    fn analysis_section_is_parsed() {
        let config = parse(
            "intervention_label = 3\n\
             [analysis]\n\
             equal_var = false\n\
             alternative = \"greater\"\n\
             effect_size = \"n2\"\n",
        )
        .unwrap();
        assert!(!config.analysis.equal_var);
        assert_eq!(config.analysis.alternative, Alternative::Greater);
        assert_eq!(config.analysis.effect_size, EffectSize::EtaSquared);
        assert_eq!(config.analysis.confidence_level, 0.95);
        assert_eq!(config.intervention(), Intervention::Label(3));
    }

    #[test]
    fn intervention_is_required_once() {
        assert!(parse("").is_err());
        assert!(parse("intervention_index = 3\nintervention_label = 3\n").is_err());
    }

    #[test]
    fn lengths_must_agree() {
        let err = parse(
            "intervention_index = 3\n\
             [[covariates]]\n\
             name = \"temperature\"\n\
             values = [1.0, 2.0]\n",
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("temperature"));

        assert!(parse("intervention_index = 3\nindex = [0, 1, 2]\n").is_err());
    }

    #[test]
    fn confidence_level_must_be_a_probability() {
        assert!(parse("intervention_index = 3\n[analysis]\nconfidence_level = 1.0\n").is_err());
        assert!(parse("intervention_index = 3\n[analysis]\nconfidence_level = 0.0\n").is_err());
        assert!(parse("intervention_index = 3\n[analysis]\nconfidence_level = 0.9\n").is_ok());
    }

    #[test]
    fn builds_analyzer_on_shared_index() {
        let config = parse(
            "index = [10, 20, 30, 40, 50, 60]\n\
             intervention_label = 35\n",
        )
        .unwrap();
        let analyzer = config.build_analyzer().unwrap();
        assert_eq!(analyzer.cut(), 3);
        assert_eq!(analyzer.series().index(), &[10, 20, 30, 40, 50, 60]);
    }
}
