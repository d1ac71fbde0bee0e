//! Two-sample t-test computed from summary statistics.
//!
//! Only group means, sample standard deviations and sizes are used, never
//! raw observations. Both the pooled-variance (Student) and the
//! unequal-variance (Welch) forms are supported.
//!
//! Groups with fewer than two observations have an undefined standard
//! deviation; the resulting statistic, p-value and bounds are NaN rather than
//! an error, so callers must check `is_finite` before acting on them.

use crate::error::AnalysisError;
use crate::stats::GroupStats;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::{fmt, str::FromStr};

/// Alternative hypothesis on the difference `mean_1 - mean_2`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    #[default]
    TwoSided,
    Less,
    Greater,
}

impl FromStr for Alternative {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "two-sided" => Ok(Self::TwoSided),
            "less" => Ok(Self::Less),
            "greater" => Ok(Self::Greater),
            other => Err(AnalysisError::InvalidArgument(format!(
                "alternative must be one of two-sided, less, greater, but is {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TwoSided => write!(f, "two-sided"),
            Self::Less => write!(f, "less"),
            Self::Greater => write!(f, "greater"),
        }
    }
}

/// Outcome of a two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    /// t statistic of `mean_1 - mean_2`.
    pub statistic: f64,
    pub p_value: f64,
    /// Degrees of freedom of the reference t distribution.
    pub df: f64,
    /// Confidence bounds for `mean_1 - mean_2`; one side is infinite for
    /// one-sided alternatives.
    pub confidence_interval: (f64, f64),
    pub confidence_level: f64,
}

/// Two-sample independent t-test from the summary statistics of two groups.
///
/// With `equal_var` the variances are pooled and `df = n_1 + n_2 - 2`;
/// otherwise the Welch standard error and Welch–Satterthwaite degrees of
/// freedom are used.
pub fn ttest_ind_from_stats(
    group_1: &GroupStats,
    group_2: &GroupStats,
    equal_var: bool,
    alternative: Alternative,
    confidence_level: f64,
) -> TTestResult {
    let n_1 = group_1.n_vals as f64;
    let n_2 = group_2.n_vals as f64;
    let var_1 = group_1.std_dev.powi(2);
    let var_2 = group_2.std_dev.powi(2);

    let (df, std_err) = if equal_var {
        let df = n_1 + n_2 - 2.0;
        let pooled_var = ((n_1 - 1.0) * var_1 + (n_2 - 1.0) * var_2) / df;
        (df, (pooled_var * (1.0 / n_1 + 1.0 / n_2)).sqrt())
    } else {
        let var_n_1 = var_1 / n_1;
        let var_n_2 = var_2 / n_2;
        let df = (var_n_1 + var_n_2).powi(2)
            / (var_n_1.powi(2) / (n_1 - 1.0) + var_n_2.powi(2) / (n_2 - 1.0));
        // Both variances zero: 0/0. Fall back to one degree of freedom.
        let df = if df.is_nan() { 1.0 } else { df };
        (df, (var_n_1 + var_n_2).sqrt())
    };

    let mean_diff = group_1.mean - group_2.mean;
    let statistic = mean_diff / std_err;

    let dist = t_dist(df);
    let p_value = match &dist {
        Some(dist) if !statistic.is_nan() => match alternative {
            Alternative::TwoSided => 2.0 * upper_tail(dist, statistic.abs()),
            Alternative::Less => 1.0 - upper_tail(dist, statistic),
            Alternative::Greater => upper_tail(dist, statistic),
        },
        _ => f64::NAN,
    };

    let confidence_interval = match &dist {
        Some(dist) if std_err.is_finite() && mean_diff.is_finite() => {
            confidence_bounds(dist, mean_diff, std_err, alternative, confidence_level)
        }
        _ => (f64::NAN, f64::NAN),
    };

    TTestResult {
        statistic,
        p_value,
        df,
        confidence_interval,
        confidence_level,
    }
}

fn t_dist(df: f64) -> Option<StudentsT> {
    if df.is_finite() && df > 0.0 {
        StudentsT::new(0.0, 1.0, df).ok()
    } else {
        None
    }
}

/// `P(T > t)`, with infinite statistics mapped to 0 or 1.
fn upper_tail(dist: &StudentsT, t: f64) -> f64 {
    if t == f64::INFINITY {
        0.0
    } else if t == f64::NEG_INFINITY {
        1.0
    } else {
        dist.sf(t)
    }
}

fn confidence_bounds(
    dist: &StudentsT,
    mean_diff: f64,
    std_err: f64,
    alternative: Alternative,
    confidence_level: f64,
) -> (f64, f64) {
    match alternative {
        Alternative::TwoSided => {
            let quantile = dist.inverse_cdf(1.0 - (1.0 - confidence_level) / 2.0);
            let margin = quantile * std_err;
            (mean_diff - margin, mean_diff + margin)
        }
        Alternative::Less => {
            let quantile = dist.inverse_cdf(confidence_level);
            (f64::NEG_INFINITY, mean_diff + quantile * std_err)
        }
        Alternative::Greater => {
            let quantile = dist.inverse_cdf(confidence_level);
            (mean_diff - quantile * std_err, f64::INFINITY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(mean: f64, std_dev: f64, n_vals: usize) -> GroupStats {
        GroupStats {
            mean,
            std_dev,
            n_vals,
        }
    }

    #[test]
    fn pooled_matches_reference() {
        let a = group(15.0, 87.5_f64.sqrt(), 13);
        let b = group(12.0, 39.0_f64.sqrt(), 11);
        let res = ttest_ind_from_stats(&a, &b, true, Alternative::TwoSided, 0.95);

        assert!((res.statistic - 0.905_135_809_331_027).abs() < 1e-9);
        assert!((res.p_value - 0.375_199_679_758_148_6).abs() < 1e-6);
        assert_eq!(res.df, 22.0);
        assert!((res.confidence_interval.0 + 3.873_685_848_657_77).abs() < 1e-5);
        assert!((res.confidence_interval.1 - 9.873_685_848_657_77).abs() < 1e-5);
    }

    #[test]
    fn welch_matches_reference() {
        let a = group(15.0, 87.5_f64.sqrt(), 13);
        let b = group(12.0, 39.0_f64.sqrt(), 11);
        let res = ttest_ind_from_stats(&a, &b, false, Alternative::TwoSided, 0.95);

        assert!((res.statistic - 0.935_846_193_555_604_8).abs() < 1e-9);
        assert!((res.df - 20.984_611_233_429_92).abs() < 1e-9);
        assert!((res.p_value - 0.359_998_186_932_442_4).abs() < 1e-6);
    }

    #[test]
    fn one_sided_alternatives_split_the_tail() {
        let a = group(15.0, 87.5_f64.sqrt(), 13);
        let b = group(12.0, 39.0_f64.sqrt(), 11);
        let greater = ttest_ind_from_stats(&a, &b, true, Alternative::Greater, 0.95);
        let less = ttest_ind_from_stats(&a, &b, true, Alternative::Less, 0.95);

        assert!((greater.p_value - 0.187_599_839_879_074_3).abs() < 1e-6);
        assert!((less.p_value - 0.812_400_160_120_925_7).abs() < 1e-6);
        assert_eq!(greater.confidence_interval.1, f64::INFINITY);
        assert_eq!(less.confidence_interval.0, f64::NEG_INFINITY);
    }

    #[test]
    fn degenerate_groups_propagate_nan() {
        let a = group(1.0, f64::NAN, 1);
        let b = group(2.0, 0.5, 4);
        for equal_var in [true, false] {
            let res = ttest_ind_from_stats(&a, &b, equal_var, Alternative::TwoSided, 0.95);
            assert!(res.statistic.is_nan());
            assert!(res.p_value.is_nan());
            assert!(res.confidence_interval.0.is_nan());
        }

        let empty = group(f64::NAN, f64::NAN, 0);
        let res = ttest_ind_from_stats(&empty, &empty, true, Alternative::Greater, 0.95);
        assert!(res.p_value.is_nan());
    }

    #[test]
    fn zero_variance_with_shift_is_infinitely_significant() {
        let a = group(2.0, 0.0, 3);
        let b = group(1.0, 0.0, 3);
        let res = ttest_ind_from_stats(&a, &b, true, Alternative::TwoSided, 0.95);
        assert_eq!(res.statistic, f64::INFINITY);
        assert_eq!(res.p_value, 0.0);
    }

    #[test]
    fn alternative_parses_kebab_case() {
        assert_eq!("two-sided".parse::<Alternative>(), Ok(Alternative::TwoSided));
        assert_eq!("greater".parse::<Alternative>(), Ok(Alternative::Greater));
        assert!(matches!(
            "bigger".parse::<Alternative>(),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }
}
