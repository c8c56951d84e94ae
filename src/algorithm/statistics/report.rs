//! Readmission report
//!
//! A [`CohortReport`] is the serializable view of the aggregated covariates:
//! counts, means, chi-square and |t| scores per window, bucket and code.
//! It renders as plain-text tables through `Display` or as JSON.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

use super::aggregate::{
    BinaryCovariateStats, BucketedCovariateStats, CategoricalCountStats, ContinuousCovariateStats,
    CovariateStats, OutcomeGroup,
};

#[cfg(feature = "significance")]
fn chi_square_p(score: Option<f64>) -> Option<f64> {
    score.and_then(|s| super::significance::chi_square_p_value(s, 1.0))
}

#[cfg(not(feature = "significance"))]
fn chi_square_p(_score: Option<f64>) -> Option<f64> {
    None
}

#[cfg(feature = "significance")]
fn welch_p(readmitted: &[f64], not_readmitted: &[f64]) -> Option<f64> {
    super::significance::welch_t_p_value(readmitted, not_readmitted)
}

#[cfg(not(feature = "significance"))]
fn welch_p(_readmitted: &[f64], _not_readmitted: &[f64]) -> Option<f64> {
    None
}

fn stat(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

/// Count and mean of one outcome partition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupSummary {
    /// Number of patients
    pub count: usize,
    /// Mean value; `None` when the partition is empty
    pub mean: Option<f64>,
}

impl From<&OutcomeGroup> for GroupSummary {
    fn from(group: &OutcomeGroup) -> Self {
        Self {
            count: group.count,
            mean: group.mean(),
        }
    }
}

/// Readmitted patients in one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowCount {
    /// Window length in days
    pub window_days: u32,
    /// Readmitted patients
    pub readmitted: usize,
}

/// One window of a yes/no covariate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryWindowRow {
    /// Window length in days
    pub window_days: u32,
    /// Readmitted patients with the condition
    pub yes_readmitted: usize,
    /// Readmitted patients without the condition
    pub no_readmitted: usize,
    /// Symmetric chi-square of readmission against the condition
    pub chi_square: Option<f64>,
    /// Chi-square p-value, present with the `significance` feature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
}

/// A yes/no covariate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryCovariateReport {
    /// Covariate name
    pub name: String,
    /// Patients with the condition
    pub yes_total: usize,
    /// Patients without the condition
    pub no_total: usize,
    /// One row per window
    pub windows: Vec<BinaryWindowRow>,
}

impl From<&BinaryCovariateStats> for BinaryCovariateReport {
    fn from(stats: &BinaryCovariateStats) -> Self {
        let windows = stats
            .windows
            .iter()
            .enumerate()
            .map(|(i, &window_days)| {
                let chi_square = stats.chi_square(i);
                BinaryWindowRow {
                    window_days,
                    yes_readmitted: stats.yes_readmitted[i],
                    no_readmitted: stats.no_readmitted[i],
                    chi_square,
                    p_value: chi_square_p(chi_square),
                }
            })
            .collect();
        Self {
            name: stats.name.clone(),
            yes_total: stats.yes_total,
            no_total: stats.no_total,
            windows,
        }
    }
}

/// One window of a continuous covariate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinuousWindowRow {
    /// Window length in days
    pub window_days: u32,
    /// Patients readmitted within the window
    pub readmitted: GroupSummary,
    /// Patients not readmitted within the window
    pub not_readmitted: GroupSummary,
    /// |Welch t|
    pub t_score: Option<f64>,
    /// Two-sided Welch t p-value, present with the `significance` feature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
}

/// A continuous covariate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinuousCovariateReport {
    /// Covariate name
    pub name: String,
    /// One row per window
    pub windows: Vec<ContinuousWindowRow>,
}

impl From<&ContinuousCovariateStats> for ContinuousCovariateReport {
    fn from(stats: &ContinuousCovariateStats) -> Self {
        let windows = stats
            .windows
            .iter()
            .enumerate()
            .map(|(i, &window_days)| ContinuousWindowRow {
                window_days,
                readmitted: GroupSummary::from(&stats.readmitted[i]),
                not_readmitted: GroupSummary::from(&stats.not_readmitted[i]),
                t_score: stats.t_score(i),
                p_value: welch_p(&stats.readmitted[i].values, &stats.not_readmitted[i].values),
            })
            .collect();
        Self {
            name: stats.name.clone(),
            windows,
        }
    }
}

/// One bucket of one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketRow {
    /// Bucket label, e.g. `[18.5, 25)`
    pub label: String,
    /// Readmitted patients in the bucket
    pub readmitted: GroupSummary,
    /// Patients in the bucket not readmitted
    pub not_readmitted: GroupSummary,
    /// Chi-square of the bucket against window totals
    pub chi_square: Option<f64>,
    /// |Welch t| within the bucket
    pub t_score: Option<f64>,
}

/// One window of a bucketed covariate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketedWindowRow {
    /// Window length in days
    pub window_days: u32,
    /// |Welch t| over every bucketed value
    pub t_score: Option<f64>,
    /// Two-sided Welch t p-value, present with the `significance` feature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    /// One row per bucket
    pub buckets: Vec<BucketRow>,
}

/// A bucketed covariate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketedCovariateReport {
    /// Covariate name
    pub name: String,
    /// One row per window
    pub windows: Vec<BucketedWindowRow>,
}

impl From<&BucketedCovariateStats> for BucketedCovariateReport {
    fn from(stats: &BucketedCovariateStats) -> Self {
        let windows = stats
            .windows
            .iter()
            .enumerate()
            .map(|(w, &window_days)| {
                let buckets = (0..stats.bucket_count())
                    .map(|k| BucketRow {
                        label: stats.bounds.label(k).unwrap_or_default(),
                        readmitted: GroupSummary::from(&stats.readmitted[w][k]),
                        not_readmitted: GroupSummary::from(&stats.not_readmitted[w][k]),
                        chi_square: stats.chi_square(w, k),
                        t_score: stats.bucket_t_score(w, k),
                    })
                    .collect();
                BucketedWindowRow {
                    window_days,
                    t_score: stats.window_t_score(w),
                    p_value: welch_p(
                        &stats.window_readmitted[w],
                        &stats.window_not_readmitted[w],
                    ),
                    buckets,
                }
            })
            .collect();
        Self {
            name: stats.name.clone(),
            windows,
        }
    }
}

/// One code of one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    /// Registry code
    pub code: u32,
    /// Readmitted patients with this code
    pub readmitted: usize,
    /// Patients with this code not readmitted
    pub not_readmitted: usize,
    /// Chi-square of the code against window totals
    pub chi_square: Option<f64>,
}

/// One window of a coded covariate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalWindowRow {
    /// Window length in days
    pub window_days: u32,
    /// One row per configured code
    pub categories: Vec<CategoryRow>,
}

/// A coded covariate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalCovariateReport {
    /// Covariate name
    pub name: String,
    /// One row per window
    pub windows: Vec<CategoricalWindowRow>,
}

impl From<&CategoricalCountStats> for CategoricalCovariateReport {
    fn from(stats: &CategoricalCountStats) -> Self {
        let windows = stats
            .windows
            .iter()
            .enumerate()
            .map(|(w, &window_days)| CategoricalWindowRow {
                window_days,
                categories: stats
                    .codes
                    .iter()
                    .enumerate()
                    .map(|(k, &code)| CategoryRow {
                        code,
                        readmitted: stats.readmitted[w][k],
                        not_readmitted: stats.not_readmitted[w][k],
                        chi_square: stats.chi_square(w, k),
                    })
                    .collect(),
            })
            .collect();
        Self {
            name: stats.name.clone(),
            windows,
        }
    }
}

/// Full readmission report of a cohort
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortReport {
    /// Patients in the analysed cohort
    pub patients: usize,
    /// Readmitted patients per window
    pub readmissions: Vec<WindowCount>,
    /// Diabetes, HCV serostatus and malignancy
    pub binary: Vec<BinaryCovariateReport>,
    /// Age
    pub continuous: Vec<ContinuousCovariateReport>,
    /// Average BMI and average MELD
    pub bucketed: Vec<BucketedCovariateReport>,
    /// Functional status
    pub categorical: Vec<CategoricalCovariateReport>,
}

impl CohortReport {
    /// Build the report from aggregated covariates
    #[must_use]
    pub fn from_stats(stats: &CovariateStats) -> Self {
        Self {
            patients: stats.patients,
            readmissions: stats
                .windows
                .iter()
                .zip(&stats.readmitted)
                .map(|(&window_days, &readmitted)| WindowCount {
                    window_days,
                    readmitted,
                })
                .collect(),
            binary: vec![
                (&stats.diabetes).into(),
                (&stats.hcv).into(),
                (&stats.malignancy).into(),
            ],
            continuous: vec![(&stats.age).into()],
            bucketed: vec![(&stats.bmi).into(), (&stats.meld).into()],
            categorical: vec![(&stats.functional_status).into()],
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON to a file
    pub fn save_to_json(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        log::info!("Readmission report saved to {}", path.display());
        Ok(())
    }
}

impl fmt::Display for CohortReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Readmission Report")?;
        writeln!(f, "==================")?;
        writeln!(f, "Patients: {}", self.patients)?;
        for count in &self.readmissions {
            writeln!(
                f,
                "Readmitted within {} days: {}",
                count.window_days, count.readmitted
            )?;
        }

        for covariate in &self.binary {
            writeln!(f)?;
            writeln!(
                f,
                "{} (yes: {}, no: {})",
                covariate.name, covariate.yes_total, covariate.no_total
            )?;
            writeln!(
                f,
                "  {:>8} {:>8} {:>8} {:>12} {:>10}",
                "Window", "Yes", "No", "Chi-Square", "p"
            )?;
            for row in &covariate.windows {
                writeln!(
                    f,
                    "  {:>8} {:>8} {:>8} {:>12} {:>10}",
                    row.window_days,
                    row.yes_readmitted,
                    row.no_readmitted,
                    stat(row.chi_square),
                    stat(row.p_value)
                )?;
            }
        }

        for covariate in &self.continuous {
            writeln!(f)?;
            writeln!(f, "{}", covariate.name)?;
            writeln!(
                f,
                "  {:>8} {:>8} {:>10} {:>8} {:>10} {:>10} {:>10}",
                "Window", "Hosp N", "Hosp Mean", "No N", "No Mean", "|t|", "p"
            )?;
            for row in &covariate.windows {
                writeln!(
                    f,
                    "  {:>8} {:>8} {:>10} {:>8} {:>10} {:>10} {:>10}",
                    row.window_days,
                    row.readmitted.count,
                    stat(row.readmitted.mean),
                    row.not_readmitted.count,
                    stat(row.not_readmitted.mean),
                    stat(row.t_score),
                    stat(row.p_value)
                )?;
            }
        }

        for covariate in &self.bucketed {
            writeln!(f)?;
            writeln!(f, "{}", covariate.name)?;
            for window in &covariate.windows {
                writeln!(
                    f,
                    "  Window {} days: |t| = {}, p = {}",
                    window.window_days,
                    stat(window.t_score),
                    stat(window.p_value)
                )?;
                writeln!(
                    f,
                    "    {:>14} {:>8} {:>10} {:>8} {:>10} {:>12} {:>10}",
                    "Bucket", "Hosp N", "Hosp Mean", "No N", "No Mean", "Chi-Square", "|t|"
                )?;
                for bucket in &window.buckets {
                    writeln!(
                        f,
                        "    {:>14} {:>8} {:>10} {:>8} {:>10} {:>12} {:>10}",
                        bucket.label,
                        bucket.readmitted.count,
                        stat(bucket.readmitted.mean),
                        bucket.not_readmitted.count,
                        stat(bucket.not_readmitted.mean),
                        stat(bucket.chi_square),
                        stat(bucket.t_score)
                    )?;
                }
            }
        }

        for covariate in &self.categorical {
            writeln!(f)?;
            writeln!(f, "{}", covariate.name)?;
            for window in &covariate.windows {
                writeln!(f, "  Window {} days", window.window_days)?;
                writeln!(
                    f,
                    "    {:>8} {:>8} {:>8} {:>12}",
                    "Code", "Hosp", "No Hosp", "Chi-Square"
                )?;
                for row in &window.categories {
                    writeln!(
                        f,
                        "    {:>8} {:>8} {:>8} {:>12}",
                        row.code,
                        row.readmitted,
                        row.not_readmitted,
                        stat(row.chi_square)
                    )?;
                }
            }
        }

        Ok(())
    }
}
