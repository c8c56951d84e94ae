//! Stratified aggregation of covariates by readmission outcome
//!
//! Each accumulator is filled with one pass over the cohort and then queried
//! per window (and per bucket or code where the covariate is stratified).
//! Readmitted patients form the "hospitalized" partition of a window, the
//! rest the "not hospitalized" partition.

use serde::Serialize;

use crate::algorithm::categories::CategoryBounds;
use crate::algorithm::cohort::Cohort;
use crate::config::StudyConfig;
use crate::models::{DiabetesCategory, HcvSerostatus, Malignancy, Patient, ReadmissionFlags};

use super::primitives;

fn readmitted_within(flags: &ReadmissionFlags, window_days: u32) -> bool {
    flags.get(window_days).unwrap_or(false)
}

fn as_f64(count: usize) -> f64 {
    count as f64
}

/// Running accumulator for one outcome partition
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutcomeGroup {
    /// Sum of the values
    pub sum: f64,
    /// Number of values
    pub count: usize,
    /// Raw values, in cohort order
    pub values: Vec<f64>,
}

impl OutcomeGroup {
    /// Add a value
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
        self.values.push(value);
    }

    /// Mean of the values; `None` when empty
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / as_f64(self.count))
        }
    }
}

/// Absolute Welch t between the hospitalized and not-hospitalized values
fn abs_welch_t(readmitted: &[f64], not_readmitted: &[f64]) -> Option<f64> {
    primitives::welch_t(readmitted, not_readmitted).map(f64::abs)
}

/// A yes/no covariate against readmission
///
/// Counts, per window, how many readmitted patients fall in each class, and
/// keeps the class sizes over the whole cohort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryCovariateStats {
    /// Covariate name
    pub name: String,
    /// Windows, in configured order
    pub windows: Vec<u32>,
    /// Readmitted patients in the "yes" class, per window
    pub yes_readmitted: Vec<usize>,
    /// Readmitted patients in the "no" class, per window
    pub no_readmitted: Vec<usize>,
    /// Patients in the "yes" class
    pub yes_total: usize,
    /// Patients in the "no" class
    pub no_total: usize,
}

impl BinaryCovariateStats {
    /// Empty accumulator
    #[must_use]
    pub fn new(name: impl Into<String>, windows: &[u32]) -> Self {
        Self {
            name: name.into(),
            windows: windows.to_vec(),
            yes_readmitted: vec![0; windows.len()],
            no_readmitted: vec![0; windows.len()],
            yes_total: 0,
            no_total: 0,
        }
    }

    /// Count one patient in the given class
    pub fn record(&mut self, yes: bool, flags: &ReadmissionFlags) {
        let (total, readmitted) = if yes {
            (&mut self.yes_total, &mut self.yes_readmitted)
        } else {
            (&mut self.no_total, &mut self.no_readmitted)
        };
        *total += 1;
        for (slot, &window) in readmitted.iter_mut().zip(&self.windows) {
            if readmitted_within(flags, window) {
                *slot += 1;
            }
        }
    }

    /// Accumulate over a cohort; patients whose class is `None` are skipped
    #[must_use]
    pub fn from_cohort<F>(name: &str, cohort: &Cohort, windows: &[u32], classify: F) -> Self
    where
        F: Fn(&Patient) -> Option<bool>,
    {
        let mut stats = Self::new(name, windows);
        for patient in cohort.patients() {
            if let Some(yes) = classify(patient) {
                stats.record(yes, &patient.readmissions);
            }
        }
        stats
    }

    /// Symmetric chi-square of the window at `index`
    #[must_use]
    pub fn chi_square(&self, index: usize) -> Option<f64> {
        primitives::chi_square_symmetric(
            as_f64(*self.yes_readmitted.get(index)?),
            as_f64(*self.no_readmitted.get(index)?),
            as_f64(self.yes_total),
            as_f64(self.no_total),
        )
    }
}

/// A continuous, unstratified covariate against readmission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinuousCovariateStats {
    /// Covariate name
    pub name: String,
    /// Windows, in configured order
    pub windows: Vec<u32>,
    /// Hospitalized partition, per window
    pub readmitted: Vec<OutcomeGroup>,
    /// Not-hospitalized partition, per window
    pub not_readmitted: Vec<OutcomeGroup>,
}

impl ContinuousCovariateStats {
    /// Empty accumulator
    #[must_use]
    pub fn new(name: impl Into<String>, windows: &[u32]) -> Self {
        Self {
            name: name.into(),
            windows: windows.to_vec(),
            readmitted: vec![OutcomeGroup::default(); windows.len()],
            not_readmitted: vec![OutcomeGroup::default(); windows.len()],
        }
    }

    /// Add one patient's value to the matching partition of every window
    pub fn record(&mut self, value: f64, flags: &ReadmissionFlags) {
        for (index, &window) in self.windows.iter().enumerate() {
            if readmitted_within(flags, window) {
                self.readmitted[index].add(value);
            } else {
                self.not_readmitted[index].add(value);
            }
        }
    }

    /// Accumulate over a cohort; patients without a value are skipped
    #[must_use]
    pub fn from_cohort<F>(name: &str, cohort: &Cohort, windows: &[u32], value: F) -> Self
    where
        F: Fn(&Patient) -> Option<f64>,
    {
        let mut stats = Self::new(name, windows);
        for patient in cohort.patients() {
            if let Some(v) = value(patient) {
                stats.record(v, &patient.readmissions);
            }
        }
        stats
    }

    /// |Welch t| of the window at `index`
    #[must_use]
    pub fn t_score(&self, index: usize) -> Option<f64> {
        abs_welch_t(
            &self.readmitted.get(index)?.values,
            &self.not_readmitted.get(index)?.values,
        )
    }
}

/// A continuous covariate stratified into buckets
///
/// Values outside every bucket are ignored altogether, including in the
/// whole-window lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketedCovariateStats {
    /// Covariate name
    pub name: String,
    /// Windows, in configured order
    pub windows: Vec<u32>,
    /// Bucket boundaries
    #[serde(skip)]
    pub bounds: CategoryBounds,
    /// Hospitalized partition, per window then bucket
    pub readmitted: Vec<Vec<OutcomeGroup>>,
    /// Not-hospitalized partition, per window then bucket
    pub not_readmitted: Vec<Vec<OutcomeGroup>>,
    /// Bucketed hospitalized values, per window
    pub window_readmitted: Vec<Vec<f64>>,
    /// Bucketed not-hospitalized values, per window
    pub window_not_readmitted: Vec<Vec<f64>>,
}

impl BucketedCovariateStats {
    /// Empty accumulator
    #[must_use]
    pub fn new(name: impl Into<String>, windows: &[u32], bounds: CategoryBounds) -> Self {
        let buckets = vec![OutcomeGroup::default(); bounds.len()];
        Self {
            name: name.into(),
            windows: windows.to_vec(),
            readmitted: vec![buckets.clone(); windows.len()],
            not_readmitted: vec![buckets; windows.len()],
            window_readmitted: vec![Vec::new(); windows.len()],
            window_not_readmitted: vec![Vec::new(); windows.len()],
            bounds,
        }
    }

    /// Add one patient's value
    pub fn record(&mut self, value: f64, flags: &ReadmissionFlags) {
        let Some(bucket) = self.bounds.category_of(value) else {
            return;
        };
        for (index, &window) in self.windows.iter().enumerate() {
            if readmitted_within(flags, window) {
                self.readmitted[index][bucket].add(value);
                self.window_readmitted[index].push(value);
            } else {
                self.not_readmitted[index][bucket].add(value);
                self.window_not_readmitted[index].push(value);
            }
        }
    }

    /// Accumulate over a cohort; patients without a value are skipped
    #[must_use]
    pub fn from_cohort<F>(
        name: &str,
        cohort: &Cohort,
        windows: &[u32],
        bounds: CategoryBounds,
        value: F,
    ) -> Self
    where
        F: Fn(&Patient) -> Option<f64>,
    {
        let mut stats = Self::new(name, windows, bounds);
        for patient in cohort.patients() {
            if let Some(v) = value(patient) {
                stats.record(v, &patient.readmissions);
            }
        }
        stats
    }

    /// Number of buckets
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.bounds.len()
    }

    /// Chi-square of one bucket of a window
    ///
    /// The bucket's hospitalized count against the window's hospitalized and
    /// not-hospitalized totals over all buckets.
    #[must_use]
    pub fn chi_square(&self, window: usize, bucket: usize) -> Option<f64> {
        let readmitted = self.readmitted.get(window)?;
        let not_readmitted = self.not_readmitted.get(window)?;
        let readmitted_total: usize = readmitted.iter().map(|g| g.count).sum();
        let not_readmitted_total: usize = not_readmitted.iter().map(|g| g.count).sum();
        primitives::chi_square(
            as_f64(readmitted.get(bucket)?.count),
            as_f64(not_readmitted.get(bucket)?.count),
            as_f64(readmitted_total),
            as_f64(not_readmitted_total),
        )
    }

    /// |Welch t| within one bucket of a window
    #[must_use]
    pub fn bucket_t_score(&self, window: usize, bucket: usize) -> Option<f64> {
        abs_welch_t(
            &self.readmitted.get(window)?.get(bucket)?.values,
            &self.not_readmitted.get(window)?.get(bucket)?.values,
        )
    }

    /// |Welch t| over every bucketed value of a window
    #[must_use]
    pub fn window_t_score(&self, window: usize) -> Option<f64> {
        abs_welch_t(
            self.window_readmitted.get(window)?,
            self.window_not_readmitted.get(window)?,
        )
    }
}

/// A coded covariate counted per code
///
/// Codes not in the configured list are not counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalCountStats {
    /// Covariate name
    pub name: String,
    /// Windows, in configured order
    pub windows: Vec<u32>,
    /// Recognised codes
    pub codes: Vec<u32>,
    /// Hospitalized counts, per window then code
    pub readmitted: Vec<Vec<usize>>,
    /// Not-hospitalized counts, per window then code
    pub not_readmitted: Vec<Vec<usize>>,
}

impl CategoricalCountStats {
    /// Empty accumulator
    #[must_use]
    pub fn new(name: impl Into<String>, windows: &[u32], codes: &[u32]) -> Self {
        Self {
            name: name.into(),
            windows: windows.to_vec(),
            codes: codes.to_vec(),
            readmitted: vec![vec![0; codes.len()]; windows.len()],
            not_readmitted: vec![vec![0; codes.len()]; windows.len()],
        }
    }

    /// Count one patient's code
    pub fn record(&mut self, code: u32, flags: &ReadmissionFlags) {
        let Some(slot) = self.codes.iter().position(|&c| c == code) else {
            return;
        };
        for (index, &window) in self.windows.iter().enumerate() {
            if readmitted_within(flags, window) {
                self.readmitted[index][slot] += 1;
            } else {
                self.not_readmitted[index][slot] += 1;
            }
        }
    }

    /// Accumulate over a cohort; patients without a code are skipped
    #[must_use]
    pub fn from_cohort<F>(name: &str, cohort: &Cohort, windows: &[u32], codes: &[u32], code: F) -> Self
    where
        F: Fn(&Patient) -> Option<u32>,
    {
        let mut stats = Self::new(name, windows, codes);
        for patient in cohort.patients() {
            if let Some(c) = code(patient) {
                stats.record(c, &patient.readmissions);
            }
        }
        stats
    }

    /// Chi-square of one code of a window
    #[must_use]
    pub fn chi_square(&self, window: usize, slot: usize) -> Option<f64> {
        let readmitted = self.readmitted.get(window)?;
        let not_readmitted = self.not_readmitted.get(window)?;
        primitives::chi_square(
            as_f64(*readmitted.get(slot)?),
            as_f64(*not_readmitted.get(slot)?),
            as_f64(readmitted.iter().sum()),
            as_f64(not_readmitted.iter().sum()),
        )
    }
}

/// Every covariate of the study, aggregated over one cohort
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovariateStats {
    /// Patients aggregated
    pub patients: usize,
    /// Windows, in configured order
    pub windows: Vec<u32>,
    /// Readmitted patients per window
    pub readmitted: Vec<usize>,
    /// Diabetic vs non-diabetic
    pub diabetes: BinaryCovariateStats,
    /// HCV positive vs negative
    pub hcv: BinaryCovariateStats,
    /// Malignancy yes vs no
    pub malignancy: BinaryCovariateStats,
    /// Age at transplant
    pub age: ContinuousCovariateStats,
    /// Average BMI by category
    pub bmi: BucketedCovariateStats,
    /// Average MELD by category
    pub meld: BucketedCovariateStats,
    /// Functional status by code
    pub functional_status: CategoricalCountStats,
}

/// Aggregate every covariate of a classified cohort
#[must_use]
pub fn aggregate_cohort(cohort: &Cohort, config: &StudyConfig) -> CovariateStats {
    let windows = config.readmission_windows.as_slice();

    let stats = CovariateStats {
        patients: cohort.len(),
        windows: windows.to_vec(),
        readmitted: windows.iter().map(|&w| cohort.readmitted_count(w)).collect(),
        diabetes: BinaryCovariateStats::from_cohort("Diabetes", cohort, windows, |p| {
            p.diabetes().map(DiabetesCategory::is_diabetic)
        }),
        hcv: BinaryCovariateStats::from_cohort("HCV Serostatus", cohort, windows, |p| {
            p.hcv_serostatus().map(|s| s == HcvSerostatus::Positive)
        }),
        malignancy: BinaryCovariateStats::from_cohort("Malignancy", cohort, windows, |p| {
            p.malignancy().map(|m| m == Malignancy::Yes)
        }),
        age: ContinuousCovariateStats::from_cohort("Age", cohort, windows, |p| {
            Some(f64::from(p.age))
        }),
        bmi: BucketedCovariateStats::from_cohort(
            "BMI",
            cohort,
            windows,
            CategoryBounds::new(config.bmi_bounds.clone()),
            |p| p.average_bmi,
        ),
        meld: BucketedCovariateStats::from_cohort(
            "MELD",
            cohort,
            windows,
            CategoryBounds::new(config.meld_bounds.clone()),
            |p| p.average_meld,
        ),
        functional_status: CategoricalCountStats::from_cohort(
            "Functional Status",
            cohort,
            windows,
            &config.functional_status_codes,
            |p| p.functional_status().map(|s| s.code()),
        ),
    };

    log::info!(
        "Aggregated covariates over {} patients and {} windows",
        stats.patients,
        windows.len()
    );
    stats
}
