//! Data-quality filters for the cohort
//!
//! After the primary encounters are consolidated, patients whose covariates
//! cannot be stratified are removed. The filters are expressed as criteria on
//! a single patient so they can be combined and reused.

use std::collections::BTreeMap;
use std::fmt;

use crate::algorithm::categories::CategoryBounds;
use crate::config::StudyConfig;
use crate::models::Patient;

use super::core::Cohort;

/// Defines a criterion for filtering entities
pub trait FilterCriteria<T> {
    /// Determine if an entity meets the filter criteria
    fn meets_criteria(&self, entity: &T) -> bool;
}

/// Why a patient was removed from the cohort
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RemovalReason {
    /// Diabetes category missing or unknown
    MissingDiabetes,
    /// HCV serostatus not `P`/`N`
    MissingHcvSerostatus,
    /// Functional status not a six-character numeric code
    MissingFunctionalStatus,
    /// No BMI reading
    NoBmi,
    /// No MELD reading
    NoMeld,
    /// Lowest and highest BMI in different categories
    InconsistentBmi,
}

impl RemovalReason {
    /// Short description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::MissingDiabetes => "missing diabetes category",
            Self::MissingHcvSerostatus => "missing HCV serostatus",
            Self::MissingFunctionalStatus => "missing functional status",
            Self::NoBmi => "no BMI reading",
            Self::NoMeld => "no MELD reading",
            Self::InconsistentBmi => "BMI readings straddle a category",
        }
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A filter that can be applied to a patient
#[derive(Debug, Clone)]
pub enum PatientFilter {
    /// Diabetes code is one of the known categories
    KnownDiabetes,
    /// HCV serostatus is `P` or `N`
    KnownHcvSerostatus,
    /// Functional status is a usable code
    ValidFunctionalStatus,
    /// At least one BMI reading
    HasBmi,
    /// At least one MELD reading
    HasMeld,
    /// Lowest and highest BMI share category membership
    ConsistentBmi(CategoryBounds),
    /// Combined filter that requires all criteria to be met
    All(Vec<PatientFilter>),
}

impl PatientFilter {
    /// The data-quality filter of a study, in the order reasons are reported
    #[must_use]
    pub fn data_quality(config: &StudyConfig) -> Self {
        Self::All(vec![
            Self::KnownDiabetes,
            Self::KnownHcvSerostatus,
            Self::ValidFunctionalStatus,
            Self::HasBmi,
            Self::HasMeld,
            Self::ConsistentBmi(CategoryBounds::new(config.bmi_bounds.clone())),
        ])
    }

    /// First reason the patient fails this filter, if any
    #[must_use]
    pub fn removal_reason(&self, patient: &Patient) -> Option<RemovalReason> {
        match self {
            Self::KnownDiabetes => patient
                .diabetes()
                .is_none()
                .then_some(RemovalReason::MissingDiabetes),
            Self::KnownHcvSerostatus => patient
                .hcv_serostatus()
                .is_none()
                .then_some(RemovalReason::MissingHcvSerostatus),
            Self::ValidFunctionalStatus => patient
                .functional_status()
                .is_none()
                .then_some(RemovalReason::MissingFunctionalStatus),
            Self::HasBmi => patient
                .bmi_readings
                .is_empty()
                .then_some(RemovalReason::NoBmi),
            Self::HasMeld => patient
                .meld_scores
                .is_empty()
                .then_some(RemovalReason::NoMeld),
            Self::ConsistentBmi(bounds) => match patient.bmi_range() {
                Some((lowest, highest)) if bounds.same_category(lowest, highest) => None,
                Some(_) => Some(RemovalReason::InconsistentBmi),
                None => Some(RemovalReason::NoBmi),
            },
            Self::All(filters) => filters.iter().find_map(|f| f.removal_reason(patient)),
        }
    }
}

impl FilterCriteria<Patient> for PatientFilter {
    fn meets_criteria(&self, patient: &Patient) -> bool {
        self.removal_reason(patient).is_none()
    }
}

/// Outcome of filtering a cohort
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSummary {
    /// Patients before filtering
    pub before: usize,
    /// Patients kept
    pub after: usize,
    /// Removed patients by reason
    pub removed: BTreeMap<RemovalReason, usize>,
}

impl FilterSummary {
    /// Total removed patients
    #[must_use]
    pub fn removed_total(&self) -> usize {
        self.before - self.after
    }
}

impl fmt::Display for FilterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Data Quality Filter: {} -> {} patients", self.before, self.after)?;
        for (reason, count) in &self.removed {
            writeln!(f, "  Removed ({reason}): {count}")?;
        }
        Ok(())
    }
}

/// Remove every patient failing `filter`, by patient code
pub fn apply_filter(cohort: &mut Cohort, filter: &PatientFilter) -> FilterSummary {
    let before = cohort.len();
    let failing: Vec<(u32, RemovalReason)> = cohort
        .patients()
        .filter_map(|p| filter.removal_reason(p).map(|reason| (p.code, reason)))
        .collect();

    let mut removed = BTreeMap::new();
    for (code, reason) in failing {
        if cohort.remove(code).is_some() {
            *removed.entry(reason).or_insert(0) += 1;
        }
    }

    FilterSummary {
        before,
        after: cohort.len(),
        removed,
    }
}

/// Apply the study's data-quality filter
pub fn filter_cohort(cohort: &mut Cohort, config: &StudyConfig) -> FilterSummary {
    let summary = apply_filter(cohort, &PatientFilter::data_quality(config));
    log::info!(
        "Data quality filter kept {} of {} patients",
        summary.after,
        summary.before
    );
    for (reason, count) in &summary.removed {
        log::debug!("Removed {count} patients: {reason}");
    }
    summary
}
