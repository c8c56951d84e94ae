//! Patient entity model
//!
//! A [`Patient`] consolidates every admissible primary encounter that shares a
//! patient code. Longitudinal observations are appended in arrival order; the
//! categorical covariates are those of the first encounter seen.

use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use smallvec::SmallVec;

use crate::algorithm::statistics::primitives;
use crate::models::codes::{DiabetesCategory, FunctionalStatus, HcvSerostatus, Malignancy};
use crate::models::follow_up::FollowUp;

/// Readmission outcome for one window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowFlag {
    /// Window length in days
    pub window_days: u32,
    /// Whether a hospitalization fell inside the window
    pub readmitted: bool,
}

/// Readmission flags keyed by window length
///
/// Windows keep the order they were configured in. Looking a flag up by a
/// window that was never configured yields `None` rather than a neighbour's
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadmissionFlags {
    flags: SmallVec<[WindowFlag; 4]>,
}

impl ReadmissionFlags {
    /// All windows cleared
    #[must_use]
    pub fn new(windows: &[u32]) -> Self {
        let flags = windows
            .iter()
            .map(|&window_days| WindowFlag {
                window_days,
                readmitted: false,
            })
            .collect();
        Self { flags }
    }

    /// Record a hospitalization `days` after discharge
    ///
    /// Sets every window that is at least `days` long. Deltas of zero or less
    /// never set anything.
    pub fn record_delta(&mut self, days: i64) {
        if days <= 0 {
            return;
        }
        for flag in &mut self.flags {
            if days <= i64::from(flag.window_days) {
                flag.readmitted = true;
            }
        }
    }

    /// Flag for a given window, if that window is configured
    #[must_use]
    pub fn get(&self, window_days: u32) -> Option<bool> {
        self.flags
            .iter()
            .find(|f| f.window_days == window_days)
            .map(|f| f.readmitted)
    }

    /// Whether the patient was readmitted within any window
    #[must_use]
    pub fn any(&self) -> bool {
        self.flags.iter().any(|f| f.readmitted)
    }

    /// Flags in configured order
    pub fn iter(&self) -> impl Iterator<Item = &WindowFlag> {
        self.flags.iter()
    }

    /// Flag values in configured order
    #[must_use]
    pub fn values(&self) -> Vec<bool> {
        self.flags.iter().map(|f| f.readmitted).collect()
    }

    /// Clear every window
    pub fn clear(&mut self) {
        for flag in &mut self.flags {
            flag.readmitted = false;
        }
    }

    /// Number of configured windows
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether no window is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Observations of a single admissible primary encounter
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterObservation {
    /// Discharge date (`YYYY-MM-DD`)
    pub discharge_date: String,
    /// BMI, if the encounter reported a parseable one
    pub bmi: Option<f64>,
    /// MELD 3.0 score derived from the encounter's labs
    pub meld: u32,
}

/// Consolidated longitudinal record of one transplant patient
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    /// Patient code
    pub code: u32,
    /// Transplant-record identifier of the first encounter
    pub transplant_id: String,
    /// Age at transplant in years
    pub age: u32,
    /// Discharge dates, one per encounter
    pub discharge_dates: Vec<String>,
    /// BMI readings
    pub bmi_readings: Vec<f64>,
    /// MELD 3.0 scores
    pub meld_scores: Vec<u32>,
    /// Raw diabetes category code
    pub diabetes_code: String,
    /// Raw HCV serostatus code
    pub hcv_code: String,
    /// Raw malignancy code
    pub malignancy_code: String,
    /// Raw functional status code
    pub functional_status_code: String,
    /// Mean of `bmi_readings`
    pub average_bmi: Option<f64>,
    /// Mean of `meld_scores`
    pub average_meld: Option<f64>,
    /// Readmission outcome per window
    pub readmissions: ReadmissionFlags,
    /// Hospitalizations reported at follow-up
    pub follow_ups: Vec<FollowUp>,
}

impl Patient {
    /// Create a patient from its first admissible encounter
    #[must_use]
    pub fn new(
        code: u32,
        transplant_id: impl Into<String>,
        age: u32,
        observation: EncounterObservation,
    ) -> Self {
        let mut patient = Self {
            code,
            transplant_id: transplant_id.into(),
            age,
            discharge_dates: Vec::new(),
            bmi_readings: Vec::new(),
            meld_scores: Vec::new(),
            diabetes_code: String::new(),
            hcv_code: String::new(),
            malignancy_code: String::new(),
            functional_status_code: String::new(),
            average_bmi: None,
            average_meld: None,
            readmissions: ReadmissionFlags::default(),
            follow_ups: Vec::new(),
        };
        patient.record_encounter(observation);
        patient
    }

    /// Set the categorical covariates
    #[must_use]
    pub fn with_covariates(
        mut self,
        diabetes: impl Into<String>,
        hcv: impl Into<String>,
        malignancy: impl Into<String>,
        functional_status: impl Into<String>,
    ) -> Self {
        self.diabetes_code = diabetes.into();
        self.hcv_code = hcv.into();
        self.malignancy_code = malignancy.into();
        self.functional_status_code = functional_status.into();
        self
    }

    /// Append the observations of another encounter
    pub fn record_encounter(&mut self, observation: EncounterObservation) {
        self.discharge_dates.push(observation.discharge_date);
        if let Some(bmi) = observation.bmi {
            self.bmi_readings.push(bmi);
        }
        self.meld_scores.push(observation.meld);
    }

    /// Attach a follow-up hospitalization
    pub fn add_follow_up(&mut self, follow_up: FollowUp) {
        self.follow_ups.push(follow_up);
    }

    /// Lowest and highest BMI reading
    #[must_use]
    pub fn bmi_range(&self) -> Option<(f64, f64)> {
        match self.bmi_readings.iter().copied().minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(bmi) => Some((bmi, bmi)),
            MinMaxResult::MinMax(min, max) => Some((min, max)),
        }
    }

    /// Compute `average_bmi` and `average_meld` from the readings
    pub fn derive_averages(&mut self) {
        self.average_bmi = primitives::mean(&self.bmi_readings);
        let meld: Vec<f64> = self.meld_scores.iter().map(|&m| f64::from(m)).collect();
        self.average_meld = primitives::mean(&meld);
    }

    /// Parsed diabetes category
    #[must_use]
    pub fn diabetes(&self) -> Option<DiabetesCategory> {
        DiabetesCategory::parse(&self.diabetes_code)
    }

    /// Parsed HCV serostatus
    #[must_use]
    pub fn hcv_serostatus(&self) -> Option<HcvSerostatus> {
        HcvSerostatus::parse(&self.hcv_code)
    }

    /// Parsed malignancy flag
    #[must_use]
    pub fn malignancy(&self) -> Option<Malignancy> {
        Malignancy::parse(&self.malignancy_code)
    }

    /// Parsed functional status
    #[must_use]
    pub fn functional_status(&self) -> Option<FunctionalStatus> {
        FunctionalStatus::parse(&self.functional_status_code)
    }
}
