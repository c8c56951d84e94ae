//! Cohort construction from encounter rows
//!
//! The builder runs the two ingestion passes of the study. Pass one reads the
//! primary transplant encounters and creates or extends patient records; pass
//! two reads follow-up encounters and attaches hospitalizations to patients
//! that already exist. Inadmissible rows are skipped and counted, never fatal.

use std::collections::BTreeMap;
use std::fmt;

use crate::algorithm::meld::{MeldInputs, meld_3_0};
use crate::config::StudyConfig;
use crate::models::codes::integer_part;
use crate::models::follow_up::is_structurally_valid_date;
use crate::models::{EncounterObservation, EncounterRow, FollowUp, Patient};

use super::core::Cohort;

/// Why a row was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectReason {
    /// Patient code empty
    MissingPatientCode,
    /// Patient code not numeric
    InvalidPatientCode,
    /// Transplant-record id empty or with the wrong prefix
    InvalidTransplantId,
    /// Age empty or not numeric
    InvalidAge,
    /// Age outside the study range
    AgeOutOfRange,
    /// Discharge date empty
    MissingDischargeDate,
    /// A MELD lab value missing or malformed
    MeldNotComputable,
    /// Follow-up does not report a hospitalization
    NotHospitalized,
    /// Follow-up status date malformed
    InvalidStatusDate,
    /// Follow-up for a patient not in the cohort
    UnknownPatient,
}

impl RejectReason {
    /// Short description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::MissingPatientCode => "missing patient code",
            Self::InvalidPatientCode => "invalid patient code",
            Self::InvalidTransplantId => "invalid transplant-record id",
            Self::InvalidAge => "invalid age",
            Self::AgeOutOfRange => "age out of range",
            Self::MissingDischargeDate => "missing discharge date",
            Self::MeldNotComputable => "MELD not computable",
            Self::NotHospitalized => "not a hospitalization",
            Self::InvalidStatusDate => "invalid status date",
            Self::UnknownPatient => "unknown patient",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// What happened to one ingested row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new patient record was created
    Created(u32),
    /// An existing patient record was extended
    Appended(u32),
    /// A follow-up was attached to the patient
    FollowUpAttached(u32),
    /// The row was skipped
    Rejected(RejectReason),
}

/// Counts for one ingestion pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Rows offered to the builder
    pub rows_seen: usize,
    /// Patients created
    pub created: usize,
    /// Encounters appended to existing patients
    pub appended: usize,
    /// Follow-ups attached
    pub follow_ups_attached: usize,
    /// Rejected rows by reason
    pub rejected: BTreeMap<RejectReason, usize>,
}

impl IngestSummary {
    /// Account for one row
    pub fn record(&mut self, outcome: IngestOutcome) {
        self.rows_seen += 1;
        match outcome {
            IngestOutcome::Created(_) => self.created += 1,
            IngestOutcome::Appended(_) => self.appended += 1,
            IngestOutcome::FollowUpAttached(_) => self.follow_ups_attached += 1,
            IngestOutcome::Rejected(reason) => *self.rejected.entry(reason).or_insert(0) += 1,
        }
    }

    /// Total rejected rows
    #[must_use]
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Rows that changed the cohort
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.created + self.appended + self.follow_ups_attached
    }
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows: {}", self.rows_seen)?;
        writeln!(f, "  Patients Created: {}", self.created)?;
        writeln!(f, "  Encounters Appended: {}", self.appended)?;
        writeln!(f, "  Follow-Ups Attached: {}", self.follow_ups_attached)?;
        writeln!(f, "  Rejected: {}", self.rejected_total())?;
        for (reason, count) in &self.rejected {
            writeln!(f, "    {reason}: {count}")?;
        }
        Ok(())
    }
}

/// Builder that consolidates encounter rows into a [`Cohort`]
pub struct CohortBuilder {
    /// Study parameters used for admissibility
    config: StudyConfig,
    /// Patients built so far
    cohort: Cohort,
}

impl CohortBuilder {
    /// Create a builder with an empty cohort
    #[must_use]
    pub fn new(config: StudyConfig) -> Self {
        Self {
            config,
            cohort: Cohort::new(),
        }
    }

    /// Continue building on an existing cohort
    #[must_use]
    pub fn with_cohort(mut self, cohort: Cohort) -> Self {
        self.cohort = cohort;
        self
    }

    /// Cohort built so far
    #[must_use]
    pub fn cohort(&self) -> &Cohort {
        &self.cohort
    }

    /// Mutable access for the stages that run between the two passes
    pub fn cohort_mut(&mut self) -> &mut Cohort {
        &mut self.cohort
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Cohort {
        self.cohort
    }

    /// Validate patient code and transplant-record id shared by both extracts
    fn identify(&self, row: &EncounterRow) -> Result<u32, RejectReason> {
        let fields = &self.config.fields;
        let code = row.get(&fields.patient_code);
        if code.is_empty() {
            return Err(RejectReason::MissingPatientCode);
        }
        let code = integer_part(code).ok_or(RejectReason::InvalidPatientCode)?;

        let transplant_id = row.get(&fields.transplant_id);
        if !transplant_id.starts_with(self.config.transplant_id_prefix) {
            return Err(RejectReason::InvalidTransplantId);
        }
        Ok(code)
    }

    /// Ingest one primary transplant encounter
    pub fn ingest_primary(&mut self, row: &EncounterRow) -> IngestOutcome {
        match self.admit_primary(row) {
            Ok((code, transplant_id, age, observation)) => {
                if let Some(patient) = self.cohort.get_mut(code) {
                    patient.record_encounter(observation);
                    IngestOutcome::Appended(code)
                } else {
                    let fields = &self.config.fields;
                    let patient = Patient::new(code, transplant_id, age, observation)
                        .with_covariates(
                            row.get(&fields.diabetes),
                            row.get(&fields.hcv_serostatus),
                            row.get(&fields.malignancy),
                            row.get(&fields.functional_status),
                        );
                    self.cohort.insert(patient);
                    IngestOutcome::Created(code)
                }
            }
            Err(reason) => {
                log::debug!("Skipping primary encounter: {reason}");
                IngestOutcome::Rejected(reason)
            }
        }
    }

    fn admit_primary(
        &self,
        row: &EncounterRow,
    ) -> Result<(u32, String, u32, EncounterObservation), RejectReason> {
        let code = self.identify(row)?;
        let fields = &self.config.fields;

        let age = integer_part(row.get(&fields.age)).ok_or(RejectReason::InvalidAge)?;
        if age < self.config.min_age || age > self.config.max_age {
            return Err(RejectReason::AgeOutOfRange);
        }

        let discharge_date = row.get(&fields.discharge_date).trim();
        if discharge_date.is_empty() {
            return Err(RejectReason::MissingDischargeDate);
        }

        let meld = meld_3_0(&MeldInputs {
            sex: row.get(&fields.sex),
            creatinine: row.get(&fields.creatinine),
            bilirubin: row.get(&fields.bilirubin),
            inr: row.get(&fields.inr),
            sodium: row.get(&fields.sodium),
            albumin: row.get(&fields.albumin),
            dialysis: row.get(&fields.dialysis),
        })
        .ok_or(RejectReason::MeldNotComputable)?;

        let bmi = row
            .get(&fields.bmi)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|b| b.is_finite());

        let observation = EncounterObservation {
            discharge_date: discharge_date.to_string(),
            bmi,
            meld,
        };
        Ok((
            code,
            row.get(&fields.transplant_id).to_string(),
            age,
            observation,
        ))
    }

    /// Ingest one follow-up encounter
    pub fn ingest_follow_up(&mut self, row: &EncounterRow) -> IngestOutcome {
        match self.admit_follow_up(row) {
            Ok((code, follow_up)) => match self.cohort.get_mut(code) {
                Some(patient) => {
                    patient.add_follow_up(follow_up);
                    IngestOutcome::FollowUpAttached(code)
                }
                None => IngestOutcome::Rejected(RejectReason::UnknownPatient),
            },
            Err(reason) => {
                log::debug!("Skipping follow-up encounter: {reason}");
                IngestOutcome::Rejected(reason)
            }
        }
    }

    fn admit_follow_up(&self, row: &EncounterRow) -> Result<(u32, FollowUp), RejectReason> {
        let code = self.identify(row)?;
        let fields = &self.config.fields;

        let hospitalized = row.get(&fields.hospitalized);
        if hospitalized.chars().count() != 1 || hospitalized != self.config.hospitalized_code {
            return Err(RejectReason::NotHospitalized);
        }

        let status_date = row.get(&fields.status_date);
        if !is_structurally_valid_date(status_date) {
            return Err(RejectReason::InvalidStatusDate);
        }

        Ok((code, FollowUp::new(hospitalized, status_date)))
    }

    /// Ingest a whole primary extract
    pub fn ingest_primary_rows<'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a EncounterRow>,
    ) -> IngestSummary {
        let mut summary = IngestSummary::default();
        for row in rows {
            summary.record(self.ingest_primary(row));
        }
        log::info!(
            "Primary encounters: {} rows, {} patients created, {} appended, {} rejected",
            summary.rows_seen,
            summary.created,
            summary.appended,
            summary.rejected_total()
        );
        summary
    }

    /// Ingest a whole follow-up extract
    pub fn ingest_follow_up_rows<'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a EncounterRow>,
    ) -> IngestSummary {
        let mut summary = IngestSummary::default();
        for row in rows {
            summary.record(self.ingest_follow_up(row));
        }
        log::info!(
            "Follow-up encounters: {} rows, {} hospitalizations attached, {} rejected",
            summary.rows_seen,
            summary.follow_ups_attached,
            summary.rejected_total()
        );
        summary
    }
}
