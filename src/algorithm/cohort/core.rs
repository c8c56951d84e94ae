//! The patient-keyed cohort container

use std::collections::BTreeMap;
use std::fmt;

use crate::models::Patient;

/// All patient records of a study, keyed by patient code
///
/// Iteration is in ascending patient code, so every pass over the cohort and
/// every report built from it is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cohort {
    patients: BTreeMap<u32, Patient>,
}

impl Cohort {
    /// Create an empty cohort
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of patients
    #[must_use]
    pub fn len(&self) -> usize {
        self.patients.len()
    }

    /// Whether the cohort has no patients
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// Whether a patient code is present
    #[must_use]
    pub fn contains(&self, code: u32) -> bool {
        self.patients.contains_key(&code)
    }

    /// Look up a patient
    #[must_use]
    pub fn get(&self, code: u32) -> Option<&Patient> {
        self.patients.get(&code)
    }

    /// Look up a patient for update
    pub fn get_mut(&mut self, code: u32) -> Option<&mut Patient> {
        self.patients.get_mut(&code)
    }

    /// Insert a patient, replacing any record with the same code
    pub fn insert(&mut self, patient: Patient) -> Option<Patient> {
        self.patients.insert(patient.code, patient)
    }

    /// Remove a patient by code
    pub fn remove(&mut self, code: u32) -> Option<Patient> {
        self.patients.remove(&code)
    }

    /// Patients in code order
    pub fn patients(&self) -> impl Iterator<Item = &Patient> {
        self.patients.values()
    }

    /// Patients in code order, for in-place updates
    pub fn patients_mut(&mut self) -> impl Iterator<Item = &mut Patient> {
        self.patients.values_mut()
    }

    /// Patient codes in ascending order
    pub fn codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.patients.keys().copied()
    }

    /// Compute average BMI and MELD for every patient
    pub fn derive_averages(&mut self) {
        for patient in self.patients_mut() {
            patient.derive_averages();
        }
        log::debug!("Derived BMI and MELD averages for {} patients", self.len());
    }

    /// Number of patients readmitted within the given window
    #[must_use]
    pub fn readmitted_count(&self, window_days: u32) -> usize {
        self.patients()
            .filter(|p| p.readmissions.get(window_days) == Some(true))
            .count()
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let follow_ups: usize = self.patients().map(|p| p.follow_ups.len()).sum();
        let encounters: usize = self.patients().map(|p| p.discharge_dates.len()).sum();
        writeln!(f, "Cohort Summary:")?;
        writeln!(f, "  Patients: {}", self.len())?;
        writeln!(f, "  Primary Encounters: {encounters}")?;
        writeln!(f, "  Follow-Up Hospitalizations: {follow_ups}")?;
        Ok(())
    }
}

impl FromIterator<Patient> for Cohort {
    fn from_iter<I: IntoIterator<Item = Patient>>(iter: I) -> Self {
        let patients = iter.into_iter().map(|p| (p.code, p)).collect();
        Self { patients }
    }
}
