//! Domain models for the transplant cohort
//!
//! This module contains the entities the analysis works on: raw encounter
//! rows, the consolidated patient record with its follow-up hospitalizations,
//! and the coded covariates read from the registry.

pub mod codes;
pub mod encounter;
pub mod follow_up;
pub mod patient;

// Re-export commonly used types
pub use codes::{DiabetesCategory, FunctionalStatus, HcvSerostatus, Malignancy};
pub use encounter::EncounterRow;
pub use follow_up::FollowUp;
pub use patient::{EncounterObservation, Patient, ReadmissionFlags, WindowFlag};
