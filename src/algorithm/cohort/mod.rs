//! Cohort construction, filtering and readmission classification

pub mod builder;
pub mod core;
pub mod filters;
pub mod readmission;

pub use self::builder::{CohortBuilder, IngestOutcome, IngestSummary, RejectReason};
pub use self::core::Cohort;
pub use self::filters::{
    FilterCriteria, FilterSummary, PatientFilter, RemovalReason, apply_filter, filter_cohort,
};
pub use self::readmission::{ClassificationSummary, classify_readmissions};
