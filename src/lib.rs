//! Readmission analysis for liver-transplant registry extracts.
//!
//! Primary transplant encounters and follow-up encounters are consolidated
//! into a patient cohort, filtered for data quality, classified by
//! readmission window and summarised per covariate with chi-square and
//! Welch t scores.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{FieldNames, StudyConfig};
pub use error::{CohortError, Result};
pub use models::{EncounterRow, FollowUp, Patient, ReadmissionFlags};

// Cohort construction
pub use algorithm::cohort::{
    Cohort, CohortBuilder, FilterSummary, IngestSummary, RejectReason, RemovalReason,
    classify_readmissions, filter_cohort,
};
pub use algorithm::meld::{MeldInputs, meld_3_0};

// Statistics and reporting
pub use algorithm::statistics::{CohortReport, CovariateStats, aggregate_cohort};

// Input and orchestration
pub use pipeline::{AnalysisOutcome, CohortAnalysis};
pub use reader::{CsvRows, InMemoryRows, ParquetRows, RowSource, csv_to_parquet, open_row_source};
