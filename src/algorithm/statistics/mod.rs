//! Statistics over the classified cohort
//!
//! `primitives` holds the scalar statistics, `aggregate` the per-covariate
//! accumulators and `report` the rendered result.

pub mod aggregate;
pub mod primitives;
pub mod report;
#[cfg(feature = "significance")]
pub mod significance;

pub use aggregate::{
    BinaryCovariateStats, BucketedCovariateStats, CategoricalCountStats, ContinuousCovariateStats,
    CovariateStats, OutcomeGroup, aggregate_cohort,
};
pub use report::CohortReport;
