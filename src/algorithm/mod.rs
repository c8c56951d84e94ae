//! Cohort algorithms
//!
//! Scoring, cohort construction and the statistics computed over the
//! classified cohort.

pub mod categories;
pub mod cohort;
pub mod meld;
pub mod statistics;
