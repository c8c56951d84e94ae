//! End-to-end readmission analysis
//!
//! Runs the study phases in order over two row sources: primary encounters,
//! data-quality filtering, averages, follow-up encounters, readmission
//! classification and aggregation. The population size is logged after every
//! phase.

use std::fmt;
use std::time::Instant;

use crate::algorithm::cohort::{
    ClassificationSummary, Cohort, CohortBuilder, FilterSummary, IngestSummary,
    classify_readmissions, filter_cohort,
};
use crate::algorithm::statistics::{CohortReport, CovariateStats, aggregate_cohort};
use crate::config::StudyConfig;
use crate::error::Result;
use crate::reader::RowSource;

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Final, classified cohort
    pub cohort: Cohort,
    /// Primary encounter ingestion
    pub primary: IngestSummary,
    /// Data-quality filtering
    pub filter: FilterSummary,
    /// Follow-up encounter ingestion
    pub follow_up: IngestSummary,
    /// Readmission classification
    pub classification: ClassificationSummary,
    /// Aggregated covariates
    pub stats: CovariateStats,
    /// Rendered report
    pub report: CohortReport,
}

impl fmt::Display for AnalysisOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Primary Encounters")?;
        write!(f, "{}", self.primary)?;
        write!(f, "{}", self.filter)?;
        writeln!(f, "Follow-Up Encounters")?;
        write!(f, "{}", self.follow_up)?;
        write!(f, "{}", self.classification)?;
        write!(f, "{}", self.cohort)
    }
}

/// A configured readmission analysis
#[derive(Debug, Clone)]
pub struct CohortAnalysis {
    config: StudyConfig,
}

impl CohortAnalysis {
    /// Create an analysis with the given configuration
    #[must_use]
    pub fn new(config: StudyConfig) -> Self {
        Self { config }
    }

    /// The configuration in use
    #[must_use]
    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Run every phase over a primary and a follow-up source
    pub fn run(&self, primary: &dyn RowSource, follow_up: &dyn RowSource) -> Result<AnalysisOutcome> {
        let start = Instant::now();
        self.config.validate()?;
        log::info!("Starting readmission analysis\n{}", self.config);

        let mut builder = CohortBuilder::new(self.config.clone());

        log::info!("Loading primary encounters from {}", primary.describe());
        let primary_rows = primary.read_rows(&self.config.fields.primary_columns())?;
        let primary_summary = builder.ingest_primary_rows(&primary_rows);
        drop(primary_rows);
        log::info!("Patients after primary encounters: {}", builder.cohort().len());

        let filter = filter_cohort(builder.cohort_mut(), &self.config);
        log::info!("Patients after data-quality filter: {}", builder.cohort().len());

        builder.cohort_mut().derive_averages();

        log::info!("Loading follow-up encounters from {}", follow_up.describe());
        let follow_up_rows = follow_up.read_rows(&self.config.fields.follow_up_columns())?;
        let follow_up_summary = builder.ingest_follow_up_rows(&follow_up_rows);
        drop(follow_up_rows);
        log::info!(
            "Patients after follow-up encounters: {} ({} follow-ups attached)",
            builder.cohort().len(),
            follow_up_summary.follow_ups_attached
        );

        let mut cohort = builder.build();
        let classification = classify_readmissions(&mut cohort, &self.config.readmission_windows);
        for (window, count) in &classification.readmitted {
            log::info!("Readmitted within {window} days: {count} of {}", cohort.len());
        }

        let stats = aggregate_cohort(&cohort, &self.config);
        let report = CohortReport::from_stats(&stats);

        log::info!("Readmission analysis completed in {:?}", start.elapsed());
        Ok(AnalysisOutcome {
            cohort,
            primary: primary_summary,
            filter,
            follow_up: follow_up_summary,
            classification,
            stats,
            report,
        })
    }
}
