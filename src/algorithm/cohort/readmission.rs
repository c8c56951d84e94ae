//! Readmission classification
//!
//! Pairs every discharge date of a patient with every follow-up status date,
//! stores the day deltas on the follow-up and sets the window flags.

use std::fmt;

use crate::models::ReadmissionFlags;
use crate::models::follow_up::parse_date;

use super::core::Cohort;

/// Outcome of a classification pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationSummary {
    /// Patients visited
    pub patients: usize,
    /// Date pairs evaluated
    pub pairs_evaluated: usize,
    /// Date pairs skipped because a date did not parse
    pub pairs_skipped: usize,
    /// Readmitted patients per window, in configured order
    pub readmitted: Vec<(u32, usize)>,
}

impl fmt::Display for ClassificationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Readmission Classification:")?;
        writeln!(f, "  Patients: {}", self.patients)?;
        writeln!(
            f,
            "  Date Pairs: {} evaluated, {} skipped",
            self.pairs_evaluated, self.pairs_skipped
        )?;
        for (window, count) in &self.readmitted {
            writeln!(f, "  Readmitted within {window} days: {count}")?;
        }
        Ok(())
    }
}

/// Classify every patient's readmissions against the given windows
///
/// Flags and day deltas are rebuilt from scratch, so running the pass twice
/// gives the same result. A pair whose dates fail to parse is skipped with a
/// warning.
pub fn classify_readmissions(cohort: &mut Cohort, windows: &[u32]) -> ClassificationSummary {
    let mut summary = ClassificationSummary {
        patients: cohort.len(),
        ..ClassificationSummary::default()
    };

    for patient in cohort.patients_mut() {
        let mut flags = ReadmissionFlags::new(windows);

        for follow_up in &mut patient.follow_ups {
            follow_up.days_since_discharge.clear();
            let Some(status) = follow_up.status() else {
                log::warn!(
                    "Patient {}: unparseable status date {:?}, skipping {} pairs",
                    patient.code,
                    follow_up.status_date,
                    patient.discharge_dates.len()
                );
                summary.pairs_skipped += patient.discharge_dates.len();
                continue;
            };

            for discharge in &patient.discharge_dates {
                let Some(discharged) = parse_date(discharge) else {
                    log::warn!(
                        "Patient {}: unparseable discharge date {discharge:?}, skipping pair",
                        patient.code
                    );
                    summary.pairs_skipped += 1;
                    continue;
                };

                let days = (status - discharged).num_days();
                follow_up.days_since_discharge.push(days);
                flags.record_delta(days);
                summary.pairs_evaluated += 1;
            }
        }

        patient.readmissions = flags;
    }

    summary.readmitted = windows
        .iter()
        .map(|&window| (window, cohort.readmitted_count(window)))
        .collect();

    log::info!(
        "Classified readmissions for {} patients ({} date pairs, {} skipped)",
        summary.patients,
        summary.pairs_evaluated,
        summary.pairs_skipped
    );
    summary
}
