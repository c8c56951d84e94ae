//! Tests for cohort construction, filtering and classification

use ltr_cohort::algorithm::cohort::IngestOutcome;
use ltr_cohort::{
    Cohort, CohortBuilder, RejectReason, RemovalReason, StudyConfig, classify_readmissions,
    filter_cohort,
};

use crate::utils::{follow_up_row, primary_row};

fn built(rows: &[ltr_cohort::EncounterRow]) -> CohortBuilder {
    let mut builder = CohortBuilder::new(StudyConfig::default());
    builder.ingest_primary_rows(rows);
    builder
}

#[test]
fn test_repeat_encounters_consolidate() {
    let rows = vec![
        primary_row(12, 55, "2019-03-01"),
        primary_row(12, 55, "2019-09-14").with_field("BMICALC", "29.0"),
        primary_row(30, 61, "2018-01-05"),
    ];
    let builder = built(&rows);
    let cohort = builder.cohort();

    assert_eq!(cohort.len(), 2);
    let patient = cohort.get(12).unwrap();
    assert_eq!(patient.discharge_dates, vec!["2019-03-01", "2019-09-14"]);
    assert_eq!(patient.bmi_readings, vec![27.0, 29.0]);
    assert_eq!(patient.meld_scores, vec![7, 7]);
    assert_eq!(patient.transplant_id, "A12");
}

#[test]
fn test_first_encounter_fixes_covariates() {
    let rows = vec![
        primary_row(5, 40, "2019-03-01").with_field("DIAB", "3.0"),
        primary_row(5, 40, "2019-04-01").with_field("DIAB", "1.0"),
    ];
    let builder = built(&rows);
    assert_eq!(builder.cohort().get(5).unwrap().diabetes_code, "3.0");
}

#[test]
fn test_inadmissible_rows_are_counted() {
    let rows = vec![
        primary_row(1, 17, "2019-03-01"),
        primary_row(2, 101, "2019-03-01"),
        primary_row(3, 50, "2019-03-01").with_field("PTCODE", ""),
        primary_row(4, 50, "2019-03-01").with_field("PTCODE", "X4"),
        primary_row(5, 50, "2019-03-01").with_field("TRRIDCODE", "B5"),
        primary_row(6, 50, ""),
        primary_row(7, 50, "2019-03-01").with_field("INR_TX", "1"),
        primary_row(8, 50, "2019-03-01").with_field("AGE", ""),
        primary_row(9, 18, "2019-03-01"),
    ];
    let mut builder = CohortBuilder::new(StudyConfig::default());
    let summary = builder.ingest_primary_rows(&rows);

    assert_eq!(summary.rows_seen, 9);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.rejected.get(&RejectReason::AgeOutOfRange), Some(&2));
    assert_eq!(summary.rejected.get(&RejectReason::MissingPatientCode), Some(&1));
    assert_eq!(summary.rejected.get(&RejectReason::InvalidPatientCode), Some(&1));
    assert_eq!(summary.rejected.get(&RejectReason::InvalidTransplantId), Some(&1));
    assert_eq!(summary.rejected.get(&RejectReason::MissingDischargeDate), Some(&1));
    assert_eq!(summary.rejected.get(&RejectReason::MeldNotComputable), Some(&1));
    assert_eq!(summary.rejected.get(&RejectReason::InvalidAge), Some(&1));
    assert!(builder.cohort().contains(9));
}

#[test]
fn test_malformed_bmi_is_absent_not_fatal() {
    let rows = vec![primary_row(1, 50, "2019-03-01").with_field("BMICALC", "n/a")];
    let builder = built(&rows);
    assert!(builder.cohort().get(1).unwrap().bmi_readings.is_empty());
}

#[test]
fn test_follow_up_admissibility() {
    let mut builder = built(&[primary_row(1, 50, "2020-01-01")]);

    assert_eq!(
        builder.ingest_follow_up(&follow_up_row(1, "2020-01-20")),
        IngestOutcome::FollowUpAttached(1)
    );
    assert_eq!(
        builder.ingest_follow_up(&follow_up_row(2, "2020-01-20")),
        IngestOutcome::Rejected(RejectReason::UnknownPatient)
    );
    assert_eq!(
        builder.ingest_follow_up(&follow_up_row(1, "2020-01-20").with_field("HOSP", "N")),
        IngestOutcome::Rejected(RejectReason::NotHospitalized)
    );
    assert_eq!(
        builder.ingest_follow_up(&follow_up_row(1, "2020-01-20").with_field("HOSP", "YY")),
        IngestOutcome::Rejected(RejectReason::NotHospitalized)
    );
    assert_eq!(
        builder.ingest_follow_up(&follow_up_row(1, "20200120")),
        IngestOutcome::Rejected(RejectReason::InvalidStatusDate)
    );
    assert_eq!(builder.cohort().get(1).unwrap().follow_ups.len(), 1);
}

#[test]
fn test_filter_keeps_subset() {
    let rows = vec![
        primary_row(1, 50, "2019-03-01"),
        primary_row(2, 50, "2019-03-01").with_field("HCVSEROSTATUS", "U"),
        primary_row(3, 50, "2019-03-01").with_field("BMICALC", "24.9"),
        primary_row(3, 50, "2019-06-01").with_field("BMICALC", "25.1"),
        primary_row(4, 50, "2019-03-01").with_field("FUNCSTATTRR", "996"),
    ];
    let mut builder = built(&rows);
    let before: Vec<u32> = builder.cohort().codes().collect();

    let summary = filter_cohort(builder.cohort_mut(), &StudyConfig::default());
    let after: Vec<u32> = builder.cohort().codes().collect();

    assert!(after.iter().all(|code| before.contains(code)));
    assert_eq!(after, vec![1]);
    assert_eq!(summary.removed.get(&RemovalReason::InconsistentBmi), Some(&1));
    assert_eq!(summary.removed_total(), 3);
}

#[test]
fn test_classification_windows() {
    let mut builder = built(&[
        primary_row(1, 50, "2020-01-01"),
        primary_row(2, 50, "2020-01-01"),
        primary_row(3, 50, "2020-01-01"),
    ]);
    builder.ingest_follow_up_rows(&[
        follow_up_row(1, "2020-01-20"),
        follow_up_row(2, "2020-03-05"),
    ]);
    let mut cohort: Cohort = builder.build();

    classify_readmissions(&mut cohort, &[30, 90, 365]);
    assert_eq!(cohort.get(1).unwrap().readmissions.values(), vec![true, true, true]);
    assert_eq!(cohort.get(2).unwrap().readmissions.values(), vec![false, true, true]);
    assert_eq!(cohort.get(3).unwrap().readmissions.values(), vec![false, false, false]);
    assert_eq!(cohort.readmitted_count(90), 2);
}

#[test]
fn test_single_window_flag() {
    let mut builder = built(&[primary_row(1, 50, "2020-01-01")]);
    builder.ingest_follow_up_rows(&[follow_up_row(1, "2020-02-15")]);
    let mut cohort = builder.build();

    classify_readmissions(&mut cohort, &[90]);
    let flags = &cohort.get(1).unwrap().readmissions;
    assert_eq!(flags.len(), 1);
    assert!(flags.any());
}
