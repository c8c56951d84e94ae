//! End-to-end runs of the readmission analysis

use std::fs;
use std::path::{Path, PathBuf};

use ltr_cohort::{CohortAnalysis, CsvRows, ParquetRows, StudyConfig, csv_to_parquet};
use tempfile::tempdir;

use crate::utils::{follow_up_row, primary_row, source};

fn sample_analysis() -> ltr_cohort::AnalysisOutcome {
    let primary = source(
        "primary",
        vec![
            primary_row(1, 52, "2020-01-01").with_field("DIAB", "2.0"),
            primary_row(1, 52, "2020-02-01").with_field("BMICALC", "28.0"),
            primary_row(2, 64, "2020-01-01"),
            primary_row(3, 45, "2019-06-01").with_field("HCVSEROSTATUS", "P"),
            primary_row(4, 70, "2019-06-01").with_field("HCVSEROSTATUS", "U"),
            primary_row(5, 16, "2019-06-01"),
        ],
    );
    let follow_up = source(
        "follow-up",
        vec![
            follow_up_row(1, "2020-02-20"),
            follow_up_row(3, "2019-10-01"),
            follow_up_row(4, "2019-07-01"),
            follow_up_row(9, "2019-07-01"),
        ],
    );
    CohortAnalysis::new(StudyConfig::default())
        .run(&primary, &follow_up)
        .unwrap()
}

#[test]
fn test_population_shrinks_monotonically() {
    let outcome = sample_analysis();

    assert_eq!(outcome.primary.created, 4);
    assert_eq!(outcome.primary.appended, 1);
    assert_eq!(outcome.filter.before, 4);
    assert_eq!(outcome.filter.after, 3);
    assert_eq!(outcome.cohort.len(), 3);
    assert!(!outcome.cohort.contains(4));
    // patient 4 was filtered out, patient 9 never existed
    assert_eq!(outcome.follow_up.follow_ups_attached, 2);
    assert_eq!(outcome.follow_up.rejected_total(), 2);
}

#[test]
fn test_readmissions_by_window() {
    let outcome = sample_analysis();
    let patient = outcome.cohort.get(1).unwrap();

    // 50 days after the first discharge, 19 after the second
    assert_eq!(patient.follow_ups[0].days_since_discharge, vec![50, 19]);
    assert_eq!(patient.readmissions.values(), vec![true, true, true, true]);

    // 122 days after discharge
    let patient = outcome.cohort.get(3).unwrap();
    assert_eq!(patient.readmissions.values(), vec![false, false, true, true]);

    let counts: Vec<usize> = outcome.report.readmissions.iter().map(|c| c.readmitted).collect();
    assert_eq!(counts, vec![1, 1, 2, 2]);
}

#[test]
fn test_averages_feed_bucketed_stats() {
    let outcome = sample_analysis();
    assert_eq!(outcome.cohort.get(1).unwrap().average_bmi, Some(27.5));

    // every patient has BMI in [25, 30) and MELD 7 in [6, 15)
    let bmi = &outcome.stats.bmi;
    let window = 2;
    assert_eq!(bmi.readmitted[window][2].count, 2);
    assert_eq!(bmi.not_readmitted[window][2].count, 1);
    assert_eq!(outcome.stats.meld.readmitted[window][0].mean(), Some(7.0));
}

#[test]
fn test_report_renders_both_formats() {
    let outcome = sample_analysis();

    let text = outcome.report.to_string();
    assert!(text.contains("Diabetes"));
    assert!(text.contains("Functional Status"));

    let json: serde_json::Value = serde_json::from_str(&outcome.report.to_json().unwrap()).unwrap();
    assert_eq!(json["patients"], 3);
    assert_eq!(json["bucketed"][1]["name"], "MELD");

    let dir = tempdir().unwrap();
    let path = dir.path().join("report.json");
    outcome.report.save_to_json(&path).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved, json);
}

fn write_csv_extracts(dir: &Path) -> (PathBuf, PathBuf) {
    let primary = dir.join("primary.csv");
    let follow_up = dir.join("follow_up.csv");

    fs::write(
        &primary,
        "PTCODE,TRRIDCODE,AGE,GENDER,DISCHARGEDATE,BMICALC,DIAB,FUNCSTATTRR,HCVSEROSTATUS,MALIG,\
         CREAT_TX,TBILI_TX,INR_TX,SERUM_SODIUM,ALBUMIN_TX,DIAL_TX\n\
         21.0,A21,58,M,2021-03-01,24.0,1.0,2070.0,N,N,1.2,2.0,1.5,130.0,3.0,N\n\
         22.0,A22,49,F,2021-03-01,31.0,3.0,2090.0,P,Y,0.8,0.9,0.9,140.0,4.0,N\n",
    )
    .unwrap();
    fs::write(
        &follow_up,
        "PTCODE,TRRIDCODE,HOSP,PXSTATDATE\n21.0,A21,Y,2021-03-20\n22.0,A22,N,2021-03-20\n",
    )
    .unwrap();
    (primary, follow_up)
}

#[test]
fn test_csv_extracts_end_to_end() {
    let dir = tempdir().unwrap();
    let (primary, follow_up) = write_csv_extracts(dir.path());

    let outcome = CohortAnalysis::new(StudyConfig::default())
        .run(&CsvRows::new(&primary), &CsvRows::new(&follow_up))
        .unwrap();

    assert_eq!(outcome.cohort.len(), 2);
    assert_eq!(outcome.cohort.get(21).unwrap().meld_scores, vec![20]);
    assert_eq!(outcome.cohort.get(22).unwrap().meld_scores, vec![7]);
    assert_eq!(outcome.cohort.readmitted_count(30), 1);
    assert_eq!(outcome.follow_up.follow_ups_attached, 1);
}

#[test]
fn test_converted_extracts_give_same_report() {
    let dir = tempdir().unwrap();
    let (primary, follow_up) = write_csv_extracts(dir.path());
    let primary_parquet = dir.path().join("primary.parquet");
    let follow_up_parquet = dir.path().join("follow_up.parquet");
    assert_eq!(csv_to_parquet(&primary, &primary_parquet).unwrap(), 2);
    assert_eq!(csv_to_parquet(&follow_up, &follow_up_parquet).unwrap(), 2);

    let analysis = CohortAnalysis::new(StudyConfig::default());
    let from_csv = analysis
        .run(&CsvRows::new(&primary), &CsvRows::new(&follow_up))
        .unwrap();
    let from_parquet = analysis
        .run(
            &ParquetRows::new(&primary_parquet),
            &ParquetRows::new(&follow_up_parquet),
        )
        .unwrap();

    assert_eq!(from_parquet.report, from_csv.report);
    assert_eq!(from_parquet.cohort.len(), 2);
}
