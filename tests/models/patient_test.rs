//! Tests for the patient record and coded covariates

use ltr_cohort::models::codes::integer_part;
use ltr_cohort::models::{
    DiabetesCategory, EncounterObservation, FunctionalStatus, HcvSerostatus, Malignancy,
};
use ltr_cohort::{FollowUp, Patient, ReadmissionFlags};

fn observation(date: &str, bmi: Option<f64>, meld: u32) -> EncounterObservation {
    EncounterObservation {
        discharge_date: date.to_string(),
        bmi,
        meld,
    }
}

#[test]
fn test_integer_part() {
    assert_eq!(integer_part("1234.0"), Some(1234));
    assert_eq!(integer_part("56"), Some(56));
    assert_eq!(integer_part(".5"), None);
    assert_eq!(integer_part(""), None);
}

#[test]
fn test_coded_covariates() {
    assert_eq!(DiabetesCategory::parse("1.0"), Some(DiabetesCategory::None));
    assert!(DiabetesCategory::parse("4.0").is_some_and(DiabetesCategory::is_diabetic));
    assert_eq!(DiabetesCategory::parse("998.0"), None);

    assert_eq!(HcvSerostatus::parse("P"), Some(HcvSerostatus::Positive));
    assert_eq!(HcvSerostatus::parse("ND"), None);
    assert_eq!(Malignancy::parse("Y"), Some(Malignancy::Yes));

    assert_eq!(FunctionalStatus::parse("2100.0"), Some(FunctionalStatus(2100)));
    assert_eq!(FunctionalStatus::parse("2100"), None);
    assert_eq!(FunctionalStatus::parse("002070"), Some(FunctionalStatus(2070)));
}

#[test]
fn test_patient_lifecycle() {
    let mut patient = Patient::new(3, "A3", 47, observation("2018-02-01", Some(31.0), 22))
        .with_covariates("1.0", "N", "Y", "2050.0");
    patient.record_encounter(observation("2018-08-01", Some(33.0), 18));
    patient.add_follow_up(FollowUp::new("Y", "2018-09-01"));
    patient.derive_averages();

    assert_eq!(patient.average_bmi, Some(32.0));
    assert_eq!(patient.average_meld, Some(20.0));
    assert_eq!(patient.bmi_range(), Some((31.0, 33.0)));
    assert_eq!(patient.malignancy(), Some(Malignancy::Yes));
    assert_eq!(patient.functional_status(), Some(FunctionalStatus(2050)));
    assert_eq!(patient.follow_ups.len(), 1);
}

#[test]
fn test_patient_without_bmi_has_no_average() {
    let mut patient = Patient::new(4, "A4", 47, observation("2018-02-01", None, 22));
    patient.derive_averages();
    assert_eq!(patient.average_bmi, None);
    assert_eq!(patient.bmi_range(), None);
    assert_eq!(patient.average_meld, Some(22.0));
}

#[test]
fn test_flags_keyed_by_window() {
    let mut flags = ReadmissionFlags::new(&[365, 30]);
    flags.record_delta(100);
    assert_eq!(flags.get(365), Some(true));
    assert_eq!(flags.get(30), Some(false));
    assert_eq!(flags.values(), vec![true, false]);
    flags.clear();
    assert!(!flags.any());
}
