//! Tests for the MELD 3.0 calculator

use ltr_cohort::algorithm::meld::{MELD_MAX, MELD_MIN};
use ltr_cohort::{MeldInputs, meld_3_0};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn score(
    sex: &str,
    creatinine: &str,
    bilirubin: &str,
    inr: &str,
    sodium: &str,
    albumin: &str,
    dialysis: &str,
) -> Option<u32> {
    meld_3_0(&MeldInputs {
        sex,
        creatinine,
        bilirubin,
        inr,
        sodium,
        albumin,
        dialysis,
    })
}

#[test]
fn test_reference_patients() {
    assert_eq!(score("F", "0.8", "0.9", "0.9", "140.0", "4.0", "N"), Some(7));
    assert_eq!(score("M", "2.5", "8.0", "2.4", "128.0", "2.4", "N"), Some(37));
    assert_eq!(score("F", "1.0", "3.0", "1.8", "133.0", "2.8", "N"), Some(21));
}

#[test]
fn test_dialysis_overrides_low_creatinine() {
    // raw score 19.57 once creatinine is forced to 3.0
    assert_eq!(score("F", "0.8", "0.9", "0.9", "140.0", "4.0", "Y"), Some(20));
}

#[test]
fn test_integer_lab_is_not_computable() {
    assert_eq!(score("F", "0.8", "0.9", "0.9", "140", "4.0", "N"), None);
    assert_eq!(score("F", "0.8", "", "0.9", "140.0", "4.0", "N"), None);
}

#[test]
fn test_score_always_within_bounds() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let creatinine = format!("{:.2}", rng.random_range(0.1..12.0));
        let bilirubin = format!("{:.2}", rng.random_range(0.1..40.0));
        let inr = format!("{:.2}", rng.random_range(0.5..8.0));
        let sodium = format!("{:.1}", rng.random_range(110.0..150.0));
        let albumin = format!("{:.2}", rng.random_range(0.5..6.0));
        let sex = if rng.random_bool(0.5) { "F" } else { "M" };
        let dialysis = if rng.random_bool(0.2) { "Y" } else { "N" };

        let meld = score(sex, &creatinine, &bilirubin, &inr, &sodium, &albumin, dialysis)
            .expect("well-formed labs always score");
        assert!((MELD_MIN..=MELD_MAX).contains(&meld), "score {meld} out of range");
    }
}
