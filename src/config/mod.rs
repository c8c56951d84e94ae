//! Study configuration.
//!
//! Everything the analysis treats as a study parameter: readmission windows,
//! category boundaries, admissibility thresholds and the names of the input
//! columns. A configuration can be built in code, taken from [`Default`], or
//! read from a JSON file where every key is optional.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CohortError, Result};

/// Column names of the two encounter extracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// Patient code (shared by both extracts)
    pub patient_code: String,
    /// Transplant-record identifier (shared by both extracts)
    pub transplant_id: String,
    /// Age at transplant
    pub age: String,
    /// Sex (`F`/`M`)
    pub sex: String,
    /// Discharge date of the transplant admission
    pub discharge_date: String,
    /// Calculated BMI
    pub bmi: String,
    /// Diabetes category code
    pub diabetes: String,
    /// Functional status at transplant
    pub functional_status: String,
    /// HCV serostatus
    pub hcv_serostatus: String,
    /// Malignancy ever
    pub malignancy: String,
    /// Serum creatinine
    pub creatinine: String,
    /// Total bilirubin
    pub bilirubin: String,
    /// INR
    pub inr: String,
    /// Serum sodium
    pub sodium: String,
    /// Serum albumin
    pub albumin: String,
    /// Dialysis in the week before transplant
    pub dialysis: String,
    /// Hospitalized since last follow-up
    pub hospitalized: String,
    /// Follow-up status date
    pub status_date: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            patient_code: "PTCODE".to_string(),
            transplant_id: "TRRIDCODE".to_string(),
            age: "AGE".to_string(),
            sex: "GENDER".to_string(),
            discharge_date: "DISCHARGEDATE".to_string(),
            bmi: "BMICALC".to_string(),
            diabetes: "DIAB".to_string(),
            functional_status: "FUNCSTATTRR".to_string(),
            hcv_serostatus: "HCVSEROSTATUS".to_string(),
            malignancy: "MALIG".to_string(),
            creatinine: "CREAT_TX".to_string(),
            bilirubin: "TBILI_TX".to_string(),
            inr: "INR_TX".to_string(),
            sodium: "SERUM_SODIUM".to_string(),
            albumin: "ALBUMIN_TX".to_string(),
            dialysis: "DIAL_TX".to_string(),
            hospitalized: "HOSP".to_string(),
            status_date: "PXSTATDATE".to_string(),
        }
    }
}

impl FieldNames {
    /// Columns every primary encounter row must carry
    #[must_use]
    pub fn primary_columns(&self) -> Vec<&str> {
        vec![
            self.patient_code.as_str(),
            self.transplant_id.as_str(),
            self.age.as_str(),
            self.sex.as_str(),
            self.discharge_date.as_str(),
            self.bmi.as_str(),
            self.diabetes.as_str(),
            self.functional_status.as_str(),
            self.hcv_serostatus.as_str(),
            self.malignancy.as_str(),
            self.creatinine.as_str(),
            self.bilirubin.as_str(),
            self.inr.as_str(),
            self.sodium.as_str(),
            self.albumin.as_str(),
            self.dialysis.as_str(),
        ]
    }

    /// Columns every follow-up row must carry
    #[must_use]
    pub fn follow_up_columns(&self) -> Vec<&str> {
        vec![
            self.patient_code.as_str(),
            self.transplant_id.as_str(),
            self.hospitalized.as_str(),
            self.status_date.as_str(),
        ]
    }
}

/// Configuration for a readmission cohort study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Readmission windows in days
    pub readmission_windows: Vec<u32>,
    /// Ascending BMI category boundaries
    pub bmi_bounds: Vec<f64>,
    /// Ascending MELD category boundaries
    pub meld_bounds: Vec<f64>,
    /// Functional status category codes
    pub functional_status_codes: Vec<u32>,
    /// Minimum age for inclusion (inclusive)
    pub min_age: u32,
    /// Maximum age for inclusion (inclusive)
    pub max_age: u32,
    /// Required first letter of the transplant-record identifier
    pub transplant_id_prefix: char,
    /// Code marking a follow-up as a hospitalization
    pub hospitalized_code: String,
    /// Input column names
    pub fields: FieldNames,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            readmission_windows: vec![30, 90, 365, 365 * 5],
            bmi_bounds: vec![0.0, 18.5, 25.0, 30.0, 35.0, 40.0, 50.0, 100.0],
            meld_bounds: vec![6.0, 15.0, 21.0, 28.0, 40.1],
            functional_status_codes: (2010..=2100).step_by(10).collect(),
            min_age: 18,
            max_age: 100,
            transplant_id_prefix: 'A',
            hospitalized_code: "Y".to_string(),
            fields: FieldNames::default(),
        }
    }
}

impl StudyConfig {
    /// Read a configuration from a JSON file and validate it
    ///
    /// Keys missing from the file keep their default value.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the readmission windows
    #[must_use]
    pub fn with_windows(mut self, windows: Vec<u32>) -> Self {
        self.readmission_windows = windows;
        self
    }

    /// Set the BMI category boundaries
    #[must_use]
    pub fn with_bmi_bounds(mut self, bounds: Vec<f64>) -> Self {
        self.bmi_bounds = bounds;
        self
    }

    /// Set the MELD category boundaries
    #[must_use]
    pub fn with_meld_bounds(mut self, bounds: Vec<f64>) -> Self {
        self.meld_bounds = bounds;
        self
    }

    /// Check that the configuration describes a usable study
    pub fn validate(&self) -> Result<()> {
        if self.readmission_windows.is_empty() {
            return Err(CohortError::config(
                "at least one readmission window is required",
            ));
        }
        if self.readmission_windows.contains(&0) {
            return Err(CohortError::config("readmission windows must be positive"));
        }
        let mut seen = self.readmission_windows.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != self.readmission_windows.len() {
            return Err(CohortError::config("readmission windows must be distinct"));
        }

        validate_bounds("BMI", &self.bmi_bounds)?;
        validate_bounds("MELD", &self.meld_bounds)?;

        if self.min_age > self.max_age {
            return Err(CohortError::config(format!(
                "minimum age {} exceeds maximum age {}",
                self.min_age, self.max_age
            )));
        }
        if self.hospitalized_code.chars().count() != 1 {
            return Err(CohortError::config(
                "hospitalized code must be a single character",
            ));
        }
        Ok(())
    }
}

fn validate_bounds(name: &str, bounds: &[f64]) -> Result<()> {
    if bounds.len() < 2 {
        return Err(CohortError::config(format!(
            "{name} bounds need at least two values"
        )));
    }
    if bounds.iter().any(|b| !b.is_finite()) {
        return Err(CohortError::config(format!("{name} bounds must be finite")));
    }
    if bounds.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(CohortError::config(format!(
            "{name} bounds must be strictly ascending"
        )));
    }
    Ok(())
}

impl fmt::Display for StudyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Study Configuration:")?;
        writeln!(f, "  Readmission Windows (days): {:?}", self.readmission_windows)?;
        writeln!(f, "  BMI Bounds: {:?}", self.bmi_bounds)?;
        writeln!(f, "  MELD Bounds: {:?}", self.meld_bounds)?;
        writeln!(f, "  Functional Status Codes: {:?}", self.functional_status_codes)?;
        writeln!(f, "  Age Range: {}-{}", self.min_age, self.max_age)?;
        writeln!(f, "  Transplant ID Prefix: {}", self.transplant_id_prefix)?;
        writeln!(f, "  Hospitalized Code: {}", self.hospitalized_code)?;
        Ok(())
    }
}
