//! Coded covariates of the transplant registry
//!
//! The registry stores categorical covariates as short strings, often as the
//! text form of a float (`"2.0"`, `"2010.0"`). These types turn the raw codes
//! into something the filters and the aggregator can match on; a code that
//! does not parse is a missing covariate.

use std::fmt;

/// Integer part of a numeric code (`"1234.0"` -> 1234)
///
/// The text must start with an ASCII digit; everything from the first `.` on
/// is ignored.
#[must_use]
pub fn integer_part(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if !raw.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let digits = raw.split_once('.').map_or(raw, |(int, _)| int);
    digits.parse().ok()
}

/// Diabetes category at transplant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiabetesCategory {
    /// No diabetes
    None,
    /// Type I
    Type1,
    /// Type II
    Type2,
    /// Other type
    Other,
    /// Diabetic, type unknown
    Unknown,
}

impl DiabetesCategory {
    /// Parse a registry code (`"1.0"` to `"5.0"`, or `"1"` to `"5"`)
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1.0" | "1" => Some(Self::None),
            "2.0" | "2" => Some(Self::Type1),
            "3.0" | "3" => Some(Self::Type2),
            "4.0" | "4" => Some(Self::Other),
            "5.0" | "5" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Whether the category counts as diabetic
    #[must_use]
    pub const fn is_diabetic(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// HCV serostatus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HcvSerostatus {
    /// `P`
    Positive,
    /// `N`
    Negative,
}

impl HcvSerostatus {
    /// Parse `P`/`N`; anything else (unknown, not done) is missing
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "P" => Some(Self::Positive),
            "N" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Malignancy ever reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Malignancy {
    /// `Y`
    Yes,
    /// `N`
    No,
}

impl Malignancy {
    /// Parse `Y`/`N`
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Y" => Some(Self::Yes),
            "N" => Some(Self::No),
            _ => None,
        }
    }
}

/// Functional status code at transplant (Karnofsky-style, `2010`..`2100`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionalStatus(pub u32);

impl FunctionalStatus {
    /// Parse a six-character numeric code
    ///
    /// Accepts the float rendering the registry exports (`"2010.0"`) as well
    /// as six plain digits. Any other length is a missing value.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != 6 {
            return None;
        }
        if raw.bytes().all(|b| b.is_ascii_digit()) {
            return raw.parse().ok().map(Self);
        }
        let value: f64 = raw.parse().ok()?;
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
            // Six characters bound the value well inside u32.
            Some(Self(value as u32))
        } else {
            None
        }
    }

    /// Numeric code
    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FunctionalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
