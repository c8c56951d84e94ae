//! MELD 3.0 severity score
//!
//! MELD 3.0 = 1.33·female + 4.56·ln(bilirubin) + 0.82·(137 − Na)
//! − 0.24·(137 − Na)·ln(bilirubin) + 9.09·ln(INR) + 11.14·ln(creatinine)
//! + 1.85·(3.5 − albumin) − 1.83·(3.5 − albumin)·ln(creatinine) + 6
//!
//! with the lab values clamped to the ranges the score was fitted on and the
//! result capped at 40. The lower lab clamps keep every term non-negative, so
//! the score never drops below 6.

/// Lowest possible score
pub const MELD_MIN: u32 = 6;
/// Highest possible score
pub const MELD_MAX: u32 = 40;

/// Raw lab fields of one encounter, as found in the extract
#[derive(Debug, Clone, Copy, Default)]
pub struct MeldInputs<'a> {
    /// Sex (`F` for female)
    pub sex: &'a str,
    /// Serum creatinine, mg/dL
    pub creatinine: &'a str,
    /// Total bilirubin, mg/dL
    pub bilirubin: &'a str,
    /// INR
    pub inr: &'a str,
    /// Serum sodium, mEq/L
    pub sodium: &'a str,
    /// Serum albumin, g/dL
    pub albumin: &'a str,
    /// Dialysis flag (`Y` forces creatinine to the cap)
    pub dialysis: &'a str,
}

/// Parse a lab value; the registry always exports measured labs with a decimal point
fn lab_value(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.contains('.') {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Compute the MELD 3.0 score, or `None` when a lab value is missing or malformed
#[must_use]
pub fn meld_3_0(inputs: &MeldInputs<'_>) -> Option<u32> {
    let creatinine = lab_value(inputs.creatinine)?;
    let bilirubin = lab_value(inputs.bilirubin)?;
    let inr = lab_value(inputs.inr)?;
    let sodium = lab_value(inputs.sodium)?;
    let albumin = lab_value(inputs.albumin)?;

    let female = inputs.sex.trim_start().starts_with('F');
    let on_dialysis = inputs.dialysis.trim() == "Y";

    let bilirubin = bilirubin.max(1.0);
    let inr = inr.max(1.0);
    let creatinine = if on_dialysis {
        3.0
    } else {
        creatinine.clamp(1.0, 3.0)
    };
    let sodium = sodium.clamp(125.0, 137.0);
    let albumin = albumin.clamp(1.5, 3.5);

    let ln_bili = bilirubin.ln();
    let ln_cr = creatinine.ln();
    let sodium_gap = 137.0 - sodium;
    let albumin_gap = 3.5 - albumin;

    let mut score = if female { 1.33 } else { 0.0 };
    score += 4.56 * ln_bili + 0.82 * sodium_gap - 0.24 * sodium_gap * ln_bili
        + 9.09 * inr.ln()
        + 11.14 * ln_cr
        + 1.85 * albumin_gap
        - 1.83 * albumin_gap * ln_cr
        + 6.0;
    let score = score.min(f64::from(MELD_MAX));

    // Inside [6, 40] after the clamps above.
    Some(score.round() as u32)
}
