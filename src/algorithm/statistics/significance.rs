//! p-values for the chi-square and Welch t scores

use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};

use super::primitives;

/// Upper-tail probability of a chi-square score
#[must_use]
pub fn chi_square_p_value(score: f64, degrees_of_freedom: f64) -> Option<f64> {
    if !score.is_finite() || score < 0.0 {
        return None;
    }
    let distribution = ChiSquared::new(degrees_of_freedom).ok()?;
    Some(distribution.sf(score))
}

/// Welch–Satterthwaite degrees of freedom for two samples
#[must_use]
pub fn welch_degrees_of_freedom(group_a: &[f64], group_b: &[f64]) -> Option<f64> {
    let n_a = group_a.len() as f64;
    let n_b = group_b.len() as f64;
    let var_a = primitives::sample_std_dev(group_a, primitives::mean(group_a)?)?.powi(2) / n_a;
    let var_b = primitives::sample_std_dev(group_b, primitives::mean(group_b)?)?.powi(2) / n_b;

    let denominator = var_a.powi(2) / (n_a - 1.0) + var_b.powi(2) / (n_b - 1.0);
    if denominator == 0.0 {
        return None;
    }
    let df = (var_a + var_b).powi(2) / denominator;
    df.is_finite().then_some(df)
}

/// Two-sided p-value of Welch's t-test
#[must_use]
pub fn welch_t_p_value(group_a: &[f64], group_b: &[f64]) -> Option<f64> {
    let t = primitives::welch_t(group_a, group_b)?;
    let df = welch_degrees_of_freedom(group_a, group_b)?;
    let distribution = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * distribution.sf(t.abs())).min(1.0))
}
