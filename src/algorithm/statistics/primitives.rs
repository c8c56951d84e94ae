//! Descriptive and test statistics
//!
//! Every function returns `None` where the statistic is undefined (empty
//! input, a single observation, zero expected count) so one empty stratum never
//! poisons the rest of a report.

/// Sum of the values; `None` for an empty slice
#[must_use]
pub fn sum(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum())
}

/// Arithmetic mean; `None` for an empty slice
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    sum(values).map(|total| total / values.len() as f64)
}

/// Sample standard deviation around a given mean (n − 1 denominator)
#[must_use]
pub fn sample_std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let squares: f64 = values.iter().map(|&x| (x - mean).powi(2)).sum();
    Some((squares / (values.len() - 1) as f64).sqrt())
}

/// Welch's t-statistic for two independent samples
///
/// `(mean_a − mean_b) / sqrt(sd_a²/n_a + sd_b²/n_b)`. Signed; reports take the
/// absolute value. `None` when either sample has fewer than two values or
/// both samples have zero variance.
#[must_use]
pub fn welch_t(group_a: &[f64], group_b: &[f64]) -> Option<f64> {
    let mean_a = mean(group_a)?;
    let mean_b = mean(group_b)?;
    let sd_a = sample_std_dev(group_a, mean_a)?;
    let sd_b = sample_std_dev(group_b, mean_b)?;

    let standard_error =
        (sd_a.powi(2) / group_a.len() as f64 + sd_b.powi(2) / group_b.len() as f64).sqrt();
    if standard_error == 0.0 || !standard_error.is_finite() {
        return None;
    }
    Some((mean_a - mean_b) / standard_error)
}

/// Chi-square contribution of one cell of a 2×k table
///
/// The cell is `sub_yes`; `sub_yes + sub_no` is its row total and
/// `pop_yes / (pop_yes + pop_no)` the column share. `None` when the expected
/// count is zero.
#[must_use]
pub fn chi_square(sub_yes: f64, sub_no: f64, pop_yes: f64, pop_no: f64) -> Option<f64> {
    let population = pop_yes + pop_no;
    if population == 0.0 {
        return None;
    }
    let expected = (sub_yes + sub_no) * (pop_yes / population);
    if expected == 0.0 {
        return None;
    }
    Some((sub_yes - expected).powi(2) / expected)
}

/// Chi-square over both cells of a row: the score with the yes/no roles taken
/// each way round, summed
#[must_use]
pub fn chi_square_symmetric(sub_yes: f64, sub_no: f64, pop_yes: f64, pop_no: f64) -> Option<f64> {
    let yes = chi_square(sub_yes, sub_no, pop_yes, pop_no)?;
    let no = chi_square(sub_no, sub_yes, pop_no, pop_yes)?;
    Some(yes + no)
}
