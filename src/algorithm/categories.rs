//! Category boundaries for continuous covariates
//!
//! BMI and MELD are stratified into half-open intervals `[b_k, b_{k+1})` over
//! an ascending boundary list. A value equal to the last boundary, or outside
//! the list altogether, belongs to no category; the default MELD boundaries
//! end at 40.1 so that the maximum score of 40 still falls in the top band.

use std::fmt;

/// Ascending boundaries defining `len() - 1` half-open categories
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBounds {
    bounds: Vec<f64>,
}

impl CategoryBounds {
    /// Wrap a boundary list; callers validate ordering through `StudyConfig::validate`
    #[must_use]
    pub fn new(bounds: Vec<f64>) -> Self {
        Self { bounds }
    }

    /// Number of categories
    #[must_use]
    pub fn len(&self) -> usize {
        self.bounds.len().saturating_sub(1)
    }

    /// Whether there are no categories
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `value` lies in category `index`
    #[must_use]
    pub fn contains(&self, index: usize, value: f64) -> bool {
        match (self.bounds.get(index), self.bounds.get(index + 1)) {
            (Some(&lower), Some(&upper)) => value >= lower && value < upper,
            _ => false,
        }
    }

    /// Index of the category containing `value`
    #[must_use]
    pub fn category_of(&self, value: f64) -> Option<usize> {
        (0..self.len()).find(|&index| self.contains(index, value))
    }

    /// Whether two values share category membership
    ///
    /// True when both fall in the same category, and also when both fall
    /// outside every category.
    #[must_use]
    pub fn same_category(&self, a: f64, b: f64) -> bool {
        (0..self.len()).all(|index| self.contains(index, a) == self.contains(index, b))
    }

    /// `(lower, upper)` of every category
    pub fn intervals(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bounds.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Human-readable label of a category, e.g. `[18.5, 25)`
    #[must_use]
    pub fn label(&self, index: usize) -> Option<String> {
        let lower = self.bounds.get(index)?;
        let upper = self.bounds.get(index + 1)?;
        Some(format!("[{lower}, {upper})"))
    }
}

impl fmt::Display for CategoryBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = (0..self.len()).filter_map(|i| self.label(i)).collect();
        write!(f, "{}", labels.join(" "))
    }
}
