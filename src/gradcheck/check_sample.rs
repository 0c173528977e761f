use serde::{Serialize, Deserialize};

/// One entry compared by `grad_check_sparse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradCheckSample {
    /// Row of the checked weight entry.
    pub row: usize,
    /// Column of the checked weight entry.
    pub col: usize,
    /// Centered finite-difference estimate.
    pub numerical: f64,
    /// Value taken from the analytic gradient.
    pub analytic: f64,
    /// `|numerical - analytic| / (|numerical| + |analytic|)`.
    pub rel_error: f64,
}

/// Largest relative error among `samples`, `0.0` when empty.
pub fn max_rel_error(samples: &[GradCheckSample]) -> f64 {
    samples.iter().map(|s| s.rel_error).fold(0.0, f64::max)
}
