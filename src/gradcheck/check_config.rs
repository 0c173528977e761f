/// Configuration for a `grad_check_sparse` run.
///
/// # Fields
/// - `num_checks` — number of randomly sampled weight entries to check
/// - `step`       — half-width `h` of the centered difference `(f(w+h) - f(w-h)) / 2h`
/// - `seed`       — fixes the sampled entries when set; otherwise they are drawn from an entropy-seeded RNG
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradCheckConfig {
    pub num_checks: usize,
    pub step: f64,
    pub seed: Option<u64>,
}

impl GradCheckConfig {
    pub fn new(num_checks: usize, step: f64, seed: Option<u64>) -> Self {
        assert!(step > 0.0, "finite-difference step must be positive");
        GradCheckConfig { num_checks, step, seed }
    }
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        GradCheckConfig::new(10, 1e-5, None)
    }
}
