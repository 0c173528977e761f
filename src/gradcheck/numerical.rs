use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::gradcheck::check_config::GradCheckConfig;
use crate::gradcheck::check_sample::GradCheckSample;
use crate::math::matrix::Matrix;

/// `|a - b| / (|a| + |b|)`, or `0.0` when both are zero.
pub fn relative_error(a: f64, b: f64) -> f64 {
    let denom = a.abs() + b.abs();
    if denom == 0.0 {
        0.0
    } else {
        (a - b).abs() / denom
    }
}

/// Centered finite-difference gradient of `f` at `w`, for every entry.
///
/// Costs `2 · rows · cols` evaluations of `f`; use `grad_check_sparse` for
/// anything larger than a toy problem. `w` itself is not modified.
pub fn eval_numerical_gradient<F>(mut f: F, w: &Matrix, step: f64) -> Matrix
where
    F: FnMut(&Matrix) -> f64,
{
    let mut probe = w.clone();
    let mut grad = Matrix::zeros(w.rows, w.cols);

    for i in 0..w.rows {
        for j in 0..w.cols {
            grad.data[i][j] = centered_difference(&mut f, &mut probe, i, j, step);
        }
    }

    grad
}

/// Compares `analytic` against centered finite differences of `f` at
/// `config.num_checks` randomly chosen entries of `w`.
///
/// Entries are sampled with replacement. Returns one `GradCheckSample` per
/// check, in sampling order; each is also logged at `debug` level.
///
/// # Panics
/// Panics if `analytic` does not have the shape of `w`.
pub fn grad_check_sparse<F>(
    mut f: F,
    w: &Matrix,
    analytic: &Matrix,
    config: &GradCheckConfig,
) -> Vec<GradCheckSample>
where
    F: FnMut(&Matrix) -> f64,
{
    assert!(
        analytic.rows == w.rows && analytic.cols == w.cols,
        "analytic gradient is {}x{} but weights are {}x{}",
        analytic.rows, analytic.cols, w.rows, w.cols
    );
    if w.rows == 0 || w.cols == 0 {
        return Vec::new();
    }

    let mut rng = config.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let mut probe = w.clone();

    (0..config.num_checks)
        .map(|_| {
            let row = rng.gen_range(0..w.rows);
            let col = rng.gen_range(0..w.cols);
            let numerical = centered_difference(&mut f, &mut probe, row, col, config.step);
            let analytic = analytic.data[row][col];
            let rel_error = relative_error(numerical, analytic);
            debug!(row, col, numerical, analytic, rel_error, "gradient check");
            GradCheckSample { row, col, numerical, analytic, rel_error }
        })
        .collect()
}

/// `(f(w + h·e_ij) - f(w - h·e_ij)) / 2h`, restoring `probe[i][j]` afterwards.
fn centered_difference<F>(f: &mut F, probe: &mut Matrix, i: usize, j: usize, h: f64) -> f64
where
    F: FnMut(&Matrix) -> f64,
{
    let old = probe.data[i][j];

    probe.data[i][j] = old + h;
    let fxph = f(&*probe);
    probe.data[i][j] = old - h;
    let fxmh = f(&*probe);
    probe.data[i][j] = old;

    (fxph - fxmh) / (2.0 * h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradcheck::check_sample::max_rel_error;
    use crate::loss::softmax::softmax_loss_vectorized;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn relative_error_is_symmetric_and_zero_safe() {
        assert_eq!(relative_error(0.0, 0.0), 0.0);
        assert_eq!(relative_error(1.0, 3.0), 0.5);
        assert_eq!(relative_error(3.0, 1.0), 0.5);
        assert_eq!(relative_error(2.0, -2.0), 1.0);
    }

    #[test]
    fn numerical_gradient_of_quadratic() {
        // f(W) = Σ W², ∇f = 2W
        let w = Matrix::from_data(vec![vec![1.0, -2.0], vec![0.5, 3.0]]);
        let grad = eval_numerical_gradient(|m| m.sum_squares(), &w, 1e-5);
        assert!(grad.max_abs_diff(&w.scale(2.0)) < 1e-8);
    }

    #[test]
    fn probe_does_not_leak_into_weights() {
        let w = Matrix::from_data(vec![vec![1.0, 2.0, 3.0]]);
        let before = w.clone();
        let _ = eval_numerical_gradient(|m| m.sum(), &w, 0.1);
        assert_eq!(w, before);
    }

    #[test]
    fn sparse_check_passes_for_softmax_gradient() {
        let mut rng = StdRng::seed_from_u64(42);
        let w = Matrix::gaussian(20, 5, 1e-2, &mut rng);
        let x = Matrix::gaussian(30, 20, 1.0, &mut rng);
        let y: Vec<usize> = (0..30).map(|_| rng.gen_range(0..5)).collect();
        let reg = 1e-1;

        let (_, analytic) = softmax_loss_vectorized(&w, &x, &y, reg);
        let config = GradCheckConfig::new(15, 1e-5, Some(7));
        let samples = grad_check_sparse(|w| softmax_loss_vectorized(w, &x, &y, reg).0, &w, &analytic, &config);

        assert_eq!(samples.len(), 15);
        for s in &samples {
            assert!(s.row < 20 && s.col < 5);
            assert!(
                (s.numerical - s.analytic).abs() < 1e-7 || s.rel_error < 1e-5,
                "sample {s:?}"
            );
        }
    }

    #[test]
    fn sparse_check_flags_a_wrong_gradient() {
        let w = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let wrong = w.scale(10.0);
        let samples = grad_check_sparse(|m| m.sum_squares(), &w, &wrong, &GradCheckConfig::new(4, 1e-5, Some(1)));
        // 2w vs 10w: relative error 8/12
        assert!((max_rel_error(&samples) - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn seeded_checks_sample_the_same_entries() {
        let w = Matrix::zeros(6, 6);
        let config = GradCheckConfig::new(5, 1e-3, Some(99));
        let positions = |samples: Vec<GradCheckSample>| -> Vec<(usize, usize)> {
            samples.into_iter().map(|s| (s.row, s.col)).collect()
        };
        let a = positions(grad_check_sparse(|m| m.sum(), &w, &w, &config));
        let b = positions(grad_check_sparse(|m| m.sum(), &w, &w, &config));
        assert_eq!(a, b);
    }

    #[test]
    fn empty_weights_yield_no_samples() {
        let w = Matrix::zeros(0, 3);
        let samples = grad_check_sparse(|_| 0.0, &w, &w, &GradCheckConfig::default());
        assert!(samples.is_empty());
    }
}
