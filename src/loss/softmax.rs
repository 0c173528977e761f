use tracing::debug;

use crate::loss::variant::SoftmaxVariant;
use crate::math::matrix::Matrix;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Softmax cross-entropy loss and its gradient with respect to `w`, dispatched
/// on `variant`. Both variants return the same values up to summation order.
pub fn softmax_loss(
    variant: SoftmaxVariant,
    w: &Matrix,
    x: &Matrix,
    y: &[usize],
    reg: f64,
) -> (f64, Matrix) {
    match variant {
        SoftmaxVariant::Naive      => softmax_loss_naive(w, x, y, reg),
        SoftmaxVariant::Vectorized => softmax_loss_vectorized(w, x, y, reg),
    }
}

/// Softmax loss, naive implementation (explicit loops).
///
/// Inputs have dimension D, there are C classes, and we operate on
/// minibatches of N examples.
///
/// # Arguments
/// - `w`   — weights, shape (D, C)
/// - `x`   — minibatch of data, shape (N, D)
/// - `y`   — labels, length N; `y[i] = c` means `x[i]` has label `c`, `0 <= c < C`
/// - `reg` — L2 regularization strength
///
/// Returns `(loss, dW)` where `dW` has the shape of `w`:
///   loss = mean_i(-log softmax(Wᵀ·x_i)[y_i]) + 0.5·reg·Σ W²
///   dW   = mean_i((p_i - onehot(y_i)) ⊗ x_i) + reg·W
///
/// # Panics
/// Panics if the shapes are inconsistent, `x` is empty, or a label is out of range.
pub fn softmax_loss_naive(w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> (f64, Matrix) {
    check_inputs(w, x, y);

    let num_features = w.rows;
    let num_classes = w.cols;
    let num_train = x.rows;

    let mut loss = 0.0;
    let mut dw = Matrix::zeros(num_features, num_classes);
    let mut scores = vec![0.0; num_classes];

    for (xi, &yi) in x.data.iter().zip(y.iter()) {
        // scores = Wᵀ·x_i
        for (j, score) in scores.iter_mut().enumerate() {
            *score = 0.0;
            for d in 0..num_features {
                *score += w.data[d][j] * xi[d];
            }
        }

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut sum_exp = 0.0;
        for score in scores.iter_mut() {
            *score -= max;
            sum_exp += score.exp();
        }

        // -log(exp(s_y) / Σ exp(s)), kept finite when the ratio underflows.
        loss += sum_exp.ln() - scores[yi];

        for j in 0..num_classes {
            let p = scores[j].exp() / sum_exp;
            let coeff = if j == yi { p - 1.0 } else { p };
            for d in 0..num_features {
                dw.data[d][j] += coeff * xi[d];
            }
        }
    }

    let inv_n = 1.0 / num_train as f64;
    let loss = loss * inv_n + 0.5 * reg * w.sum_squares();
    for (dw_row, w_row) in dw.data.iter_mut().zip(w.data.iter()) {
        for (g, &wv) in dw_row.iter_mut().zip(w_row.iter()) {
            *g = *g * inv_n + reg * wv;
        }
    }

    debug!(num_train, num_features, num_classes, loss, "softmax loss (naive)");
    (loss, dw)
}

/// Softmax loss, vectorized version.
///
/// Inputs, outputs and panics are the same as `softmax_loss_naive`. The whole
/// minibatch goes through batched matrix operations:
///
///   S = X·W                         (N, C) scores
///   S -= rowmax(S)                  stabilized
///   P = exp(S) / rowsum(exp(S))     probabilities
///   G = P, G[i, y_i] -= 1           per-sample, per-class adjustment
///   dW = Xᵀ·G / N + reg·W
pub fn softmax_loss_vectorized(w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> (f64, Matrix) {
    check_inputs(w, x, y);

    let num_train = x.rows as f64;

    let scores = x.dot(w);
    let shifted = scores.sub_per_row(&scores.row_max());
    let exp = shifted.map(f64::exp);
    let sums = exp.row_sum();

    let log_sums: f64 = sums.iter().map(|s| s.ln()).sum();
    let correct: f64 = shifted.gather(y).iter().sum();
    let loss = (log_sums - correct) / num_train + 0.5 * reg * w.sum_squares();

    let mut grad = exp.div_per_row(&sums);
    grad.add_at(y, -1.0);
    let dw = x.transpose().dot(&grad).scale(1.0 / num_train) + w.scale(reg);

    debug!(
        num_train = x.rows,
        num_features = w.rows,
        num_classes = w.cols,
        loss,
        "softmax loss (vectorized)"
    );
    (loss, dw)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn check_inputs(w: &Matrix, x: &Matrix, y: &[usize]) {
    assert!(x.rows > 0, "minibatch must contain at least one sample");
    assert_eq!(
        x.cols, w.rows,
        "data has {} features but weights expect {}",
        x.cols, w.rows
    );
    assert_eq!(
        x.rows,
        y.len(),
        "data has {} samples but {} labels were given",
        x.rows,
        y.len()
    );
    if let Some(&bad) = y.iter().find(|&&label| label >= w.cols) {
        panic!("label {} out of range for {} classes", bad, w.cols);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradcheck::numerical::{eval_numerical_gradient, relative_error};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_problem(seed: u64, n: usize, d: usize, c: usize) -> (Matrix, Matrix, Vec<usize>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let w = Matrix::gaussian(d, c, 0.01, &mut rng);
        let x = Matrix::gaussian(n, d, 1.0, &mut rng);
        let y = (0..n).map(|_| rng.gen_range(0..c)).collect();
        (w, x, y)
    }

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!(
            relative_error(a, b) < tol,
            "{a} and {b} differ by relative error {}",
            relative_error(a, b)
        );
    }

    #[test]
    fn zero_weights_give_log_num_classes() {
        let (_, x, y) = random_problem(3, 20, 7, 5);
        let w = Matrix::zeros(7, 5);

        // Uniform softmax: G = 1/C everywhere, minus one at the true class.
        let mut g = Matrix::from_data(vec![vec![1.0 / 5.0; 5]; 20]);
        g.add_at(&y, -1.0);
        let expected_grad = x.transpose().dot(&g).scale(1.0 / 20.0);

        for variant in SoftmaxVariant::ALL {
            let (loss, dw) = softmax_loss(variant, &w, &x, &y, 0.0);
            assert!((loss - 5f64.ln()).abs() < 1e-12, "{variant:?}: loss = {loss}");
            assert!(dw.max_abs_diff(&expected_grad) < 1e-12, "{variant:?}");
        }
    }

    #[test]
    fn naive_and_vectorized_agree() {
        let (w, x, y) = random_problem(11, 50, 30, 10);
        let (loss_naive, grad_naive) = softmax_loss_naive(&w, &x, &y, 5e-2);
        let (loss_vec, grad_vec) = softmax_loss_vectorized(&w, &x, &y, 5e-2);

        assert_close(loss_naive, loss_vec, 1e-10);
        let scale = grad_naive.frobenius_norm().max(1e-12);
        assert!(grad_naive.max_abs_diff(&grad_vec) / scale < 1e-10);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let (w, x, y) = random_problem(5, 8, 4, 3);
        let reg = 0.1;
        for variant in SoftmaxVariant::ALL {
            let (_, analytic) = softmax_loss(variant, &w, &x, &y, reg);
            let numerical = eval_numerical_gradient(|w| softmax_loss(variant, w, &x, &y, reg).0, &w, 1e-5);
            for i in 0..w.rows {
                for j in 0..w.cols {
                    let (a, n) = (analytic.data[i][j], numerical.data[i][j]);
                    assert!(
                        (a - n).abs() < 1e-7 || relative_error(a, n) < 1e-5,
                        "{variant:?} [{i},{j}]: analytic {a} vs numerical {n}"
                    );
                }
            }
        }
    }

    #[test]
    fn regularization_adds_half_squared_norm_and_scaled_weights() {
        let (w, x, y) = random_problem(9, 10, 6, 4);
        let reg = 0.3;
        for variant in SoftmaxVariant::ALL {
            let (loss0, grad0) = softmax_loss(variant, &w, &x, &y, 0.0);
            let (loss1, grad1) = softmax_loss(variant, &w, &x, &y, reg);
            assert!((loss1 - loss0 - 0.5 * reg * w.sum_squares()).abs() < 1e-12);
            assert!((grad1 - grad0).max_abs_diff(&w.scale(reg)) < 1e-12);
        }
    }

    #[test]
    fn dominant_correct_score_drives_loss_and_gradient_to_zero() {
        let x = Matrix::from_data(vec![vec![1.0, 0.5]]);
        let mut w = Matrix::zeros(2, 3);
        w.data[0][1] = 40.0;
        let y = [1];

        for variant in SoftmaxVariant::ALL {
            let (loss, dw) = softmax_loss(variant, &w, &x, &y, 0.0);
            assert!(loss >= 0.0 && loss < 1e-15, "{variant:?}: loss = {loss}");
            assert!(dw.data.iter().flatten().all(|g| g.abs() < 1e-15), "{variant:?}");
        }
    }

    #[test]
    fn extreme_scores_stay_finite() {
        let x = Matrix::from_data(vec![vec![1.0], vec![1.0]]);
        let w = Matrix::from_data(vec![vec![1000.0, -1000.0, 0.0]]);
        let y = [1, 0];

        for variant in SoftmaxVariant::ALL {
            let (loss, dw) = softmax_loss(variant, &w, &x, &y, 0.0);
            // Sample 0 pays 2000, sample 1 pays nothing.
            assert!((loss - 1000.0).abs() < 1e-9, "{variant:?}: loss = {loss}");
            assert!(dw.data.iter().flatten().all(|g| g.is_finite()), "{variant:?}");
        }
    }

    #[test]
    fn inputs_are_left_untouched() {
        let (w, x, y) = random_problem(2, 6, 5, 3);
        let (w0, x0, y0) = (w.clone(), x.clone(), y.clone());
        for variant in SoftmaxVariant::ALL {
            let _ = softmax_loss(variant, &w, &x, &y, 1.0);
        }
        assert_eq!((w, x, y), (w0, x0, y0));
    }

    #[test]
    #[should_panic(expected = "labels were given")]
    fn label_count_mismatch_panics() {
        let (w, x, _) = random_problem(1, 4, 3, 2);
        softmax_loss_vectorized(&w, &x, &[0, 1, 0], 0.0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_label_panics() {
        let (w, x, _) = random_problem(1, 2, 3, 2);
        softmax_loss_naive(&w, &x, &[0, 2], 0.0);
    }

    #[test]
    #[should_panic(expected = "features")]
    fn feature_mismatch_panics() {
        let (_, x, y) = random_problem(1, 2, 3, 2);
        softmax_loss_naive(&Matrix::zeros(4, 2), &x, &y, 0.0);
    }
}
