use serde::Serialize;

use softmax_loss::GradCheckSample;

use crate::config::DemoConfig;

/// Loss and timing of one variant on the demo minibatch.
#[derive(Debug, Clone, Serialize)]
pub struct VariantRun {
    pub loss: f64,
    pub elapsed_ms: f64,
}

/// Everything the demo prints on stdout, as pretty JSON.
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub config: DemoConfig,
    pub naive: VariantRun,
    pub vectorized: VariantRun,
    /// `|loss_naive - loss_vectorized|`
    pub loss_difference: f64,
    /// Frobenius norm of `dW_naive - dW_vectorized`.
    pub gradient_difference: f64,
    /// ln(num_classes): what the loss should be close to with tiny weights.
    pub expected_initial_loss: f64,
    pub max_rel_error: f64,
    pub grad_check: Vec<GradCheckSample>,
}
