use serde::{Serialize, Deserialize};

/// Selects which implementation of the softmax loss evaluates a minibatch.
///
/// - `Naive`      — explicit per-sample, per-class loops; the reference.
/// - `Vectorized` — whole-matrix operations; same results up to summation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftmaxVariant {
    Naive,
    Vectorized,
}

impl SoftmaxVariant {
    pub const ALL: [SoftmaxVariant; 2] = [SoftmaxVariant::Naive, SoftmaxVariant::Vectorized];
}
