pub mod math;
pub mod loss;
pub mod gradcheck;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use loss::softmax::{softmax_loss, softmax_loss_naive, softmax_loss_vectorized};
pub use loss::variant::SoftmaxVariant;
pub use gradcheck::{GradCheckConfig, GradCheckSample, grad_check_sparse, eval_numerical_gradient};
