pub mod softmax;
pub mod variant;

pub use softmax::{softmax_loss, softmax_loss_naive, softmax_loss_vectorized};
pub use variant::SoftmaxVariant;
