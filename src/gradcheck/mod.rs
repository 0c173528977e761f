pub mod check_config;
pub mod check_sample;
pub mod numerical;

pub use check_config::GradCheckConfig;
pub use check_sample::{GradCheckSample, max_rel_error};
pub use numerical::{eval_numerical_gradient, grad_check_sparse, relative_error};
