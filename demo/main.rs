/// softmax-loss demo
///
/// Builds a synthetic minibatch, evaluates the softmax loss with both the
/// naive and the vectorized implementation, compares them, and spot-checks
/// the analytic gradient against finite differences.
///
/// Run with:
///   cargo run --bin softmax-demo --release [config.json]
///
/// The JSON report goes to stdout; logs go to stderr (`RUST_LOG=debug` shows
/// every gradient check).

mod config;
mod logging;
mod report;

use std::time::Instant;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{info, warn};

use softmax_loss::{
    gradcheck::max_rel_error,
    grad_check_sparse,
    softmax_loss,
    GradCheckConfig,
    Matrix,
    SoftmaxVariant,
};

use config::DemoConfig;
use report::{DemoReport, VariantRun};

/// Relative error above which the gradient check is reported as suspicious.
const REL_ERROR_WARN: f64 = 1e-5;

fn main() -> std::io::Result<()> {
    logging::init().map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!(path = %path, "loading demo config");
            DemoConfig::load_json(&path)?
        }
        None => DemoConfig::default(),
    };
    info!(?config, "starting");

    let mut rng = config.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let w = config.initial_weights(&mut rng)?;
    let x = Matrix::gaussian(config.num_train, config.num_features, 1.0, &mut rng);
    let y: Vec<usize> = (0..config.num_train)
        .map(|_| rng.gen_range(0..config.num_classes))
        .collect();

    let (naive, grad_naive) = timed(SoftmaxVariant::Naive, &w, &x, &y, config.reg);
    let (vectorized, grad_vectorized) = timed(SoftmaxVariant::Vectorized, &w, &x, &y, config.reg);

    let loss_difference = (naive.loss - vectorized.loss).abs();
    let gradient_difference = (grad_naive - grad_vectorized.clone()).frobenius_norm();
    info!(loss_difference, gradient_difference, "naive vs vectorized");

    let check_config = GradCheckConfig::new(config.grad_checks, 1e-5, config.seed);
    let grad_check = grad_check_sparse(
        |w| softmax_loss(SoftmaxVariant::Vectorized, w, &x, &y, config.reg).0,
        &w,
        &grad_vectorized,
        &check_config,
    );
    let worst = max_rel_error(&grad_check);
    if worst > REL_ERROR_WARN {
        warn!(max_rel_error = worst, "gradient check exceeded tolerance");
    } else {
        info!(max_rel_error = worst, checks = grad_check.len(), "gradient check passed");
    }

    let report = DemoReport {
        expected_initial_loss: (config.num_classes as f64).ln(),
        config,
        naive,
        vectorized,
        loss_difference,
        gradient_difference,
        max_rel_error: worst,
        grad_check,
    };

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    println!("{json}");
    Ok(())
}

/// Evaluates one variant and records its wall-clock time.
fn timed(
    variant: SoftmaxVariant,
    w: &Matrix,
    x: &Matrix,
    y: &[usize],
    reg: f64,
) -> (VariantRun, Matrix) {
    let t_start = Instant::now();
    let (loss, grad) = softmax_loss(variant, w, x, y, reg);
    let elapsed_ms = t_start.elapsed().as_secs_f64() * 1000.0;
    info!(?variant, loss, elapsed_ms, "evaluated softmax loss");
    (VariantRun { loss, elapsed_ms }, grad)
}
