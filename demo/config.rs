use rand::Rng;
use serde::{Serialize, Deserialize};
use tracing::info;

use softmax_loss::Matrix;

/// Shape and hyperparameters of the synthetic minibatch the demo evaluates.
///
/// Every field is optional in the JSON file; missing ones take the defaults,
/// which mirror a CIFAR-10 sized development batch (3072 pixels plus a bias
/// column, ten classes).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub num_train: usize,
    pub num_features: usize,
    pub num_classes: usize,
    /// L2 regularization strength passed to both variants.
    pub reg: f64,
    /// Standard deviation of the initial weights.
    pub weight_scale: f64,
    /// Seeds data generation and the sparse gradient check. `None` = entropy.
    pub seed: Option<u64>,
    pub grad_checks: usize,
    /// JSON weights (as written by `Matrix::save_json`) to evaluate instead
    /// of freshly generated ones. Must be `num_features x num_classes`.
    pub load_weights: Option<String>,
    /// Where to write the weights the run used.
    pub save_weights: Option<String>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            num_train: 500,
            num_features: 3073,
            num_classes: 10,
            reg: 5e-6,
            weight_scale: 1e-4,
            seed: Some(231),
            grad_checks: 10,
            load_weights: None,
            save_weights: None,
        }
    }
}

impl DemoConfig {
    /// Reads a config from a JSON file.
    pub fn load_json(path: &str) -> std::io::Result<DemoConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: DemoConfig = serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Weights for this run: loaded from `load_weights` when set, otherwise
    /// sampled from N(0, weight_scale²). Written to `save_weights` when set.
    pub fn initial_weights<R: Rng + ?Sized>(&self, rng: &mut R) -> std::io::Result<Matrix> {
        let w = match &self.load_weights {
            Some(path) => {
                let w = Matrix::load_json(path)?;
                if w.rows != self.num_features || w.cols != self.num_classes {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!(
                            "weights in {} are {}x{}, expected {}x{}",
                            path, w.rows, w.cols, self.num_features, self.num_classes
                        ),
                    ));
                }
                info!(path = %path, "loaded weights");
                w
            }
            None => Matrix::gaussian(self.num_features, self.num_classes, self.weight_scale, rng),
        };

        if let Some(path) = &self.save_weights {
            w.save_json(path)?;
            info!(path = %path, "saved weights");
        }
        Ok(w)
    }

    fn validate(&self) -> std::io::Result<()> {
        if self.num_train == 0 || self.num_features == 0 || self.num_classes == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "num_train, num_features and num_classes must all be positive",
            ));
        }
        if self.reg.is_nan() || self.reg < 0.0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "reg must be non-negative",
            ));
        }
        Ok(())
    }
}
