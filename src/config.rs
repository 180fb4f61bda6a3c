//! Run configuration of the estimator.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EstimatorError, Result};
use crate::optimizer::OptimizerConfig;

/// Sweep, optimizer and output settings.
///
/// Every field has a default, so a JSON file only needs the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Weights are swept in steps of `1 / range_weights` up to one half.
    pub range_weights: usize,
    /// Optimizer restarts per sweep point.
    pub iters: usize,
    pub prec: f64,
    pub min_val: f64,
    pub max_iter: usize,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Evaluate sweep points on the rayon pool.
    pub parallel: bool,
    pub data_dir: PathBuf,
    pub plots_dir: PathBuf,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            range_weights: 100,
            iters: 20,
            prec: 1e-7,
            min_val: 1000.0,
            max_iter: 2000,
            seed: None,
            parallel: false,
            data_dir: PathBuf::from("data"),
            plots_dir: PathBuf::from("plots"),
        }
    }
}

impl EstimatorConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.range_weights < 4 {
            return Err(EstimatorError::InvalidConfig(format!(
                "range_weights must be at least 4, got {}",
                self.range_weights
            )));
        }
        if self.iters == 0 {
            return Err(EstimatorError::InvalidConfig("iters must be positive".into()));
        }
        if self.prec.is_nan() || self.prec <= 0.0 {
            return Err(EstimatorError::InvalidConfig(format!(
                "prec must be positive, got {}",
                self.prec
            )));
        }
        if self.max_iter == 0 {
            return Err(EstimatorError::InvalidConfig("max_iter must be positive".into()));
        }
        Ok(())
    }

    /// Optimizer settings for one sweep point.
    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            iters: self.iters,
            prec: self.prec,
            min_val: self.min_val,
            max_iter: self.max_iter,
            ..OptimizerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EstimatorConfig::default();
        assert!(config.validate().is_ok());
        let opt = config.optimizer_config();
        assert_eq!(opt.iters, 20);
        assert_eq!(opt.prec, 1e-7);
        assert_eq!(opt.min_val, 1000.0);
        assert_eq!(opt.start.attempts, 10_000);
    }

    #[test]
    fn test_validate_rejects() {
        let bad = [
            EstimatorConfig {
                range_weights: 2,
                ..Default::default()
            },
            EstimatorConfig {
                iters: 0,
                ..Default::default()
            },
            EstimatorConfig {
                prec: 0.0,
                ..Default::default()
            },
            EstimatorConfig {
                prec: f64::NAN,
                ..Default::default()
            },
            EstimatorConfig {
                max_iter: 0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(EstimatorError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"range_weights": 20, "seed": 42, "parallel": true}}"#).unwrap();
        let config = EstimatorConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.range_weights, 20);
        assert_eq!(config.seed, Some(42));
        assert!(config.parallel);
        assert_eq!(config.iters, 20);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"iters": 0}}"#).unwrap();
        assert!(EstimatorConfig::from_json_file(file.path()).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            EstimatorConfig::from_json_file(file.path()),
            Err(EstimatorError::Json(_))
        ));
    }
}
