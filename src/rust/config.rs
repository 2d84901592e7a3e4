/// Hyperparameters for a training run.
///
/// The defaults reproduce the reference pipeline: a 5000-term vocabulary,
/// an 80/20 split with seed 42, and at most 200 optimizer iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Upper bound on the vectorizer vocabulary
    pub max_features: usize,
    /// Share of each category held out for evaluation
    pub test_fraction: f64,
    /// Seed for the train/evaluation shuffle
    pub seed: u64,
    /// Optimizer iteration cap
    pub max_iterations: usize,
    /// Inverse L2 regularization strength (C)
    pub regularization: f64,
    pub learning_rate: f64,
    /// Stop once every gradient entry is below this
    pub tolerance: f64,
    /// Split each category separately so every one appears on both sides
    pub stratify: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            test_fraction: 0.2,
            seed: 42,
            max_iterations: 200,
            regularization: 1.0,
            learning_rate: 1.0,
            tolerance: 1e-4,
            stratify: true,
        }
    }
}

impl TrainingConfig {
    /// Rejects settings the trainer cannot work with.
    pub fn validate(&self) -> Result<(), crate::CategorizerError> {
        use crate::CategorizerError::InvalidInput;

        if self.max_features == 0 {
            return Err(InvalidInput("max_features must be greater than zero".into()));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(InvalidInput(format!(
                "test_fraction must be between 0 and 1 (exclusive), got {}", self.test_fraction
            )));
        }
        if !(self.regularization > 0.0 && self.regularization.is_finite()) {
            return Err(InvalidInput(format!("regularization must be positive, got {}", self.regularization)));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(InvalidInput(format!("learning_rate must be positive, got {}", self.learning_rate)));
        }
        if self.tolerance < 0.0 {
            return Err(InvalidInput(format!("tolerance cannot be negative, got {}", self.tolerance)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TrainingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_features, 5000);
        assert_eq!(config.max_iterations, 200);
    }

    #[test]
    fn test_invalid_settings() {
        let bad_fraction = TrainingConfig { test_fraction: 1.0, ..TrainingConfig::default() };
        assert!(bad_fraction.validate().is_err());

        let bad_cap = TrainingConfig { max_features: 0, ..TrainingConfig::default() };
        assert!(bad_cap.validate().is_err());

        let bad_c = TrainingConfig { regularization: 0.0, ..TrainingConfig::default() };
        assert!(bad_c.validate().is_err());
    }
}
