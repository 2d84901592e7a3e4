use std::collections::BTreeSet;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use log::{debug, info, warn};

use super::category::Category;
use super::error::CategorizerError;
use super::utils::{argmax, softmax};
use crate::config::TrainingConfig;

/// Outcome of an optimizer run
#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    /// Gradient steps taken
    pub iterations: usize,
    /// Whether the gradient fell below the tolerance before the iteration cap
    pub converged: bool,
    /// Regularized objective of the returned weights
    pub objective: f64,
}

/// Multinomial logistic regression over TF-IDF features.
///
/// Scores are `W x + b`, one row of `W` per class. Classes are kept in
/// sorted order and the highest score wins, with ties going to the first
/// class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    classes: Vec<Category>,
    coefficients: Array2<f64>,
    intercepts: Array1<f64>,
}

impl LogisticRegression {
    /// Fits the model with full-batch gradient descent.
    ///
    /// Minimizes the mean cross-entropy plus `||W||^2 / (2 C n)`; intercepts
    /// are not penalized. If `max_iterations` runs out before the gradient
    /// drops below `tolerance`, the iterate with the lowest objective seen is
    /// returned.
    ///
    /// # Errors
    /// - `InsufficientData` if there are no rows or fewer than two classes
    /// - `DataFormat` if the number of labels does not match the number of rows
    pub fn fit(
        features: &Array2<f64>,
        labels: &[Category],
        config: &TrainingConfig,
    ) -> Result<(Self, FitSummary), CategorizerError> {
        let (n_samples, n_features) = features.dim();
        if n_samples != labels.len() {
            return Err(CategorizerError::DataFormat(format!(
                "{} feature rows but {} labels", n_samples, labels.len()
            )));
        }
        if n_samples == 0 {
            return Err(CategorizerError::InsufficientData("No training rows".into()));
        }

        let classes: Vec<Category> = labels.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
        if classes.len() < 2 {
            return Err(CategorizerError::InsufficientData(format!(
                "At least two categories are required, found {}", classes.len()
            )));
        }

        let mut targets = Array2::<f64>::zeros((n_samples, classes.len()));
        for (row, label) in labels.iter().enumerate() {
            let class = classes.binary_search(label)
                .map_err(|_| CategorizerError::DataFormat(format!("Unknown label '{}'", label)))?;
            targets[[row, class]] = 1.0;
        }

        info!(
            "Fitting logistic regression: {} samples, {} features, {} classes",
            n_samples, n_features, classes.len()
        );

        let n = n_samples as f64;
        let penalty = 1.0 / (config.regularization * n);
        let mut coefficients = Array2::<f64>::zeros((classes.len(), n_features));
        let mut intercepts = Array1::<f64>::zeros(classes.len());

        let objective = |w: &Array2<f64>, b: &Array1<f64>| -> (f64, Array2<f64>) {
            let mut probabilities = features.dot(&w.t()) + b;
            for mut row in probabilities.rows_mut() {
                let p = softmax(row.view());
                row.assign(&p);
            }
            let cross_entropy: f64 = probabilities.iter()
                .zip(targets.iter())
                .filter(|pair| *pair.1 > 0.0)
                .map(|(p, _)| -p.max(f64::MIN_POSITIVE).ln())
                .sum();
            let loss = cross_entropy / n + 0.5 * penalty * w.iter().map(|x| x * x).sum::<f64>();
            (loss, probabilities)
        };

        let mut best = (f64::INFINITY, coefficients.clone(), intercepts.clone());
        let mut iterations = 0;
        let mut converged = false;

        while iterations < config.max_iterations {
            let (loss, probabilities) = objective(&coefficients, &intercepts);
            if loss < best.0 {
                best = (loss, coefficients.clone(), intercepts.clone());
            }

            let residuals = probabilities - &targets;
            let grad_w = residuals.t().dot(features) / n + &coefficients * penalty;
            let grad_b = residuals.sum_axis(Axis(0)) / n;

            let max_gradient = grad_w.iter().chain(grad_b.iter())
                .fold(0.0f64, |acc, g| acc.max(g.abs()));
            if max_gradient < config.tolerance {
                converged = true;
                break;
            }

            coefficients.scaled_add(-config.learning_rate, &grad_w);
            intercepts.scaled_add(-config.learning_rate, &grad_b);
            iterations += 1;

            if iterations % 50 == 0 {
                debug!("Iteration {}: objective {:.6}, max gradient {:.3e}", iterations, loss, max_gradient);
            }
        }

        if !converged {
            let (loss, _) = objective(&coefficients, &intercepts);
            if loss < best.0 {
                best = (loss, coefficients, intercepts);
            }
            warn!(
                "Optimizer did not converge within {} iterations; keeping best iterate (objective {:.6})",
                config.max_iterations, best.0
            );
        } else {
            // the converged iterate is the latest one evaluated
            let (loss, _) = objective(&coefficients, &intercepts);
            best = (loss, coefficients, intercepts);
            info!("Optimizer converged after {} iterations", iterations);
        }

        let (objective, coefficients, intercepts) = best;
        let model = Self { classes, coefficients, intercepts };
        Ok((model, FitSummary { iterations, converged, objective }))
    }

    /// Raw class scores `W x + b`
    pub fn decision_function(&self, features: ArrayView1<f64>) -> Array1<f64> {
        self.coefficients.dot(&features) + &self.intercepts
    }

    /// Class probabilities in [`Self::classes`] order
    pub fn predict_proba(&self, features: ArrayView1<f64>) -> Array1<f64> {
        softmax(self.decision_function(features).view())
    }

    /// The highest-scoring class
    pub fn predict(&self, features: ArrayView1<f64>) -> &Category {
        let scores = self.decision_function(features);
        // classes is never empty for a fitted or validated model
        let best = argmax(scores.view()).unwrap_or(0);
        &self.classes[best]
    }

    pub fn classes(&self) -> &[Category] {
        &self.classes
    }

    /// Input dimensionality the coefficients were fitted for
    pub fn n_features(&self) -> usize {
        self.coefficients.ncols()
    }

    /// Checks internal consistency of a deserialized model.
    pub(crate) fn validate(&self) -> Result<(), CategorizerError> {
        if self.classes.len() < 2 {
            return Err(CategorizerError::ArtifactLoad(format!(
                "Model must have at least two classes, found {}", self.classes.len()
            )));
        }
        if self.classes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(CategorizerError::ArtifactLoad("Model classes are not sorted and unique".into()));
        }
        if self.coefficients.nrows() != self.classes.len() || self.intercepts.len() != self.classes.len() {
            return Err(CategorizerError::ArtifactLoad(format!(
                "Model has {} classes but {} coefficient rows and {} intercepts",
                self.classes.len(), self.coefficients.nrows(), self.intercepts.len()
            )));
        }
        if self.coefficients.iter().chain(self.intercepts.iter()).any(|w| !w.is_finite()) {
            return Err(CategorizerError::ArtifactLoad("Model contains non-finite weights".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labels(names: &[&str]) -> Vec<Category> {
        names.iter().map(|&n| Category::new(n).unwrap()).collect()
    }

    #[test]
    fn test_separable_data() {
        let x = array![[1.0, 0.0], [0.9, 0.1], [0.0, 1.0], [0.1, 0.9]];
        let y = labels(&["Transport", "Transport", "Food", "Food"]);
        let (model, summary) = LogisticRegression::fit(&x, &y, &TrainingConfig::default()).unwrap();

        assert_eq!(model.classes(), labels(&["Food", "Transport"]).as_slice());
        assert_eq!(model.predict(array![1.0, 0.0].view()), "Transport");
        assert_eq!(model.predict(array![0.0, 1.0].view()), "Food");
        assert!(summary.objective.is_finite());
        assert!(model.validate().is_ok());

        let p = model.predict_proba(array![1.0, 0.0].view());
        assert!((p.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_iteration_cap_returns_best_iterate() {
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        let y = labels(&["A", "B"]);
        let config = TrainingConfig { max_iterations: 1, tolerance: 0.0, ..TrainingConfig::default() };
        let (model, summary) = LogisticRegression::fit(&x, &y, &config).unwrap();
        assert!(!summary.converged);
        assert_eq!(summary.iterations, 1);
        // one step already beats the all-zero start
        assert!(summary.objective < 2.0f64.ln());
        assert_eq!(model.predict(array![1.0, 0.0].view()), "A");
    }

    #[test]
    fn test_zero_iterations_keeps_zero_weights() {
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        let y = labels(&["A", "B"]);
        let config = TrainingConfig { max_iterations: 0, ..TrainingConfig::default() };
        let (model, summary) = LogisticRegression::fit(&x, &y, &config).unwrap();
        assert_eq!(summary.iterations, 0);
        // all scores tie, so the first class wins
        assert_eq!(model.predict(array![0.0, 1.0].view()), "A");
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[1.0], [1.0]];
        let y = labels(&["A", "A"]);
        let result = LogisticRegression::fit(&x, &y, &TrainingConfig::default());
        assert!(matches!(result, Err(CategorizerError::InsufficientData(_))));
    }

    #[test]
    fn test_label_count_mismatch() {
        let x = array![[1.0], [0.0]];
        let y = labels(&["A"]);
        let result = LogisticRegression::fit(&x, &y, &TrainingConfig::default());
        assert!(matches!(result, Err(CategorizerError::DataFormat(_))));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let x = array![[0.6, 0.8, 0.0], [0.0, 0.6, 0.8], [0.8, 0.0, 0.6]];
        let y = labels(&["A", "B", "C"]);
        let (a, _) = LogisticRegression::fit(&x, &y, &TrainingConfig::default()).unwrap();
        let (b, _) = LogisticRegression::fit(&x, &y, &TrainingConfig::default()).unwrap();
        assert_eq!(a, b);
    }
}
