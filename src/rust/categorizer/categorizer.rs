use std::sync::Arc;

use super::category::Category;
use super::error::CategorizerError;
use super::model::LogisticRegression;
use super::vectorizer::TfidfVectorizer;

/// A fitted vectorizer and classifier pair that maps expense descriptions to categories.
///
/// # Thread Safety
///
/// Both halves sit behind `Arc` and are never mutated once the categorizer
/// exists, so a single instance can serve any number of threads without
/// locking:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use expense_categorizer::{Categorizer, ExpenseRecord};
/// use std::sync::Arc;
/// use std::thread;
///
/// let mut records = Vec::new();
/// for _ in 0..5 {
///     records.push(ExpenseRecord::new("Uber ride", "taxi to airport", "Transport")?);
///     records.push(ExpenseRecord::new("Grocery", "milk and bread", "Food")?);
/// }
/// let trained = Categorizer::builder().add_records(records).build()?;
/// let categorizer = Arc::new(trained.categorizer);
///
/// let worker = Arc::clone(&categorizer);
/// let handle = thread::spawn(move || worker.categorize("taxi home").unwrap());
/// assert_eq!(handle.join().unwrap(), "Transport");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Categorizer {
    vectorizer: Arc<TfidfVectorizer>,
    model: Arc<LogisticRegression>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Categorizer>();
    }
};

impl Categorizer {
    /// Creates a new CategorizerBuilder for training
    pub fn builder() -> super::builder::CategorizerBuilder {
        super::builder::CategorizerBuilder::new()
    }

    /// Pairs a vectorizer with a classifier after checking they fit together.
    ///
    /// # Errors
    /// - `ArtifactLoad` if either part is internally inconsistent, or the
    ///   classifier expects a different number of features than the
    ///   vectorizer produces
    pub fn from_parts(vectorizer: TfidfVectorizer, model: LogisticRegression) -> Result<Self, CategorizerError> {
        vectorizer.validate()?;
        model.validate()?;
        if vectorizer.vocabulary_size() != model.n_features() {
            return Err(CategorizerError::ArtifactLoad(format!(
                "Vectorizer produces {} features but the classifier expects {}",
                vectorizer.vocabulary_size(), model.n_features()
            )));
        }
        Ok(Self {
            vectorizer: Arc::new(vectorizer),
            model: Arc::new(model),
        })
    }

    /// Predicts the category of an expense description.
    ///
    /// # Errors
    /// - `InvalidInput` if the description is empty or only whitespace
    pub fn categorize(&self, description: &str) -> Result<Category, CategorizerError> {
        Self::validate_description(description)?;
        Ok(self.predict_text(description).clone())
    }

    /// Class probabilities for a description, highest first.
    ///
    /// # Errors
    /// - `InvalidInput` if the description is empty or only whitespace
    pub fn scores(&self, description: &str) -> Result<Vec<(Category, f64)>, CategorizerError> {
        Self::validate_description(description)?;
        let features = self.vectorizer.transform(description);
        let probabilities = self.model.predict_proba(features.view());
        let mut scores: Vec<(Category, f64)> = self.model.classes().iter()
            .cloned()
            .zip(probabilities.iter().copied())
            .collect();
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scores)
    }

    /// Returns information about the loaded vectorizer and classifier
    pub fn info(&self) -> super::CategorizerInfo {
        super::CategorizerInfo {
            vocabulary_size: self.vectorizer.vocabulary_size(),
            max_features: self.vectorizer.max_features(),
            num_classes: self.model.classes().len(),
            class_labels: self.model.classes().to_vec(),
            fingerprint: self.vectorizer.fingerprint(),
        }
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn model(&self) -> &LogisticRegression {
        &self.model
    }

    pub(crate) fn predict_text(&self, text: &str) -> &Category {
        let features = self.vectorizer.transform(text);
        self.model.predict(features.view())
    }

    fn validate_description(description: &str) -> Result<(), CategorizerError> {
        if description.trim().is_empty() {
            return Err(CategorizerError::InvalidInput("Description cannot be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;

    fn parts() -> (TfidfVectorizer, LogisticRegression) {
        let texts = ["taxi airport", "milk bread"];
        let vectorizer = TfidfVectorizer::fit(&texts, 10).unwrap();
        let features = vectorizer.transform_batch(&texts);
        let labels = vec![Category::new("Transport").unwrap(), Category::new("Food").unwrap()];
        let (model, _) = LogisticRegression::fit(&features, &labels, &TrainingConfig::default()).unwrap();
        (vectorizer, model)
    }

    #[test]
    fn test_categorize() {
        let (vectorizer, model) = parts();
        let categorizer = Categorizer::from_parts(vectorizer, model).unwrap();
        assert_eq!(categorizer.categorize("airport taxi please").unwrap(), "Transport");
        assert_eq!(categorizer.categorize("bread").unwrap(), "Food");
    }

    #[test]
    fn test_blank_input_rejected() {
        let (vectorizer, model) = parts();
        let categorizer = Categorizer::from_parts(vectorizer, model).unwrap();
        for input in ["", "   ", "\n\t"] {
            let err = categorizer.categorize(input).unwrap_err();
            assert!(err.is_client_error());
        }
        assert!(categorizer.scores("").is_err());
    }

    #[test]
    fn test_scores_sorted() {
        let (vectorizer, model) = parts();
        let categorizer = Categorizer::from_parts(vectorizer, model).unwrap();
        let scores = categorizer.scores("milk").unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].0, "Food");
        assert!(scores[0].1 >= scores[1].1);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let (_, model) = parts();
        let other = TfidfVectorizer::fit(&["taxi airport milk bread eggs"], 10).unwrap();
        assert_ne!(other.vocabulary_size(), model.n_features());
        let result = Categorizer::from_parts(other, model);
        assert!(matches!(result, Err(CategorizerError::ArtifactLoad(_))));
    }

    #[test]
    fn test_info() {
        let (vectorizer, model) = parts();
        let categorizer = Categorizer::from_parts(vectorizer, model).unwrap();
        let info = categorizer.info();
        assert_eq!(info.num_classes, 2);
        assert_eq!(info.vocabulary_size, 4);
        assert_eq!(info.class_labels[0], "Food");
    }
}
