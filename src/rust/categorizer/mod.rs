mod error;
mod utils;
mod category;
mod vectorizer;
mod model;
mod categorizer;
mod split;
mod report;
pub mod builder;
pub mod dataset;

pub use error::CategorizerError;
pub use category::Category;
pub use vectorizer::{TfidfVectorizer, ENGLISH_STOP_WORDS};
pub use model::{FitSummary, LogisticRegression};
pub use categorizer::Categorizer;
pub use split::{train_test_split, Split};
pub use report::{Averages, ClassMetrics, ClassificationReport};
pub use builder::{CategorizerBuilder, TrainedCategorizer};
pub use dataset::{ExpenseRecord, load_records, read_records};

/// Information about a loaded categorizer
#[derive(Debug, Clone)]
pub struct CategorizerInfo {
    /// Number of terms the vectorizer recognizes
    pub vocabulary_size: usize,
    /// Vocabulary cap the vectorizer was fitted with
    pub max_features: usize,
    /// Number of categories the classifier can predict
    pub num_classes: usize,
    /// Categories in classifier order
    pub class_labels: Vec<Category>,
    /// SHA-256 fingerprint of the vocabulary and IDF weights
    pub fingerprint: String,
}
