//! An expense categorizer: a TF-IDF vectorizer and a logistic regression
//! classifier trained offline on labeled expenses, persisted as an artifact
//! pair, and loaded once to serve predictions.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use expense_categorizer::{ArtifactStore, Categorizer, ExpenseRecord};
//!
//! let mut records = Vec::new();
//! for _ in 0..5 {
//!     records.push(ExpenseRecord::new("Uber ride", "taxi to airport", "Transport")?);
//!     records.push(ExpenseRecord::new("Grocery", "milk and bread", "Food")?);
//! }
//!
//! let trained = Categorizer::builder()
//!     .add_records(records)
//!     .build()?;
//! println!("{}", trained.report);
//!
//! let dir = std::env::temp_dir().join("expense-categorizer-doc");
//! let store = ArtifactStore::new(&dir);
//! store.save(&trained.categorizer)?;
//!
//! let categorizer = store.load()?;
//! assert_eq!(categorizer.categorize("taxi to the office")?, "Transport");
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A loaded [`Categorizer`] is immutable and `Send + Sync`; share it with
//! `Arc` or through a [`ServingContext`].

pub mod categorizer;
mod config;
pub mod artifact_store;
pub mod serving;

pub use categorizer::{
    Categorizer, CategorizerBuilder, CategorizerError, CategorizerInfo, Category,
    ClassificationReport, ExpenseRecord, LogisticRegression, TfidfVectorizer, TrainedCategorizer,
    load_records, read_records,
};
pub use config::TrainingConfig;
pub use artifact_store::ArtifactStore;
pub use serving::{CategorizeRequest, CategorizeResponse, ErrorResponse, Reply, ServingContext};

pub fn init_logger() {
    env_logger::init();
}
