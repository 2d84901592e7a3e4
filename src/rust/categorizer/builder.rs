use ndarray::Axis;
use log::info;

use super::categorizer::Categorizer;
use super::category::Category;
use super::dataset::ExpenseRecord;
use super::error::CategorizerError;
use super::model::{FitSummary, LogisticRegression};
use super::report::ClassificationReport;
use super::split::train_test_split;
use super::vectorizer::TfidfVectorizer;
use crate::config::TrainingConfig;

/// The result of a training run
#[derive(Debug, Clone)]
pub struct TrainedCategorizer {
    /// The fitted vectorizer and classifier, ready to serve or persist
    pub categorizer: Categorizer,
    /// Evaluation on the held-out rows
    pub report: ClassificationReport,
    pub fit: FitSummary,
    pub train_size: usize,
    pub test_size: usize,
}

/// A builder that collects labeled expenses and trains a [`Categorizer`].
///
/// Training proceeds as follows:
/// 1. The TF-IDF vectorizer is fitted on the text of every record
/// 2. Rows are split into training and evaluation sets with the configured seed
/// 3. Logistic regression is fitted on the training rows
/// 4. The evaluation rows are scored into a [`ClassificationReport`]
///
/// Given the same records and configuration, two runs produce identical
/// vectorizers and classifiers.
#[derive(Default, Debug)]
pub struct CategorizerBuilder {
    records: Vec<ExpenseRecord>,
    config: TrainingConfig,
}

impl CategorizerBuilder {
    /// Creates an empty builder with the default [`TrainingConfig`]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            config: TrainingConfig::default(),
        }
    }

    /// Replaces the whole training configuration
    ///
    /// # Example
    /// ```
    /// use expense_categorizer::{CategorizerBuilder, TrainingConfig};
    ///
    /// let builder = CategorizerBuilder::new()
    ///     .with_config(TrainingConfig { seed: 7, ..TrainingConfig::default() });
    /// ```
    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.config.max_features = max_features;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.config.test_fraction = test_fraction;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Chooses between a per-category and a single global shuffle
    pub fn stratified(mut self, stratify: bool) -> Self {
        self.config.stratify = stratify;
        self
    }

    pub fn add_record(mut self, record: ExpenseRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn add_records(mut self, records: impl IntoIterator<Item = ExpenseRecord>) -> Self {
        self.records.extend(records);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Trains and evaluates a categorizer on the collected records
    ///
    /// # Returns
    /// * `Result<TrainedCategorizer, CategorizerError>` - The fitted categorizer and its evaluation, or an error if:
    ///   - The configuration is invalid (`InvalidInput`)
    ///   - There are no records, no usable terms, fewer than two categories,
    ///     or (stratified) a category with a single record (`InsufficientData`)
    pub fn build(self) -> Result<TrainedCategorizer, CategorizerError> {
        self.config.validate()?;
        if self.records.is_empty() {
            return Err(CategorizerError::InsufficientData("No training records provided".into()));
        }

        let config = self.config;
        let texts: Vec<String> = self.records.iter().map(ExpenseRecord::text).collect();
        let labels: Vec<Category> = self.records.into_iter().map(|r| r.category).collect();
        info!("Training on {} records", texts.len());

        let vectorizer = TfidfVectorizer::fit(&texts, config.max_features)?;
        let features = vectorizer.transform_batch(&texts);

        let split = train_test_split(&labels, config.test_fraction, config.seed, config.stratify)?;
        info!("Split into {} training and {} evaluation rows", split.train.len(), split.test.len());

        let train_features = features.select(Axis(0), &split.train);
        let train_labels: Vec<Category> = split.train.iter().map(|&i| labels[i].clone()).collect();
        let (model, fit) = LogisticRegression::fit(&train_features, &train_labels, &config)?;

        let test_features = features.select(Axis(0), &split.test);
        let actual: Vec<Category> = split.test.iter().map(|&i| labels[i].clone()).collect();
        let predicted: Vec<Category> = test_features.rows()
            .into_iter()
            .map(|row| model.predict(row).clone())
            .collect();
        let report = ClassificationReport::from_predictions(&actual, &predicted);
        info!("Held-out accuracy: {:.3}", report.accuracy);

        let categorizer = Categorizer::from_parts(vectorizer, model)?;

        Ok(TrainedCategorizer {
            categorizer,
            report,
            fit,
            train_size: split.train.len(),
            test_size: split.test.len(),
        })
    }
}
