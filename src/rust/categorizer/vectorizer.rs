use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use ndarray::{Array1, Array2};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use log::{debug, info};

use super::error::CategorizerError;
use super::utils::normalize_vector;

/// Tokens are runs of at least two word characters.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is valid"));

/// Common English function words excluded from the vocabulary.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "also", "am", "among",
    "an", "and", "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down",
    "during", "each", "either", "else", "etc", "ever", "every", "few", "for", "from", "further",
    "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him", "himself",
    "his", "how", "however", "i", "ie", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "might", "more", "most", "must", "my", "myself", "neither", "no", "nor", "not", "now",
    "of", "off", "often", "on", "once", "only", "or", "other", "others", "otherwise", "our",
    "ours", "ourselves", "out", "over", "own", "per", "perhaps", "rather", "same", "several",
    "she", "should", "since", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "therefore", "these", "they", "this", "those",
    "though", "through", "thus", "to", "too", "under", "until", "up", "upon", "us", "very",
    "via", "was", "we", "well", "were", "what", "whatever", "when", "whence", "whenever",
    "where", "whereas", "whether", "which", "while", "who", "whoever", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

static STOP_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// Splits text into lowercase terms, dropping stop words.
pub(crate) fn analyze(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// A fitted TF-IDF text feature extractor.
///
/// The vocabulary and IDF weights are fixed by [`TfidfVectorizer::fit`] and
/// never change afterwards. Serving must use the very instance (or its
/// persisted snapshot) that produced the training features, since the
/// classifier's weight columns are indexed by this vocabulary.
///
/// Weighting:
/// - term frequency is the raw count of the term in the document
/// - `idf = ln((1 + n_docs) / (1 + df)) + 1`
/// - each document vector is L2-normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    max_features: usize,
}

#[derive(Default)]
struct TermStats {
    document_frequency: usize,
    total_count: usize,
}

impl TfidfVectorizer {
    /// Learns the vocabulary and IDF weights from a corpus.
    ///
    /// Terms are ranked by document frequency, then by total count, then
    /// lexicographically, and only the top `max_features` are kept. Indices
    /// are assigned in lexicographic term order.
    ///
    /// # Errors
    /// - `InvalidInput` if `max_features` is zero
    /// - `InsufficientData` if the corpus is empty or contains no usable terms
    pub fn fit<S: AsRef<str>>(corpus: &[S], max_features: usize) -> Result<Self, CategorizerError> {
        if max_features == 0 {
            return Err(CategorizerError::InvalidInput("max_features must be greater than zero".into()));
        }
        if corpus.is_empty() {
            return Err(CategorizerError::InsufficientData("Cannot fit a vectorizer on an empty corpus".into()));
        }

        let mut stats: HashMap<String, TermStats> = HashMap::new();
        for document in corpus {
            let mut seen = HashSet::new();
            for term in analyze(document.as_ref()) {
                let entry = stats.entry(term.clone()).or_default();
                entry.total_count += 1;
                if seen.insert(term) {
                    entry.document_frequency += 1;
                }
            }
        }

        if stats.is_empty() {
            return Err(CategorizerError::InsufficientData(
                "Corpus contains no terms after stop-word removal".into()
            ));
        }

        let mut ranked: Vec<(String, TermStats)> = stats.into_iter().collect();
        ranked.sort_by(|(term_a, a), (term_b, b)| {
            b.document_frequency.cmp(&a.document_frequency)
                .then(b.total_count.cmp(&a.total_count))
                .then(term_a.cmp(term_b))
        });
        let distinct_terms = ranked.len();
        ranked.truncate(max_features);
        ranked.sort_by(|(a, _), (b, _)| a.cmp(b));

        let n_docs = corpus.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(ranked.len());
        for (index, (term, term_stats)) in ranked.into_iter().enumerate() {
            idf.push(((1.0 + n_docs) / (1.0 + term_stats.document_frequency as f64)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        info!(
            "Fitted vectorizer: {} terms kept out of {} distinct ({} documents, cap {})",
            vocabulary.len(), distinct_terms, corpus.len(), max_features
        );

        Ok(Self { vocabulary, idf, max_features })
    }

    /// Converts text into a feature vector of length [`Self::vocabulary_size`].
    ///
    /// Unknown terms are ignored; text without any known term yields the zero vector.
    pub fn transform(&self, text: &str) -> Array1<f64> {
        let mut features = Array1::zeros(self.idf.len());
        for term in analyze(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                features[index] += 1.0;
            }
        }
        for (value, weight) in features.iter_mut().zip(&self.idf) {
            *value *= weight;
        }
        normalize_vector(&features)
    }

    /// Vectorizes many documents into a `(documents, features)` matrix.
    pub fn transform_batch<S: AsRef<str>>(&self, texts: &[S]) -> Array2<f64> {
        let mut matrix = Array2::zeros((texts.len(), self.idf.len()));
        for (mut row, text) in matrix.rows_mut().into_iter().zip(texts) {
            row.assign(&self.transform(text.as_ref()));
        }
        debug!("Vectorized {} documents into {} features", texts.len(), self.idf.len());
        matrix
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Index of a term in the feature vector, if it is part of the vocabulary
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Terms in index order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.keys().map(String::as_str)
    }

    /// SHA-256 over the vocabulary and IDF weights.
    ///
    /// A classifier records the fingerprint of the vectorizer it was trained
    /// against, so a mismatched artifact pair can be detected on load.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (term, index) in &self.vocabulary {
            hasher.update(term.as_bytes());
            hasher.update([0u8]);
            hasher.update((*index as u64).to_le_bytes());
            hasher.update(self.idf.get(*index).copied().unwrap_or(f64::NAN).to_bits().to_le_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Checks internal consistency of a deserialized vectorizer.
    pub(crate) fn validate(&self) -> Result<(), CategorizerError> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(CategorizerError::ArtifactLoad(format!(
                "Vectorizer has {} terms but {} IDF weights",
                self.vocabulary.len(), self.idf.len()
            )));
        }
        if self.vocabulary.len() > self.max_features {
            return Err(CategorizerError::ArtifactLoad(format!(
                "Vectorizer vocabulary ({}) exceeds its cap ({})",
                self.vocabulary.len(), self.max_features
            )));
        }
        let mut indices: Vec<usize> = self.vocabulary.values().copied().collect();
        indices.sort_unstable();
        if indices.iter().enumerate().any(|(expected, &actual)| expected != actual) {
            return Err(CategorizerError::ArtifactLoad("Vectorizer term indices are not contiguous".into()));
        }
        if self.idf.iter().any(|w| !w.is_finite()) {
            return Err(CategorizerError::ArtifactLoad("Vectorizer contains non-finite IDF weights".into()));
        }
        Ok(())
    }
}
