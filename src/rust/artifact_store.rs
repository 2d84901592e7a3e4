use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::categorizer::{Categorizer, CategorizerError, LogisticRegression, TfidfVectorizer};

/// File name of the persisted vectorizer/classifier pair
pub const ARTIFACT_FILE: &str = "categorizer.bin";
/// Environment variable overriding the default artifact directory
pub const ARTIFACTS_ENV: &str = "EXPENSE_CATEGORIZER_ARTIFACTS";

const FORMAT_VERSION: u32 = 2;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Serialize, Deserialize)]
struct ArtifactPair<V, M> {
    format_version: u32,
    vectorizer: V,
    model: ModelSection<M>,
}

#[derive(Serialize, Deserialize)]
struct ModelSection<M> {
    /// Vocabulary size of the vectorizer the model was trained against
    n_features: usize,
    vectorizer_fingerprint: String,
    model: M,
}

/// Reads and writes the vectorizer/classifier artifact pair in one directory.
///
/// The pair lives in a single file that is written under a temporary name and
/// renamed over the previous one, so readers see either the old pair or the
/// new one and a failed save leaves the previous pair untouched. The model
/// section records the fingerprint of its vectorizer, and
/// [`ArtifactStore::load`] refuses sections that do not belong together.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store in the default artifact directory
    pub fn new_default() -> Self {
        Self::new(Self::get_default_dir())
    }

    /// Returns the default artifact directory path
    pub fn get_default_dir() -> PathBuf {
        resolve_default_dir(env::var(ARTIFACTS_ENV).ok())
    }

    /// Points a store at `dir`. Nothing touches the filesystem until [`save`](Self::save).
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILE)
    }

    /// Whether the artifact file exists (it is not validated)
    pub fn is_present(&self) -> bool {
        let path = self.artifact_path();
        log::debug!("Artifact path: {:?} (exists: {})", path, path.exists());
        path.exists()
    }

    /// Persists a categorizer, replacing any previous pair in one rename.
    ///
    /// # Errors
    /// - `Io` if encoding, writing, or renaming fails; the previous pair is left as it was
    pub fn save(&self, categorizer: &Categorizer) -> Result<(), CategorizerError> {
        let vectorizer = categorizer.vectorizer();
        let bytes = encode(&ArtifactPair {
            format_version: FORMAT_VERSION,
            vectorizer,
            model: ModelSection {
                n_features: vectorizer.vocabulary_size(),
                vectorizer_fingerprint: vectorizer.fingerprint(),
                model: categorizer.model(),
            },
        })?;

        self.write_artifact(&bytes)?;
        log::info!("Saved artifacts to {:?} ({} bytes)", self.artifact_path(), bytes.len());
        Ok(())
    }

    /// Loads and cross-checks the artifact pair.
    ///
    /// # Errors
    /// - `ArtifactLoad` if the file is missing, unreadable, undecodable,
    ///   from another format version, or its model does not fit its vectorizer
    pub fn load(&self) -> Result<Categorizer, CategorizerError> {
        let path = self.artifact_path();
        log::info!("Loading artifacts from {:?}", path);

        let bytes = fs::read(&path).map_err(|e| {
            CategorizerError::ArtifactLoad(format!("Cannot read {:?}: {}", path, e))
        })?;
        let pair: ArtifactPair<TfidfVectorizer, LogisticRegression> = bincode::deserialize(&bytes)
            .map_err(|e| CategorizerError::ArtifactLoad(format!("Cannot decode {:?}: {}", path, e)))?;

        if pair.format_version != FORMAT_VERSION {
            return Err(CategorizerError::ArtifactLoad(format!(
                "{:?} has format version {}, expected {}", path, pair.format_version, FORMAT_VERSION
            )));
        }

        let vectorizer = pair.vectorizer;
        let ModelSection { n_features, vectorizer_fingerprint, model } = pair.model;

        if n_features != model.n_features() {
            return Err(CategorizerError::ArtifactLoad(format!(
                "Model section declares {} features but its weights have {}",
                n_features, model.n_features()
            )));
        }
        if n_features != vectorizer.vocabulary_size() {
            return Err(CategorizerError::ArtifactLoad(format!(
                "Model expects {} features but the vectorizer vocabulary has {} terms",
                n_features, vectorizer.vocabulary_size()
            )));
        }
        if vectorizer_fingerprint != vectorizer.fingerprint() {
            return Err(CategorizerError::ArtifactLoad(
                "Model was trained against a different vectorizer".into()
            ));
        }

        let categorizer = Categorizer::from_parts(vectorizer, model)?;
        let info = categorizer.info();
        log::info!(
            "Loaded categorizer: {} terms, {} categories",
            info.vocabulary_size, info.num_classes
        );
        Ok(categorizer)
    }

    /// Deletes the artifact file if present
    pub fn remove(&self) -> Result<(), CategorizerError> {
        let path = self.artifact_path();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn write_artifact(&self, bytes: &[u8]) -> Result<(), CategorizerError> {
        fs::create_dir_all(&self.dir)?;
        self.replace_via(&self.temp_path(), bytes)
    }

    /// Writes `bytes` to `tmp` and renames it over the artifact file
    fn replace_via(&self, tmp: &Path, bytes: &[u8]) -> Result<(), CategorizerError> {
        let result = write_synced(tmp, bytes).and_then(|_| fs::rename(tmp, self.artifact_path()));
        if let Err(e) = result {
            log::error!("Failed to write artifacts to {:?}: {}", self.dir, e);
            let _ = fs::remove_file(tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(".{}.{}.{}.tmp", ARTIFACT_FILE, std::process::id(), n))
    }
}

fn resolve_default_dir(env_value: Option<String>) -> PathBuf {
    // 1. Check environment variable
    if let Some(path) = env_value {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // 2. Use platform-specific data directory
    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("expense-categorizer");
    }

    // 3. Fallback to user's home directory
    if let Some(home_dir) = dirs::home_dir() {
        return home_dir.join(".local").join("share").join("expense-categorizer");
    }

    // 4. If all else fails, use system temp directory
    env::temp_dir().join("expense-categorizer")
}

fn encode<T: Serialize>(artifact: &T) -> Result<Vec<u8>, CategorizerError> {
    bincode::serialize(artifact)
        .map_err(|e| CategorizerError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
