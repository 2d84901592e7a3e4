//! Framework-agnostic adapter for the `categorize_expense` endpoint.
//!
//! An HTTP layer only needs to hand the raw request body to
//! [`ServingContext::handle_json`] and write back the returned status and
//! JSON body.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use log::{debug, warn};

use crate::artifact_store::ArtifactStore;
use crate::categorizer::{Categorizer, CategorizerError, Category};

/// Message returned when the request carries no usable description
pub const MISSING_DESCRIPTION: &str = "No description provided";

/// Body of a categorization request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizeRequest {
    #[serde(default)]
    pub description: Option<String>,
}

impl CategorizeRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: Some(description.into()) }
    }
}

/// Successful response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizeResponse {
    pub category: Category,
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// HTTP status and JSON body produced for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    fn ok(response: CategorizeResponse) -> Self {
        Self { status: 200, body: json!(response) }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self { status, body: json!(ErrorResponse { error: message.into() }) }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Process-wide, read-only state for serving predictions.
///
/// Built once at startup; cloning shares the same categorizer. Nothing in
/// the context can be replaced after construction, so request handlers may
/// run concurrently without locks.
#[derive(Debug, Clone)]
pub struct ServingContext {
    categorizer: Arc<Categorizer>,
}

impl ServingContext {
    /// Loads the artifact pair. A failure here must stop the process from serving.
    ///
    /// # Errors
    /// - `ArtifactLoad` if the artifacts are missing, corrupt, or mismatched
    pub fn initialize(store: &ArtifactStore) -> Result<Self, CategorizerError> {
        Ok(Self::from_categorizer(store.load()?))
    }

    pub fn from_categorizer(categorizer: Categorizer) -> Self {
        Self { categorizer: Arc::new(categorizer) }
    }

    pub fn categorizer(&self) -> &Categorizer {
        &self.categorizer
    }

    /// Categorizes a parsed request.
    ///
    /// Missing or blank descriptions produce a 400 reply; they never reach the categorizer.
    pub fn handle(&self, request: &CategorizeRequest) -> Reply {
        let description = match request.description.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Reply::error(400, MISSING_DESCRIPTION),
        };

        match self.categorizer.categorize(description) {
            Ok(category) => {
                debug!("Categorized {:?} as '{}'", description, category);
                Reply::ok(CategorizeResponse { category })
            }
            Err(e) if e.is_client_error() => Reply::error(400, e.to_string()),
            Err(e) => {
                warn!("Categorization failed: {}", e);
                Reply::error(500, e.to_string())
            }
        }
    }

    /// Parses a raw JSON request body and categorizes it.
    pub fn handle_json(&self, body: &str) -> Reply {
        match serde_json::from_str::<CategorizeRequest>(body) {
            Ok(request) => self.handle(&request),
            Err(e) => {
                debug!("Rejected malformed request body: {}", e);
                Reply::error(400, format!("Invalid JSON body: {}", e))
            }
        }
    }
}
