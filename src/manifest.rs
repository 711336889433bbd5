//! Manifest of routable documents.
//!
//! The manifest is a JSON resource mapping document paths to the trigger
//! keywords that select them:
//!
//! ```json
//! {
//!   "docs": [
//!     { "path": "context/testing/GTest_Mock.md", "when": ["mock", "gmock"] },
//!     { "path": "context/testing/GTest_Execute.md", "when": ["ctest", "run"] }
//!   ]
//! }
//! ```
//!
//! It is reloaded on every request. A missing or malformed manifest
//! degrades to an empty one via [`ManifestStore::load`]; callers that need
//! to explain the failure use [`ManifestStore::try_load`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::resource::{ResourceError, ResourceResolver};

/// One manifest entry: a document path plus its trigger keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    /// Path of the document body, relative to the context root.
    pub path: String,
    /// Case-insensitive trigger terms. Serialized as `when`.
    #[serde(rename = "when", default)]
    pub keywords: Vec<String>,
}

impl DocumentDescriptor {
    pub fn new(path: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            path: path.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Short name used by the CLI: the file stem of `path`.
    pub fn skill_name(&self) -> &str {
        Path::new(&self.path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.path)
    }
}

/// Ordered list of descriptors, as loaded from one manifest resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub docs: Vec<DocumentDescriptor>,
}

impl Manifest {
    pub fn new(docs: Vec<DocumentDescriptor>) -> Self {
        Self { docs }
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentDescriptor> {
        self.docs.iter()
    }

    /// First descriptor whose skill name equals `name`, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<&DocumentDescriptor> {
        let wanted = name.to_lowercase();
        self.docs
            .iter()
            .find(|d| d.skill_name().to_lowercase() == wanted)
    }
}

/// Why a manifest could not be loaded.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not readable at {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: ResourceError,
    },

    #[error("manifest at {path} is malformed: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads the manifest from a fixed resource path.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: String,
}

impl ManifestStore {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Load and parse the manifest, reporting failures.
    pub fn try_load(&self, resolver: &dyn ResourceResolver) -> Result<Manifest, ManifestError> {
        let text = resolver
            .read_resource(&self.path)
            .map_err(|source| ManifestError::Unavailable {
                path: self.path.clone(),
                source,
            })?;

        let manifest = Manifest::parse(&text).map_err(|source| ManifestError::Malformed {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path, documents = manifest.len(), "manifest loaded");
        Ok(manifest)
    }

    /// Load the manifest, falling back to an empty one on any failure.
    pub fn load(&self, resolver: &dyn ResourceResolver) -> Manifest {
        match self.try_load(resolver) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(error = %e, "continuing with an empty manifest");
                Manifest::default()
            }
        }
    }
}
