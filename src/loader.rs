//! Process-scoped context loader.
//!
//! [`ContextLoader`] bundles the resource resolver, manifest location and
//! selection limit. It is built once from [`Config`] at startup and shared
//! by reference (or `Arc`) with every transport; it holds no mutable state,
//! and every call reloads the manifest so edits on disk are picked up
//! without a restart.

use anyhow::Result;
use std::sync::Arc;

use crate::assemble::{assemble, system_context, AssembleOptions, ContextBundle};
use crate::config::Config;
use crate::manifest::{Manifest, ManifestError, ManifestStore};
use crate::resource::{FileResolver, ResourceError, ResourceResolver};
use crate::select::{select, ScoredMatch};

pub struct ContextLoader {
    resolver: Arc<dyn ResourceResolver>,
    manifest: ManifestStore,
    base_path: String,
    max_docs: usize,
}

impl ContextLoader {
    pub fn new(
        resolver: Arc<dyn ResourceResolver>,
        manifest_path: impl Into<String>,
        base_path: impl Into<String>,
        max_docs: usize,
    ) -> Self {
        Self {
            resolver,
            manifest: ManifestStore::new(manifest_path),
            base_path: base_path.into(),
            max_docs,
        }
    }

    /// File-backed loader rooted at `context.root`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(FileResolver::new(config.context.root.clone())),
            config.context.manifest.clone(),
            config.context.base.clone(),
            config.context.max_docs,
        )
    }

    pub fn max_docs(&self) -> usize {
        self.max_docs
    }

    pub fn manifest_path(&self) -> &str {
        self.manifest.path()
    }

    /// Current manifest, empty if it cannot be loaded.
    pub fn manifest(&self) -> Manifest {
        self.manifest.load(self.resolver.as_ref())
    }

    pub fn try_manifest(&self) -> Result<Manifest, ManifestError> {
        self.manifest.try_load(self.resolver.as_ref())
    }

    /// Ranked matches for `prompt`, capped at `limit` (or the configured
    /// `max_docs` when `None`).
    pub fn select(&self, prompt: &str, limit: Option<usize>) -> Vec<ScoredMatch> {
        let manifest = self.manifest();
        select(prompt, &manifest, limit.unwrap_or(self.max_docs))
    }

    pub fn assemble(&self, prompt: &str, include_base: bool) -> ContextBundle {
        let manifest = self.manifest();
        let opts = AssembleOptions {
            include_base,
            max_docs: self.max_docs,
        };
        assemble(
            prompt,
            &manifest,
            self.resolver.as_ref(),
            &self.base_path,
            &opts,
        )
    }

    /// Base preamble plus selected bodies, as sent to a chat model.
    pub fn system_context(&self, prompt: &str) -> String {
        let manifest = self.manifest();
        system_context(
            prompt,
            &manifest,
            self.resolver.as_ref(),
            &self.base_path,
            self.max_docs,
        )
    }

    /// Raw body of a document.
    pub fn read_document(&self, path: &str) -> Result<String, ResourceError> {
        self.resolver.read_resource(path)
    }
}

/// CLI entry point for `ctxl select`.
pub fn run_select(loader: &ContextLoader, prompt: &str, limit: Option<usize>) -> Result<()> {
    let matches = loader.select(prompt, limit);

    if matches.is_empty() {
        println!("No documents matched.");
        return Ok(());
    }

    println!("{:<6} PATH", "SCORE");
    for m in &matches {
        println!("{:<6} {}", m.score, m.descriptor.path);
    }

    Ok(())
}

/// CLI entry point for `ctxl context`.
pub fn run_context(loader: &ContextLoader, prompt: &str, include_base: bool) -> Result<()> {
    if prompt.trim().is_empty() {
        anyhow::bail!("prompt must not be empty");
    }
    println!("{}", loader.assemble(prompt, include_base));
    Ok(())
}
