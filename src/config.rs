//! TOML configuration.
//!
//! ```toml
//! [context]
//! root = "."
//! manifest = "context/manifest.json"
//! base = "context/base.md"
//! max_docs = 3
//!
//! [server]
//! bind = "0.0.0.0:7000"
//!
//! [editor]
//! command = "code"
//!
//! [agent]
//! model = "gpt-4o-mini"
//! base_url = "https://api.openai.com/v1"
//! api_key_env = "OPENAI_API_KEY"
//! ```
//!
//! Every section is optional. A relative `context.root` is resolved against
//! the directory holding the config file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_manifest")]
    pub manifest: String,
    #[serde(default = "default_base")]
    pub base: String,
    #[serde(default = "default_max_docs")]
    pub max_docs: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            manifest: default_manifest(),
            base: default_base(),
            max_docs: default_max_docs(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_manifest() -> String {
    "context/manifest.json".to_string()
}
fn default_base() -> String {
    "context/base.md".to_string()
}
fn default_max_docs() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:7000".to_string()
}

/// Editor launched by `ctxl load --output editor`.
#[derive(Debug, Deserialize, Clone)]
pub struct EditorConfig {
    #[serde(default = "default_editor")]
    pub command: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            command: default_editor(),
        }
    }
}

fn default_editor() -> String {
    "code".to_string()
}

/// Chat-completion backend used by `POST /ask` and `ctxl ask`.
///
/// The API key is never stored in the file; `api_key_env` names the
/// environment variable that holds it.
#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Config {
    /// Defaults rooted at the current directory, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.context.max_docs == 0 {
            anyhow::bail!("context.max_docs must be >= 1");
        }
        if self.context.manifest.trim().is_empty() {
            anyhow::bail!("context.manifest must not be empty");
        }
        if self.server.bind.trim().is_empty() {
            anyhow::bail!("server.bind must not be empty");
        }
        if self.agent.model.trim().is_empty() {
            anyhow::bail!("agent.model must not be empty");
        }
        if !self.agent.base_url.starts_with("http://") && !self.agent.base_url.starts_with("https://")
        {
            anyhow::bail!("agent.base_url must be an http(s) URL");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.context.root.is_relative() {
        if let Some(dir) = path.parent() {
            config.context.root = dir.join(&config.context.root);
        }
    }

    config.validate()?;
    Ok(config)
}
