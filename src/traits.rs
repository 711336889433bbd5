//! Tool trait and registry shared by every transport.
//!
//! The stdio MCP server, the HTTP MCP endpoint and the REST routes all
//! dispatch through one [`ToolRegistry`]. Each transport is a thin adapter:
//! it looks a tool up by name, validates arguments with
//! [`validate_params`], and calls [`Tool::execute`].
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ToolRegistry                │
//! │  load_context  list_contexts             │
//! │  get_context_file   (+ custom Rust)      │
//! └──────┬──────────────┬────────────────┬───┘
//!        ▼              ▼                ▼
//!   MCP (stdio)    MCP (/mcp)     REST (/tools/*)
//! ```
//!
//! # Usage
//!
//! ```rust
//! use context_loader::traits::ToolRegistry;
//!
//! let tools = ToolRegistry::with_builtins();
//! // or ToolRegistry::new() and register(Box::new(MyTool))
//! assert_eq!(tools.len(), 3);
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::assemble::{error_marker, ContextBundle};
use crate::loader::ContextLoader;
use crate::manifest::Manifest;
use crate::resource::ResourceError;

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A tool that AI clients can discover and call.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use context_loader::traits::{Tool, ToolContext};
///
/// pub struct CountDocsTool;
///
/// #[async_trait]
/// impl Tool for CountDocsTool {
///     fn name(&self) -> &str { "count_docs" }
///     fn description(&self) -> &str { "Count manifest entries" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {} })
///     }
///
///     async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<String> {
///         Ok(ctx.manifest().len().to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores; also the REST route segment.
    fn name(&self) -> &str;

    /// One-line description shown to clients during discovery.
    fn description(&self) -> &str;

    /// Whether this is one of the three built-in tools.
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema (`type: "object"`) describing the parameters.
    fn parameters_schema(&self) -> Value;

    /// Run the tool with validated parameters and return its text output.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String>;
}

/// Caller-side parameter problem detected inside a tool.
///
/// Transports downcast to this to answer with a client error instead of a
/// tool failure.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Gives tools access to the context loader.
#[derive(Clone)]
pub struct ToolContext {
    loader: Arc<ContextLoader>,
}

impl ToolContext {
    pub fn new(loader: Arc<ContextLoader>) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &ContextLoader {
        &self.loader
    }

    pub fn manifest(&self) -> Manifest {
        self.loader.manifest()
    }

    pub fn assemble(&self, prompt: &str, include_base: bool) -> ContextBundle {
        self.loader.assemble(prompt, include_base)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations
// ═══════════════════════════════════════════════════════════════════════

/// Selects documents by keyword and returns the assembled bundle.
pub struct LoadContextTool;

#[async_trait]
impl Tool for LoadContextTool {
    fn name(&self) -> &str {
        "load_context"
    }

    fn description(&self) -> &str {
        "Load the context/guideline documents relevant to a prompt. Keywords in the prompt \
         are matched against the manifest to pick the most relevant documentation. Use this \
         when you need design guidelines, testing instructions, or architectural context."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Your question or task description. Keywords will be matched against available documentation."
                },
                "include_base": {
                    "type": "boolean",
                    "description": "Whether to include the base context (default: true)",
                    "default": true
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String> {
        let prompt = params["prompt"].as_str().unwrap_or("");
        if prompt.trim().is_empty() {
            return Err(ParamError::Empty("prompt").into());
        }
        let include_base = params["include_base"].as_bool().unwrap_or(true);

        Ok(ctx.assemble(prompt, include_base).render())
    }
}

/// Lists every manifest entry and its trigger keywords.
pub struct ListContextsTool;

#[async_trait]
impl Tool for ListContextsTool {
    fn name(&self) -> &str {
        "list_contexts"
    }

    fn description(&self) -> &str {
        "List all available context/guideline documents and their trigger keywords."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<String> {
        Ok(render_listing(&ctx.manifest()))
    }
}

/// Returns one document by path, bypassing keyword selection.
pub struct GetContextFileTool;

#[async_trait]
impl Tool for GetContextFileTool {
    fn name(&self) -> &str {
        "get_context_file"
    }

    fn description(&self) -> &str {
        "Retrieve a specific context file by its path. Use this when you know exactly \
         which document you need."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Relative path to the context file (e.g., 'context/design/Design.md')"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String> {
        let file_path = params["file_path"].as_str().unwrap_or("");
        if file_path.trim().is_empty() {
            return Err(ParamError::Empty("file_path").into());
        }

        let body = match ctx.loader().read_document(file_path) {
            Ok(text) => text,
            Err(e @ ResourceError::OutsideRoot { .. }) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(path = file_path, error = %e, "context file unavailable");
                error_marker(file_path, &e)
            }
        };

        Ok(format!("=== {} ===\n\n{}", file_path, body))
    }
}

/// Text produced by `list_contexts`.
pub fn render_listing(manifest: &Manifest) -> String {
    let mut lines = vec!["Available Context Documents:\n".to_string()];
    for doc in manifest.iter() {
        lines.push(format!("- {}", doc.path));
        lines.push(format!("  Keywords: {}\n", doc.keywords.join(", ")));
    }
    lines.join("\n")
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter validation
// ═══════════════════════════════════════════════════════════════════════

/// Check `params` against a tool's JSON schema.
///
/// Enforces `required`, primitive `type`s and `enum` values, and fills in
/// `default`s for absent properties. Unknown properties pass through.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let params_obj = match params {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        other => bail!("parameters must be an object, got {}", json_type_name(other)),
    };

    let properties = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let required: Vec<&str> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    for req_field in &required {
        if !params_obj.contains_key(*req_field) {
            bail!("missing required parameter: {}", req_field);
        }
    }

    let mut result = params_obj.clone();

    for (prop_name, prop_schema) in &properties {
        match params_obj.get(prop_name) {
            Some(value) => {
                if let Some(expected_type) = prop_schema.get("type").and_then(|t| t.as_str()) {
                    let type_ok = match expected_type {
                        "string" => value.is_string(),
                        "integer" => value.is_i64() || value.is_u64(),
                        "number" => value.is_number(),
                        "boolean" => value.is_boolean(),
                        "array" => value.is_array(),
                        "object" => value.is_object(),
                        _ => true,
                    };
                    if !type_ok {
                        bail!(
                            "invalid parameter '{}': expected {}, got {}",
                            prop_name,
                            expected_type,
                            json_type_name(value)
                        );
                    }
                }

                if let Some(enum_values) = prop_schema.get("enum").and_then(|e| e.as_array()) {
                    if !enum_values.contains(value) {
                        let allowed: Vec<String> =
                            enum_values.iter().map(|v| v.to_string()).collect();
                        bail!(
                            "invalid parameter '{}': must be one of [{}], got {}",
                            prop_name,
                            allowed.join(", "),
                            value
                        );
                    }
                }
            }
            None => {
                if let Some(default) = prop_schema.get("default") {
                    result.insert(prop_name.clone(), default.clone());
                }
            }
        }
    }

    Ok(Value::Object(result))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Ordered set of tools, looked up by name.
///
/// Registration order is preserved in listings. When two tools share a
/// name, the first registered wins on lookup.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry holding `load_context`, `list_contexts` and `get_context_file`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(LoadContextTool));
        registry.register(Box::new(ListContextsTool));
        registry.register(Box::new(GetContextFileTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
