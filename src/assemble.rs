//! Context bundle assembly.
//!
//! Combines the base preamble with the bodies of the documents chosen by
//! [`select`](crate::select::select) into one text blob:
//!
//! ```text
//! === Base Context ===
//! <base preamble>
//!
//! === Relevant Documentation ===
//!
//! --- context/testing/GTest_Mock.md (matched keywords: mock, gmock) ---
//! <document body>
//! ```
//!
//! A document that cannot be read is replaced by an inline
//! `Error reading <path>: <reason>` marker; the rest of the bundle is
//! still produced.

use std::fmt;

use tracing::warn;

use crate::manifest::Manifest;
use crate::resource::{ResourceError, ResourceResolver};
use crate::select::{select, DEFAULT_MAX_DOCS};

pub const BASE_HEADER: &str = "=== Base Context ===";
pub const DOCUMENTS_HEADER: &str = "=== Relevant Documentation ===";
pub const NO_MATCH_NOTICE: &str = "=== No specific documentation matched your query ===";

/// Options for a single [`assemble`] call.
#[derive(Debug, Clone, Copy)]
pub struct AssembleOptions {
    /// Prepend the base preamble section.
    pub include_base: bool,
    /// Maximum number of document sections.
    pub max_docs: usize,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            include_base: true,
            max_docs: DEFAULT_MAX_DOCS,
        }
    }
}

/// One labeled part of a [`ContextBundle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Base {
        body: String,
    },
    DocumentsHeader,
    Document {
        path: String,
        /// Every keyword configured for the document, not only the hits.
        keywords: Vec<String>,
        body: String,
    },
    NoMatch,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Base { body } => write!(f, "{}\n{}", BASE_HEADER, body),
            Section::DocumentsHeader => f.write_str(DOCUMENTS_HEADER),
            Section::Document {
                path,
                keywords,
                body,
            } => write!(
                f,
                "--- {} (matched keywords: {}) ---\n{}",
                path,
                keywords.join(", "),
                body
            ),
            Section::NoMatch => f.write_str(NO_MATCH_NOTICE),
        }
    }
}

/// The assembled output for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBundle {
    sections: Vec<Section>,
}

impl ContextBundle {
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Paths of the document sections, in selection order.
    pub fn document_paths(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter_map(|s| match s {
                Section::Document { path, .. } => Some(path.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Render all sections separated by a blank line.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ContextBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{}", section)?;
        }
        Ok(())
    }
}

/// Inline text substituted for a resource that could not be read.
pub fn error_marker(path: &str, err: &ResourceError) -> String {
    format!("Error reading {}: {}", path, err)
}

/// Read `path`, or produce the inline error marker for it.
pub fn read_or_marker(resolver: &dyn ResourceResolver, path: &str) -> String {
    match resolver.read_resource(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(path, error = %e, "document unavailable");
            error_marker(path, &e)
        }
    }
}

/// Build the context bundle for `prompt`.
///
/// `base_path` names the preamble resource and is only read when
/// `opts.include_base` is set. Never fails: unreadable resources become
/// inline markers.
pub fn assemble(
    prompt: &str,
    manifest: &Manifest,
    resolver: &dyn ResourceResolver,
    base_path: &str,
    opts: &AssembleOptions,
) -> ContextBundle {
    let mut sections = Vec::new();

    if opts.include_base {
        sections.push(Section::Base {
            body: read_or_marker(resolver, base_path),
        });
    }

    let matches = select(prompt, manifest, opts.max_docs);

    if matches.is_empty() {
        sections.push(Section::NoMatch);
    } else {
        sections.push(Section::DocumentsHeader);
        for m in matches {
            let body = read_or_marker(resolver, &m.descriptor.path);
            sections.push(Section::Document {
                path: m.descriptor.path,
                keywords: m.descriptor.keywords,
                body,
            });
        }
    }

    ContextBundle { sections }
}

/// Plain system context for a chat model: the base preamble followed by
/// the selected document bodies, separated by blank lines and without
/// section headers.
pub fn system_context(
    prompt: &str,
    manifest: &Manifest,
    resolver: &dyn ResourceResolver,
    base_path: &str,
    max_docs: usize,
) -> String {
    let mut parts = vec![read_or_marker(resolver, base_path)];
    for m in select(prompt, manifest, max_docs) {
        parts.push(read_or_marker(resolver, &m.descriptor.path));
    }
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::DocumentDescriptor;
    use std::collections::HashMap;

    /// In-memory resolver keyed by relative path.
    struct MapResolver(HashMap<&'static str, &'static str>);

    impl ResourceResolver for MapResolver {
        fn read_resource(&self, relative_path: &str) -> Result<String, ResourceError> {
            self.0
                .get(relative_path)
                .map(|s| s.to_string())
                .ok_or_else(|| ResourceError::Unavailable {
                    path: relative_path.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                })
        }
    }

    fn fixture() -> (Manifest, MapResolver) {
        let manifest = Manifest::new(vec![
            DocumentDescriptor::new("a.md", &["mock", "gmock"]),
            DocumentDescriptor::new("b.md", &["ctest"]),
        ]);
        let resolver = MapResolver(HashMap::from([
            ("base.md", "BASE PREAMBLE"),
            ("a.md", "mocking guide"),
            ("b.md", "ctest guide"),
        ]));
        (manifest, resolver)
    }

    #[test]
    fn test_base_prefix_and_document_section() {
        let (manifest, resolver) = fixture();
        let bundle = assemble(
            "how do I mock?",
            &manifest,
            &resolver,
            "base.md",
            &AssembleOptions::default(),
        );

        let text = bundle.render();
        assert_eq!(
            text,
            "=== Base Context ===\nBASE PREAMBLE\n\n\
             === Relevant Documentation ===\n\n\
             --- a.md (matched keywords: mock, gmock) ---\nmocking guide"
        );
    }

    #[test]
    fn test_without_base_omits_preamble() {
        let (manifest, resolver) = fixture();
        let opts = AssembleOptions {
            include_base: false,
            ..Default::default()
        };
        let text = assemble("ctest please", &manifest, &resolver, "base.md", &opts).render();

        assert!(!text.contains("BASE PREAMBLE"));
        assert!(!text.contains(BASE_HEADER));
        assert!(text.starts_with(DOCUMENTS_HEADER));
    }

    #[test]
    fn test_no_match_sentinel() {
        let (manifest, resolver) = fixture();
        let bundle = assemble(
            "nothing relevant",
            &manifest,
            &resolver,
            "base.md",
            &AssembleOptions::default(),
        );

        assert_eq!(bundle.sections().len(), 2);
        assert_eq!(bundle.sections()[1], Section::NoMatch);
        assert!(bundle.render().ends_with(NO_MATCH_NOTICE));
    }

    #[test]
    fn test_missing_document_is_isolated() {
        let manifest = Manifest::new(vec![
            DocumentDescriptor::new("gone.md", &["mock"]),
            DocumentDescriptor::new("a.md", &["mock"]),
        ]);
        let (_, resolver) = fixture();
        let text = assemble(
            "mock",
            &manifest,
            &resolver,
            "base.md",
            &AssembleOptions::default(),
        )
        .render();

        assert!(text.contains("--- gone.md (matched keywords: mock) ---\nError reading gone.md: not found"));
        assert!(text.contains("mocking guide"));
    }

    #[test]
    fn test_missing_base_is_marker() {
        let (manifest, resolver) = fixture();
        let text = assemble(
            "mock",
            &manifest,
            &resolver,
            "missing-base.md",
            &AssembleOptions::default(),
        )
        .render();

        assert!(text.starts_with("=== Base Context ===\nError reading missing-base.md"));
        assert!(text.contains("mocking guide"));
    }

    #[test]
    fn test_echoes_all_configured_keywords() {
        let (manifest, resolver) = fixture();
        let bundle = assemble(
            "gmock only",
            &manifest,
            &resolver,
            "base.md",
            &AssembleOptions::default(),
        );
        match &bundle.sections()[2] {
            Section::Document { keywords, .. } => assert_eq!(keywords, &["mock", "gmock"]),
            other => panic!("expected document section, got {:?}", other),
        }
    }

    #[test]
    fn test_respects_max_docs() {
        let (manifest, resolver) = fixture();
        let opts = AssembleOptions {
            include_base: false,
            max_docs: 1,
        };
        let bundle = assemble("mock and ctest", &manifest, &resolver, "base.md", &opts);
        assert_eq!(bundle.document_paths(), vec!["a.md"]);
    }

    #[test]
    fn test_idempotent() {
        let (manifest, resolver) = fixture();
        let opts = AssembleOptions::default();
        let first = assemble("mock ctest", &manifest, &resolver, "base.md", &opts).render();
        let second = assemble("mock ctest", &manifest, &resolver, "base.md", &opts).render();
        assert_eq!(first, second);
    }

    #[test]
    fn test_system_context_has_no_headers() {
        let (manifest, resolver) = fixture();
        let text = system_context("gmock mock and ctest", &manifest, &resolver, "base.md", 3);
        assert_eq!(text, "BASE PREAMBLE\n\nmocking guide\n\nctest guide");

        let text = system_context("weather", &manifest, &resolver, "base.md", 3);
        assert_eq!(text, "BASE PREAMBLE");

        let text = system_context("mock", &manifest, &resolver, "missing.md", 3);
        assert!(text.starts_with("Error reading missing.md"));
        assert!(text.ends_with("\n\nmocking guide"));
    }
}
