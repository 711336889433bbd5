//! Skill commands for the CLI.
//!
//! A *skill* is a manifest document addressed by its file stem, so
//! `context/testing/GTest_Mock.md` is the skill `GTest_Mock`. These commands
//! bypass keyword selection and work with one named document at a time.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use crate::config::Config;
use crate::loader::ContextLoader;
use crate::manifest::{DocumentDescriptor, Manifest};

/// Where `ctxl load` sends a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputTarget {
    /// Write `.copilot_context.md` under the root and open it in the editor.
    Editor,
    /// Print the skill to stdout.
    Stdout,
    /// Write `.skill_temp.md` under the root.
    File,
}

/// CLI entry point for `ctxl list`.
pub fn run_list(loader: &ContextLoader) -> Result<()> {
    let manifest = loader.try_manifest()?;
    let rule = "=".repeat(60);

    println!("Available Skills:");
    println!("{}", rule);
    for doc in manifest.iter() {
        println!();
        println!("{}", doc.skill_name());
        println!("   Path: {}", doc.path);
        println!("   Keywords: {}", doc.keywords.join(", "));
    }
    println!();
    println!("{}", rule);
    println!("Total: {} skills", manifest.len());

    Ok(())
}

/// CLI entry point for `ctxl show`.
pub fn run_show(loader: &ContextLoader, name: &str) -> Result<()> {
    let (_, content) = read_skill(loader, name)?;
    println!("{}", content);
    Ok(())
}

/// CLI entry point for `ctxl load`.
pub fn run_load(
    config: &Config,
    loader: &ContextLoader,
    name: &str,
    output: OutputTarget,
) -> Result<()> {
    let (doc, content) = read_skill(loader, name)?;
    let skill = doc.skill_name();

    match output {
        OutputTarget::Stdout => {
            println!("{}", content);
        }
        OutputTarget::File => {
            let target = config.context.root.join(".skill_temp.md");
            write_file(&target, &content)?;
            println!("Skill '{}' written to {}", skill, target.display());
        }
        OutputTarget::Editor => {
            let target = config.context.root.join(".copilot_context.md");
            write_file(&target, &format!("# Context: {}\n\n{}", skill, content))?;

            match Command::new(&config.editor.command).arg(&target).spawn() {
                Ok(_) => {
                    println!("Skill '{}' loaded ({} chars)", skill, content.len());
                    println!("  Opening {} in {}", target.display(), config.editor.command);
                }
                Err(e) => {
                    warn!(editor = %config.editor.command, error = %e, "could not launch editor");
                    println!("Skill '{}' saved to {}", skill, target.display());
                    println!("  Reference this file from your assistant chat.");
                }
            }
        }
    }

    Ok(())
}

/// Look up `name` in the manifest and read its document.
pub fn read_skill(loader: &ContextLoader, name: &str) -> Result<(DocumentDescriptor, String)> {
    let manifest = loader.try_manifest()?;

    let doc = match manifest.find_by_name(name) {
        Some(doc) => doc.clone(),
        None => bail!(
            "skill '{}' not found. Available skills: {}",
            name,
            skill_names(&manifest).join(", ")
        ),
    };

    debug!(skill = name, path = %doc.path, "reading skill");
    let content = loader
        .read_document(&doc.path)
        .with_context(|| format!("skill file not readable: {}", doc.path))?;

    Ok((doc, content))
}

fn skill_names(manifest: &Manifest) -> Vec<&str> {
    manifest.iter().map(|d| d.skill_name()).collect()
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config, ContextLoader) {
        let tmp = TempDir::new().unwrap();
        let ctx = tmp.path().join("context/testing");
        std::fs::create_dir_all(&ctx).unwrap();
        std::fs::write(ctx.join("GTest_Mock.md"), "# Mocking").unwrap();
        std::fs::write(
            tmp.path().join("context/manifest.json"),
            r#"{"docs": [
                {"path": "context/testing/GTest_Mock.md", "when": ["mock"]},
                {"path": "context/testing/Missing.md", "when": ["missing"]}
            ]}"#,
        )
        .unwrap();

        let mut cfg = Config::minimal();
        cfg.context.root = tmp.path().to_path_buf();
        let loader = ContextLoader::from_config(&cfg);
        (tmp, cfg, loader)
    }

    #[test]
    fn test_read_skill_case_insensitive() {
        let (_tmp, _cfg, loader) = setup();
        let (doc, content) = read_skill(&loader, "gtest_mock").unwrap();
        assert_eq!(doc.path, "context/testing/GTest_Mock.md");
        assert_eq!(content, "# Mocking");
    }

    #[test]
    fn test_unknown_skill_lists_available() {
        let (_tmp, _cfg, loader) = setup();
        let err = read_skill(&loader, "Nope").unwrap_err().to_string();
        assert!(err.contains("skill 'Nope' not found"));
        assert!(err.contains("GTest_Mock, Missing"));
    }

    #[test]
    fn test_unreadable_skill_is_error() {
        let (_tmp, _cfg, loader) = setup();
        let err = read_skill(&loader, "Missing").unwrap_err();
        assert!(format!("{:#}", err).contains("skill file not readable"));
    }

    #[test]
    fn test_load_to_file() {
        let (tmp, cfg, loader) = setup();
        run_load(&cfg, &loader, "GTest_Mock", OutputTarget::File).unwrap();
        let written = std::fs::read_to_string(tmp.path().join(".skill_temp.md")).unwrap();
        assert_eq!(written, "# Mocking");
    }

    #[test]
    fn test_load_to_editor_survives_missing_editor() {
        let (tmp, mut cfg, loader) = setup();
        cfg.editor.command = "definitely-not-an-editor-binary".to_string();
        run_load(&cfg, &loader, "GTest_Mock", OutputTarget::Editor).unwrap();
        let written = std::fs::read_to_string(tmp.path().join(".copilot_context.md")).unwrap();
        assert_eq!(written, "# Context: GTest_Mock\n\n# Mocking");
    }
}
