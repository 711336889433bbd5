//! # Context Loader
//!
//! Keyword-routed documentation context for AI tools.
//!
//! A JSON manifest maps documentation files to trigger keywords. Given a
//! prompt, the loader scores every document by how many of its keywords
//! appear in the prompt, keeps the best few, and assembles them behind a
//! base preamble into one text blob for an assistant's system context.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │ Resources │──▶│ Manifest │──▶│  Select  │──▶│ Assemble │
//! │  (files)  │   │  (JSON)  │   │ (score)  │   │ (bundle) │
//! └───────────┘   └──────────┘   └──────────┘   └────┬─────┘
//!                                                    │
//!                                             ToolRegistry
//!                              ┌──────────────┬──────┴───────┐
//!                              ▼              ▼              ▼
//!                         ┌────────┐    ┌──────────┐   ┌──────────┐
//!                         │  CLI   │    │ MCP stdio│   │   HTTP   │
//!                         │ (ctxl) │    │          │   │ MCP+JSON │
//!                         └────────┘    └──────────┘   └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`resource`] | Root-confined file reads |
//! | [`manifest`] | Manifest model and degrade-to-empty loading |
//! | [`select`] | Keyword scoring and ranking |
//! | [`assemble`] | Context bundle construction |
//! | [`loader`] | Process-scoped composition of the above |
//! | [`traits`] | `Tool` trait, registry, built-in tools |
//! | [`mcp`] | MCP protocol bridge and stdio transport |
//! | [`server`] | HTTP server (MCP Streamable HTTP + JSON routes) |
//! | [`skills`] | Skill commands for the CLI |
//! | [`agent`] | Chat-model answers over the routed context (`/ask`) |

pub mod agent;
pub mod assemble;
pub mod config;
pub mod loader;
pub mod manifest;
pub mod mcp;
pub mod resource;
pub mod select;
pub mod server;
pub mod skills;
pub mod traits;
