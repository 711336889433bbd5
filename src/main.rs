//! # Context Loader CLI (`ctxl`)
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ctxl list` | List every skill with its path and keywords |
//! | `ctxl show <skill>` | Print one skill |
//! | `ctxl load <skill>` | Send one skill to the editor, stdout, or a file |
//! | `ctxl select "<prompt>"` | Show which documents a prompt selects |
//! | `ctxl context "<prompt>"` | Print the assembled context bundle |
//! | `ctxl ask "<prompt>"` | Answer a prompt with the chat model |
//! | `ctxl serve stdio` | MCP server over stdin/stdout |
//! | `ctxl serve http` | MCP + JSON HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! ctxl list
//! ctxl load GTest_Mock --output stdout
//! ctxl context "how do I use EXPECT_CALL for mocking?"
//! ctxl serve http --bind 127.0.0.1:7000
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use context_loader::agent::{Agent, OpenAiChatClient};
use context_loader::config::{self, Config};
use context_loader::loader::{run_context, run_select, ContextLoader};
use context_loader::skills::{self, OutputTarget};
use context_loader::traits::ToolRegistry;
use context_loader::{mcp, server};

/// Context Loader: keyword-routed documentation context for AI tools.
#[derive(Parser)]
#[command(
    name = "ctxl",
    about = "Context Loader: keyword-routed documentation context for AI tools",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply if it does not exist.
    #[arg(long, global = true, default_value = "./config/ctxl.toml")]
    config: PathBuf,

    /// Override `context.root` from the config file.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Increase log verbosity (`-v` debug, `-vv` trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List all available skills.
    List,

    /// Print a skill's content.
    Show {
        /// Skill name (document file stem, case-insensitive).
        skill: String,
    },

    /// Load a skill for your assistant.
    Load {
        /// Skill name (document file stem, case-insensitive).
        skill: String,

        /// Output destination.
        #[arg(long, value_enum, default_value = "editor")]
        output: OutputTarget,
    },

    /// Rank manifest documents against a prompt.
    Select {
        prompt: String,

        /// Maximum number of matches (defaults to `context.max_docs`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the assembled context for a prompt.
    Context {
        prompt: String,

        /// Leave out the base preamble.
        #[arg(long)]
        no_base: bool,
    },

    /// Answer a prompt with the chat model, using the selected documents as
    /// system context. Reads the API key from `agent.api_key_env`.
    Ask {
        prompt: String,

        /// Model name (defaults to `agent.model`).
        #[arg(long)]
        model: Option<String>,
    },

    /// Start a server.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

#[derive(Subcommand)]
enum ServeService {
    /// MCP over stdin/stdout.
    Stdio,

    /// MCP Streamable HTTP at `/mcp` plus JSON tool routes.
    Http {
        /// Address to bind (defaults to `server.bind`).
        #[arg(long)]
        bind: Option<String>,
    },
}

/// Logs always go to stderr; stdout carries command output and, for
/// `serve stdio`, the MCP protocol stream.
fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "context_loader=info,ctxl=info",
        1 => "context_loader=debug,ctxl=debug",
        _ => "context_loader=trace,ctxl=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        debug!(path = %cli.config.display(), "no config file, using defaults");
        Config::minimal()
    };

    if let Some(root) = &cli.root {
        cfg.context.root = root.clone();
    }

    Ok(cfg)
}

fn build_agent(cfg: &Config, loader: Arc<ContextLoader>) -> Agent {
    let client = Arc::new(OpenAiChatClient::from_config(&cfg.agent));
    Agent::new(loader, client, cfg.agent.model.clone())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let cfg = resolve_config(&cli)?;
    let loader = Arc::new(ContextLoader::from_config(&cfg));

    match cli.command {
        Commands::List => {
            skills::run_list(&loader)?;
        }
        Commands::Show { skill } => {
            skills::run_show(&loader, &skill)?;
        }
        Commands::Load { skill, output } => {
            skills::run_load(&cfg, &loader, &skill, output)?;
        }
        Commands::Select { prompt, limit } => {
            run_select(&loader, &prompt, limit)?;
        }
        Commands::Context { prompt, no_base } => {
            run_context(&loader, &prompt, !no_base)?;
        }
        Commands::Ask { prompt, model } => {
            let agent = build_agent(&cfg, loader);
            println!("{}", agent.ask(&prompt, model.as_deref()).await?);
        }
        Commands::Serve { service } => {
            let tools = Arc::new(ToolRegistry::with_builtins());
            match service {
                ServeService::Stdio => {
                    mcp::serve_stdio(mcp::McpBridge::new(loader, tools)).await?;
                }
                ServeService::Http { bind } => {
                    let bind = bind.unwrap_or_else(|| cfg.server.bind.clone());
                    let agent = Arc::new(build_agent(&cfg, loader.clone()));
                    server::run_server(&bind, loader, tools, agent).await?;
                }
            }
        }
    }

    Ok(())
}
