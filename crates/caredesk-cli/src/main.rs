//! CLI entry point for CareDesk.
//!
//! This binary provides the `caredesk` command: initialize a vault,
//! inspect the lifecycle folders, drive approve/reject/execute
//! decisions, and run the inbox watcher. Responses are printed as the
//! same JSON payloads an HTTP layer would return.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use caredesk_engine::{ApprovalEngine, EngineError, InboxWatcher};
use caredesk_policy::AutoApprovalConfig;
use caredesk_vault::{Folder, VaultStore};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// CareDesk — approval workflow for a digital practice assistant.
#[derive(Parser)]
#[command(
    name = "caredesk",
    version,
    about = "CareDesk — human-in-the-loop approval workflow",
    long_about = "Manages a vault of action records moving through \
                  Inbox, Needs_Action, Pending_Approval, Approved and Done, \
                  with policy-based auto-approval for low-risk categories."
)]
struct Cli {
    /// Vault root directory. Falls back to $CAREDESK_VAULT.
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the vault folder structure.
    Init,

    /// List the records in a folder.
    List {
        /// Folder name: Inbox, Needs_Action, Pending_Approval, Approved, Done.
        folder: String,
    },

    /// Shorthand for `list Pending_Approval`.
    Pending,

    /// Show one record: raw content plus parsed metadata.
    Show { folder: String, filename: String },

    /// Submit a record from Inbox/Needs_Action for approval.
    Submit { filename: String },

    /// Approve a pending record.
    Approve {
        filename: String,
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Reject a pending record.
    Reject {
        filename: String,
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Mark an approved record as executed.
    Execute {
        filename: String,
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Watch the Inbox folder and submit complete records as they land.
    Watch,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // .env before anything reads the environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = vault_root(cli.vault)?;
    let engine = build_engine(&root)?;

    match cli.command {
        Commands::Init => {
            println!("vault initialized at {}", root.display());
            Ok(())
        }
        Commands::List { folder } => print_listing(&engine, &folder),
        Commands::Pending => {
            print_json(&engine.list(Folder::PendingApproval).map_err(render)?)
        }
        Commands::Show { folder, filename } => {
            let folder = Folder::parse(&folder).map_err(render)?;
            print_json(&engine.raw(folder, &filename).map_err(render)?)
        }
        Commands::Submit { filename } => {
            print_json(&engine.submit_for_approval(&filename).map_err(render)?)
        }
        Commands::Approve { filename, notes } => {
            print_json(&engine.approve(&filename, &notes).map_err(render)?)
        }
        Commands::Reject { filename, notes } => {
            print_json(&engine.reject(&filename, &notes).map_err(render)?)
        }
        Commands::Execute { filename, notes } => {
            print_json(&engine.mark_executed(&filename, &notes).map_err(render)?)
        }
        Commands::Watch => cmd_watch(engine).await,
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn print_listing(engine: &ApprovalEngine, folder: &str) -> Result<()> {
    let folder = Folder::parse(folder).map_err(render)?;
    print_json(&engine.list(folder).map_err(render)?)
}

async fn cmd_watch(engine: ApprovalEngine) -> Result<()> {
    let engine = Arc::new(engine);
    let watcher = InboxWatcher::spawn(Arc::clone(&engine))
        .map_err(render)
        .context("failed to start inbox watcher")?;

    info!("watching Inbox — press Ctrl-C to stop");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    watcher.stop();
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn vault_root(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    if let Ok(path) = std::env::var("CAREDESK_VAULT") {
        return Ok(PathBuf::from(path));
    }
    bail!("no vault configured: pass --vault or set CAREDESK_VAULT");
}

/// Open the vault and build the engine. An invalid auto-approval
/// configuration is fail-safe: the engine runs with auto-approval
/// disabled rather than failing open.
fn build_engine(root: &Path) -> Result<ApprovalEngine> {
    let store = VaultStore::open(root).context("failed to open vault")?;
    match AutoApprovalConfig::from_env() {
        Ok(config) => Ok(ApprovalEngine::with_auto_approval(store, config)),
        Err(e) => {
            warn!(error = %e, "invalid auto-approval config, auto-approval disabled");
            Ok(ApprovalEngine::new(store))
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Map engine errors onto operator-facing messages, keeping the
/// 404/409 distinction visible.
fn render(e: impl Into<RenderedError>) -> anyhow::Error {
    e.into().0
}

struct RenderedError(anyhow::Error);

impl From<EngineError> for RenderedError {
    fn from(e: EngineError) -> Self {
        let msg = if e.is_not_found() {
            format!("not found: {e}")
        } else if e.is_conflict() {
            format!("conflict: {e}")
        } else {
            e.to_string()
        };
        Self(anyhow::anyhow!(msg))
    }
}

impl From<caredesk_vault::VaultError> for RenderedError {
    fn from(e: caredesk_vault::VaultError) -> Self {
        Self(anyhow::anyhow!(e.to_string()))
    }
}
