//! vault-memory: command-line access to a Vault notes file and its Memory engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vault_memory::{
    InMemoryNoteStore, MemoryEngine, NoteDraft, NoteRepository, RecallStatus, RemoteConfig,
    TagMode,
};

#[derive(Parser)]
#[command(name = "vault-memory")]
#[command(author, version, about = "Tagging and recall for Vault notes")]
#[command(propagate_version = true)]
struct Cli {
    /// Notes file (JSON). Created on first write.
    #[arg(long, env = "VAULT_NOTES_FILE", default_value = "notes.json", global = true)]
    notes: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a new note and tag it
    Add {
        /// Note title
        #[arg(short, long, default_value = "")]
        title: String,

        /// Note body
        #[arg(short, long, default_value = "")]
        content: String,

        /// Card color (slate, amber, emerald, rose, sky, violet)
        #[arg(long)]
        color: Option<String>,

        /// Pin the note to the top of the vault
        #[arg(long)]
        pinned: bool,
    },

    /// Ask Memory a question about your notes
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Print the full response envelope as JSON
        #[arg(long)]
        json: bool,
    },

    /// Tag notes that are missing tags
    Backfill {
        /// Recompute tags for every note
        #[arg(long)]
        force: bool,
    },

    /// List notes in vault order
    List,

    /// Delete a note
    Delete {
        /// Note id
        id: i64,
    },
}

/// Initialize tracing from `LOG_FORMAT`, `LOG_FILE`, `LOG_ANSI` and `RUST_LOG`.
///
/// Console output goes to stderr so command output on stdout stays clean.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vault_memory=info,vault_inference=warn".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = Path::new(path).parent().unwrap_or(Path::new("."));
        let file_name = Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("vault-memory.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_logging();

    let cli = Cli::parse();

    let store = Arc::new(
        InMemoryNoteStore::open(&cli.notes)
            .await
            .with_context(|| format!("Failed to open notes file {}", cli.notes.display()))?,
    );
    let engine = MemoryEngine::from_config(store.clone(), &RemoteConfig::from_env())?;

    match cli.command {
        Commands::Add {
            title,
            content,
            color,
            pinned,
        } => {
            let mut draft = NoteDraft::new(title, content).pinned(pinned);
            draft.color = color;
            let note = engine.create_note(draft).await?;
            println!(
                "Captured [{}] {} #{}",
                note.id,
                note.display_title(),
                note.tags.join(" #")
            );
        }

        Commands::Ask { question, json } => {
            let response = engine.ask(&question.join(" ")).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                if !response.answer.is_empty() {
                    println!("{}", response.answer);
                }
                if let Some(message) = &response.message {
                    eprintln!("{}", message);
                }
            }
            if response.status == RecallStatus::Error && response.answer.is_empty() {
                anyhow::bail!("Memory could not answer");
            }
        }

        Commands::Backfill { force } => {
            let mode = if force { TagMode::Force } else { TagMode::Incremental };
            let report = engine.backfill(mode).await?;
            println!(
                "Scanned {} notes: {} tagged, {} skipped, {} failed",
                report.scanned, report.tagged, report.skipped, report.failed
            );
        }

        Commands::List => {
            let notes = store.list_notes().await?;
            if notes.is_empty() {
                println!("No notes yet.");
            }
            for note in notes {
                let pin = if note.pinned { "*" } else { " " };
                let tags = if note.tags.is_empty() {
                    String::new()
                } else {
                    format!(" #{}", note.tags.join(" #"))
                };
                println!(
                    "{} [{}] {} ({}){}",
                    pin,
                    note.id,
                    note.display_title(),
                    note.color,
                    tags
                );
            }
        }

        Commands::Delete { id } => {
            engine.delete_note(id).await?;
            println!("Deleted note {}", id);
        }
    }

    Ok(())
}
