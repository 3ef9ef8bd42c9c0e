//! Command-line front end for the notepad core.
//!
//! # Responsibility
//! - Open a note database and drive the notes/todo controllers.
//! - Print snapshots as plain text; all rules live in `notepad_core`.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::info;
use notepad_core::{
    init_logging, CategoryFilter, EngineConfig, NoteDraft, NoteService, NotesController,
    SqliteNoteStore, TodoController,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::runtime::Handle;

#[derive(Debug, Parser)]
#[command(name = "notepad", version, about = "Categorized notes and todos")]
struct Cli {
    /// SQLite database file; created when missing.
    #[arg(long, default_value = "notepad.sqlite3")]
    db: PathBuf,
    /// JSON engine configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Absolute directory for rolling log files; logging is off without it.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the core library is linked.
    Ping,
    /// Print the grouped notes list.
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// `All`, `Uncategorized`, or an exact category.
        #[arg(long, default_value = "All")]
        category: String,
    },
    /// Print pending and completed todos.
    Todos,
    /// Add a pending todo.
    AddTodo { content: String },
    /// Flip a todo between pending and completed.
    Toggle { id: i64 },
    /// Create and save a note.
    NewNote {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete a note.
    Delete { id: i64 },
    /// Print the category filter choices.
    Categories,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.config.as_ref() {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    if let Some(dir) = cli.log_dir.as_ref() {
        let dir = dir.to_str().context("log dir must be valid UTF-8")?;
        init_logging(config.effective_log_level(), dir)?;
    }

    if let Command::Ping = cli.command {
        println!("notepad_core ping={}", notepad_core::ping());
        println!("notepad_core version={}", notepad_core::core_version());
        return Ok(());
    }

    let store = Arc::new(
        SqliteNoteStore::open(&cli.db)
            .with_context(|| format!("cannot open `{}`", cli.db.display()))?,
    );
    info!("event=cli_command module=cli status=start command={}", command_name(&cli.command));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("cannot start async runtime")?;

    match cli.command {
        Command::Ping => {}
        Command::List { search, category } => {
            runtime.block_on(print_groups(store, config, search, category))?;
        }
        Command::Todos => runtime.block_on(print_todos(store, config))?,
        Command::AddTodo { content } => {
            let id = runtime.block_on(async {
                let controller = TodoController::new(store, Handle::current(), &config);
                controller.add_todo(&content)?.wait().await
            })?;
            println!("added todo #{id}");
        }
        Command::Toggle { id } => {
            let status = runtime.block_on(async {
                let controller = TodoController::new(store, Handle::current(), &config);
                controller.toggle_status(id)?.wait().await
            })?;
            println!("todo #{id} is now {}", status.label());
        }
        Command::NewNote {
            title,
            body,
            category,
        } => {
            let saved = NoteService::new(store).create_with(&NoteDraft {
                title,
                body,
                category,
            })?;
            println!("saved note #{} \"{}\"", saved.id, saved.title);
        }
        Command::Delete { id } => {
            NoteService::new(store).delete_note(id)?;
            println!("deleted note #{id}");
        }
        Command::Categories => {
            for choice in NoteService::new(store).filter_choices()? {
                println!("{choice}");
            }
        }
    }

    Ok(())
}

async fn print_groups(
    store: Arc<SqliteNoteStore>,
    config: EngineConfig,
    search: String,
    category: String,
) -> anyhow::Result<()> {
    let controller = NotesController::new(store, Handle::current(), config);
    // Only the last dispatch is awaited; the first is superseded by it.
    let _ = controller.set_category_filter(CategoryFilter::from_label(&category));
    controller.set_search_text(search).await?;

    let snapshot = controller.current();
    if snapshot.error {
        bail!("notes query failed; see logs");
    }
    if snapshot.data.is_empty() {
        println!("(no notes)");
    }
    for group in &snapshot.data {
        println!("{} ({})", group.label, group.len());
        for note in &group.notes {
            println!("  #{} {}", note.id, note.title);
        }
    }
    Ok(())
}

async fn print_todos(store: Arc<SqliteNoteStore>, config: EngineConfig) -> anyhow::Result<()> {
    let controller = TodoController::new(store, Handle::current(), &config);
    controller.refresh().await?;

    let snapshot = controller.current();
    if snapshot.error {
        bail!("todo query failed; see logs");
    }
    for (label, notes) in snapshot.data.buckets() {
        println!("{label} ({})", notes.len());
        for note in notes {
            println!("  #{} {}", note.id, note.title);
        }
    }
    Ok(())
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Ping => "ping",
        Command::List { .. } => "list",
        Command::Todos => "todos",
        Command::AddTodo { .. } => "add_todo",
        Command::Toggle { .. } => "toggle",
        Command::NewNote { .. } => "new_note",
        Command::Delete { .. } => "delete",
        Command::Categories => "categories",
    }
}
