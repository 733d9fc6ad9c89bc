use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use jot_client::{ApiConfig, SyncError, TodoApi, TodoSession};
use jot_core::TodoStore;
use std::time::Duration;

mod state;

#[derive(Parser, Debug)]
#[command(name = "jot", version, about = "Jot — todo list backed by a remote collection")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List todos (newest first)
    List,

    /// Add a todo
    Add {
        /// Title; multiple words are joined with spaces
        title: Vec<String>,
    },

    /// Mark a todo as done
    Done { id: String },

    /// Mark a todo as not done
    Undone { id: String },

    /// Rename a todo
    Edit {
        id: String,
        /// New title; multiple words are joined with spaces
        title: Vec<String>,
    },

    /// Delete a todo
    Rm { id: String },

    /// Manage the API token sent to the remote collection
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Paste and store an API token in ~/.jot/auth.json
    PasteToken,

    /// Forget the stored token
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr so they never mix with command output.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Auth { command } => match command {
            AuthCommand::PasteToken => state::paste_token()?,
            AuthCommand::Clear => state::clear_token()?,
        },

        Command::List => {
            let session = open_session().await?;
            print_todos(session.store());
        }

        Command::Add { title } => {
            let mut session = open_session().await?;
            let result = session.add(&title.join(" ")).await;
            match result {
                Ok(id) => {
                    println!("Added {id}");
                    print_todos(session.store());
                }
                Err(e) => banner(e, session.store())?,
            }
        }

        Command::Done { id } => {
            let mut session = open_session().await?;
            let result = session.set_completed(&id, true).await;
            finish(result, session.store())?;
        }

        Command::Undone { id } => {
            let mut session = open_session().await?;
            let result = session.set_completed(&id, false).await;
            finish(result, session.store())?;
        }

        Command::Edit { id, title } => {
            let mut session = open_session().await?;
            let result = session.rename(&id, &title.join(" ")).await;
            finish(result, session.store())?;
        }

        Command::Rm { id } => {
            let mut session = open_session().await?;
            let result = session.remove(&id).await;
            match result {
                Ok(()) => {
                    println!("Deleted {id}");
                    print_todos(session.store());
                }
                Err(e) => banner(e, session.store())?,
            }
        }
    }

    Ok(())
}

async fn open_session() -> Result<TodoSession<TodoApi>> {
    let config = state::read_config()?;
    let auth = state::load_auth()?;

    let api = TodoApi::new(ApiConfig {
        base_url: config.api.base_url,
        token: auth.token,
        timeout: Duration::from_secs(config.api.timeout_secs),
    })?;

    let mut session = TodoSession::new(api);
    session
        .load()
        .await
        .context("loading todos from the remote collection")?;
    Ok(session)
}

fn finish(result: Result<(), SyncError>, store: &TodoStore) -> Result<()> {
    match result {
        Ok(()) => {
            print_todos(store);
            Ok(())
        }
        Err(e) => banner(e, store),
    }
}

/// The speculative change was rolled back; show the store's one-line banner.
fn banner(err: SyncError, store: &TodoStore) -> Result<()> {
    match store.last_error() {
        Some(msg) => bail!("{msg} ({err})"),
        None => bail!("{err}"),
    }
}

fn print_todos(store: &TodoStore) {
    if store.is_empty() {
        println!("Nothing to do.");
        return;
    }
    for t in store.todos() {
        let mark = if t.completed { "x" } else { " " };
        println!("[{mark}] {:<12} {}", t.id, t.title);
    }
}
