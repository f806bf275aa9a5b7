//! alleasy - command-line front-end for the reqres.in demo API.
//!
//! Signs in or registers against the API, keeps the session between runs,
//! and stores a light/dark preference.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use alleasy_core::{
    ColorMode, Config, KeyValueStore, LoginForm, RegisterForm, Session, SessionManager, StoreBackend,
    ThemeStore, ValidationError,
};

// ============================================================================
// Command line
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "alleasy", version, about = "Sign in to the reqres.in demo API")]
struct Cli {
    /// Storage backend for the session (file, keyring, memory)
    #[arg(long, global = true)]
    store: Option<StoreBackend>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Status {
        /// Print the stored session as JSON, token redacted
        #[arg(long)]
        json: bool,
    },
    /// Show or change the colour mode
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum ThemeAction {
    Show,
    Toggle,
    Light,
    Dark,
}

// ============================================================================
// Logging
// ============================================================================

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG to control the level (e.g., RUST_LOG=debug). When
/// ALLEASY_LOG_DIR is set, a daily rolling log file is written there too.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var("ALLEASY_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "alleasy.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

// ============================================================================
// Entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing();
    info!("alleasy starting");

    let mut config = Config::load()
        .context("Failed to load config")?
        .apply_env()?;
    if let Some(store) = cli.store {
        config.store = store;
    }
    debug!(?config, "Config loaded");

    let store = config.open_store()?;
    let manager = alleasy_core::connect(&config, store.clone())?;

    match cli.command {
        Command::Login { email } => login(&manager, email).await,
        Command::Register { name, email } => register(&manager, name, email).await,
        Command::Logout => logout(&manager).await,
        Command::Status { json } => status(&manager, json).await,
        Command::Theme { action } => theme(store, action.unwrap_or(ThemeAction::Show)).await,
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn login(manager: &SessionManager, email: Option<String>) -> Result<()> {
    restore(manager).await;

    let form = LoginForm {
        email: match email {
            Some(email) => email,
            None => prompt("Email: ")?,
        },
        password: rpassword::prompt_password("Password: ")?,
    };
    check_form(form.validate())?;

    println!("\nAuthenticating...");
    let session = manager
        .sign_in(&form.email, &form.password)
        .await
        .map_err(explain)?;

    println!("Signed in as {}", session.display_name());
    Ok(())
}

async fn register(manager: &SessionManager, name: Option<String>, email: Option<String>) -> Result<()> {
    restore(manager).await;

    let form = RegisterForm {
        name: match name {
            Some(name) => name,
            None => prompt("Name: ")?,
        },
        email: match email {
            Some(email) => email,
            None => prompt("Email: ")?,
        },
        password: rpassword::prompt_password("Password: ")?,
        confirm_password: rpassword::prompt_password("Confirm password: ")?,
    };
    check_form(form.validate())?;

    println!("\nCreating account...");
    let session = manager
        .register_user(&form.email, &form.password, Some(form.name.trim()))
        .await
        .map_err(explain)?;

    println!("Welcome, {}! (user id {})", session.display_name(), session.id);
    Ok(())
}

async fn logout(manager: &SessionManager) -> Result<()> {
    restore(manager).await;
    let was_signed_in = manager.is_signed_in().await;

    manager.sign_out().await.map_err(explain)?;

    if was_signed_in {
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
    Ok(())
}

async fn status(manager: &SessionManager, json: bool) -> Result<()> {
    let session = restore(manager).await;

    if json {
        let shown = session.as_ref().map(Session::redacted);
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    match session {
        Some(session) => {
            println!("Signed in as {}", session.display_name());
            println!("  email: {}", session.email);
            println!("  id:    {}", session.id);
        }
        None => println!("Not signed in"),
    }
    println!(
        "  stored session: {}",
        if manager.auth().is_authenticated().await { "yes" } else { "no" }
    );
    Ok(())
}

async fn theme(store: Arc<dyn KeyValueStore>, action: ThemeAction) -> Result<()> {
    let themes = ThemeStore::new(store);

    let mode = match action {
        ThemeAction::Show => themes.load().await,
        ThemeAction::Toggle => themes.toggle().await?,
        ThemeAction::Light => {
            themes.set(ColorMode::Light).await?;
            ColorMode::Light
        }
        ThemeAction::Dark => {
            themes.set(ColorMode::Dark).await?;
            ColorMode::Dark
        }
    };

    println!("Colour mode: {}", mode);
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Restore any stored session; a damaged or unreadable one counts as signed out
async fn restore(manager: &SessionManager) -> Option<Session> {
    manager.bootstrap().await.unwrap_or_else(|e| {
        debug!(error = %e, "No usable stored session");
        None
    })
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn check_form(errors: Vec<ValidationError>) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    for error in &errors {
        eprintln!("  - {}", error);
    }
    Err(anyhow::anyhow!("Please correct the {} problem(s) above", errors.len()))
}

/// Lead with the user-facing message, keep the underlying error as the cause
fn explain(err: alleasy_core::Error) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}
