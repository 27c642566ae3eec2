// Corkboard Server - Main Entry Point
//
// This file contains only the application bootstrap logic, CLI commands,
// and initialization. All handlers, routes, and business logic are in
// separate modules.

pub use corkboard_server::*;

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use corkboard_core::{config::AppConfig, db::Database, users::UserStore};
use dotenvy::{Error as DotenvError, dotenv};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_appender::non_blocking;
use tracing_subscriber::EnvFilter;

static TRACING_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(author, version, about = "Corkboard server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Create a user account
    CreateUser {
        /// Email for the account
        email: String,
        /// Password for the account
        password: String,
        /// Display name (defaults to the email's local part)
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_status = load_env_file();
    init_tracing();
    report_env_status(&env_status);

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(config).await,
        Command::CreateUser {
            email,
            password,
            name,
        } => run_create_user(config, email, password, name).await,
    }
}

async fn run_serve(config: AppConfig) -> anyhow::Result<()> {
    info!(
        database_path = %config.database_path,
        "Starting server with database configuration"
    );

    let database = Database::connect(&config).await?;
    sqlx::migrate!("./migrations")
        .run(database.pool())
        .await
        .context("failed to apply migrations")?;

    let state = build_state(&database);
    let app = router::build_router(state);

    let listener = TcpListener::bind(config.bind_address)
        .await
        .context("failed to bind socket")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read local address")?;

    info!("listening on {actual_addr}");

    if let Err(error) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(?error, "server terminated with error");
    }

    Ok(())
}

async fn run_create_user(
    config: AppConfig,
    email: String,
    password: String,
    name: Option<String>,
) -> anyhow::Result<()> {
    let email = email.trim().to_owned();
    if email.is_empty() {
        anyhow::bail!("email must not be empty");
    }

    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }

    let database = Database::connect(&config).await?;
    sqlx::migrate!("./migrations")
        .run(database.pool())
        .await
        .context("failed to apply migrations")?;

    let user_store = UserStore::new(&database);
    if user_store.find_by_email(&email).await?.is_some() {
        anyhow::bail!("a user with email {email} already exists");
    }

    let resolved_name = name
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| {
            email
                .split_once('@')
                .map(|(local, _)| local.to_owned())
                .unwrap_or_else(|| email.clone())
        });

    let password_hash = auth::generate_password_hash(&password)
        .map_err(|err| anyhow::anyhow!("failed to hash password: {err}"))?;

    let user = user_store
        .create(&email, &resolved_name, &password_hash, None)
        .await?;

    info!(user_id = %user.id, "created user");
    println!("Created user '{}' ({})", user.email, user.id);

    Ok(())
}

fn init_tracing() {
    // Emit compact JSON to a rolling file by default to keep stdout quiet;
    // set CORKBOARD_LOG_TO_STDOUT for local debugging. RUST_LOG controls the
    // level either way.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let log_to_stdout = std::env::var("CORKBOARD_LOG_TO_STDOUT")
        .map(|v| !v.trim().is_empty() && v.trim() != "0")
        .unwrap_or(false);

    if log_to_stdout {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .try_init();
        return;
    }

    let log_dir = std::env::var("CORKBOARD_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    if let Err(err) = std::fs::create_dir_all(&log_dir) {
        eprintln!("failed to create log dir '{log_dir}': {err}");
        std::process::exit(1);
    }
    let file_appender = tracing_appender::rolling::daily(&log_dir, "server.log");
    let (writer, guard) = non_blocking(file_appender);

    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .json()
        .with_writer(writer)
        .try_init()
        .is_ok()
    {
        let _ = TRACING_GUARD.set(guard);
    }
}

enum EnvLoadStatus {
    Loaded(PathBuf),
    NotFound,
    Failed(DotenvError),
}

fn load_env_file() -> EnvLoadStatus {
    match dotenv() {
        Ok(path) => {
            let display_path = make_relative(&path).unwrap_or(path);
            EnvLoadStatus::Loaded(display_path)
        }
        Err(DotenvError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            EnvLoadStatus::NotFound
        }
        Err(err) => EnvLoadStatus::Failed(err),
    }
}

fn report_env_status(status: &EnvLoadStatus) {
    match status {
        EnvLoadStatus::Loaded(path) => {
            info!("Loaded environment variables from {}", path.display());
        }
        EnvLoadStatus::NotFound => {
            info!("No .env file found; using process environment only");
        }
        EnvLoadStatus::Failed(err) => {
            warn!("Failed to load .env file: {err:?}");
        }
    }
}

fn make_relative(path: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    path.strip_prefix(&cwd).map(|p| p.to_path_buf()).ok()
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut int = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

        tokio::select! {
            _ = term.recv() => {},
            _ = int.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
