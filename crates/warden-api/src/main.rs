//! warden-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, spawns the notification dispatcher and the
//! classification consumer, and serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for an admin's `password_hash` in
//! config.toml:
//!
//! ```
//! cargo run -p warden-api --bin warden-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use warden_api::{
  AppState, ServerConfig, auth::AuthConfig, classifier::KeywordClassifier,
};
use warden_core::{
  aggregator::ReportAggregator,
  classify::spawn_consumer,
  engine::ModerationEngine,
  notify::{AdminDirectory, Dispatcher, Message, Transport, spawn_dispatcher},
};
use warden_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Warden moderation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

// ─── Deployment collaborators ────────────────────────────────────────────────

/// Resolves the `admins` audience from the configured admin list.
struct ConfigDirectory {
  admins: Vec<String>,
}

impl AdminDirectory for ConfigDirectory {
  async fn active_admins(
    &self,
  ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
    Ok(self.admins.clone())
  }
}

/// Delivery transport that writes messages to the log. Swap in an email or
/// push transport per deployment; the pipeline is indifferent.
struct LogTransport;

impl Transport for LogTransport {
  async fn send(
    &self,
    message: &Message,
  ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!(
      recipient = %message.recipient,
      subject = %message.subject,
      "notification delivered to log",
    );
    Ok(())
  }
}

// ─── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("WARDEN"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  // Notification pipeline: directory + transport behind a drain task.
  let dispatcher = Arc::new(Dispatcher::new(
    ConfigDirectory {
      admins: server_cfg.admins.iter().map(|a| a.id.clone()).collect(),
    },
    LogTransport,
  ));
  let (notifier, _dispatch_task) = spawn_dispatcher(dispatcher);

  // Engine and aggregator over the shared store.
  let engine = ModerationEngine::new(
    Arc::clone(&store),
    notifier,
    server_cfg.report_threshold,
  );
  let aggregator = ReportAggregator::new(engine.clone());

  // Classification consumer with the built-in keyword classifier.
  let adapter = Arc::new(KeywordClassifier::new(
    server_cfg.flag_terms.clone(),
    server_cfg.reject_terms.clone(),
  ));
  let (queue, _consumer_task) = spawn_consumer(
    engine.clone(),
    adapter,
    Duration::from_secs(server_cfg.classify_timeout_secs),
  );

  // Build application state.
  let state = AppState {
    store,
    engine,
    aggregator,
    queue,
    auth: Arc::new(AuthConfig { admins: server_cfg.admins.clone() }),
  };

  let app = warden_api::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
