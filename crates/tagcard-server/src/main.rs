//! tagcard server binary.
//!
//! Reads `tagcard.toml` (or the path given with `--config`), opens the
//! SQLite store and serves the tag HTTP surface. The remaining subcommands
//! are operator tools that work directly against the store.
//!
//! # Bootstrapping
//!
//! ```sh
//! tagcard create-admin --username root --email root@example.com
//! tagcard provision --count 20
//! tagcard serve
//! ```

mod config;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tagcard_api::AppState;
use tagcard_core::{
  Accounts,
  account::{AccountInput, Role},
  password::hash_password,
};
use tagcard_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "NFC tag contact-card server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tagcard.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve HTTP (the default).
  Serve,
  /// Create an administrator account. The password is read from stdin.
  CreateAdmin {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email:    String,
  },
  /// Create a standard account with no tag. The password is read from stdin.
  CreateUser {
    #[arg(long)]
    username:   String,
    #[arg(long)]
    email:      String,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name:  Option<String>,
  },
  /// Promote an existing account to administrator.
  GrantAdmin {
    #[arg(long)]
    username: String,
  },
  /// Mint unbound tags and print their scan URLs.
  Provision {
    #[arg(long, default_value_t = 1)]
    count: u32,
  },
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => {
      let (cfg, store) = open(&cli.config).await?;
      serve(store, &cfg).await
    }
    Command::CreateAdmin { username, email } => {
      let (_, store) = open(&cli.config).await?;
      let password = rpassword_or_stdin()?;
      let account = Accounts::new(store)
        .create_account(AccountInput::new(username, email, password), Role::Administrator)
        .await?;
      println!("created administrator {} ({})", account.username, account.account_id);
      Ok(())
    }
    Command::CreateUser { username, email, first_name, last_name } => {
      let (_, store) = open(&cli.config).await?;
      let password = rpassword_or_stdin()?;
      let input = AccountInput {
        first_name,
        last_name,
        ..AccountInput::new(username, email, password)
      };
      let account = Accounts::new(store).create_account(input, Role::Standard).await?;
      println!("created account {} ({})", account.username, account.account_id);
      Ok(())
    }
    Command::GrantAdmin { username } => {
      let (_, store) = open(&cli.config).await?;
      let account = Accounts::new(store).grant_administrator(&username).await?;
      println!("{} is now an administrator", account.username);
      Ok(())
    }
    Command::Provision { count } => {
      let (cfg, store) = open(&cli.config).await?;
      let state =
        AppState::new(store, &cfg.base_url).with_max_batch(cfg.max_provision_batch);
      for tag in state.provisioner.provision_tags(count).await? {
        println!("{}", state.scan_url(tag.tag_id));
      }
      Ok(())
    }
    Command::HashPassword => {
      let password = rpassword_or_stdin()?;
      println!("{}", hash_password(&password)?);
      Ok(())
    }
  }
}

async fn open(path: &Path) -> anyhow::Result<(ServerConfig, Arc<SqliteStore>)> {
  let cfg = ServerConfig::load(path)?;
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  Ok((cfg, Arc::new(store)))
}

async fn serve(store: Arc<SqliteStore>, cfg: &ServerConfig) -> anyhow::Result<()> {
  let state =
    AppState::new(store, &cfg.base_url).with_max_batch(cfg.max_provision_batch);
  let app = tagcard_api::router(state);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Prompt for a password and read one line from stdin.
fn rpassword_or_stdin() -> anyhow::Result<String> {
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
