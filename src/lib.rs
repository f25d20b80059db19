// src/lib.rs
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;
pub mod util;

use anyhow::{bail, Context, Result};
use config::Config;
use domain::DomainError;
use infrastructure::{SqlitePool, SqliteUserStore};
use ports::http::AppState;
use tracing::{debug, info};

use crate::cli::args::{Args, Command};

pub fn run(args: Args) -> Result<()> {
    debug!(?args, "Starting findfirst with arguments");

    let mut config = Config::resolve(args.config.as_deref())?;
    if let Some(path) = args.database {
        debug!(?path, "Using provided database path");
        config.database.path = path;
    }

    match args.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let pool = SqlitePool::open(&config.database).context("Failed to open database")?;
            let state = AppState::new(pool);

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            runtime.block_on(ports::http::serve(&config.server, state))
        }
        Command::AddUser { username } => {
            let pool = SqlitePool::open(&config.database).context("Failed to open database")?;
            let users = SqliteUserStore::new(pool);
            match users.find_by_username(&username) {
                Ok(existing) => bail!("User {} already exists (id {})", username, existing.id),
                Err(DomainError::UserNotFound(_)) => {}
                Err(e) => return Err(e).context("Failed to look up user"),
            }
            let (user, token) = users
                .create_user(&username)
                .with_context(|| format!("Failed to create user {username}"))?;
            info!(user_id = %user.id, "User created");
            println!("{}", token);
            Ok(())
        }
        Command::InitConfig { path } => {
            let path = path
                .or_else(Config::default_location)
                .context("Could not determine configuration directory")?;
            if path.exists() {
                bail!("Configuration file already exists: {}", path.display());
            }
            Config::create_default(&path)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
/// must be public to be used from integration tests
mod tests {
    use crate::util::testing;
    #[ctor::ctor]
    fn init() {
        testing::init_test_setup().expect("Failed to initialize test setup");
    }
}
