// src/cli/args.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
#[command(arg_required_else_help = true, disable_help_subcommand = true)]
pub struct Args {
    /// Path to the TOML configuration file (optional)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database, overrides the configuration (optional)
    #[arg(short, long, value_name = "DATABASE", global = true)]
    pub database: Option<PathBuf>,

    /// Verbosity level (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute (serve, add-user, or init-config)
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the bookmark REST API
    Serve {
        /// Address to listen on
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },

    /// Create a user and print its API token
    AddUser {
        /// Unique username
        #[arg(value_name = "USERNAME")]
        username: String,
    },

    /// Write a configuration file with default values
    InitConfig {
        /// Destination, defaults to the user configuration directory
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}
