use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::data::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Browse and edit a drive snapshot by path")]
pub struct Cli {
    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// The directory holding drivetree.yaml
    #[clap(long, short, default_value = ".")]
    pub root: PathBuf,

    /// Snapshot file to use instead of the configured one
    #[clap(long, short)]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the entries of a folder
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    /// Print the remote id of a path
    Id { path: String },
    /// Show details of a file or folder
    Stat { path: String },
    /// Print a folder and everything below it
    Tree {
        #[arg(default_value = "")]
        path: String,
    },
    /// Print the content of a file
    Cat { path: String },
    /// Create a folder
    Mkdir { path: String },
    /// Create a text file
    Put {
        path: String,
        #[arg(long, short)]
        content: String,
    },
    /// Delete a file or folder
    Rm { path: String },
}

impl Command {
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::Mkdir { .. } | Command::Put { .. } | Command::Rm { .. }
        )
    }
}
