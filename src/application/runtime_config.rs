use std::path::{Path, PathBuf};

use crate::cli::{Cli, Command};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub root: PathBuf,
    pub snapshot: Option<PathBuf>,
    pub command: Command,
}

impl RuntimeConfig {
    /// Explicit snapshot path, or the configured one below the root directory.
    pub fn snapshot_path(&self, configured: &Path) -> PathBuf {
        self.snapshot
            .clone()
            .unwrap_or_else(|| self.root.join(configured))
    }
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            root: cli.root,
            snapshot: cli.snapshot,
            command: cli.command,
        }
    }
}
