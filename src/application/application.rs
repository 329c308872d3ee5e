use snafu::Snafu;
use snafu::prelude::*;
use supports_color::Stream;
use tracing::{debug, info};

use crate::application::RuntimeConfig;
use crate::application::commands::{self, CommandError};
use crate::config::{ColorMode, Settings, SettingsError};
use crate::storage::{DriveStorage, MemoryStore, SnapshotError, StorageError};

pub struct Application;

impl Application {
    pub async fn run(runtime_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let runtime_config: RuntimeConfig = runtime_config.into();
        let settings = Settings::read(&runtime_config.root)
            .await
            .context(SettingsSnafu)?;
        debug!("Loaded settings: {:?}", settings);
        apply_color_mode(settings.color);

        let snapshot_path = runtime_config.snapshot_path(&settings.snapshot);
        let store = MemoryStore::load(&snapshot_path)
            .await
            .context(LoadSnapshotSnafu)?;
        let mut storage = DriveStorage::connect(store).await.context(ConnectSnafu)?;

        let lines = commands::execute(&mut storage, &runtime_config.command)
            .await
            .context(CommandSnafu)?;
        for line in lines {
            println!("{line}");
        }

        if runtime_config.command.is_mutating() {
            info!("Writing snapshot to {}", snapshot_path.display());
            storage
                .store()
                .save(&snapshot_path)
                .await
                .context(SaveSnapshotSnafu)?;
        }

        Ok(())
    }
}

fn apply_color_mode(mode: ColorMode) {
    let enabled = match mode {
        ColorMode::Auto => supports_color::on(Stream::Stdout).is_some(),
        ColorMode::Always => true,
        ColorMode::Never => false,
    };
    colored::control::set_override(enabled);
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while reading settings"))]
    SettingsError { source: SettingsError },
    #[snafu(display("Critical failure encountered while loading the snapshot"))]
    LoadSnapshotError { source: SnapshotError },
    #[snafu(display("Critical failure encountered while indexing the drive"))]
    ConnectError { source: StorageError },
    #[snafu(display("Command failed"))]
    CommandError { source: CommandError },
    #[snafu(display("Critical failure encountered while saving the snapshot"))]
    SaveSnapshotError { source: SnapshotError },
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;
    use crate::cli::Command;

    const SNAPSHOT: &str = "\
root_id: R
objects:
  - id: A
    title: data
    mimeType: application/vnd.google-apps.folder
    parents:
      - id: R
        isRoot: true
";

    fn config(root: &Path, command: Command) -> RuntimeConfig {
        if !root.join("drivetree.yaml").exists() {
            std::fs::write(root.join("drivetree.yaml"), "color: never\n")
                .expect("Failed to write settings");
        }
        RuntimeConfig {
            root: root.to_path_buf(),
            snapshot: None,
            command,
        }
    }

    #[compio::test]
    async fn mutating_commands_persist_the_snapshot() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(dir.path().join("drive.yaml"), SNAPSHOT)
            .expect("Failed to write snapshot");

        let put = Command::Put {
            path: "data/notes.txt".to_string(),
            content: "hello".to_string(),
        };
        Application::run(config(dir.path(), put)).await.unwrap();

        let store = MemoryStore::load(&dir.path().join("drive.yaml"))
            .await
            .unwrap();
        let storage = DriveStorage::connect(store).await.unwrap();
        assert!(storage.path_exists("data/notes.txt").unwrap().is_some());
        assert_eq!(
            storage.read_file("data/notes.txt").await.unwrap(),
            b"hello".to_vec()
        );
    }

    #[compio::test]
    async fn settings_choose_the_snapshot_file() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(dir.path().join("team.yaml"), SNAPSHOT).expect("Failed to write snapshot");
        std::fs::write(
            dir.path().join("drivetree.yaml"),
            "snapshot: team.yaml\ncolor: never\n",
        )
        .expect("Failed to write settings");

        let ls = Command::Ls {
            path: String::new(),
        };
        Application::run(config(dir.path(), ls)).await.unwrap();
    }

    #[compio::test]
    async fn missing_snapshot_fails_to_load() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let ls = Command::Ls {
            path: String::new(),
        };
        let result = Application::run(config(dir.path(), ls)).await;
        assert!(matches!(
            result,
            Err(ApplicationError::LoadSnapshotError { .. })
        ));
    }

    #[compio::test]
    async fn command_errors_are_reported() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(dir.path().join("drive.yaml"), SNAPSHOT)
            .expect("Failed to write snapshot");
        let cat = Command::Cat {
            path: "data/missing.txt".to_string(),
        };
        let result = Application::run(config(dir.path(), cat)).await;
        assert!(matches!(result, Err(ApplicationError::CommandError { .. })));
    }
}
