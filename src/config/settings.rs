use std::{
    borrow::Cow,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};

use compio::fs;
use derive_more::Display;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::debug;

const SETTINGS_FILE_NAME: &str = "drivetree.yaml";
const DEFAULT_SNAPSHOT_FILE_NAME: &str = "drive.yaml";

fn get_settings_file_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE_NAME)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ColorMode {
    #[default]
    #[display("auto")]
    Auto,
    #[display("always")]
    Always,
    #[display("never")]
    Never,
}

impl FromStr for ColorMode {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            _ => InvalidValueSnafu { key: "color" }.fail(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Snapshot file, relative to the root directory.
    pub snapshot: PathBuf,
    pub color: ColorMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from(DEFAULT_SNAPSHOT_FILE_NAME),
            color: ColorMode::default(),
        }
    }
}

impl Settings {
    pub async fn read(root: &Path) -> Result<Self, SettingsError> {
        Self::from_path(get_settings_file_path(root)).await
    }

    pub async fn from_path(path: PathBuf) -> Result<Self, SettingsError> {
        debug!("Reading settings file: {}", path.display());
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No settings file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).context(ReadSnafu {
                    file_path: path.display().to_string(),
                });
            }
        };
        debug!("Successfully read settings file: {} bytes", bytes.len());
        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.display().to_string(),
        })?;
        Self::try_from(contents.as_str())
    }

    fn string_setting<'a>(
        top_level: &'a LinkedHashMap<Yaml, Yaml>,
        key: &'static str,
    ) -> Result<Option<&'a str>, SettingsError> {
        match top_level.get(&Yaml::Value(Scalar::String(Cow::Borrowed(key)))) {
            None => Ok(None),
            Some(value) => value.as_str().map(Some).context(InvalidValueSnafu { key }),
        }
    }
}

impl TryFrom<&str> for Settings {
    type Error = SettingsError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let contents_vec =
            Yaml::load_from_str(contents).map_err(|e| SettingsError::ParseError { source: e })?;
        let Some(contents) = contents_vec.first() else {
            // An empty file has no document at all
            return Ok(Self::default());
        };
        if matches!(contents, Yaml::Value(Scalar::Null)) {
            return Ok(Self::default());
        }

        let top_level = contents
            .as_mapping()
            .ok_or(SettingsError::TopLevelNotMap)?;

        let mut settings = Self::default();
        if let Some(snapshot) = Self::string_setting(top_level, "snapshot")? {
            ensure!(!snapshot.is_empty(), InvalidValueSnafu { key: "snapshot" });
            settings.snapshot = PathBuf::from(snapshot);
        }
        if let Some(color) = Self::string_setting(top_level, "color")? {
            settings.color = color.parse()?;
        }

        Ok(settings)
    }
}

#[derive(Debug, Snafu)]
pub enum SettingsError {
    #[snafu(display("Failed to read the settings file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Settings file is not valid UTF-8: {}", file_path))]
    EncodingError {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the settings file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of settings should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Setting '{}' has an invalid value", key))]
    InvalidValue { key: &'static str },
}
