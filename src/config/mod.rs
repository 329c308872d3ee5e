mod settings;

pub use settings::{ColorMode, Settings, SettingsError};
