mod application;
mod commands;
pub mod data;
mod runtime_config;

pub use application::{Application, ApplicationError};
pub use commands::{CommandError, execute};
pub use runtime_config::RuntimeConfig;
