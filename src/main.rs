use std::io::IsTerminal as _;

use clap::Parser as _;
use drivetree::{
    application::{Application, ApplicationError, data::LogLevel},
    cli::Cli,
};
use tracing::debug;

#[compio::main]
#[snafu::report]
async fn main() -> Result<(), ApplicationError> {
    let cli_args = Cli::parse();
    init_diagnostics(cli_args.log_level);
    debug!("Parsed CLI arguments: {cli_args:?}");

    Application::run(cli_args).await
}

/// Diagnostics go to stderr so command output on stdout stays pipeable.
fn init_diagnostics(log_level: LogLevel) {
    tracing_subscriber::fmt()
        .with_max_level(log_level.level_filter())
        .with_target(log_level.shows_targets())
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
}
