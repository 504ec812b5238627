//! CLI error type.

use std::fmt;

use console::style;
use offmap::app::AppError;
use offmap::auth::AuthError;
use offmap::config::ConfigError;
use offmap::logging::LoggingError;

/// Errors reported by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded, parsed or saved.
    Config(String),

    /// An application operation failed.
    App(AppError),

    /// Sign-in token could not be stored or removed.
    Auth(AuthError),

    /// Logging could not be initialized.
    Logging(LoggingError),

    /// Terminal interaction failed.
    Prompt(String),

    /// Writing output failed.
    Output(String),
}

impl CliError {
    /// Prints the error to stderr.
    pub fn display(&self) {
        eprintln!("{} {}", style("✗").red().bold(), style(self).red().bold());
        if let Some(hint) = self.hint() {
            eprintln!("  {}", style(hint).yellow());
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::App(AppError::SignedOut) => Some("Run 'offmap login' first."),
            CliError::App(AppError::UnknownArea(_)) => Some("Run 'offmap areas' to see available areas."),
            CliError::App(AppError::MapNotFound(_)) => Some("Run 'offmap download <area>' first."),
            CliError::App(AppError::Persist(e)) if e.is_quota_exceeded() => {
                Some("Run 'offmap list' and 'offmap delete <area>' to free space.")
            }
            CliError::Config(_) => Some("Run 'offmap config list' to see available keys."),
            _ => None,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Auth(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Prompt(msg) => write!(f, "Prompt failed: {}", msg),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<AuthError> for CliError {
    fn from(e: AuthError) -> Self {
        CliError::Auth(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(e: dialoguer::Error) -> Self {
        CliError::Prompt(e.to_string())
    }
}
