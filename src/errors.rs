use fintrack_config::ConfigError;
use fintrack_core::CoreError;
use thiserror::Error;

/// Failures surfaced by a [`crate::Session`].
#[derive(Debug, Error)]
pub enum FintrackError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Backups require file-backed storage")]
    BackupsUnavailable,
    #[error("Session was not opened from a config directory")]
    ConfigUnavailable,
}
