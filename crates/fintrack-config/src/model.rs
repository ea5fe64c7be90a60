use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name of the folder created under the user's documents (or home) directory.
pub const DEFAULT_DATA_FOLDER: &str = "Fintrack";

/// Stores user preferences plus the labels used for engine-generated entries.
///
/// Every field has a default so older or hand-edited files still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    /// Category shown for transactions without one.
    pub fallback_category: String,
    /// Appended to descriptions of transactions created from recurring rules.
    pub recurring_suffix: String,
    pub deposit_category: String,
    pub transfer_category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom data directory. Defaults to `~/Documents/Fintrack`.
    pub data_dir: Option<PathBuf>,
    pub backup_retention: usize,
    /// `tracing` filter directive, e.g. `fintrack=debug`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "USD".into(),
            fallback_category: "Other".into(),
            recurring_suffix: " (Recurring)".into(),
            deposit_category: "Deposit".into(),
            transfer_category: "Transfer".into(),
            data_dir: None,
            backup_retention: 5,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(path) = &self.data_dir {
            return path.clone();
        }

        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join(DEFAULT_DATA_FOLDER)
    }
}
