use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{Config, ConfigError};

const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";

/// Handles persistence and backup management for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf, backups_dir: PathBuf) -> Self {
        Self {
            config_path,
            backups_dir,
        }
    }

    /// Lays out `<base>/config/config.json` and `<base>/config/backups`.
    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        let config_dir = base.join("config");
        let backups_dir = config_dir.join("backups");
        fs::create_dir_all(&backups_dir)?;
        Ok(Self::new(config_dir.join("config.json"), backups_dir))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Reads the stored config, or defaults when no file exists yet.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        read_config(&self.config_path)
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        write_atomic(&self.config_path, &serde_json::to_string_pretty(config)?)
    }

    /// Writes a timestamped copy of `config` and returns the backup file name.
    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String, ConfigError> {
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut name = format!("config_{timestamp}");
        if let Some(label) = sanitize_note(note) {
            name.push('_');
            name.push_str(&label);
        }
        name.push('.');
        name.push_str(BACKUP_EXTENSION);
        write_atomic(
            &self.backups_dir.join(&name),
            &serde_json::to_string_pretty(config)?,
        )?;
        Ok(name)
    }

    /// Loads a backup and makes it the current config.
    pub fn restore(&self, backup_name: &str) -> Result<Config, ConfigError> {
        let path = self.backups_dir.join(backup_name);
        if !path.exists() {
            return Err(ConfigError::BackupNotFound(backup_name.to_string()));
        }
        let config = read_config(&path)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, ConfigError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_timestamp(b)
                .cmp(&parse_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{BACKUP_EXTENSION}"))?;
    let mut segments = trimmed.split('_').skip(1);
    let date_part = segments.next()?;
    let time_part = segments.next()?;
    if date_part.len() != 8 || time_part.len() != 6 {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date_part}{time_part}"), "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    fs::rename(&tmp, path)?;
    Ok(())
}
