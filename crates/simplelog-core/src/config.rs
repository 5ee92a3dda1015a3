//! Service configuration loaded from TOML

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Default name of the configuration file
pub const CONFIG_FILENAME: &str = "simplelog.toml";

/// Settings for one log service instance
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ServiceConfig {
    /// Capacity of the message channel; producers wait when it is full
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Log file opened right after startup
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Rename the old file to `<name>_<timestamp>` when switching files
    #[serde(default)]
    pub archive_on_switch: bool,

    /// How often buffered file output is flushed
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    #[serde(default)]
    pub stdout_prefix: String,

    #[serde(default)]
    pub file_prefix: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            log_file: None,
            archive_on_switch: false,
            flush_interval_ms: default_flush_interval_ms(),
            stdout_prefix: String::new(),
            file_prefix: String::new(),
        }
    }
}

impl ServiceConfig {
    pub fn flush_interval(&self) -> Duration {
        // A zero interval would make the ticker spin
        Duration::from_millis(self.flush_interval_ms.max(1))
    }
}

fn default_buffer_capacity() -> usize {
    10
}

fn default_flush_interval_ms() -> u64 {
    1000
}

/// Load configuration from a TOML file
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_config(path: &Path) -> ServiceConfig {
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return ServiceConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                debug!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                ServiceConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            ServiceConfig::default()
        }
    }
}

/// Write a commented default configuration file if none exists
pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::config(format!("Failed to create {:?}: {}", parent, e)))?;
        }
    }

    let default_content = r#"# simplelog configuration

buffer_capacity = 10        # Records queued before writers wait
# log_file = "app.log"      # Opened right after startup
archive_on_switch = false   # Rename the old file to <name>_<yyyymmddHHMMSS> on switch
flush_interval_ms = 1000    # Periodic flush of buffered file output
stdout_prefix = ""
file_prefix = ""
"#;
    std::fs::write(path, default_content)
        .map_err(|e| Error::config(format!("Failed to write {:?}: {}", path, e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_defaults() {
        let temp = tempdir().unwrap();
        let config = load_config(&temp.path().join(CONFIG_FILENAME));

        assert_eq!(config.buffer_capacity, 10);
        assert_eq!(config.flush_interval_ms, 1000);
        assert!(config.log_file.is_none());
        assert!(!config.archive_on_switch);
    }

    #[test]
    fn test_load_config_custom() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
buffer_capacity = 64
log_file = "service.log"
archive_on_switch = true
file_prefix = "[svc] "
"#,
        )
        .unwrap();

        let config = load_config(&path);

        assert_eq!(config.buffer_capacity, 64);
        assert_eq!(config.log_file, Some(PathBuf::from("service.log")));
        assert!(config.archive_on_switch);
        assert_eq!(config.file_prefix, "[svc] ");
        assert_eq!(config.stdout_prefix, "");
        assert_eq!(config.flush_interval_ms, 1000);
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "not valid toml {{{{").unwrap();

        assert_eq!(load_config(&path), ServiceConfig::default());
    }

    #[test]
    fn test_write_default_config_is_valid() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join(CONFIG_FILENAME);

        write_default_config(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: ServiceConfig =
            toml::from_str(&content).expect("Default config should be valid TOML");
        assert_eq!(parsed, ServiceConfig::default());
    }

    #[test]
    fn test_write_default_config_keeps_existing() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "buffer_capacity = 3\n").unwrap();

        write_default_config(&path).unwrap();

        assert_eq!(load_config(&path).buffer_capacity, 3);
    }

    #[test]
    fn test_flush_interval_never_zero() {
        let config = ServiceConfig {
            flush_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.flush_interval(), Duration::from_millis(1));
    }
}
