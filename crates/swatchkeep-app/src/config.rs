//! Application configuration for the native shell.

use std::path::PathBuf;
use swatchkeep_core::ColorFormat;
use swatchkeep_core::storage::{StorageResult, default_data_dir};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "SWATCHKEEP_DATA_DIR";

/// Environment variable selecting the default output format.
pub const FORMAT_ENV: &str = "SWATCHKEEP_FORMAT";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppConfig {
    /// Directory holding `storage.json`. `None` uses the platform data dir.
    pub data_dir: Option<PathBuf>,
    /// Format used when a command doesn't ask for one.
    pub format: ColorFormat,
}

impl AppConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from a variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(format) = lookup(FORMAT_ENV) {
            match format.parse() {
                Ok(format) => config.format = format,
                Err(e) => log::warn!("Ignoring {}: {}", FORMAT_ENV, e),
            }
        }

        config
    }

    /// Apply a command-line data directory, which wins over the environment.
    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        if dir.is_some() {
            self.data_dir = dir;
        }
        self
    }

    /// The directory storage lives in.
    pub fn storage_dir(&self) -> StorageResult<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.format, ColorFormat::Hex);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[(DATA_DIR_ENV, "/tmp/swatches"), (FORMAT_ENV, "HSL")]));
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/swatches")));
        assert_eq!(config.format, ColorFormat::Hsl);
        assert_eq!(config.storage_dir().unwrap(), PathBuf::from("/tmp/swatches"));
    }

    #[test]
    fn test_bad_values_are_ignored() {
        let config = AppConfig::from_lookup(lookup(&[(DATA_DIR_ENV, "  "), (FORMAT_ENV, "cmyk")]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_flag_wins_over_env() {
        let config = AppConfig::from_lookup(lookup(&[(DATA_DIR_ENV, "/from/env")]))
            .with_data_dir(Some(PathBuf::from("/from/flag")));
        assert_eq!(config.data_dir, Some(PathBuf::from("/from/flag")));

        let config = AppConfig::from_lookup(lookup(&[(DATA_DIR_ENV, "/from/env")])).with_data_dir(None);
        assert_eq!(config.data_dir, Some(PathBuf::from("/from/env")));
    }
}
