use crate::matcher::DEFAULT_TIMEOUT;
use crate::sequence::Sequence;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timeout_ms: u64,
    pub sequence: Sequence,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            sequence: Sequence::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let string = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = toml::from_str(&string)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = Config::load_from_file("konami.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = toml::from_str("timeout_ms = 300").unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(300));
        assert_eq!(config.sequence, Sequence::konami());

        let config: Config = toml::from_str(r#"sequence = "<Enter>ok""#).unwrap();
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.sequence, Sequence::new(["Enter", "o", "k"]));
    }

    #[test]
    fn test_missing_file_names_path() {
        let error = Config::load_from_file("does/not/exist.toml").unwrap_err();
        assert!(error.to_string().contains("does/not/exist.toml"));
    }
}
