use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to open config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directory holding `modules.json` and the cached scripts.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    #[serde(default = "default_true")]
    pub create_storage_dir: bool,

    #[serde(default = "default_request_timeout", with = "duration_ms")]
    pub request_timeout: Duration,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            create_storage_dir: default_true(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("data/modules")
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("scraper-registry/{}", env!("CARGO_PKG_VERSION"))
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> ConfigResult<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> ConfigResult<T> {
    let config = serde_json::from_str(s)?;
    Ok(config)
}

pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_registry_config_serde() {
        let config = RegistryConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        tracing::debug!("{}", json);
        let deserialized: RegistryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(format!("{:?}", config), format!("{:?}", deserialized));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RegistryConfig =
            from_str(r#"{"storage_dir": "/var/lib/scrapers", "request_timeout": 1500}"#).unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/scrapers"));
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert!(config.create_storage_dir);
        assert!(config.user_agent.starts_with("scraper-registry/"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"create_storage_dir": false}}"#).unwrap();

        let config: RegistryConfig = from_file(file.path()).unwrap();
        assert!(!config.create_storage_dir);
        assert_eq!(config.storage_dir, default_storage_dir());
    }

    #[test]
    fn test_from_file_errors() {
        let missing = from_file::<RegistryConfig, _>("/nonexistent/registry.json");
        assert!(matches!(missing, Err(ConfigError::Io(_))));

        let malformed = from_str::<RegistryConfig>("{not json");
        assert!(matches!(malformed, Err(ConfigError::Json(_))));
    }
}
