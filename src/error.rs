use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Module already exists: {metadata_url}")]
    AlreadyExists { metadata_url: String },
    #[error("Module not found: {id}")]
    NotFound { id: Uuid },
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("Failed to parse response from {url}: {message}")]
    Parse { url: String, message: String },
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    pub fn fetch<U: Into<String>, M: ToString>(url: U, message: M) -> Self {
        RegistryError::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn parse<U: Into<String>, M: ToString>(url: U, message: M) -> Self {
        RegistryError::Parse {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        RegistryError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RegistryError::AlreadyExists {
            metadata_url: "http://x/meta1".to_string(),
        };
        assert_eq!(err.to_string(), "Module already exists: http://x/meta1");

        let err = RegistryError::fetch("http://x/s1", "connection refused");
        assert_eq!(
            err.to_string(),
            "Failed to fetch http://x/s1: connection refused"
        );

        let err = RegistryError::io(
            "/tmp/missing.js",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(err.to_string(), "IO error on /tmp/missing.js: no such file");
    }
}
