//! Module records and the remote metadata they are built from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Descriptor served at a module's metadata URL.
///
/// Fields other than the three the registry reads are kept in `extra` and
/// written back out unchanged, so the persisted record carries everything the
/// remote document provided.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleMetadata {
    #[serde(rename = "sourceName")]
    pub source_name: String,

    #[serde(rename = "scriptURL")]
    pub script_url: String,

    pub version: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One managed module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: Uuid,

    pub metadata: ModuleMetadata,

    /// Script filename, relative to the storage directory.
    #[serde(rename = "localPath")]
    pub local_path: String,

    #[serde(rename = "metadataURL")]
    pub metadata_url: String,

    /// Reserved for consumers that run modules; the registry never changes it.
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

impl ModuleRecord {
    pub fn new(metadata: ModuleMetadata, local_path: String, metadata_url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            metadata,
            local_path,
            metadata_url,
            is_active: false,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.metadata.source_name
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    pub fn summary(&self) -> ModuleSummary {
        ModuleSummary {
            id: self.id.to_string(),
            name: self.metadata.source_name.clone(),
        }
    }
}

/// Display pair returned by `Registry::list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub id: String,
    pub name: String,
}

/// Generates the filename a freshly downloaded script is stored under.
pub(crate) fn script_file_name() -> String {
    format!("{}.js", Uuid::new_v4())
}
