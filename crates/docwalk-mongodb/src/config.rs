//! Workflow and client configuration
//!
//! Configuration is plain serde data. A TOML file holds it under a
//! `[workflow]` table, with driver options under `[workflow.client]`:
//!
//! ```toml
//! [workflow]
//! address = "mongodb://localhost:27017"
//! database = "baz"
//! collection = "qux"
//! operation_timeout_secs = 30
//!
//! [workflow.client]
//! max_pool_size = 20
//! app_name = "docwalk"
//! ```
//!
//! A `0` (or `""` for `app_name`) switches an option off. Unset options are
//! written that way too, so printed config reloads unchanged.

use std::path::Path;
use std::time::Duration;

use docwalk_common::{DocwalkError, Result};
use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use serde::{Deserialize, Serialize};

use crate::validation::{ValidatedCollectionName, ValidatedDatabaseName};

pub const DEFAULT_ADDRESS: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "baz";
pub const DEFAULT_COLLECTION: &str = "qux";

/// Driver client options passed through to `mongodb::options::ClientOptions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Minimum number of connections in the pool
    #[serde(with = "zero_as_none")]
    pub min_pool_size: Option<u32>,
    /// Maximum number of connections in the pool (default: 10)
    #[serde(with = "zero_as_none")]
    pub max_pool_size: Option<u32>,
    /// Maximum time a connection can remain idle before being closed
    #[serde(rename = "max_idle_time_secs", with = "duration_secs")]
    pub max_idle_time: Option<Duration>,
    /// Connection timeout (default: 10s)
    #[serde(rename = "connect_timeout_secs", with = "duration_secs")]
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout (default: 30s)
    #[serde(rename = "server_selection_timeout_secs", with = "duration_secs")]
    pub server_selection_timeout: Option<Duration>,
    /// Application name for server logs
    #[serde(with = "empty_as_none")]
    pub app_name: Option<String>,
    /// Pin the stable API version 1
    pub stable_api: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            min_pool_size: None,
            max_pool_size: Some(10),
            max_idle_time: None,
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            app_name: Some("docwalk".to_string()),
            stable_api: true,
        }
    }
}

impl ClientConfig {
    /// Overlay the configured values onto parsed connection-string options
    pub fn apply(&self, client_options: &mut ClientOptions) {
        if let Some(min) = self.min_pool_size {
            client_options.min_pool_size = Some(min);
        }
        if let Some(max) = self.max_pool_size {
            client_options.max_pool_size = Some(max);
        }
        if let Some(idle) = self.max_idle_time {
            client_options.max_idle_time = Some(idle);
        }
        if let Some(connect) = self.connect_timeout {
            client_options.connect_timeout = Some(connect);
        }
        if let Some(server_sel) = self.server_selection_timeout {
            client_options.server_selection_timeout = Some(server_sel);
        }
        if let Some(app) = &self.app_name {
            client_options.app_name = Some(app.clone());
        }
        if self.stable_api {
            let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
            client_options.server_api = Some(server_api);
        }
    }
}

/// Everything the workflow runner needs to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Connection string, e.g. `mongodb://localhost:27017`
    pub address: String,
    pub database: String,
    pub collection: String,
    /// Deadline applied to every database call; `None` waits indefinitely
    #[serde(rename = "operation_timeout_secs", with = "duration_secs")]
    pub operation_timeout: Option<Duration>,
    /// Drop the collection before inserting, so a run always starts empty
    pub drop_before_run: bool,
    pub client: ClientConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            operation_timeout: Some(Duration::from_secs(30)),
            drop_before_run: false,
            client: ClientConfig::default(),
        }
    }
}

impl WorkflowConfig {
    /// Check names and options before anything touches the network
    pub fn validate(&self) -> Result<()> {
        if !(self.address.starts_with("mongodb://") || self.address.starts_with("mongodb+srv://")) {
            return Err(DocwalkError::Config(format!(
                "address must start with mongodb:// or mongodb+srv://, got '{}'",
                self.address
            )));
        }

        ValidatedDatabaseName::new(&self.database)?;
        ValidatedCollectionName::new(&self.collection)?;

        if let (Some(min), Some(max)) = (self.client.min_pool_size, self.client.max_pool_size) {
            if min > max {
                return Err(DocwalkError::Config(format!(
                    "min_pool_size ({}) exceeds max_pool_size ({})",
                    min, max
                )));
            }
        }

        Ok(())
    }
}

/// On-disk layout: the workflow settings live under `[workflow]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

impl ConfigFile {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DocwalkError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl From<WorkflowConfig> for ConfigFile {
    fn from(workflow: WorkflowConfig) -> Self {
        Self { workflow }
    }
}

/// `Option<Duration>` as whole seconds, `0` meaning `None`
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.map_or(0, |d| d.as_secs()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok((secs > 0).then(|| Duration::from_secs(secs)))
    }
}

/// `Option<u32>` with `0` meaning `None`
mod zero_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(value.unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let value = u32::deserialize(deserializer)?;
        Ok((value > 0).then_some(value))
    }
}

/// `Option<String>` with `""` meaning `None`
mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or_default())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok((!value.is_empty()).then_some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_workflow_config() {
        let config = WorkflowConfig::default();
        assert_eq!(config.address, "mongodb://localhost:27017");
        assert_eq!(config.database, "baz");
        assert_eq!(config.collection, "qux");
        assert_eq!(config.operation_timeout, Some(Duration::from_secs(30)));
        assert!(!config.drop_before_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_client_config() {
        let config = ClientConfig::default();
        assert_eq!(config.max_pool_size, Some(10));
        assert_eq!(config.app_name, Some("docwalk".to_string()));
        assert!(config.stable_api);
    }

    #[test]
    fn test_apply_client_config() {
        let mut options = ClientOptions::default();
        let config = ClientConfig {
            min_pool_size: Some(2),
            max_pool_size: Some(4),
            max_idle_time: Some(Duration::from_secs(60)),
            connect_timeout: Some(Duration::from_secs(5)),
            server_selection_timeout: Some(Duration::from_secs(7)),
            app_name: Some("walker".to_string()),
            stable_api: false,
        };
        config.apply(&mut options);

        assert_eq!(options.min_pool_size, Some(2));
        assert_eq!(options.max_pool_size, Some(4));
        assert_eq!(options.max_idle_time, Some(Duration::from_secs(60)));
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.server_selection_timeout, Some(Duration::from_secs(7)));
        assert_eq!(options.app_name.as_deref(), Some("walker"));
        assert!(options.server_api.is_none());
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let file = ConfigFile::from_toml_str(
            r#"
            [workflow]
            database = "inventory"
            operation_timeout_secs = 5

            [workflow.client]
            max_pool_size = 3
            "#,
        )
        .unwrap();

        let config = file.workflow;
        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert_eq!(config.database, "inventory");
        assert_eq!(config.collection, DEFAULT_COLLECTION);
        assert_eq!(config.operation_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.client.max_pool_size, Some(3));
        assert_eq!(config.client.app_name, Some("docwalk".to_string()));
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = ConfigFile::from_toml_str("").unwrap();
        assert_eq!(file.workflow, WorkflowConfig::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let err = ConfigFile::from_toml_str("[workflow\naddress = 1").unwrap_err();
        assert!(matches!(err, DocwalkError::Config(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let original = ConfigFile::from(WorkflowConfig {
            collection: "people".to_string(),
            drop_before_run: true,
            ..WorkflowConfig::default()
        });
        let text = original.to_toml_string().unwrap();
        assert!(text.contains("[workflow]"));
        assert_eq!(ConfigFile::from_toml_str(&text).unwrap(), original);
    }

    #[test]
    fn test_toml_roundtrip_keeps_disabled_options() {
        let original = ConfigFile::from(WorkflowConfig {
            operation_timeout: None,
            client: ClientConfig {
                min_pool_size: None,
                max_pool_size: None,
                max_idle_time: None,
                connect_timeout: None,
                server_selection_timeout: None,
                app_name: None,
                stable_api: false,
            },
            ..WorkflowConfig::default()
        });
        let text = original.to_toml_string().unwrap();
        assert!(text.contains("operation_timeout_secs = 0"));
        assert!(text.contains("app_name = \"\""));

        let reloaded = ConfigFile::from_toml_str(&text).unwrap();
        assert_eq!(reloaded, original);
        assert_eq!(reloaded.workflow.operation_timeout, None);
        assert_eq!(reloaded.workflow.client.max_pool_size, None);
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let file = ConfigFile::from_toml_str(
            r#"
            [workflow]
            operation_timeout_secs = 0

            [workflow.client]
            connect_timeout_secs = 0
            max_pool_size = 0
            "#,
        )
        .unwrap();

        let config = file.workflow;
        assert_eq!(config.operation_timeout, None);
        assert_eq!(config.client.connect_timeout, None);
        assert_eq!(config.client.max_pool_size, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigFile::load(Path::new("/nonexistent/docwalk.toml")).unwrap_err();
        assert!(matches!(err, DocwalkError::Config(_)));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docwalk.toml");
        std::fs::write(&path, "[workflow]\ncollection = \"people\"\n").unwrap();

        let file = ConfigFile::load(&path).unwrap();
        assert_eq!(file.workflow.collection, "people");
    }

    #[test]
    fn test_validate_rejects_bad_address() {
        let config = WorkflowConfig {
            address: "http://localhost:27017".to_string(),
            ..WorkflowConfig::default()
        };
        assert!(matches!(config.validate(), Err(DocwalkError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let config = WorkflowConfig {
            collection: "system.users".to_string(),
            ..WorkflowConfig::default()
        };
        assert!(matches!(config.validate(), Err(DocwalkError::Validation(_))));

        let config = WorkflowConfig {
            database: "my.db".to_string(),
            ..WorkflowConfig::default()
        };
        assert!(matches!(config.validate(), Err(DocwalkError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_pool_bounds() {
        let mut config = WorkflowConfig::default();
        config.client.min_pool_size = Some(8);
        config.client.max_pool_size = Some(2);
        assert!(matches!(config.validate(), Err(DocwalkError::Config(_))));
    }
}
