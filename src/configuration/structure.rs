use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use self::brokerpak_source::BrokerpakSourceConfig;
use super::{
    error::ValidationError,
    traits::{ValidatableConfiguration, ValidatableConfigurationWithContext},
    validators::{check_identifier, check_json_object},
};

mod brokerpak_source;


/// Name the single source is registered under when loading from a local path.
pub const LOCAL_BROKERPAK_NAME: &str = "local-brokerpak";



/// The brokerpak configuration of the whole server.
///
/// Brokerpaks are kept in a [`BTreeMap`], so iteration (and therefore validation
/// and error reporting) is in lexicographic order of their names.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Default, Debug)]
pub struct ServerConfig {
    /// Global settings shared by all brokerpaks, as a JSON object.
    pub config: String,

    /// Brokerpaks to load, keyed by name.
    #[serde(default)]
    pub brokerpaks: BTreeMap<String, BrokerpakSourceConfig>,
}


impl ValidatableConfiguration for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        check_json_object(&self.config)
            .map_err(|reason| ValidationError::invalid_field("config", reason))?;

        for (name, source) in &self.brokerpaks {
            check_identifier(name).map_err(|reason| ValidationError::invalid_key(name, reason))?;

            source.validate(name.as_str())?;
        }

        debug!(
            brokerpak_count = self.brokerpaks.len(),
            "Brokerpak server configuration is valid."
        );

        Ok(())
    }
}


impl ServerConfig {
    /// Names of all configured brokerpaks, in lexicographic order.
    pub fn brokerpak_names(&self) -> Vec<&str> {
        self.brokerpaks.keys().map(String::as_str).collect()
    }

    /// Parses the global `config` into a JSON object.
    /// Only meaningful after validation; returns `None` if it is not an object.
    pub fn global_config_value(&self) -> Option<serde_json::Map<String, serde_json::Value>> {
        match serde_json::from_str::<serde_json::Value>(&self.config) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}
