use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::configuration::{
    error::ValidationError,
    traits::ValidatableConfigurationWithContext,
    utilities::{join_newline_delimited_list, split_newline_delimited_list},
    validators::{check_identifier, check_json_object, check_uri},
};


/// A single configured source of service definitions.
///
/// Missing fields deserialize to empty strings; required fields are enforced by
/// [`validate`][ValidatableConfigurationWithContext::validate], not by the deserializer.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Default, Debug)]
#[serde(default)]
pub struct BrokerpakSourceConfig {
    /// Where to load the brokerpak from (remote locator or local path).
    pub uri: String,

    /// Optional prefix prepended to every service name from this brokerpak.
    pub service_prefix: String,

    /// Newline-delimited service IDs that are skipped at registration time.
    pub excluded_services: String,

    /// Brokerpak-specific settings as a JSON object.
    pub config: String,

    /// Free-form operator notes. Not used programmatically.
    pub notes: String,
}

impl BrokerpakSourceConfig {
    /// The default source used when a single brokerpak is loaded from a local path.
    pub fn from_path<S>(path: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            uri: path.into(),
            config: "{}".to_string(),
            ..Default::default()
        }
    }

    pub fn excluded_services_list(&self) -> Vec<String> {
        split_newline_delimited_list(&self.excluded_services)
    }

    pub fn set_excluded_services_list<S>(&mut self, services: &[S])
    where
        S: AsRef<str>,
    {
        self.excluded_services = join_newline_delimited_list(services);
    }

    /// Parses `config` into a JSON object.
    /// Only meaningful after validation; returns `None` if it is not an object.
    pub fn config_value(&self) -> Option<serde_json::Map<String, serde_json::Value>> {
        match serde_json::from_str::<serde_json::Value>(&self.config) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}

impl ValidatableConfigurationWithContext for BrokerpakSourceConfig {
    /// Name of the brokerpak this source is registered under.
    type Context = str;

    fn validate(&self, name: &str) -> Result<(), ValidationError> {
        debug!(brokerpak = name, uri = %self.uri, "Validating brokerpak source.");

        let field_path = |field: &str| format!("brokerpaks.{name}.{field}");

        check_uri(&self.uri)
            .map_err(|reason| ValidationError::invalid_field(field_path("uri"), reason))?;

        if !self.service_prefix.is_empty() {
            check_identifier(&self.service_prefix).map_err(|reason| {
                ValidationError::invalid_field(field_path("service_prefix"), reason)
            })?;
        }

        check_json_object(&self.config)
            .map_err(|reason| ValidationError::invalid_field(field_path("config"), reason))?;

        Ok(())
    }
}
