//! This module contains all brokerpak configuration code: the configuration
//! structure itself, the settings it is assembled from and the rules it is validated against.
//!
//! Your starting point should probably be [`ServerConfig::load_from_settings`].
//!
//! # Internals
//! Raw operator input comes from a [`SettingsSource`] as two strings:
//! `brokerpak.sources` (a JSON object mapping names to [`BrokerpakSourceConfig`]s)
//! and `brokerpak.config` (the global brokerpak configuration, itself a JSON object).
//!
//! Deserialization is deliberately lenient: missing fields become empty strings and unknown
//! fields are ignored. All field rules are enforced afterwards by
//! [`validate`][traits::ValidatableConfiguration::validate], which walks the structure
//! in a stable order and stops at the first violation it finds.

#![allow(rustdoc::private_intra_doc_links)]

mod error;
mod settings;
mod structure;
mod traits;
mod utilities;
mod validators;

use std::collections::BTreeMap;

use tracing::{debug, warn};

pub use self::error::LoadError;
pub use self::settings::{
    EnvironmentSettings,
    LayeredSettings,
    MapSettings,
    SettingsSource,
    BROKERPAK_CONFIG_KEY,
    BROKERPAK_SOURCES_KEY,
    DEFAULT_ENVIRONMENT_PREFIX,
};
pub use self::structure::*;
pub use self::traits::ValidatableConfiguration;



impl ServerConfig {
    /// Assemble and validate the configuration from operator settings.
    ///
    /// Fails with [`LoadError::Malformed`] if `brokerpak.sources` is not a JSON object of
    /// objects, and with [`LoadError::Invalid`] if the assembled configuration breaks a rule.
    pub fn load_from_settings<S>(settings: &S) -> Result<Self, LoadError>
    where
        S: SettingsSource + ?Sized,
    {
        let raw_sources = settings.get_or_default(BROKERPAK_SOURCES_KEY);
        let brokerpaks = serde_json::from_str::<BTreeMap<String, BrokerpakSourceConfig>>(
            &raw_sources,
        )
        .map_err(LoadError::Malformed)?;

        let configuration = ServerConfig {
            config: settings.get_or_default(BROKERPAK_CONFIG_KEY),
            brokerpaks,
        };

        configuration.validate()?;

        debug!(
            brokerpaks = ?configuration.brokerpak_names(),
            "Loaded brokerpak configuration."
        );

        Ok(configuration)
    }

    /// Build a configuration holding a single brokerpak loaded from `path`,
    /// registered as [`LOCAL_BROKERPAK_NAME`].
    ///
    /// `brokerpak.sources` is ignored and the result is **not** validated;
    /// call [`validate`][ValidatableConfiguration::validate] if needed.
    pub fn from_local_path<P, S>(path: P, settings: &S) -> Self
    where
        P: Into<String>,
        S: SettingsSource + ?Sized,
    {
        let path = path.into();
        warn!(
            path = %path,
            "Using local brokerpak; brokerpak.sources is ignored and validation is skipped."
        );

        let mut brokerpaks = BTreeMap::new();
        brokerpaks.insert(
            LOCAL_BROKERPAK_NAME.to_string(),
            BrokerpakSourceConfig::from_path(path),
        );

        ServerConfig {
            config: settings.get_or_default(BROKERPAK_CONFIG_KEY),
            brokerpaks,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::error::{ValidationError, ValidationReason};

    fn settings_with_sources(sources: &str) -> MapSettings {
        MapSettings::new().with(BROKERPAK_SOURCES_KEY, sources)
    }

    #[test]
    fn loads_defaults_when_nothing_is_set() {
        let configuration = ServerConfig::load_from_settings(&MapSettings::new()).unwrap();

        assert_eq!(configuration.config, "{}");
        assert!(configuration.brokerpaks.is_empty());
    }

    #[test]
    fn loads_and_validates_sources() {
        let settings = settings_with_sources(
            r#"{
                "svc-a": {"uri": "https://example.com/a.brokerpak", "config": "{}"},
                "svc-b": {
                    "uri": "gs://bucket/b.brokerpak",
                    "service_prefix": "b-",
                    "excluded_services": "id1\nid2",
                    "config": "{\"region\": \"eu\"}",
                    "notes": "second source"
                }
            }"#,
        )
        .with(BROKERPAK_CONFIG_KEY, r#"{"project_id": "p"}"#);

        let configuration = ServerConfig::load_from_settings(&settings).unwrap();

        assert_eq!(configuration.config, r#"{"project_id": "p"}"#);
        assert_eq!(configuration.brokerpak_names(), vec!["svc-a", "svc-b"]);

        let svc_b = &configuration.brokerpaks["svc-b"];
        assert_eq!(svc_b.service_prefix, "b-");
        assert_eq!(svc_b.excluded_services_list(), vec!["id1", "id2"]);
        assert_eq!(svc_b.notes, "second source");
    }

    #[test]
    fn array_sources_are_malformed() {
        let result = ServerConfig::load_from_settings(&settings_with_sources("[1,2,3]"));

        assert!(matches!(result, Err(LoadError::Malformed(_))));
    }

    #[test]
    fn non_object_entries_are_malformed() {
        for sources in [r#"{"svc-a": 5}"#, r#"{"svc-a": {"uri": 5}}"#, "not json", ""] {
            let result = ServerConfig::load_from_settings(&settings_with_sources(sources));

            assert!(
                matches!(result, Err(LoadError::Malformed(_))),
                "expected {sources:?} to be malformed, got {result:?}"
            );
        }
    }

    #[test]
    fn missing_required_fields_fail_validation_not_deserialization() {
        let result = ServerConfig::load_from_settings(&settings_with_sources(
            r#"{"svc-a": {"config": "{}"}}"#,
        ));

        match result {
            Err(LoadError::Invalid(ValidationError::InvalidField { path, reason })) => {
                assert_eq!(path, "brokerpaks.svc-a.uri");
                assert_eq!(reason, ValidationReason::Required);
            }
            other => panic!("expected an invalid uri, got {other:?}"),
        }
    }

    #[test]
    fn invalid_global_config_fails_the_load() {
        let settings = MapSettings::new().with(BROKERPAK_CONFIG_KEY, "not json");
        let result = ServerConfig::load_from_settings(&settings);

        assert!(matches!(
            result,
            Err(LoadError::Invalid(ValidationError::InvalidField { ref path, .. })) if path == "config"
        ));
    }

    #[test]
    fn invalid_key_fails_the_load() {
        let result = ServerConfig::load_from_settings(&settings_with_sources(
            r#"{"Not Valid": {"uri": "x", "config": "{}"}}"#,
        ));

        assert!(matches!(
            result,
            Err(LoadError::Invalid(ValidationError::InvalidKey { .. }))
        ));
    }

    #[test]
    fn error_messages_name_the_problem() {
        let error = ServerConfig::load_from_settings(&settings_with_sources(
            r#"{"svc-a": {"uri": "not a uri", "config": "{}"}}"#,
        ))
        .unwrap_err();

        assert_eq!(
            error.to_string(),
            "brokerpak config was invalid: field brokerpaks.svc-a.uri: not a well-formed URI"
        );

        let error = ServerConfig::load_from_settings(&settings_with_sources("[]")).unwrap_err();
        assert!(error
            .to_string()
            .starts_with("couldn't deserialize brokerpak source config:"));
    }

    #[test]
    fn local_path_ignores_sources_and_keeps_global_config() {
        let settings = settings_with_sources("[this is not even json")
            .with(BROKERPAK_CONFIG_KEY, r#"{"project_id": "p"}"#);

        let configuration = ServerConfig::from_local_path("./local.brokerpak", &settings);

        assert_eq!(configuration.config, r#"{"project_id": "p"}"#);
        assert_eq!(configuration.brokerpak_names(), vec![LOCAL_BROKERPAK_NAME]);
        assert_eq!(
            configuration.brokerpaks[LOCAL_BROKERPAK_NAME],
            BrokerpakSourceConfig::from_path("./local.brokerpak")
        );
        assert_eq!(configuration.validate(), Ok(()));
    }

    #[test]
    fn local_path_is_not_validated_implicitly() {
        let settings = MapSettings::new().with(BROKERPAK_CONFIG_KEY, "not json");
        let configuration = ServerConfig::from_local_path("has spaces.brokerpak", &settings);

        assert!(configuration.validate().is_err());
    }

    #[test]
    fn serialized_configuration_loads_back() {
        let settings = settings_with_sources(
            r#"{"svc-a": {"uri": "https://example.com/a.brokerpak", "config": "{}", "notes": "n"}}"#,
        );
        let configuration = ServerConfig::load_from_settings(&settings).unwrap();

        let sources = serde_json::to_string(&configuration.brokerpaks).unwrap();
        let reloaded = ServerConfig::load_from_settings(&settings_with_sources(&sources)).unwrap();

        assert_eq!(reloaded, configuration);
    }
}
