//! Raw operator settings that a [`ServerConfig`][super::ServerConfig] is assembled from.

use std::{collections::HashMap, fs, path::Path};

use miette::{miette, Context, IntoDiagnostic, Result};
use tracing::debug;


/// Setting holding a JSON object that maps brokerpak names to their source configuration.
pub const BROKERPAK_SOURCES_KEY: &str = "brokerpak.sources";

/// Setting holding the global brokerpak configuration as a JSON object.
pub const BROKERPAK_CONFIG_KEY: &str = "brokerpak.config";

/// Value used for both brokerpak settings when they are unset.
pub const EMPTY_JSON_OBJECT: &str = "{}";

/// Default environment variable prefix, see [`EnvironmentSettings`].
pub const DEFAULT_ENVIRONMENT_PREFIX: &str = "GSB";



/// A read-only source of string settings.
pub trait SettingsSource {
    /// Returns the raw value of `key`, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// Returns the raw value of `key`, falling back to `"{}"` for the brokerpak
    /// settings and to an empty string for anything else.
    fn get_or_default(&self, key: &str) -> String {
        self.get(key).unwrap_or_else(|| match key {
            BROKERPAK_SOURCES_KEY | BROKERPAK_CONFIG_KEY => EMPTY_JSON_OBJECT.to_string(),
            _ => String::new(),
        })
    }
}

impl<S> SettingsSource for &S
where
    S: SettingsSource + ?Sized,
{
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}



/// In-memory settings, e.g. parsed from a settings file or given on the command line.
#[derive(Clone, Default, Debug)]
pub struct MapSettings {
    values: HashMap<String, String>,
}

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse TOML settings. Nested tables are flattened into dotted keys,
    /// so `brokerpak.sources` may be written as:
    ///
    /// ```toml
    /// [brokerpak]
    /// sources = '''{"svc-a": {"uri": "https://example.com/a.brokerpak", "config": "{}"}}'''
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let table = contents
            .parse::<toml::Table>()
            .into_diagnostic()
            .wrap_err("Could not parse settings as TOML.")?;

        let mut settings = Self::new();
        flatten_toml_table(&table, None, &mut settings)?;

        Ok(settings)
    }

    /// Load TOML settings from a specific file path.
    pub fn load_from_path<P: AsRef<Path>>(settings_file_path: P) -> Result<Self> {
        let settings_file_path = dunce::canonicalize(settings_file_path.as_ref())
            .into_diagnostic()
            .wrap_err_with(|| {
                miette!(
                    "Could not canonicalize settings file path {}.",
                    settings_file_path.as_ref().display()
                )
            })?;

        let settings_string = fs::read_to_string(&settings_file_path)
            .into_diagnostic()
            .wrap_err_with(|| {
                miette!(
                    "Could not read settings file {}.",
                    settings_file_path.display()
                )
            })?;

        let settings = Self::from_toml_str(&settings_string).wrap_err_with(|| {
            miette!(
                "Could not load settings file {}.",
                settings_file_path.display()
            )
        })?;

        debug!(
            path = %settings_file_path.display(),
            keys = settings.values.len(),
            "Loaded settings file."
        );

        Ok(settings)
    }
}

impl SettingsSource for MapSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

fn flatten_toml_table(
    table: &toml::Table,
    prefix: Option<&str>,
    settings: &mut MapSettings,
) -> Result<()> {
    for (key, value) in table {
        let full_key = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };

        match value {
            toml::Value::String(string) => settings.set(full_key, string.as_str()),
            toml::Value::Table(nested) => flatten_toml_table(nested, Some(&full_key), settings)?,
            other => {
                return Err(miette!(
                    "Setting {} must be a string, found {}.",
                    full_key,
                    other.type_str()
                ));
            }
        }
    }

    Ok(())
}



/// Settings read from environment variables.
///
/// A key such as `brokerpak.sources` is looked up as `<PREFIX>_BROKERPAK_SOURCES`.
/// Variables that are set but empty count as unset.
#[derive(Clone, Debug)]
pub struct EnvironmentSettings {
    prefix: String,
}

impl EnvironmentSettings {
    pub fn with_prefix<S>(prefix: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn variable_name(&self, key: &str) -> String {
        let key = key.replace(['.', '-'], "_").to_ascii_uppercase();

        if self.prefix.is_empty() {
            key
        } else {
            format!("{}_{}", self.prefix.to_ascii_uppercase(), key)
        }
    }
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_ENVIRONMENT_PREFIX)
    }
}

impl SettingsSource for EnvironmentSettings {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(self.variable_name(key))
            .ok()
            .filter(|value| !value.is_empty())
    }
}



/// Several sources queried in order; the first one that has a key wins.
#[derive(Default)]
pub struct LayeredSettings<'a> {
    layers: Vec<Box<dyn SettingsSource + 'a>>,
}

impl<'a> LayeredSettings<'a> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Adds a layer with lower priority than every layer added before it.
    pub fn then<S>(mut self, source: S) -> Self
    where
        S: SettingsSource + 'a,
    {
        self.layers.push(Box::new(source));
        self
    }
}

impl SettingsSource for LayeredSettings<'_> {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_to_empty_object_for_brokerpak_keys() {
        let settings = MapSettings::new();

        assert_eq!(settings.get(BROKERPAK_SOURCES_KEY), None);
        assert_eq!(settings.get_or_default(BROKERPAK_SOURCES_KEY), "{}");
        assert_eq!(settings.get_or_default(BROKERPAK_CONFIG_KEY), "{}");
        assert_eq!(settings.get_or_default("unrelated.key"), "");
    }

    #[test]
    fn flattens_toml_tables_into_dotted_keys() {
        let settings = MapSettings::from_toml_str(
            r#"
            [brokerpak]
            config = '{"project": "p"}'
            sources = '''
            {"svc-a": {"uri": "https://example.com/a.brokerpak", "config": "{}"}}
            '''
            "#,
        )
        .unwrap();

        assert_eq!(
            settings.get(BROKERPAK_CONFIG_KEY).as_deref(),
            Some(r#"{"project": "p"}"#)
        );
        assert!(settings
            .get(BROKERPAK_SOURCES_KEY)
            .unwrap()
            .contains("svc-a"));
    }

    #[test]
    fn rejects_non_string_settings() {
        let result = MapSettings::from_toml_str("[brokerpak]\nconfig = 5\n");

        assert!(result.is_err());
    }

    #[test]
    fn loads_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[brokerpak]\nconfig = '{{\"a\": 1}}'").unwrap();

        let settings = MapSettings::load_from_path(file.path()).unwrap();
        assert_eq!(
            settings.get(BROKERPAK_CONFIG_KEY).as_deref(),
            Some(r#"{"a": 1}"#)
        );
    }

    #[test]
    fn missing_settings_file_is_an_error() {
        let directory = tempfile::tempdir().unwrap();

        assert!(MapSettings::load_from_path(directory.path().join("missing.toml")).is_err());
    }

    #[test]
    fn environment_variable_names() {
        assert_eq!(
            EnvironmentSettings::default().variable_name(BROKERPAK_SOURCES_KEY),
            "GSB_BROKERPAK_SOURCES"
        );
        assert_eq!(
            EnvironmentSettings::with_prefix("").variable_name(BROKERPAK_CONFIG_KEY),
            "BROKERPAK_CONFIG"
        );
    }

    #[test]
    fn reads_environment_variables() {
        let settings = EnvironmentSettings::with_prefix("BROKERPAK_CONFIG_SETTINGS_TEST");
        std::env::set_var("BROKERPAK_CONFIG_SETTINGS_TEST_BROKERPAK_CONFIG", "{\"x\": 1}");

        assert_eq!(
            settings.get(BROKERPAK_CONFIG_KEY).as_deref(),
            Some("{\"x\": 1}")
        );
        assert_eq!(settings.get(BROKERPAK_SOURCES_KEY), None);
    }

    #[test]
    fn empty_environment_variables_fall_back_to_defaults() {
        let settings = EnvironmentSettings::with_prefix("BROKERPAK_CONFIG_EMPTY_ENV_TEST");
        std::env::set_var("BROKERPAK_CONFIG_EMPTY_ENV_TEST_BROKERPAK_SOURCES", "");
        std::env::set_var("BROKERPAK_CONFIG_EMPTY_ENV_TEST_BROKERPAK_CONFIG", "");

        assert_eq!(settings.get(BROKERPAK_SOURCES_KEY), None);
        assert_eq!(settings.get_or_default(BROKERPAK_SOURCES_KEY), "{}");

        let configuration = crate::configuration::ServerConfig::load_from_settings(&settings)
            .expect("empty variables should load as defaults");
        assert_eq!(configuration.config, "{}");
        assert!(configuration.brokerpaks.is_empty());
    }

    #[test]
    fn first_layer_with_a_value_wins() {
        let overrides = MapSettings::new().with(BROKERPAK_CONFIG_KEY, "{\"from\": \"cli\"}");
        let file = MapSettings::new()
            .with(BROKERPAK_CONFIG_KEY, "{\"from\": \"file\"}")
            .with(BROKERPAK_SOURCES_KEY, "{}");

        let settings = LayeredSettings::new().then(&overrides).then(file);

        assert_eq!(
            settings.get(BROKERPAK_CONFIG_KEY).as_deref(),
            Some("{\"from\": \"cli\"}")
        );
        assert_eq!(settings.get(BROKERPAK_SOURCES_KEY).as_deref(), Some("{}"));
        assert_eq!(settings.get("unset"), None);
    }
}
