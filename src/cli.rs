//! Command-line interface definitions.

use std::path::PathBuf;

use clap::Parser;

use crate::configuration::{
    MapSettings,
    BROKERPAK_CONFIG_KEY,
    BROKERPAK_SOURCES_KEY,
    DEFAULT_ENVIRONMENT_PREFIX,
};


/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "brokerpak-config",
    author,
    about = "Loads and validates the brokerpak source configuration of a service broker.",
    version
)]
pub struct CLIArgs {
    /// TOML settings file, layered on top of environment variables.
    #[arg(
        short = 's',
        long = "settings-file",
        help = "Path to a TOML settings file (e.g. a [brokerpak] table with `sources` and `config`)."
    )]
    pub settings_file_path: Option<PathBuf>,

    #[arg(
        long = "env-prefix",
        default_value = DEFAULT_ENVIRONMENT_PREFIX,
        help = "Prefix of the environment variables to read settings from \
                (brokerpak.sources is read from <PREFIX>_BROKERPAK_SOURCES)."
    )]
    pub environment_prefix: String,

    #[arg(
        long = "sources",
        help = "JSON object mapping brokerpak names to source configurations. \
                Overrides brokerpak.sources from every other settings source."
    )]
    pub sources: Option<String>,

    #[arg(
        long = "config",
        help = "Global brokerpak configuration as a JSON object. \
                Overrides brokerpak.config from every other settings source."
    )]
    pub config: Option<String>,

    #[arg(
        long = "local-brokerpak",
        help = "Load a single brokerpak from this path instead of brokerpak.sources. \
                The result is not validated unless --validate-local is also given."
    )]
    pub local_brokerpak: Option<String>,

    #[arg(
        long = "validate-local",
        requires = "local_brokerpak",
        help = "Validate the configuration built by --local-brokerpak."
    )]
    pub validate_local: bool,

    #[arg(
        long = "exclude-service",
        value_name = "SERVICE_ID",
        requires = "local_brokerpak",
        help = "Service ID to exclude from the brokerpak given by --local-brokerpak. \
                May be repeated."
    )]
    pub excluded_services: Vec<String>,

    #[arg(
        long = "print",
        help = "Print the resulting configuration as JSON to standard output."
    )]
    pub print: bool,

    #[arg(
        long = "log-level",
        default_value = "info",
        help = "Console log filter, in tracing-subscriber EnvFilter syntax."
    )]
    pub log_level: String,

    #[arg(
        long = "log-file-level",
        default_value = "debug",
        help = "Log file filter, in tracing-subscriber EnvFilter syntax. Only used with --log-directory."
    )]
    pub log_file_level: String,

    #[arg(
        long = "log-directory",
        help = "If specified, logs are also written to brokerpak-config.log in this directory."
    )]
    pub log_directory: Option<PathBuf>,
}

impl CLIArgs {
    /// Settings given directly on the command line.
    pub fn override_settings(&self) -> MapSettings {
        let mut settings = MapSettings::new();

        if let Some(sources) = &self.sources {
            settings = settings.with(BROKERPAK_SOURCES_KEY, sources.as_str());
        }

        if let Some(config) = &self.config {
            settings = settings.with(BROKERPAK_CONFIG_KEY, config.as_str());
        }

        settings
    }
}
