use clap::Parser;
use miette::{Context, IntoDiagnostic, Result};
use tracing::{debug, error, info};

use crate::{
    cli::CLIArgs,
    configuration::{
        EnvironmentSettings,
        LayeredSettings,
        MapSettings,
        ServerConfig,
        ValidatableConfiguration,
        LOCAL_BROKERPAK_NAME,
    },
    logging::{initialize_tracing, parse_log_filter},
};

mod cli;
mod configuration;
mod logging;


pub const LOG_FILE_NAME: &str = "brokerpak-config.log";


fn main() -> Result<()> {
    let cli_args = CLIArgs::parse();

    let console_level_filter = parse_log_filter(&cli_args.log_level)?;
    let log_file_level_filter = parse_log_filter(&cli_args.log_file_level)?;

    let logging_raii_guard = initialize_tracing(
        console_level_filter,
        log_file_level_filter,
        cli_args.log_directory.as_deref(),
        LOG_FILE_NAME,
    )
    .wrap_err("Failed to initialize tracing.")?;


    // Command-line overrides win over the settings file, which wins over the environment.
    let file_settings = match cli_args.settings_file_path.as_ref() {
        Some(path) => {
            info!("Loading settings file: {}", path.display());
            MapSettings::load_from_path(path)?
        }
        None => MapSettings::new(),
    };

    let override_settings = cli_args.override_settings();
    if !override_settings.is_empty() {
        info!("Using brokerpak settings given on the command line.");
    }

    let settings = LayeredSettings::new()
        .then(override_settings)
        .then(file_settings)
        .then(EnvironmentSettings::with_prefix(
            cli_args.environment_prefix.as_str(),
        ));


    let configuration = match cli_args.local_brokerpak.as_ref() {
        Some(path) => {
            let mut configuration = ServerConfig::from_local_path(path.as_str(), &settings);

            if !cli_args.excluded_services.is_empty() {
                if let Some(local_brokerpak) =
                    configuration.brokerpaks.get_mut(LOCAL_BROKERPAK_NAME)
                {
                    local_brokerpak.set_excluded_services_list(&cli_args.excluded_services);
                }
            }

            if cli_args.validate_local {
                if let Err(validation_error) = configuration.validate() {
                    error!(
                        reason = %validation_error.reason(),
                        "Local brokerpak configuration is invalid."
                    );
                    return Err(validation_error.into());
                }
            }

            configuration
        }
        None => ServerConfig::load_from_settings(&settings)?,
    };

    info!(
        "Brokerpak configuration ready: {} brokerpak(s) [{}].",
        configuration.brokerpaks.len(),
        configuration.brokerpak_names().join(", ")
    );

    let global_settings_count = configuration
        .global_config_value()
        .map(|settings| settings.len())
        .unwrap_or_default();
    debug!("Global brokerpak config has {global_settings_count} setting(s).");

    for (name, source) in &configuration.brokerpaks {
        debug!(
            brokerpak = name.as_str(),
            uri = %source.uri,
            service_prefix = %source.service_prefix,
            excluded_services = ?source.excluded_services_list(),
            config_keys = ?source
                .config_value()
                .map(|config| config.keys().cloned().collect::<Vec<_>>())
                .unwrap_or_default(),
            "Brokerpak source."
        );
    }

    if cli_args.print {
        let rendered_configuration = serde_json::to_string_pretty(&configuration)
            .into_diagnostic()
            .wrap_err("Failed to serialize brokerpak configuration.")?;

        println!("{rendered_configuration}");
    }


    drop(logging_raii_guard);
    Ok(())
}
