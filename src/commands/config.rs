use std::path::Path;

use crate::errors::AutofillResult;
use crate::models::config::AppConfig;
use crate::services::config::ConfigManager;

/// Config manager for an explicit file, or the platform default location
pub fn init_config_manager(path: Option<&Path>) -> AutofillResult<ConfigManager> {
    match path {
        Some(path) => Ok(ConfigManager::with_path(path)),
        None => ConfigManager::new(),
    }
}

/// Apply command-line overrides on top of the loaded configuration
pub fn apply_overrides(config: &mut AppConfig, confidence: Option<f32>, extended: bool) {
    if let Some(confidence) = confidence {
        config.resolver.confidence = confidence;
    }
    if extended {
        config.resolver.extended = true;
    }
}

/// Print where the configuration lives and its effective content
pub fn show_config(manager: &ConfigManager, config: &AppConfig) -> AutofillResult<()> {
    println!("Config file: {}", manager.config_file_path().display());
    if !manager.config_exists() {
        println!("(not found, showing defaults)");
    }
    println!("Coordinates file: {}", manager.coordinates_file_path().display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Write the defaults to the config file so they can be edited
pub fn write_default_config(manager: &ConfigManager) -> AutofillResult<()> {
    manager.save(&AppConfig::default())?;
    println!("Wrote {}", manager.config_file_path().display());
    Ok(())
}
