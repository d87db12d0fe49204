use crate::errors::{AutofillError, AutofillResult};
use crate::models::config::AppConfig;
use crate::models::coordinate_map::CalibrationReport;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "specimen-autofill";
const CONFIG_FILE: &str = "config.json";
const COORDINATES_FILE: &str = "coordinates.json";

/// Configuration manager for app settings and saved calibrations
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
    coordinates_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager instance
    ///
    /// This will create the config directory if it doesn't exist.
    /// Returns an error if directory creation fails.
    pub fn new() -> AutofillResult<Self> {
        // Get platform-specific config directory
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AutofillError::Config("Failed to determine config directory".to_string()))?
            .join(APP_DIR);

        fs::create_dir_all(&config_dir).map_err(|e| {
            AutofillError::Config(format!("Failed to create config directory: {}", e))
        })?;

        Ok(Self::in_dir(config_dir, CONFIG_FILE))
    }

    /// Use an explicit config file; calibrations are stored next to it
    pub fn with_path<P: AsRef<Path>>(config_path: P) -> Self {
        let config_path = config_path.as_ref();
        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = config_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(CONFIG_FILE)
            .to_string();

        Self::in_dir(config_dir, &file_name)
    }

    fn in_dir(config_dir: PathBuf, config_file: &str) -> Self {
        Self {
            config_path: config_dir.join(config_file),
            coordinates_path: config_dir.join(COORDINATES_FILE),
            config_dir,
        }
    }

    fn ensure_dir(&self) -> AutofillResult<()> {
        fs::create_dir_all(&self.config_dir).map_err(|e| {
            AutofillError::Config(format!("Failed to create config directory: {}", e))
        })
    }

    /// Save configuration to disk
    pub fn save(&self, config: &AppConfig) -> AutofillResult<()> {
        self.ensure_dir()?;

        // Pretty print for human editing
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, json).map_err(|e| {
            AutofillError::Config(format!("Failed to write config file: {}", e))
        })?;

        tracing::debug!(path = %self.config_path.display(), "config saved");
        Ok(())
    }

    /// Load configuration from disk
    ///
    /// If config file doesn't exist, returns default configuration
    pub fn load(&self) -> AutofillResult<AppConfig> {
        if !self.config_exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| AutofillError::Config(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| AutofillError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Persist a calibration so later runs can skip template matching
    pub fn save_calibration(&self, report: &CalibrationReport) -> AutofillResult<()> {
        self.ensure_dir()?;

        let json = serde_json::to_string_pretty(report)?;
        fs::write(&self.coordinates_path, json).map_err(|e| {
            AutofillError::Config(format!("Failed to write coordinates file: {}", e))
        })?;

        tracing::info!(
            path = %self.coordinates_path.display(),
            keys = report.coordinates.len(),
            "calibration saved"
        );
        Ok(())
    }

    /// Last saved calibration, if any
    pub fn load_calibration(&self) -> AutofillResult<Option<CalibrationReport>> {
        if !self.coordinates_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.coordinates_path).map_err(|e| {
            AutofillError::Config(format!("Failed to read coordinates file: {}", e))
        })?;

        let report = serde_json::from_str(&content).map_err(|e| {
            AutofillError::Config(format!("Failed to parse coordinates file: {}", e))
        })?;
        Ok(Some(report))
    }

    /// Get the config file path
    pub fn config_file_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn coordinates_file_path(&self) -> &PathBuf {
        &self.coordinates_path
    }

    /// Check if config file exists
    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }
}
