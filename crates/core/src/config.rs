//! Application configuration.
//!
//! Settings are layered: built-in defaults, then the JSON config file, then `O2O__`
//! environment variables (`O2O__IMPORT__MIN_SOURCE_FILES=2`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::store::FolderLayout;

/// Directory under the platform config dir holding `config.json`.
pub const CONFIG_DIR: &str = "o2o";
const CONFIG_FILE: &str = "config.json";

/// Import behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Reports that must be present before the railroad data is replaced (1–3).
    pub min_source_files: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            min_source_files: 3,
        }
    }
}

/// Values the exporter adds to every work event list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Railroad description printed in the list header.
    pub railroad_description: String,
    /// Division printed in the list header.
    pub division: String,
    /// Written in place of an empty destination.
    pub destination_standin: String,
    /// Written in place of an empty final destination.
    pub final_dest_standin: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            railroad_description: String::new(),
            division: String::new(),
            destination_standin: "Unknown".to_string(),
            final_dest_standin: "Unknown".to_string(),
        }
    }
}

/// Top-level settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Host profile directory; manifests and railroad data live under `operations/`.
    pub profile_root: PathBuf,
    /// Folder TrainPlayer writes its reports to.
    pub reports_dir: PathBuf,
    /// Where work event lists go; defaults to `reports_dir`.
    pub export_dir: Option<PathBuf>,
    /// Import behaviour.
    pub import: ImportSettings,
    /// Export behaviour.
    pub export: ExportSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            profile_root: home.join("JMRI").join("My_JMRI_Railroad"),
            reports_dir: dirs::data_dir()
                .unwrap_or(home)
                .join("TrainPlayer")
                .join("Reports"),
            export_dir: None,
            import: ImportSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load from the default config file location.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load with `path` as the file layer. A missing file leaves the defaults in place.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults =
            Config::try_from(&AppConfig::default()).context("failed to encode default config")?;

        let config: AppConfig = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Json).required(false))
            .add_source(
                Environment::with_prefix("O2O")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(1..=3).contains(&self.import.min_source_files) {
            bail!(
                "import.min_source_files must be between 1 and 3, got {}",
                self.import.min_source_files
            );
        }
        Ok(())
    }

    /// Folder layout for the persistence layer.
    pub fn layout(&self) -> FolderLayout {
        let operations = self.profile_root.join("operations");
        FolderLayout {
            import: self.reports_dir.clone(),
            export: self
                .export_dir
                .clone()
                .unwrap_or_else(|| self.reports_dir.clone()),
            manifest: operations.join("jsonManifests"),
            operations,
        }
    }
}

/// `<config dir>/o2o/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write the default config file if none exists yet, returning its path.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = default_config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&AppConfig::default())
        .context("failed to serialize default config")?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write config {}", path.display()))
}
