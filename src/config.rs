//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri del batch
//! - Fornisce validazione dei parametri di input
//! - Supporta il caricamento della configurazione da file JSON
//! - Costruisce la `FormatRegistry` effettiva (tabella + optimizer disabilitati)
//!
//! ## Parametri di configurazione:
//! - `workers`: Numero di file processati in parallelo (default: 4)
//! - `parallel_optimizers`: Esegue gli optimizer di uno stesso file in parallelo (default: true)
//! - `tool_timeout_secs`: Timeout per singola invocazione di un tool (default: 180)
//! - `tools_dir`: Directory con i binari degli optimizer (default: auto-detect)
//! - `search_system_path`: Cerca i tool anche nel PATH (default: true)
//! - `dry_run`: Simula senza sostituire i file (default: false)
//! - `json_output`: Report come righe JSON su stdout (default: false)
//! - `show_progress`: Progress bar su stderr (default: true)
//! - `disabled_optimizers`: Optimizer da escludere per nome (default: nessuno)
//! - `formats`: Tabella estensione → optimizer alternativa (default: built-in)
//!
//! ## Esempio:
//! ```rust
//! use space_image_optimizer::Config;
//!
//! let config = Config {
//!     workers: 8,
//!     disabled_optimizers: vec!["pngout".to_string()],
//!     ..Default::default()
//! };
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::registry::{FormatEntry, FormatRegistry, Optimizer};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of files processed concurrently
    pub workers: usize,
    /// Run the optimizers for one file concurrently
    pub parallel_optimizers: bool,
    /// Per-invocation timeout for external tools, in seconds
    pub tool_timeout_secs: u64,
    /// Directory holding optimizer binaries (None = auto-detect)
    pub tools_dir: Option<PathBuf>,
    /// Fall back to the system PATH when a tool is not in `tools_dir`
    pub search_system_path: bool,
    /// Dry run - report savings without replacing files
    pub dry_run: bool,
    /// Output per-file results and totals as JSON lines
    pub json_output: bool,
    /// Show a progress bar on stderr
    pub show_progress: bool,
    /// Optimizers excluded from the run, by name
    pub disabled_optimizers: Vec<String>,
    /// Replacement extension table (None = built-in table)
    pub formats: Option<Vec<FormatEntry>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: 4,
            parallel_optimizers: true,
            tool_timeout_secs: 180,
            tools_dir: None,
            search_system_path: true,
            dry_run: false,
            json_output: false,
            show_progress: true,
            disabled_optimizers: Vec::new(),
            formats: None,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.tool_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Tool timeout must be greater than 0 seconds"));
        }

        if let Some(ref tools_dir) = self.tools_dir {
            if !tools_dir.is_dir() {
                return Err(anyhow::anyhow!(
                    "Tools directory does not exist or is not a directory: {}",
                    tools_dir.display()
                ));
            }
        }

        let registry = self.format_registry()?;
        if registry.is_empty() {
            return Err(anyhow::anyhow!("Every optimizer is disabled, nothing to run"));
        }

        Ok(())
    }

    /// Per-invocation timeout as a `Duration`
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Resolve `disabled_optimizers` to typed optimizers
    pub fn disabled(&self) -> Result<Vec<Optimizer>> {
        self.disabled_optimizers
            .iter()
            .map(|name| name.parse::<Optimizer>().map_err(anyhow::Error::from))
            .collect()
    }

    /// The validated registry this configuration describes
    pub fn format_registry(&self) -> Result<FormatRegistry> {
        let base = match self.formats {
            Some(ref entries) => FormatRegistry::from_entries(entries)?,
            None => FormatRegistry::builtin(),
        };
        Ok(base.without(&self.disabled()?))
    }

    /// Load configuration from file.
    ///
    /// The result is not validated: command line overrides are applied first
    /// and `BatchRunner::new` validates the merged configuration.
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("Config file does not exist: {}", path.display());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 2;
        config.tool_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.tool_timeout_secs = 30;
        config.disabled_optimizers = vec!["not-a-tool".to_string()];
        assert!(config.validate().is_err());

        config.disabled_optimizers = vec!["pngout".to_string()];
        assert!(config.validate().is_ok());

        config.tools_dir = Some(PathBuf::from("/definitely/not/here"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.workers, 4);
        assert!(config.parallel_optimizers);
        assert_eq!(config.tool_timeout(), Duration::from_secs(180));
        assert!(config.search_system_path);
        assert!(!config.dry_run);
        assert!(config.formats.is_none());
    }

    #[test]
    fn test_disabling_everything_is_rejected() {
        let config = Config {
            disabled_optimizers: Optimizer::ALL.iter().map(|o| o.name().to_string()).collect(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_format_registry_override() {
        let config = Config {
            formats: Some(vec![FormatEntry {
                extension: "png".to_string(),
                optimizers: vec!["pngcrush".to_string(), "optipng".to_string()],
            }]),
            disabled_optimizers: vec!["optipng".to_string()],
            ..Default::default()
        };

        let registry = config.format_registry().unwrap();
        assert_eq!(registry.extensions().collect::<Vec<_>>(), vec!["png"]);
        assert_eq!(registry.optimizers_for("png"), &[Optimizer::Pngcrush]);
    }

    #[tokio::test]
    async fn test_config_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            workers: 8,
            parallel_optimizers: false,
            tool_timeout_secs: 60,
            dry_run: true,
            disabled_optimizers: vec!["advpng".to_string()],
            ..Default::default()
        };
        let content = serde_json::to_string_pretty(&original_config).unwrap();
        tokio::fs::write(&config_path, content).await.unwrap();

        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.workers, 8);
        assert!(!loaded_config.parallel_optimizers);
        assert_eq!(loaded_config.tool_timeout_secs, 60);
        assert!(loaded_config.dry_run);
        assert_eq!(loaded_config.disabled_optimizers, vec!["advpng".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_values_load_and_fail_validation_later() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "workers": 0 }"#).await.unwrap();

        let mut loaded = Config::from_file(&config_path).await.unwrap();
        assert_eq!(loaded.workers, 0);
        assert!(loaded.validate().is_err());

        loaded.workers = 2;
        assert!(loaded.validate().is_ok());
    }

    #[tokio::test]
    async fn test_partial_config_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "workers": 2 }"#).await.unwrap();

        let loaded = Config::from_file(&config_path).await.unwrap();
        assert_eq!(loaded.workers, 2);
        assert_eq!(loaded.tool_timeout_secs, 180);
    }

    #[tokio::test]
    async fn test_missing_config_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.json");

        let err = Config::from_file(&missing).await.unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
