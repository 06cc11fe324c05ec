use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use redline::registry::{PassDefinition, PassRegistry, standard_passes};
use redline::stage::DEFAULT_ANNOTATION;
use redline::store::StorePaths;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub paths: PathsConfig,
    pub passes: Vec<PassDefinition>,
    pub stage: StageConfig,
    pub snapshot_history: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub base_dir: PathBuf,
    pub agents_dir: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub intermediate_dir: PathBuf,
    pub run_log: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            agents_dir: PathBuf::from("agents"),
            input: PathBuf::from("input.md"),
            output: PathBuf::from("output.md"),
            intermediate_dir: PathBuf::from("intermediate"),
            run_log: PathBuf::from("processing_log.json"),
        }
    }
}

/// Paths with every relative entry joined onto the base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub agents_dir: PathBuf,
    pub store: StorePaths,
}

impl PathsConfig {
    pub fn resolve(&self) -> ResolvedPaths {
        let base = &self.base_dir;
        ResolvedPaths {
            agents_dir: base.join(&self.agents_dir),
            store: StorePaths {
                input: base.join(&self.input),
                output: base.join(&self.output),
                intermediate_dir: base.join(&self.intermediate_dir),
                run_log: base.join(&self.run_log),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Placeholder,
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub backend: Backend,
    pub annotation: String,
    pub command: Vec<String>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Placeholder,
            annotation: DEFAULT_ANNOTATION.to_string(),
            command: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            paths: PathsConfig::default(),
            passes: standard_passes(),
            stage: StageConfig::default(),
            snapshot_history: false,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Build the validated pass registry from the configured pass list
    pub fn registry(&self) -> Result<PassRegistry> {
        PassRegistry::new(self.passes.clone()).context("Invalid pass list in config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.passes.len(), 7);
        assert_eq!(config.stage.backend, Backend::Placeholder);
        assert!(!config.snapshot_history);
        assert!(config.registry().is_ok());
    }

    #[test]
    fn test_resolve_paths() {
        let paths = PathsConfig {
            base_dir: PathBuf::from("/work"),
            ..Default::default()
        };
        let resolved = paths.resolve();
        assert_eq!(resolved.agents_dir, PathBuf::from("/work/agents"));
        assert_eq!(resolved.store, StorePaths::under("/work"));
    }

    #[test]
    fn test_absolute_entries_win() {
        let paths = PathsConfig {
            base_dir: PathBuf::from("/work"),
            output: PathBuf::from("/elsewhere/final.md"),
            ..Default::default()
        };
        assert_eq!(paths.resolve().store.output, PathBuf::from("/elsewhere/final.md"));
    }

    #[test]
    fn test_load_partial_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("redline.yml");
        fs::write(
            &path,
            r#"
paths:
  base_dir: /docs
passes:
  - id: a
    name: Pass A
  - id: b
    name: Pass B
stage:
  backend: command
  command: ["sh", "-c", "cat"]
snapshot_history: true
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.paths.base_dir, PathBuf::from("/docs"));
        assert_eq!(config.paths.input, PathBuf::from("input.md"));
        assert_eq!(config.passes[1], PassDefinition::new("b", "Pass B"));
        assert_eq!(config.stage.backend, Backend::Command);
        assert_eq!(config.stage.annotation, DEFAULT_ANNOTATION);
        assert!(config.snapshot_history);
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let path = PathBuf::from("/nonexistent/redline.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let config = Config {
            passes: vec![PassDefinition::new("a", "A"), PassDefinition::new("a", "B")],
            ..Default::default()
        };
        assert!(config.registry().is_err());
    }
}
