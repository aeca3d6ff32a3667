//! Layered configuration loader.
//!
//! Discovers configuration layers (user, project, cwd, repo, runtime),
//! validates each against the schema, deep-merges them, and produces a final
//! `VitalisConfig`.

mod discovery;
mod schema;
mod stack;

#[cfg(test)]
mod tests;

use crate::{ConfigError, VitalisConfig};
use log::{debug, info};
use regex::Regex;
use serde_json::Value;
use stack::LayerStack;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "vitalis.json5";
/// Default config directory under user or repo roots.
const DEFAULT_CONFIG_DIR: &str = ".vitalis";
/// Marker files/dirs that identify a project root.
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: VitalisConfig,
    /// Metadata for each layer that contributed.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// User-specific configuration.
    User,
    /// Project root configuration.
    Project,
    /// Current working directory configuration.
    Cwd,
    /// Repo-local configuration.
    Repo,
    /// Runtime overrides (highest precedence).
    Runtime,
}

/// Metadata about a loaded config layer.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    /// Layer origin.
    pub source: ConfigLayerSource,
    /// Location on disk.
    pub path: PathBuf,
}

impl fmt::Display for ConfigLayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Project => "project",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Repo => "repo",
            ConfigLayerSource::Runtime => "runtime",
        })
    }
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to resolve local layers.
    pub cwd: PathBuf,
    /// Optional user config path (defaults to `~/.vitalis/vitalis.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied last.
    pub runtime_paths: Vec<PathBuf>,
    /// Marker files/dirs used to detect the project root.
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: discovery::user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }

    /// Add a runtime override config path that is applied last.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl VitalisConfig {
    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value = parse_json5(contents, "config")?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations and overrides.
    ///
    /// Layer precedence (low -> high): user, project, cwd, repo, runtime.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let mut stack = LayerStack::new();
        for (source, path) in discovery::candidate_layers(&options)? {
            stack.push_optional(source, &path)?;
        }
        for path in &options.runtime_paths {
            stack.push_required(ConfigLayerSource::Runtime, path)?;
        }
        let layered = stack.finish()?;
        info!("layered config loaded (layers={})", layered.layers.len());
        Ok(layered)
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.model.id.split_once('/') {
            Some((provider, model)) if !provider.is_empty() && !model.is_empty() => {}
            _ => {
                return Err(invalid("model.id", "expected `provider/model`"));
            }
        }
        if self.memory.collection.trim().is_empty() {
            return Err(invalid("memory.collection", "must not be empty"));
        }
        for (path, value) in [
            ("memory.targeted_limit", self.memory.targeted_limit),
            ("memory.general_limit", self.memory.general_limit),
            ("memory.evaluation_window", self.memory.evaluation_window),
            ("orchestrator.step_limit", self.orchestrator.step_limit),
        ] {
            if value == 0 {
                return Err(invalid(path, "must be greater than zero"));
            }
        }
        for (idx, pattern) in self.memory.write.redact_patterns.iter().enumerate() {
            if let Err(err) = Regex::new(pattern) {
                return Err(invalid(
                    &format!("memory.write.redact_patterns[{idx}]"),
                    &err.to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: path.to_string(),
        message: message.to_string(),
    }
}

fn read_json5(path: &Path, label: &str) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json5(&contents, label)
}

fn parse_json5(contents: &str, label: &str) -> Result<Value, ConfigError> {
    json5::from_str(contents).map_err(|source| ConfigError::Parse {
        label: label.to_string(),
        source,
    })
}

fn config_from_value(value: Value, label: &str) -> Result<VitalisConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: VitalisConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
