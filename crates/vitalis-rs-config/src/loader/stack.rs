//! Accumulates config layers into one merged JSON document.

use super::{ConfigLayer, ConfigLayerSource, LayeredConfig, config_from_value, schema};
use super::discovery::canonical_or_given;
use crate::ConfigError;
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Merged layers plus the files that contributed to them.
pub(super) struct LayerStack {
    merged: Value,
    layers: Vec<ConfigLayer>,
    seen: HashSet<PathBuf>,
}

impl LayerStack {
    pub(super) fn new() -> Self {
        Self {
            merged: Value::Object(Map::new()),
            layers: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Apply the layer at `path` if the file exists.
    ///
    /// A file already applied through another source is skipped.
    pub(super) fn push_optional(
        &mut self,
        source: ConfigLayerSource,
        path: &Path,
    ) -> Result<(), ConfigError> {
        if !path.is_file() {
            debug!("no config layer (source={}, path={})", source, path.display());
            return Ok(());
        }
        let identity = canonical_or_given(path)?;
        if !self.seen.insert(identity) {
            debug!(
                "config layer already applied (source={}, path={})",
                source,
                path.display()
            );
            return Ok(());
        }
        self.apply(source, path)
    }

    /// Apply the layer at `path`, failing when the file is missing.
    pub(super) fn push_required(
        &mut self,
        source: ConfigLayerSource,
        path: &Path,
    ) -> Result<(), ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        self.apply(source, path)
    }

    pub(super) fn finish(self) -> Result<LayeredConfig, ConfigError> {
        let config = config_from_value(self.merged, "effective")?;
        Ok(LayeredConfig {
            config,
            layers: self.layers,
        })
    }

    fn apply(&mut self, source: ConfigLayerSource, path: &Path) -> Result<(), ConfigError> {
        let label = format!("{source}({})", path.display());
        let value = super::read_json5(path, &label)?;
        schema::validate_layer_schema(&value, &label)?;
        debug!("applying config layer {}", label);
        overlay(&mut self.merged, value);
        self.layers.push(ConfigLayer {
            source,
            path: path.to_path_buf(),
        });
        Ok(())
    }
}

/// Deep-merge `top` into `base`. Objects merge per key; anything else replaces.
fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base), Value::Object(top)) => {
            for (key, value) in top {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::overlay;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn overlay_merges_objects_and_replaces_arrays() {
        let mut base = json!({
            "memory": { "collection": "memories", "write": { "redact_patterns": ["a"] } },
            "server": { "bind": "0.0.0.0:8000" }
        });
        overlay(
            &mut base,
            json!({
                "memory": { "targeted_limit": 7, "write": { "redact_patterns": ["b", "c"] } },
                "server": "replaced"
            }),
        );
        assert_eq!(
            base,
            json!({
                "memory": {
                    "collection": "memories",
                    "targeted_limit": 7,
                    "write": { "redact_patterns": ["b", "c"] }
                },
                "server": "replaced"
            })
        );
    }
}
