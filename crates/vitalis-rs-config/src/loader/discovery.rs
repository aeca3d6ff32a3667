//! Locating candidate config files around the working directory.

use super::{ConfigLayerSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, LayeredConfigOptions};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// `~/.vitalis/vitalis.json5`, when a home directory is known.
pub(super) fn user_config_path() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;
    Some(
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE),
    )
}

/// Optional layers in precedence order (lowest first).
///
/// Runtime paths are not included; they are required and applied last.
pub(super) fn candidate_layers(
    options: &LayeredConfigOptions,
) -> Result<Vec<(ConfigLayerSource, PathBuf)>, ConfigError> {
    let cwd = canonical_or_given(&options.cwd)?;
    let project_root = cwd
        .ancestors()
        .find(|dir| {
            options
                .project_root_markers
                .iter()
                .any(|marker| dir.join(marker).exists())
        })
        .map(Path::to_path_buf);
    debug!(
        "config discovery (cwd={}, project_root={:?})",
        cwd.display(),
        project_root
    );

    let mut candidates = Vec::with_capacity(4);
    if let Some(user) = &options.user_config_path {
        candidates.push((ConfigLayerSource::User, user.clone()));
    }
    if let Some(root) = &project_root {
        candidates.push((ConfigLayerSource::Project, root.join(DEFAULT_CONFIG_FILE)));
    }
    candidates.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));
    if let Some(root) = &project_root {
        candidates.push((
            ConfigLayerSource::Repo,
            root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
        ));
    }
    Ok(candidates)
}

/// Canonical form of `path`; a missing path is kept as given.
pub(super) fn canonical_or_given(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.canonicalize() {
        Ok(canonical) => Ok(canonical),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
