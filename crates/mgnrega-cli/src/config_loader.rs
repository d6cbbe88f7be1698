//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use mgnrega_core::config::{AppConfig, CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when --config is absent
pub const DEFAULT_CONFIG_FILE: &str = "mgnrega.toml";

/// Load layered configuration: defaults, then file, then environment
pub fn load_config(path: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = resolve_config_path(path) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides and resolve it
pub fn load_app_config(path: Option<&Path>, overrides: CliConfigOverrides) -> Result<AppConfig> {
    let mut config = load_config(path)?;
    config.update_from_cli(overrides);
    config.build().context("Invalid configuration")
}

fn resolve_config_path(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mgnrega_core::config::ConfigSource;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_explicit_file_is_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "default_state_code = \"UP\"").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        let (_, source) = &config.to_inspection_map()["default_state_code"];
        // The environment may still win over the file, but never the default
        assert_ne!(*source, ConfigSource::Default);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/mgnrega.toml"))).is_err());
    }
}
