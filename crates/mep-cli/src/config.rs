//! Configuration management for the `mep` CLI.
//! The file lives at ~/.mep/config/mep.toml and projects default to
//! ~/.mep/projects; `MEP_HOME` relocates ~/.mep.

use anyhow::{anyhow, Context, Result};
use mep_core::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MepConfig {
    #[serde(default)]
    pub data: DataConfig,
    /// Hierarchy validation tolerances
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    /// JSON project store. Relative paths sit under the mep home; `~` expands
    /// to the user's home directory.
    #[serde(default = "default_store_dir")]
    pub store_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> String {
    "projects".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `$MEP_HOME`, or ~/.mep
pub fn mep_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("MEP_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .ok_or_else(|| anyhow!("Cannot determine home directory"))
        .map(|h| h.join(".mep"))
}

pub fn mep_config_path() -> Result<PathBuf> {
    Ok(mep_home()?.join("config").join("mep.toml"))
}

/// Load the configuration; a missing file means defaults.
pub fn load_mep_config() -> Result<MepConfig> {
    load_mep_config_from(&mep_config_path()?)
}

pub fn load_mep_config_from(path: &Path) -> Result<MepConfig> {
    if !path.exists() {
        return Ok(MepConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config '{}'", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing config '{}'", path.display()))
}

pub fn save_mep_config_to(path: &Path, config: &MepConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating config directory '{}'", dir.display()))?;
    }
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents).with_context(|| format!("writing '{}'", path.display()))?;
    Ok(())
}

/// Write the default file. Returns false when one exists and `force` is off.
pub fn init_mep_config(force: bool) -> Result<bool> {
    let path = mep_config_path()?;
    if path.exists() && !force {
        return Ok(false);
    }
    save_mep_config_to(&path, &MepConfig::default())?;
    Ok(true)
}

/// Resolve `[data] store_dir` against [`mep_home`].
pub fn resolve_store_dir(data: &DataConfig) -> Result<PathBuf> {
    resolve_store_dir_in(data, &mep_home()?)
}

/// Resolve `[data] store_dir`: `~` expands, relative paths join `home`.
pub fn resolve_store_dir_in(data: &DataConfig, home: &Path) -> Result<PathBuf> {
    let path = data.store_dir.trim();
    if let Some(rest) = path.strip_prefix('~') {
        let user_home =
            dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
        return Ok(user_home.join(rest.trim_start_matches(['/', '\\'])));
    }
    let path = Path::new(path);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(home.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = load_mep_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, MepConfig::default());
        assert!((config.validation.voltage_tolerance - 1.05).abs() < 1e-12);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mep.toml");
        std::fs::write(&path, "[validation]\namperage_tolerance = 1.5\n").unwrap();
        let config = load_mep_config_from(&path).unwrap();
        assert!((config.validation.amperage_tolerance - 1.5).abs() < 1e-12);
        assert!((config.validation.voltage_tolerance - 1.05).abs() < 1e-12);
        assert!(config.validation.check_installation);
        assert_eq!(config.data.store_dir, "projects");
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config").join("mep.toml");
        let mut config = MepConfig::default();
        config.logging.level = "debug".into();
        config.data.store_dir = "/srv/mep".into();
        save_mep_config_to(&path, &config).unwrap();
        assert_eq!(load_mep_config_from(&path).unwrap(), config);
    }

    #[test]
    fn absolute_store_dir_is_kept() {
        let data = DataConfig {
            store_dir: "/srv/mep".into(),
        };
        assert_eq!(
            resolve_store_dir_in(&data, Path::new("/home/surveyor/.mep")).unwrap(),
            PathBuf::from("/srv/mep")
        );
    }

    #[test]
    fn default_store_follows_mep_home() {
        let home = tempdir().unwrap();
        let store = resolve_store_dir_in(&DataConfig::default(), home.path()).unwrap();
        assert_eq!(store, home.path().join("projects"));
    }
}
