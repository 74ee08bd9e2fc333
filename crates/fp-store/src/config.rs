//! Data directory layout and the on-disk engine config (`config.toml`).

use std::path::{Path, PathBuf};

use fp_core::EngineConfig;

use crate::error::{Result, StoreError};
use crate::store::Store;

pub const DATA_DIR_ENV: &str = "FP_DATA_DIR";
pub const CONFIG_FILE: &str = "config.toml";
pub const LEDGER_FILE: &str = "ledger.db";

/// `~/.field-pattern`
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".field-pattern")
}

/// `$FP_DATA_DIR` when set, otherwise [`default_base_dir`].
pub fn resolve_base_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(default_base_dir)
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

pub fn ensure_dir(base: &Path) -> Result<()> {
    std::fs::create_dir_all(base).map_err(|e| {
        StoreError::InvalidData(format!("failed to create {}: {e}", base.display()))
    })
}

pub fn config_path(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

/// Load `<base>/config.toml`. A missing file yields the defaults; a present
/// file is parsed with every field optional and then validated.
pub fn load_config(base: &Path) -> Result<EngineConfig> {
    let path = config_path(base);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(EngineConfig::default());
    }
    let text = std::fs::read_to_string(&path)?;
    let config: EngineConfig = toml::from_str(&text)
        .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
    config
        .validate()
        .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
    Ok(config)
}

pub fn render_config(config: &EngineConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| StoreError::Config(e.to_string()))
}

/// Write `config` to `<base>/config.toml`, creating the directory.
pub fn save_config(base: &Path, config: &EngineConfig) -> Result<PathBuf> {
    config
        .validate()
        .map_err(|e| StoreError::Config(e.to_string()))?;
    ensure_dir(base)?;
    let path = config_path(base);
    std::fs::write(&path, render_config(config)?)?;
    Ok(path)
}

/// Open (creating if needed) `<base>/ledger.db`.
pub fn open_ledger(base: &Path) -> Result<Store> {
    ensure_dir(base)?;
    Store::open(&base.join(LEDGER_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(dir.path()).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            config_path(dir.path()),
            "max_iterations = 5000\ndeadline_ms = 250\n\n[weights]\npollard_rho = 7\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.max_iterations, 5000);
        assert_eq!(config.deadline_ms, Some(250));
        assert_eq!(config.weights.pollard_rho, 7);
        assert_eq!(config.weights.residue_lookup, 1);
        assert_eq!(config.trial_bound, EngineConfig::default().trial_bound);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(config_path(dir.path()), "acceptance_threshold = 1.5\n").unwrap();
        assert!(matches!(load_config(dir.path()), Err(StoreError::Config(_))));

        std::fs::write(config_path(dir.path()), "max_iterations = \"lots\"\n").unwrap();
        assert!(matches!(load_config(dir.path()), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested").join("data");
        let config = EngineConfig {
            max_iterations: 2500,
            deadline_ms: Some(40),
            ..Default::default()
        };
        let path = save_config(&base, &config).unwrap();
        assert!(path.exists());
        assert_eq!(load_config(&base).unwrap(), config);
    }

    #[test]
    fn test_render_mentions_every_field() {
        let text = render_config(&EngineConfig::default()).unwrap();
        for key in [
            "max_iterations",
            "acceptance_threshold",
            "trial_bound",
            "extra_primality_rounds",
            "[weights]",
            "pollard_rho",
        ] {
            assert!(text.contains(key), "missing {key} in\n{text}");
        }
        assert!(!text.contains("deadline_ms"));
    }

    #[test]
    fn test_open_ledger_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("fresh");
        let store = open_ledger(&base).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(base.join(LEDGER_FILE).exists());
    }
}
