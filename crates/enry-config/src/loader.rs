//! Discovery of enry.toml and `ENRY_*` environment overrides

use crate::bridge::{BridgeConfig, LogLevel};
use crate::{ConfigResult, CONFIG_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

/// Explicit library file
pub const ENV_LIBRARY: &str = "ENRY_LIBRARY";
/// Library name override
pub const ENV_LIBRARY_NAME: &str = "ENRY_LIBRARY_NAME";
/// Extra search directories, platform path-list syntax
pub const ENV_SEARCH_PATH: &str = "ENRY_SEARCH_PATH";
/// Strict entry-point resolution
pub const ENV_STRICT: &str = "ENRY_STRICT";
/// Log level override
pub const ENV_LOG: &str = "ENRY_LOG";

/// Produces a [`Config`] from enry.toml and the environment
///
/// Environment variables override the file; the file overrides defaults.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip environment overrides (used by tests and embedders)
    ignore_env: bool,
}

/// Effective settings after every source was applied
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Bridge configuration after all overrides
    pub bridge: BridgeConfig,

    /// Config file that was loaded, if any
    pub source: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader that honours `ENRY_*` variables
    pub fn new() -> Self {
        Self { ignore_env: false }
    }

    /// Create a loader that ignores `ENRY_*` environment variables
    pub fn without_env() -> Self {
        Self { ignore_env: true }
    }

    /// Search `start_dir` and its ancestors for enry.toml
    ///
    /// Walks up the directory tree to find enry.toml. When none exists the
    /// defaults are used.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (source, bridge) = self.find_config(start_dir)?;
        let bridge = self.apply_env_overrides(bridge)?;

        Ok(Config { bridge, source })
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let bridge = BridgeConfig::load_from_file(config_path)?;
        let bridge = self.apply_env_overrides(bridge)?;

        Ok(Config {
            bridge,
            source: Some(config_path.to_path_buf()),
        })
    }

    /// Find configuration by walking up directory tree
    fn find_config(&self, start_dir: &Path) -> ConfigResult<(Option<PathBuf>, BridgeConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.is_file() {
                let config = BridgeConfig::load_from_file(&config_path)?;
                return Ok((Some(config_path), config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, BridgeConfig::default())),
            }
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, mut config: BridgeConfig) -> ConfigResult<BridgeConfig> {
        if self.ignore_env {
            return Ok(config);
        }

        if let Some(path) = env::var_os(ENV_LIBRARY).filter(|v| !v.is_empty()) {
            config.library.path = Some(PathBuf::from(path));
        }

        if let Ok(name) = env::var(ENV_LIBRARY_NAME) {
            config.library.name = Some(name);
        }

        if let Some(paths) = env::var_os(ENV_SEARCH_PATH) {
            let mut extra: Vec<PathBuf> = env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            extra.append(&mut config.library.search_paths);
            config.library.search_paths = extra;
        }

        if let Ok(strict) = env::var(ENV_STRICT) {
            config.library.strict = Some(parse_flag(&strict));
        }

        if let Ok(level) = env::var(ENV_LOG) {
            config.logging.level = Some(level);
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    /// Effective library name
    pub fn library_name(&self) -> &str {
        self.bridge.library_name()
    }

    /// Explicit library file, if configured
    pub fn library_path(&self) -> Option<&Path> {
        self.bridge.library.path.as_deref()
    }

    /// Extra search directories in priority order
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.bridge.library.search_paths
    }

    /// Whether missing entry points are fatal
    pub fn strict(&self) -> bool {
        self.bridge.strict()
    }

    /// Configured log level
    pub fn log_level(&self) -> Option<LogLevel> {
        self.bridge.log_level()
    }

    /// Check if a config file was found
    pub fn has_file(&self) -> bool {
        self.source.is_some()
    }
}
