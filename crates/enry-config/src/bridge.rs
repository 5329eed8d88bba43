//! Bridge Configuration (enry.toml)
//!
//! Describes how to find the native enry library and how loudly to log.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Library name used when none is configured (`libenry.so`, `libenry.dylib`, `enry.dll`)
pub const DEFAULT_LIBRARY_NAME: &str = "enry";

/// Bridge configuration from enry.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Native library location
    #[serde(default)]
    pub library: LibraryConfig,

    /// Logging defaults
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[library]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    /// Short library name, resolved with platform naming rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Explicit library file; bypasses the search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Extra directories searched before the platform defaults
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<PathBuf>,

    /// Fail at load time if any entry point is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default log level (error, warn, info, debug, trace)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Log level accepted in `[logging] level` and `ENRY_LOG`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!(
                    "must be one of error, warn, info, debug, trace; got '{}'",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BridgeConfig {
    /// Load bridge configuration from a file
    ///
    /// Relative `search_paths` and `path` entries are resolved against the
    /// directory containing the file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let mut config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
                file: path.to_path_buf(),
                error: e,
            })?;

        if let Some(base) = path.parent() {
            config.library.anchor_to(base);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the bridge configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(name) = &self.library.name {
            validate_library_name(name)?;
        }

        if let Some(level) = &self.logging.level {
            level.parse::<LogLevel>()?;
        }

        Ok(())
    }

    /// Effective library name
    pub fn library_name(&self) -> &str {
        self.library
            .name
            .as_deref()
            .unwrap_or(DEFAULT_LIBRARY_NAME)
    }

    /// Whether missing entry points are fatal
    pub fn strict(&self) -> bool {
        self.library.strict.unwrap_or(false)
    }

    /// Effective log level, if configured
    pub fn log_level(&self) -> Option<LogLevel> {
        self.logging
            .level
            .as_deref()
            .and_then(|level| level.parse().ok())
    }

}

impl LibraryConfig {
    fn anchor_to(&mut self, base: &Path) {
        for entry in &mut self.search_paths {
            if entry.is_relative() {
                *entry = base.join(&*entry);
            }
        }
        if let Some(path) = self.path.as_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// The name is a stem like "enry", not a file or a path
fn validate_library_name(name: &str) -> ConfigResult<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "library.name".to_string(),
            reason: "name cannot be empty".to_string(),
        });
    }

    if name.contains(['/', '\\']) {
        return Err(ConfigError::InvalidValue {
            field: "library.name".to_string(),
            reason: format!(
                "'{}' looks like a path; use library.path for explicit files",
                name
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_empty_config() {
        let config: BridgeConfig = toml::from_str("").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.library_name(), "enry");
        assert!(!config.strict());
        assert_eq!(config.log_level(), None);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[library]
name = "enry-amd64"
search_paths = ["../.shared", "/opt/enry/lib"]
strict = true

[logging]
level = "debug"
"#;

        let config: BridgeConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.library_name(), "enry-amd64");
        assert!(config.strict());
        assert_eq!(config.library.search_paths.len(), 2);
        assert_eq!(config.log_level(), Some(LogLevel::Debug));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
[library]
nmae = "enry"
"#;
        assert!(toml::from_str::<BridgeConfig>(toml).is_err());
    }

    #[test]
    fn test_library_name_validation() {
        assert!(validate_library_name("enry").is_ok());
        assert!(validate_library_name("").is_err());
        assert!(validate_library_name("   ").is_err());
        assert!(validate_library_name("lib/enry").is_err());
        assert!(validate_library_name("C:\\enry").is_err());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_invalid_log_level_fails_validation() {
        let config = BridgeConfig {
            logging: LoggingConfig {
                level: Some("verbose".to_string()),
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_anchor_relative_paths() {
        let mut library = LibraryConfig {
            path: Some(PathBuf::from("build/libenry.so")),
            search_paths: vec![PathBuf::from(".shared"), PathBuf::from("/abs")],
            ..Default::default()
        };
        library.anchor_to(Path::new("/project"));

        assert_eq!(
            library.path,
            Some(PathBuf::from("/project/build/libenry.so"))
        );
        assert_eq!(
            library.search_paths,
            vec![PathBuf::from("/project/.shared"), PathBuf::from("/abs")]
        );
    }
}
