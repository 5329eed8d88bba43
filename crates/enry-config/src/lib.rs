//! enry bridge configuration
//!
//! Locates and validates the settings the bridge needs before it can talk to
//! the native library:
//! - Which shared library to open (`[library]` in enry.toml)
//! - Where to look for it (search paths)
//! - How strictly to treat missing entry points
//! - Default log level (`[logging]`)
//!
//! Sources, lowest precedence first: built-in defaults, the nearest
//! `enry.toml` above the working directory, then `ENRY_*` variables. Command
//! line flags are applied by the caller on top of the result.
//!
//! # Example
//!
//! ```no_run
//! use enry_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("library: {}", config.library_name());
//! ```

pub mod bridge;
pub mod loader;

use std::path::PathBuf;
use thiserror::Error;

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "enry.toml";

/// Why a configuration could not be produced
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly named file does not exist
    #[error("No configuration file at {0}")]
    NotFound(PathBuf),

    #[error("Cannot read configuration: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{file} is not valid enry.toml: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    /// A setting parsed but is not acceptable
    #[error("Bad value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use bridge::{BridgeConfig, LibraryConfig, LogLevel, LoggingConfig};
pub use loader::{Config, ConfigLoader};
