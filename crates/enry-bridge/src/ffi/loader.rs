//! Locating and opening the enry shared library
//!
//! A short name such as `enry` is expanded to the platform's file names
//! (`libenry.so`, `libenry.dylib`, `enry.dll`) and looked up along a search
//! path. Opening goes through `libloading`.

use crate::ffi::symbols::SymbolSource;
use enry_config::Config;
use libloading::{Library, Symbol};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to find or open the library, or to find one of its exports
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// No candidate file exists
    #[error("Library not found: {0}")]
    LibraryNotFound(String),

    /// The library does not export this entry point
    #[error("Symbol '{symbol}' not found in library '{library}'")]
    SymbolNotFound { library: String, symbol: String },

    /// The file exists but the dynamic loader rejected it
    #[error("Failed to load library: {0}")]
    LoadFailed(String),
}

#[cfg(target_os = "linux")]
const SYSTEM_LIB_DIRS: &[&str] = &["/usr/local/lib", "/usr/lib", "/lib", "/usr/lib64", "/lib64"];

#[cfg(target_os = "macos")]
const SYSTEM_LIB_DIRS: &[&str] = &["/usr/local/lib", "/opt/homebrew/lib", "/usr/lib"];

#[cfg(target_os = "windows")]
const SYSTEM_LIB_DIRS: &[&str] = &["C:\\Windows\\System32"];

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const SYSTEM_LIB_DIRS: &[&str] = &[];

/// Finds the library file along an ordered search path
///
/// Opening a library runs its initializers inside this process, so only
/// trusted files should be configured.
#[derive(Debug, Clone)]
pub struct LibraryLoader {
    search_paths: Vec<PathBuf>,
}

impl LibraryLoader {
    /// Search the working directory, then the system library directories
    pub fn new() -> Self {
        Self {
            search_paths: Self::default_search_paths(),
        }
    }

    /// Create a loader whose configured search paths come before the defaults
    pub fn from_config(config: &Config) -> Self {
        let mut loader = Self::new();
        for dir in config.search_paths().iter().rev() {
            loader.add_search_path(dir.clone());
        }
        loader
    }

    fn default_search_paths() -> Vec<PathBuf> {
        std::env::current_dir()
            .into_iter()
            .chain(SYSTEM_LIB_DIRS.iter().map(PathBuf::from))
            .collect()
    }

    /// Candidate file names for a short library name, in priority order
    ///
    /// - Linux: lib{name}.so, {name}.so
    /// - macOS: lib{name}.dylib, lib{name}.so, ...
    /// - Windows: {name}.dll, lib{name}.dll
    pub fn file_names(name: &str) -> Vec<String> {
        let extensions: &[&str] = if cfg!(target_os = "windows") {
            &["dll"]
        } else if cfg!(target_os = "macos") {
            &["dylib", "so"]
        } else {
            &["so"]
        };

        let prefixes: &[&str] = if cfg!(target_os = "windows") {
            &["", "lib"]
        } else {
            &["lib", ""]
        };

        prefixes
            .iter()
            .flat_map(|prefix| {
                extensions
                    .iter()
                    .map(move |ext| format!("{}{}.{}", prefix, name, ext))
            })
            .collect()
    }

    /// First existing file for `name` along the search path
    ///
    /// An absolute path that exists is returned unchanged.
    pub fn resolve_library_path(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_absolute() && direct.is_file() {
            return Some(direct.to_path_buf());
        }

        let file_names = Self::file_names(name);
        self.search_paths
            .iter()
            .flat_map(|dir| file_names.iter().map(move |file| dir.join(file)))
            .find(|candidate| candidate.is_file())
    }

    /// Open a library by short name
    pub fn open(&self, name: &str) -> Result<NativeLibrary, LoadError> {
        match self.resolve_library_path(name) {
            Some(path) => Self::open_path(&path),
            None => Err(LoadError::LibraryNotFound(name.to_string())),
        }
    }

    /// Open a library from an explicit file
    pub fn open_path(path: &Path) -> Result<NativeLibrary, LoadError> {
        if !path.exists() {
            return Err(LoadError::LibraryNotFound(path.display().to_string()));
        }

        tracing::debug!(path = %path.display(), "opening native library");

        // Safety: opening runs the library's initializers; the configured
        // library is trusted
        let library =
            unsafe { Library::new(path).map_err(|e| LoadError::LoadFailed(e.to_string()))? };

        Ok(NativeLibrary {
            path: path.to_path_buf(),
            library,
        })
    }

    /// Open the library a configuration points at
    ///
    /// An explicit `library.path` wins over a name search.
    pub fn open_configured(&self, config: &Config) -> Result<NativeLibrary, LoadError> {
        match config.library_path() {
            Some(path) => Self::open_path(path),
            None => self.open(config.library_name()),
        }
    }

    /// Search `dir` before everything else
    pub fn add_search_path(&mut self, dir: PathBuf) {
        self.search_paths.insert(0, dir);
    }

    /// Search paths in priority order
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for LibraryLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// An opened shared library
///
/// Function pointers resolved from it are valid only while it is alive.
pub struct NativeLibrary {
    path: PathBuf,
    library: Library,
}

impl NativeLibrary {
    /// File the library was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SymbolSource for NativeLibrary {
    fn symbol(&self, name: &str) -> Result<*const (), LoadError> {
        // Safety: the symbol is only turned into an address here; it is
        // called through a BoundOperation whose signature was declared for it
        unsafe {
            let symbol: Symbol<'_, unsafe extern "C" fn()> = self
                .library
                .get(name.as_bytes())
                .map_err(|_| LoadError::SymbolNotFound {
                    library: self.path.display().to_string(),
                    symbol: name.to_string(),
                })?;
            Ok(*symbol as *const ())
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .finish()
    }
}
