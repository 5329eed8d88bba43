//! enry-bridge - Safe Rust bindings to the enry shared library
//!
//! This library provides:
//! - Fixed-layout codecs between Rust values and the library's C ABI
//! - A call adapter that binds each entry point to declared kinds
//! - The `Enry` handle, one typed method per exported entry point
//! - Library discovery and loading driven by `enry.toml`

/// enry-bridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod bindings;
pub mod error;
pub mod ffi;
pub mod guess;

pub use bindings::Enry;
pub use error::{BridgeError, BridgeResult, ErrorKind};
pub use ffi::{LibraryLoader, LoadError, NativeLibrary, SymbolSource, SymbolTable};
pub use guess::Guess;
