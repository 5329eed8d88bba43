//! Foreign Function Interface (FFI) infrastructure
//!
//! Enables Rust to call the native enry library via:
//! - Fixed-layout views (`types`)
//! - Host ↔ native marshaling (`marshal`)
//! - Typed call dispatch (`caller`)
//! - Dynamic library loading and symbol lookup (`loader`, `symbols`)
//!
//! # Safety
//!
//! FFI operations involve `unsafe` code and careful memory management.
//! All unsafe code is isolated in this module with safe wrappers.

pub mod caller;
pub mod loader;
pub mod marshal;
pub mod symbols;
pub mod types;

pub use caller::{BoundOperation, CallError};
pub use loader::{LibraryLoader, LoadError, NativeLibrary};
pub use marshal::{
    decode_bool, decode_bytes, decode_guess, decode_string_sequence, decode_text, encode_bytes,
    encode_text, MarshalContext, MarshalError,
};
pub use symbols::{SymbolSource, SymbolTable};
pub use types::{
    ArgLayout, GuessRecord, HostArg, HostValue, InputKind, NativeArg, NativeBuffer, NativeString,
    OutputKind,
};
