//! Where entry-point addresses come from

use crate::ffi::loader::LoadError;
use std::collections::HashMap;

/// Resolves native entry points by name
pub trait SymbolSource {
    /// Address of the named entry point
    fn symbol(&self, name: &str) -> Result<*const (), LoadError>;

    /// Short description for diagnostics (a path, or "symbol table")
    fn describe(&self) -> String;
}

/// In-memory name → function pointer map
///
/// Used when the native library is linked statically, and to stand in for it
/// with Rust `extern "C"` functions of the same ABI.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<String, *const ()>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry point, replacing any previous address
    pub fn insert(&mut self, name: impl Into<String>, fn_ptr: *const ()) {
        self.entries.insert(name.into(), fn_ptr);
    }

    /// Builder form of `insert`
    pub fn with(mut self, name: impl Into<String>, fn_ptr: *const ()) -> Self {
        self.insert(name, fn_ptr);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SymbolSource for SymbolTable {
    fn symbol(&self, name: &str) -> Result<*const (), LoadError> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::SymbolNotFound {
                library: self.describe(),
                symbol: name.to_string(),
            })
    }

    fn describe(&self) -> String {
        "symbol table".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn answer() -> u8 {
        1
    }

    #[test]
    fn test_lookup_registered_symbol() {
        let table = SymbolTable::new().with("IsVendor", answer as *const ());
        assert_eq!(table.symbol("IsVendor"), Ok(answer as *const ()));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_missing_symbol() {
        let table = SymbolTable::new();
        assert!(table.is_empty());
        assert_eq!(
            table.symbol("IsImage"),
            Err(LoadError::SymbolNotFound {
                library: "symbol table".to_string(),
                symbol: "IsImage".to_string(),
            })
        );
    }
}
