//! Errors surfaced by the binding surface

use crate::ffi::{CallError, LoadError, MarshalError};
use enry_config::ConfigError;
use std::fmt;
use thiserror::Error;

/// Result alias for binding-surface operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Any failure of a bound operation or of building the binding surface
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A call failed to encode, invoke or decode
    #[error(transparent)]
    Call(#[from] CallError),

    /// Library or symbol could not be resolved
    #[error(transparent)]
    Load(#[from] LoadError),

    /// An entry point resolved but could not be bound to its declared kinds
    #[error("Cannot bind {symbol}: {source}")]
    Binding {
        symbol: &'static str,
        #[source]
        source: CallError,
    },

    /// The operation's entry point was missing when the library was bound
    #[error("Entry point {symbol} is not linked")]
    Unlinked { symbol: &'static str },

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Broad failure classes a caller can react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Declared kinds disagree with what the adapter can call, or bad settings
    Configuration,
    /// A host value cannot be represented natively; nothing was called
    Encoding,
    /// Library missing, entry point unlinked, or malformed native output
    NativeBoundary,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Encoding => "encoding",
            ErrorKind::NativeBoundary => "native boundary",
        })
    }
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Call(err) | BridgeError::Binding { source: err, .. } => call_kind(err),
            BridgeError::Load(_) | BridgeError::Unlinked { .. } => ErrorKind::NativeBoundary,
            BridgeError::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Whether the native function was never reached because of the host input
    pub fn is_encoding(&self) -> bool {
        self.kind() == ErrorKind::Encoding
    }
}

impl From<MarshalError> for BridgeError {
    fn from(err: MarshalError) -> Self {
        BridgeError::Call(err.into())
    }
}

fn call_kind(err: &CallError) -> ErrorKind {
    match err {
        CallError::Marshal(inner) if inner.is_encoding() => ErrorKind::Encoding,
        CallError::Marshal(MarshalError::TypeMismatch { .. }) => ErrorKind::Configuration,
        CallError::Marshal(_) | CallError::NullEntryPoint(_) => ErrorKind::NativeBoundary,
        CallError::ArityMismatch { .. }
        | CallError::UnsupportedSignature { .. }
        | CallError::UnexpectedReturn { .. } => ErrorKind::Configuration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::{InputKind, OutputKind};
    use rstest::rstest;

    #[rstest]
    #[case(MarshalError::NotUtf8 { lossy: "a\u{FFFD}.py".into() }.into(), ErrorKind::Encoding)]
    #[case(
        MarshalError::TypeMismatch { expected: InputKind::Text, got: InputKind::Bytes }.into(),
        ErrorKind::Configuration
    )]
    #[case(MarshalError::NullElement { index: 2 }.into(), ErrorKind::NativeBoundary)]
    #[case(BridgeError::Unlinked { symbol: "IsTest" }, ErrorKind::NativeBoundary)]
    #[case(
        LoadError::LibraryNotFound("enry".into()).into(),
        ErrorKind::NativeBoundary
    )]
    #[case(
        CallError::UnexpectedReturn { expected: OutputKind::Text, got: OutputKind::Bool }.into(),
        ErrorKind::Configuration
    )]
    #[case(
        ConfigError::InvalidValue { field: "library.name".into(), reason: "empty".into() }.into(),
        ErrorKind::Configuration
    )]
    fn test_error_kinds(#[case] err: BridgeError, #[case] expected: ErrorKind) {
        assert_eq!(err.kind(), expected);
    }

    #[test]
    fn test_binding_error_takes_kind_of_cause() {
        let unsupported = BridgeError::Binding {
            symbol: "GetLanguage",
            source: CallError::UnsupportedSignature {
                symbol: "GetLanguage".into(),
                signature: "(bytes,text)->text".into(),
            },
        };
        assert_eq!(unsupported.kind(), ErrorKind::Configuration);

        let null = BridgeError::Binding {
            symbol: "IsImage",
            source: CallError::NullEntryPoint("IsImage".into()),
        };
        assert_eq!(null.kind(), ErrorKind::NativeBoundary);
    }

    #[test]
    fn test_messages() {
        let err = BridgeError::Unlinked { symbol: "GetColor" };
        assert_eq!(err.to_string(), "Entry point GetColor is not linked");

        let err: BridgeError = LoadError::LibraryNotFound("enry".into()).into();
        assert_eq!(err.to_string(), "Library not found: enry");
    }
}
