//! Type marshaling - host ↔ native conversions
//!
//! Encoders borrow host values and never copy them: the returned views carry
//! the lifetime of the value they point into. Text lists need a backing array
//! of views, which `MarshalContext` owns until it is dropped.
//!
//! Decoders copy out of native memory immediately; the native library keeps
//! ownership of everything it returns.
//!
//! # Memory Safety
//!
//! - Zero-length views decode to empty values without touching the pointer
//! - Null pointers with a non-zero length are rejected
//! - Native text must be valid UTF-8

use crate::ffi::types::{GuessRecord, HostArg, InputKind, NativeArg, NativeBuffer, NativeString};
use crate::guess::Guess;
use std::ffi::{c_char, c_void, CStr, OsStr};
use thiserror::Error;

/// Marshal error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarshalError {
    /// Host value does not match the declared kind
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: InputKind, got: InputKind },

    /// Host text cannot be represented as UTF-8
    #[error("Text is not valid UTF-8: {lossy:?}")]
    NotUtf8 { lossy: String },

    /// Native view with a null pointer and a non-zero length
    #[error("Null pointer with length {len}")]
    NullPointer { len: i64 },

    /// Native view with a negative length
    #[error("Negative length {0}")]
    NegativeLength(i64),

    /// Null entry inside a native string array
    #[error("Null element at index {index} of a string sequence")]
    NullElement { index: usize },

    /// Native text that is not UTF-8
    #[error("Native library returned invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

impl MarshalError {
    /// True when a host value cannot be represented natively
    ///
    /// A kind mismatch is a declaration fault, not an encoding failure.
    pub fn is_encoding(&self) -> bool {
        matches!(self, MarshalError::NotUtf8 { .. })
    }
}

/// Encode host text as a native string view
///
/// The view borrows `value`; no bytes are copied.
pub fn encode_text(value: &OsStr) -> Result<NativeString<'_>, MarshalError> {
    let text = value.to_str().ok_or_else(|| MarshalError::NotUtf8 {
        lossy: value.to_string_lossy().into_owned(),
    })?;
    Ok(NativeString::new(text))
}

/// Encode host bytes as a native buffer view with `len == cap`
pub fn encode_bytes(value: &[u8]) -> NativeBuffer<'_> {
    NativeBuffer::from_slice(value)
}

/// Decode a length-prefixed native string
///
/// A zero length yields `""` whatever the pointer holds.
///
/// # Safety
///
/// For a positive length, the pointer must reference that many readable bytes.
pub unsafe fn decode_text(view: &NativeString<'_>) -> Result<String, MarshalError> {
    let len = view.raw_len();
    if len == 0 {
        return Ok(String::new());
    }
    if len < 0 {
        return Err(MarshalError::NegativeLength(len as i64));
    }
    if view.as_ptr().is_null() {
        return Err(MarshalError::NullPointer { len: len as i64 });
    }

    Ok(std::str::from_utf8(view.as_bytes())?.to_owned())
}

/// Decode a native byte buffer
///
/// # Safety
///
/// For a positive length, `data` must reference that many readable bytes.
pub unsafe fn decode_bytes(view: &NativeBuffer<'_>) -> Result<Vec<u8>, MarshalError> {
    let len = view.raw_len();
    if len == 0 {
        return Ok(Vec::new());
    }
    if len < 0 {
        return Err(MarshalError::NegativeLength(len));
    }
    if view.data().is_null() {
        return Err(MarshalError::NullPointer { len });
    }

    Ok(view.as_slice::<u8>().to_vec())
}

/// Decode a native boolean
///
/// Strict: only the byte 1 is true. The native library only emits 0 and 1, so
/// any other byte is treated as false instead of being read as truthy.
pub fn decode_bool(value: u8) -> bool {
    value == 1
}

/// Decode a `{language, safe}` record
///
/// # Safety
///
/// The record's string view must satisfy the `decode_text` contract.
pub unsafe fn decode_guess(record: &GuessRecord) -> Result<Guess, MarshalError> {
    Ok(Guess {
        primary: decode_text(&record.language)?,
        confident: decode_bool(record.safe),
    })
}

/// Decode a populated output buffer holding `len` NUL-terminated C strings
///
/// Elements are returned in native order.
///
/// # Safety
///
/// For a positive length, `data` must reference that many pointers, each to a
/// NUL-terminated string.
pub unsafe fn decode_string_sequence(
    view: &NativeBuffer<'_>,
) -> Result<Vec<String>, MarshalError> {
    let len = view.raw_len();
    if len == 0 {
        return Ok(Vec::new());
    }
    if len < 0 {
        return Err(MarshalError::NegativeLength(len));
    }
    if view.data().is_null() {
        return Err(MarshalError::NullPointer { len });
    }

    view.as_slice::<*const c_char>()
        .iter()
        .enumerate()
        .map(|(index, &ptr)| {
            if ptr.is_null() {
                return Err(MarshalError::NullElement { index });
            }
            Ok(CStr::from_ptr(ptr).to_str()?.to_owned())
        })
        .collect()
}

/// Per-call marshal context
///
/// Owns the backing arrays created while encoding text lists. Every view it
/// hands out borrows the context, so none can outlive it.
///
/// # Example
///
/// ```
/// # use enry_bridge::ffi::{HostArg, InputKind, MarshalContext, NativeArg};
/// let candidates = ["C", "C++"];
/// let mut ctx = MarshalContext::new();
/// let arg = ctx
///     .encode(&HostArg::TextList(&candidates), InputKind::TextList)
///     .unwrap();
/// assert!(matches!(arg, NativeArg::Buf(_)));
/// assert_eq!(ctx.retained(), 1);
/// ```
///
/// A view cannot escape the context that backs it:
///
/// ```compile_fail
/// # use enry_bridge::ffi::MarshalContext;
/// let candidates = ["C", "Go"];
/// let buffer = {
///     let mut ctx = MarshalContext::new();
///     ctx.encode_text_list(&candidates)
/// };
/// let _ = buffer.raw_len();
/// ```
#[derive(Debug, Default)]
pub struct MarshalContext<'a> {
    lists: Vec<Box<[NativeString<'a>]>>,
}

impl<'a> MarshalContext<'a> {
    pub fn new() -> Self {
        Self { lists: Vec::new() }
    }

    /// Encode one host argument as its declared kind
    pub fn encode<'c>(
        &'c mut self,
        arg: &HostArg<'a>,
        kind: InputKind,
    ) -> Result<NativeArg<'c>, MarshalError> {
        // Safety: the result is narrowed to the borrow of `self`
        unsafe { self.encode_detached(arg, kind) }
    }

    /// Encode every argument against its declared kind, stopping at the first error
    pub fn encode_all<'c>(
        &'c mut self,
        args: &[HostArg<'a>],
        kinds: &[InputKind],
    ) -> Result<Vec<NativeArg<'c>>, MarshalError> {
        let encoded: Vec<NativeArg<'a>> = args
            .iter()
            .zip(kinds)
            // Safety: the collected views are narrowed to the borrow of `self`
            .map(|(arg, kind)| unsafe { self.encode_detached(arg, *kind) })
            .collect::<Result<_, _>>()?;
        Ok(encoded)
    }

    /// Encode a list of text as a buffer of string views
    pub fn encode_text_list<'c>(&'c mut self, items: &[&'a str]) -> NativeBuffer<'c> {
        // Safety: the result is narrowed to the borrow of `self`
        unsafe { self.push_text_list(items) }
    }

    /// Number of backing arrays held for the current call
    pub fn retained(&self) -> usize {
        self.lists.len()
    }

    /// # Safety
    ///
    /// A text-list result points into `self.lists`; it must not be used after
    /// `self` is dropped.
    unsafe fn encode_detached(
        &mut self,
        arg: &HostArg<'a>,
        kind: InputKind,
    ) -> Result<NativeArg<'a>, MarshalError> {
        match (*arg, kind) {
            (HostArg::Text(value), InputKind::Text) => Ok(NativeArg::Str(encode_text(value)?)),
            (HostArg::Bytes(value), InputKind::Bytes) => Ok(NativeArg::Buf(encode_bytes(value))),
            (HostArg::TextList(items), InputKind::TextList) => {
                Ok(NativeArg::Buf(self.push_text_list(items)))
            }
            _ => Err(MarshalError::TypeMismatch {
                expected: kind,
                got: arg.kind(),
            }),
        }
    }

    /// # Safety
    ///
    /// The returned buffer points into `self.lists` and must not be used after
    /// `self` is dropped.
    unsafe fn push_text_list(&mut self, items: &[&'a str]) -> NativeBuffer<'a> {
        let views: Box<[NativeString<'a>]> = items.iter().map(|&s| NativeString::new(s)).collect();
        let len = views.len() as i64;
        self.lists.push(views);

        // Boxed arrays stay put when `lists` reallocates
        let data = self.lists[self.lists.len() - 1].as_ptr() as *mut c_void;
        NativeBuffer::from_raw_parts(data, len, len)
    }
}

impl Drop for MarshalContext<'_> {
    fn drop(&mut self) {
        if !self.lists.is_empty() {
            tracing::trace!(
                arrays = self.lists.len(),
                "releasing text list backing arrays"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    proptest! {
        #[test]
        fn prop_text_round_trip(text in ".*") {
            let view = encode_text(OsStr::new(&text)).unwrap();
            let decoded = unsafe { decode_text(&view) }.unwrap();
            prop_assert_eq!(decoded, text);
        }

        #[test]
        fn prop_bytes_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let view = encode_bytes(&bytes);
            prop_assert_eq!(view.raw_len(), view.capacity());
            let decoded = unsafe { decode_bytes(&view) }.unwrap();
            prop_assert_eq!(decoded, bytes);
        }

        #[test]
        fn prop_bool_is_strict(value in any::<u8>()) {
            prop_assert_eq!(decode_bool(value), value == 1);
        }
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(2, false)]
    #[case(255, false)]
    fn test_decode_bool(#[case] raw: u8, #[case] expected: bool) {
        assert_eq!(decode_bool(raw), expected);
    }

    #[test]
    fn test_zero_length_ignores_pointer() {
        let dangling = unsafe { NativeString::from_raw_parts(0x1 as *const c_char, 0) };
        assert_eq!(unsafe { decode_text(&dangling) }, Ok(String::new()));
        assert_eq!(
            unsafe { decode_text(&NativeString::empty()) },
            Ok(String::new())
        );

        let buffer = unsafe { NativeBuffer::from_raw_parts(0x1 as *mut c_void, 0, 0) };
        assert_eq!(unsafe { decode_string_sequence(&buffer) }, Ok(vec![]));
        assert_eq!(unsafe { decode_bytes(&buffer) }, Ok(vec![]));
    }

    #[test]
    fn test_decode_null_with_length() {
        let view = unsafe { NativeString::from_raw_parts(std::ptr::null(), 3) };
        assert_eq!(
            unsafe { decode_text(&view) },
            Err(MarshalError::NullPointer { len: 3 })
        );
    }

    #[test]
    fn test_decode_negative_length() {
        let view = unsafe { NativeString::from_raw_parts(b"x".as_ptr().cast(), -1) };
        assert_eq!(
            unsafe { decode_text(&view) },
            Err(MarshalError::NegativeLength(-1))
        );
    }

    #[test]
    fn test_decode_text_copies_exactly_len_bytes() {
        let backing = b"Pythonic";
        let view = unsafe { NativeString::from_raw_parts(backing.as_ptr().cast(), 6) };
        assert_eq!(unsafe { decode_text(&view) }.unwrap(), "Python");
    }

    #[test]
    fn test_decode_invalid_utf8_from_native() {
        let backing = [0x66u8, 0xff, 0xfe];
        let view = unsafe { NativeString::from_raw_parts(backing.as_ptr().cast(), 3) };
        let err = unsafe { decode_text(&view) }.unwrap_err();
        assert!(matches!(err, MarshalError::InvalidUtf8(_)));
        assert!(!err.is_encoding());
    }

    #[test]
    fn test_decode_guess() {
        let record = GuessRecord {
            language: NativeString::new("Python"),
            safe: 1,
        };
        assert_eq!(
            unsafe { decode_guess(&record) }.unwrap(),
            Guess::new("Python", true)
        );

        let ambiguous = GuessRecord {
            language: NativeString::new("C"),
            safe: 0,
        };
        assert_eq!(
            unsafe { decode_guess(&ambiguous) }.unwrap(),
            Guess::new("C", false)
        );
    }

    #[test]
    fn test_decode_string_sequence_preserves_order() {
        let items: [*const c_char; 3] = [
            b"a\0".as_ptr().cast(),
            b"bb\0".as_ptr().cast(),
            b"ccc\0".as_ptr().cast(),
        ];
        let buffer = NativeBuffer::from_slice(&items);

        let decoded = unsafe { decode_string_sequence(&buffer) }.unwrap();
        assert_eq!(decoded, vec!["a", "bb", "ccc"]);
    }

    #[test]
    fn test_decode_string_sequence_null_element() {
        let items: [*const c_char; 2] = [b"Go\0".as_ptr().cast(), std::ptr::null()];
        let buffer = NativeBuffer::from_slice(&items);

        assert_eq!(
            unsafe { decode_string_sequence(&buffer) },
            Err(MarshalError::NullElement { index: 1 })
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_encode_non_utf8_text() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"caf\xe9.py");
        let err = encode_text(raw).unwrap_err();
        assert!(matches!(err, MarshalError::NotUtf8 { .. }));
        assert!(err.is_encoding());
    }

    #[test]
    fn test_encode_type_mismatch() {
        let mut ctx = MarshalContext::new();
        let err = ctx
            .encode(&HostArg::Bytes(b"#!/bin/sh"), InputKind::Text)
            .unwrap_err();
        assert_eq!(
            err,
            MarshalError::TypeMismatch {
                expected: InputKind::Text,
                got: InputKind::Bytes,
            }
        );
        assert!(!err.is_encoding());
    }

    #[test]
    fn test_encode_text_list_backing_array() {
        let candidates = ["C", "C++", "Objective-C"];
        let mut ctx = MarshalContext::new();
        let buffer = ctx.encode_text_list(&candidates);

        assert_eq!(buffer.raw_len(), 3);
        assert_eq!(buffer.capacity(), 3);

        let views = unsafe { buffer.as_slice::<NativeString<'_>>() };
        let decoded: Vec<String> = views
            .iter()
            .map(|v| unsafe { decode_text(v) }.unwrap())
            .collect();
        assert_eq!(decoded, vec!["C", "C++", "Objective-C"]);
        assert_eq!(ctx.retained(), 1);
    }

    #[test]
    fn test_earlier_lists_survive_later_pushes() {
        let first = ["Go"];
        let rest: Vec<[&str; 1]> = (0..32).map(|_| ["Rust"]).collect();
        let mut ctx = MarshalContext::new();

        let mut args = vec![HostArg::TextList(&first)];
        args.extend(rest.iter().map(|list| HostArg::TextList(list)));
        let kinds = vec![InputKind::TextList; args.len()];

        let encoded = ctx.encode_all(&args, &kinds).unwrap();
        let NativeArg::Buf(buffer) = encoded[0] else {
            panic!("text list must encode as a buffer");
        };
        let views = unsafe { buffer.as_slice::<NativeString<'_>>() };
        assert_eq!(unsafe { decode_text(&views[0]) }.unwrap(), "Go");

        drop(encoded);
        assert_eq!(ctx.retained(), 33);
    }

    #[test]
    fn test_encode_empty_text_list() {
        let mut ctx = MarshalContext::new();
        let buffer = ctx.encode_text_list(&[]);
        assert_eq!(buffer.raw_len(), 0);
        assert_eq!(ctx.retained(), 1);
    }

    #[test]
    fn test_encode_matches_declared_kind() {
        let mut ctx = MarshalContext::new();
        let encoded = ctx
            .encode_all(
                &[HostArg::text("test.py"), HostArg::Bytes(b"import os")],
                &[InputKind::Text, InputKind::Bytes],
            )
            .unwrap();

        assert!(matches!(encoded[0], NativeArg::Str(view) if view.raw_len() == 7));
        assert!(matches!(encoded[1], NativeArg::Buf(view) if view.raw_len() == 9));

        drop(encoded);
        assert_eq!(ctx.retained(), 0);
    }
}
