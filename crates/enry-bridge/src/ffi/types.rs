//! FFI type system - fixed-layout views and the kinds that travel across the boundary
//!
//! Defines:
//! - `NativeString`, `NativeBuffer`, `GuessRecord`: the native ABI layouts
//! - `InputKind` / `OutputKind`: declared parameter and result kinds
//! - `HostArg` / `HostValue`: Rust-side values of those kinds
//! - `NativeArg`: an encoded argument, ready to be passed by value
//!
//! Kind mapping:
//! - InputKind::Text     → NativeString        (`{ const char *p; ptrdiff_t n; }`)
//! - InputKind::Bytes    → NativeBuffer        (`{ void *data; int64 len; int64 cap; }`)
//! - InputKind::TextList → NativeBuffer of NativeString
//! - OutputKind::Text    ← NativeString
//! - OutputKind::Bool    ← u8
//! - OutputKind::Guess   ← GuessRecord         (`{ NativeString r0; uint8 r1; }`)
//! - OutputKind::TextSequence ← NativeBuffer of `char *`, written through a trailing out-pointer

use crate::guess::Guess;
use std::ffi::{c_char, c_void, OsStr};
use std::fmt;
use std::marker::PhantomData;

/// Non-owning `(pointer, length)` view over UTF-8 bytes.
///
/// The lifetime ties the view to the host allocation it was built from, so a
/// view cannot outlive the bytes it points at. Views returned by the native
/// library use `'static`: the library keeps ownership of that memory and the
/// bridge copies out of it immediately.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeString<'a> {
    ptr: *const c_char,
    len: isize,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> NativeString<'a> {
    /// View over a Rust string slice
    pub fn new(value: &'a str) -> Self {
        Self {
            ptr: value.as_ptr().cast(),
            // Allocations never exceed isize::MAX bytes
            len: value.len() as isize,
            _marker: PhantomData,
        }
    }

    /// The `{NULL, 0}` view
    pub const fn empty() -> Self {
        Self {
            ptr: std::ptr::null(),
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Build a view from raw parts, as the native side would
    ///
    /// # Safety
    ///
    /// If `len > 0`, `ptr` must point to `len` readable bytes that stay valid for `'a`.
    pub const unsafe fn from_raw_parts(ptr: *const c_char, len: isize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.ptr
    }

    /// Length exactly as the native side reported it
    pub fn raw_len(&self) -> isize {
        self.len
    }

    /// Borrow the viewed bytes
    ///
    /// # Safety
    ///
    /// The view must satisfy the `from_raw_parts` contract.
    pub unsafe fn as_bytes(&self) -> &'a [u8] {
        if self.len <= 0 || self.ptr.is_null() {
            return &[];
        }
        std::slice::from_raw_parts(self.ptr.cast(), self.len as usize)
    }
}

/// Non-owning `(pointer, length, capacity)` view.
///
/// Input buffers are built with `len == cap`. In output position the callee
/// overwrites all three fields with memory it allocated.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeBuffer<'a> {
    data: *mut c_void,
    len: i64,
    cap: i64,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> NativeBuffer<'a> {
    /// View over a slice of fixed-layout elements
    pub fn from_slice<T>(items: &'a [T]) -> Self {
        Self {
            data: items.as_ptr() as *mut c_void,
            len: items.len() as i64,
            cap: items.len() as i64,
            _marker: PhantomData,
        }
    }

    /// The zero-initialized `{NULL, 0, 0}` buffer handed to out-parameters
    pub const fn empty() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
            cap: 0,
            _marker: PhantomData,
        }
    }

    /// Build a buffer from raw parts, as the native side would
    ///
    /// # Safety
    ///
    /// If `len > 0`, `data` must point to `len` initialized elements of the
    /// type the reader expects, valid for `'a`.
    pub const unsafe fn from_raw_parts(data: *mut c_void, len: i64, cap: i64) -> Self {
        Self {
            data,
            len,
            cap,
            _marker: PhantomData,
        }
    }

    pub fn data(&self) -> *mut c_void {
        self.data
    }

    pub fn raw_len(&self) -> i64 {
        self.len
    }

    pub fn capacity(&self) -> i64 {
        self.cap
    }

    /// Borrow the buffer as a slice of `T`
    ///
    /// # Safety
    ///
    /// The buffer must satisfy the `from_raw_parts` contract for `T`.
    pub unsafe fn as_slice<T>(&self) -> &'a [T] {
        if self.len <= 0 || self.data.is_null() {
            return &[];
        }
        std::slice::from_raw_parts(self.data as *const T, self.len as usize)
    }
}

/// Two-field aggregate returned by value from single-answer detectors
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessRecord {
    /// Most likely language
    pub language: NativeString<'static>,
    /// 1 when the answer was unambiguous
    pub safe: u8,
}

/// How an encoded argument is passed by value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgLayout {
    /// NativeString (two machine words)
    Str,
    /// NativeBuffer (three machine words)
    Buf,
}

/// Declared kind of a native parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// UTF-8 text
    Text,
    /// Raw bytes
    Bytes,
    /// Sequence of UTF-8 text
    TextList,
}

impl InputKind {
    /// Layout of the encoded argument
    pub fn layout(&self) -> ArgLayout {
        match self {
            InputKind::Text => ArgLayout::Str,
            InputKind::Bytes | InputKind::TextList => ArgLayout::Buf,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Bytes => "bytes",
            InputKind::TextList => "text_list",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Declared kind of a native result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// NativeString returned by value
    Text,
    /// Single-byte boolean returned by value
    Bool,
    /// GuessRecord returned by value
    Guess,
    /// Array of C strings written through a trailing `NativeBuffer *`
    TextSequence,
}

impl OutputKind {
    /// Whether the call needs a caller-allocated output buffer
    pub fn uses_out_param(&self) -> bool {
        matches!(self, OutputKind::TextSequence)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OutputKind::Text => "text",
            OutputKind::Bool => "bool",
            OutputKind::Guess => "guess",
            OutputKind::TextSequence => "text_sequence",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Host-side argument, borrowed for the duration of one call
#[derive(Debug, Clone, Copy)]
pub enum HostArg<'a> {
    /// File names, paths and language names; must be valid UTF-8 to cross
    Text(&'a OsStr),
    Bytes(&'a [u8]),
    TextList(&'a [&'a str]),
}

impl<'a> HostArg<'a> {
    pub fn text(value: &'a (impl AsRef<OsStr> + ?Sized)) -> Self {
        HostArg::Text(value.as_ref())
    }

    pub fn kind(&self) -> InputKind {
        match self {
            HostArg::Text(_) => InputKind::Text,
            HostArg::Bytes(_) => InputKind::Bytes,
            HostArg::TextList(_) => InputKind::TextList,
        }
    }
}

/// Host-side result of a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostValue {
    Text(String),
    Bool(bool),
    Guess(Guess),
    TextSequence(Vec<String>),
}

impl HostValue {
    pub fn kind(&self) -> OutputKind {
        match self {
            HostValue::Text(_) => OutputKind::Text,
            HostValue::Bool(_) => OutputKind::Bool,
            HostValue::Guess(_) => OutputKind::Guess,
            HostValue::TextSequence(_) => OutputKind::TextSequence,
        }
    }
}

/// Encoded argument, passed to the native entry point by value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeArg<'a> {
    Str(NativeString<'a>),
    Buf(NativeBuffer<'a>),
}

impl NativeArg<'_> {
    pub fn layout(&self) -> ArgLayout {
        match self {
            NativeArg::Str(_) => ArgLayout::Str,
            NativeArg::Buf(_) => ArgLayout::Buf,
        }
    }
}
