//! Native calls through direct function pointer casts
//!
//! Every entry point of the native library has a signature known up front, so
//! a `BoundOperation` records its declared kinds once and casts the raw symbol
//! to the matching `extern "C"` function type at call time. The set of
//! parameter layouts is closed and checked when the operation is built.
//!
//! A call runs in four steps inside one lexical scope:
//! 1. encode every host argument (all encoding errors surface here, before
//!    the native function runs)
//! 2. allocate the output buffer for sequence results
//! 3. invoke
//! 4. decode, then release the output buffer and the marshal context

use crate::ffi::marshal::{
    decode_bool, decode_guess, decode_string_sequence, decode_text, MarshalContext, MarshalError,
};
use crate::ffi::types::{
    ArgLayout, GuessRecord, HostArg, HostValue, InputKind, NativeArg, NativeBuffer, NativeString,
    OutputKind,
};
use std::fmt;
use std::mem;
use thiserror::Error;

/// FFI call errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    /// Host ↔ native conversion failed
    #[error("Marshal error: {0}")]
    Marshal(#[from] MarshalError),

    /// Wrong number of arguments
    #[error("{symbol}: expected {expected} arguments, got {got}")]
    ArityMismatch {
        symbol: String,
        expected: usize,
        got: usize,
    },

    /// Parameter layout the adapter cannot call
    #[error("Unsupported FFI signature for {symbol}: {signature}")]
    UnsupportedSignature { symbol: String, signature: String },

    /// Entry point resolved to a null address
    #[error("Null entry point for {0}")]
    NullEntryPoint(String),

    /// Result kind differs from what the caller asked for
    #[error("Expected a {expected} result, got {got}")]
    UnexpectedReturn {
        expected: OutputKind,
        got: OutputKind,
    },
}

/// Parameter layouts the adapter knows how to call
const SUPPORTED_PARAMETERS: &[&[ArgLayout]] = &[
    &[],
    &[ArgLayout::Str],
    &[ArgLayout::Buf],
    &[ArgLayout::Str, ArgLayout::Str],
    &[ArgLayout::Str, ArgLayout::Buf],
    &[ArgLayout::Str, ArgLayout::Buf, ArgLayout::Buf],
];

/// Whether a declared parameter list has a matching call shape
pub fn is_supported(inputs: &[InputKind]) -> bool {
    let layouts: Vec<ArgLayout> = inputs.iter().map(InputKind::layout).collect();
    SUPPORTED_PARAMETERS.contains(&layouts.as_slice())
}

/// Cast the entry point to the function type matching `$args` and call it.
///
/// `$tail` parameters are appended after the encoded arguments.
macro_rules! call_native {
    ($op:expr, $args:expr, [$($tail:ident: $tail_ty:ty),*] -> $ret:ty) => {
        match $args {
            [] => {
                let f: unsafe extern "C" fn($($tail_ty),*) -> $ret = mem::transmute($op.fn_ptr);
                Ok(f($($tail),*))
            }
            [NativeArg::Str(a)] => {
                let f: unsafe extern "C" fn(NativeString<'_>, $($tail_ty),*) -> $ret =
                    mem::transmute($op.fn_ptr);
                Ok(f(*a, $($tail),*))
            }
            [NativeArg::Buf(a)] => {
                let f: unsafe extern "C" fn(NativeBuffer<'_>, $($tail_ty),*) -> $ret =
                    mem::transmute($op.fn_ptr);
                Ok(f(*a, $($tail),*))
            }
            [NativeArg::Str(a), NativeArg::Str(b)] => {
                let f: unsafe extern "C" fn(
                    NativeString<'_>,
                    NativeString<'_>,
                    $($tail_ty),*
                ) -> $ret = mem::transmute($op.fn_ptr);
                Ok(f(*a, *b, $($tail),*))
            }
            [NativeArg::Str(a), NativeArg::Buf(b)] => {
                let f: unsafe extern "C" fn(
                    NativeString<'_>,
                    NativeBuffer<'_>,
                    $($tail_ty),*
                ) -> $ret = mem::transmute($op.fn_ptr);
                Ok(f(*a, *b, $($tail),*))
            }
            [NativeArg::Str(a), NativeArg::Buf(b), NativeArg::Buf(c)] => {
                let f: unsafe extern "C" fn(
                    NativeString<'_>,
                    NativeBuffer<'_>,
                    NativeBuffer<'_>,
                    $($tail_ty),*
                ) -> $ret = mem::transmute($op.fn_ptr);
                Ok(f(*a, *b, *c, $($tail),*))
            }
            _ => Err(CallError::UnsupportedSignature {
                symbol: $op.symbol.clone(),
                signature: $op.signature(),
            }),
        }
    };
}

/// One native entry point with its declared input and output kinds
///
/// Built once, called many times.
#[derive(Clone)]
pub struct BoundOperation {
    /// Entry point name, for diagnostics
    symbol: String,
    /// Raw function pointer (type-erased)
    fn_ptr: *const (),
    /// Declared parameter kinds, in order
    inputs: Vec<InputKind>,
    /// Declared result kind
    output: OutputKind,
}

// Safety: BoundOperation only stores a function pointer. Whether the native
// function itself is reentrant is the library's property, not the bridge's.
unsafe impl Send for BoundOperation {}
unsafe impl Sync for BoundOperation {}

impl BoundOperation {
    /// Bind a native entry point to its declared kinds
    ///
    /// Fails if the pointer is null or the parameter list has no call shape.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    /// - `fn_ptr` points to a function whose C signature matches `inputs` and `output`
    /// - The function stays valid for the lifetime of this BoundOperation
    pub unsafe fn new(
        symbol: impl Into<String>,
        fn_ptr: *const (),
        inputs: Vec<InputKind>,
        output: OutputKind,
    ) -> Result<Self, CallError> {
        let symbol = symbol.into();

        if fn_ptr.is_null() {
            return Err(CallError::NullEntryPoint(symbol));
        }

        if !is_supported(&inputs) {
            return Err(CallError::UnsupportedSignature {
                signature: signature_key(&inputs, output),
                symbol,
            });
        }

        Ok(Self {
            symbol,
            fn_ptr,
            inputs,
            output,
        })
    }

    /// Encode `args`, call the entry point, decode its result
    pub fn call(&self, args: &[HostArg<'_>]) -> Result<HostValue, CallError> {
        if args.len() != self.inputs.len() {
            return Err(CallError::ArityMismatch {
                symbol: self.symbol.clone(),
                expected: self.inputs.len(),
                got: args.len(),
            });
        }

        // Declared before the views so it is dropped after them
        let mut ctx = MarshalContext::new();
        let native_args = ctx.encode_all(args, &self.inputs)?;

        tracing::trace!(
            symbol = %self.symbol,
            arity = native_args.len(),
            output = %self.output,
            "invoking native entry point"
        );

        // Safety: the signature was vouched for in `new`, and every view in
        // `native_args` borrows from `args` or `ctx`, both alive until after decoding
        unsafe { self.invoke(&native_args) }
    }

    unsafe fn invoke(&self, args: &[NativeArg<'_>]) -> Result<HostValue, CallError> {
        match self.output {
            OutputKind::Text => {
                let raw: NativeString<'static> =
                    call_native!(self, args, [] -> NativeString<'static>)?;
                Ok(HostValue::Text(decode_text(&raw)?))
            }
            OutputKind::Bool => {
                let raw: u8 = call_native!(self, args, [] -> u8)?;
                Ok(HostValue::Bool(decode_bool(raw)))
            }
            OutputKind::Guess => {
                let raw: GuessRecord = call_native!(self, args, [] -> GuessRecord)?;
                Ok(HostValue::Guess(decode_guess(&raw)?))
            }
            OutputKind::TextSequence => {
                let mut slot = OutputSlot::new(&self.symbol);
                let out = slot.as_mut_ptr();
                call_native!(self, args, [out: *mut NativeBuffer<'static>] -> ())?;
                let items = decode_string_sequence(slot.view())?;
                Ok(HostValue::TextSequence(items))
            }
        }
    }

    /// Entry point name
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Declared parameter kinds
    pub fn inputs(&self) -> &[InputKind] {
        &self.inputs
    }

    /// Declared result kind
    pub fn output(&self) -> OutputKind {
        self.output
    }

    /// Human-readable signature, e.g. `(text,bytes)->guess`
    pub fn signature(&self) -> String {
        signature_key(&self.inputs, self.output)
    }
}

impl fmt::Debug for BoundOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundOperation")
            .field("symbol", &self.symbol)
            .field("signature", &self.signature())
            .finish()
    }
}

fn signature_key(inputs: &[InputKind], output: OutputKind) -> String {
    let params: Vec<&str> = inputs.iter().map(InputKind::display_name).collect();
    format!("({})->{}", params.join(","), output)
}

/// Caller-allocated, zero-initialized buffer the callee populates in place.
///
/// Lives on the stack of one call. Dropping it forgets the native pointers,
/// which stay owned by the native library; this runs on every exit path,
/// including a failed decode.
struct OutputSlot<'s> {
    view: NativeBuffer<'static>,
    symbol: &'s str,
}

impl<'s> OutputSlot<'s> {
    fn new(symbol: &'s str) -> Self {
        Self {
            view: NativeBuffer::empty(),
            symbol,
        }
    }

    fn as_mut_ptr(&mut self) -> *mut NativeBuffer<'static> {
        &mut self.view
    }

    fn view(&self) -> &NativeBuffer<'static> {
        &self.view
    }
}

impl Drop for OutputSlot<'_> {
    fn drop(&mut self) {
        tracing::trace!(
            symbol = self.symbol,
            len = self.view.raw_len(),
            "releasing output buffer"
        );
        self.view = NativeBuffer::empty();
    }
}

macro_rules! impl_try_from_host_value {
    ($($target:ty => $variant:ident),* $(,)?) => {
        $(
            impl TryFrom<HostValue> for $target {
                type Error = CallError;

                fn try_from(value: HostValue) -> Result<Self, Self::Error> {
                    match value {
                        HostValue::$variant(inner) => Ok(inner),
                        other => Err(CallError::UnexpectedReturn {
                            expected: OutputKind::$variant,
                            got: other.kind(),
                        }),
                    }
                }
            }
        )*
    };
}

impl_try_from_host_value! {
    String => Text,
    bool => Bool,
    crate::guess::Guess => Guess,
    Vec<String> => TextSequence,
}
