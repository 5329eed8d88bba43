//! The binding surface: one typed method per native entry point
//!
//! Every operation is declared once in `bind_operations!` with its input and
//! output kinds. The macro generates the resolution table, the typed method and
//! the `Enry::SYMBOLS` list, so a new entry point needs no codec code.

use crate::error::{BridgeError, BridgeResult};
use crate::ffi::{
    BoundOperation, HostArg, HostValue, InputKind, LibraryLoader, NativeLibrary, OutputKind,
    SymbolSource,
};
use crate::guess::Guess;
use enry_config::Config;
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

/// Host parameter type for an input kind
macro_rules! host_type {
    (Text) => { impl AsRef<OsStr> };
    (Bytes) => { &[u8] };
    (TextList) => { &[&str] };
}

/// Rust result type for an output kind
macro_rules! output_type {
    (Text) => { String };
    (Bool) => { bool };
    (Guess) => { Guess };
    (TextSequence) => { Vec<String> };
}

macro_rules! host_arg {
    (Text, $arg:expr) => {
        HostArg::Text($arg.as_ref())
    };
    (Bytes, $arg:expr) => {
        HostArg::Bytes($arg)
    };
    (TextList, $arg:expr) => {
        HostArg::TextList($arg)
    };
}

macro_rules! bind_operations {
    (
        $(
            $(#[$meta:meta])*
            fn $name:ident($($arg:ident: $kind:ident),*) -> $out:ident = $symbol:literal;
        )*
    ) => {
        struct Operations {
            $($name: Binding,)*
        }

        impl Operations {
            /// # Safety
            ///
            /// Every symbol `source` returns must have the C signature declared for it.
            unsafe fn bind(source: &dyn SymbolSource, strict: bool) -> BridgeResult<Self> {
                Ok(Self {
                    $(
                        $name: Binding::resolve(
                            source,
                            $symbol,
                            vec![$(InputKind::$kind),*],
                            OutputKind::$out,
                            strict,
                        )?,
                    )*
                })
            }

            fn all(&self) -> Vec<&Binding> {
                vec![$(&self.$name),*]
            }
        }

        impl Enry {
            /// Every native entry point the surface declares, in declaration order
            pub const SYMBOLS: &'static [&'static str] = &[$($symbol),*];

            $(
                $(#[$meta])*
                pub fn $name(&self, $($arg: host_type!($kind)),*) -> BridgeResult<output_type!($out)> {
                    let value = self.ops.$name.call(&[$(host_arg!($kind, $arg)),*])?;
                    Ok(value.try_into()?)
                }
            )*
        }
    };
}

/// One declared entry point, bound or recorded as missing
struct Binding {
    symbol: &'static str,
    op: Option<BoundOperation>,
}

impl Binding {
    unsafe fn resolve(
        source: &dyn SymbolSource,
        symbol: &'static str,
        inputs: Vec<InputKind>,
        output: OutputKind,
        strict: bool,
    ) -> BridgeResult<Self> {
        match source.symbol(symbol) {
            Ok(fn_ptr) => {
                let op = BoundOperation::new(symbol, fn_ptr, inputs, output)
                    .map_err(|source| BridgeError::Binding { symbol, source })?;
                Ok(Self {
                    symbol,
                    op: Some(op),
                })
            }
            Err(err) if strict => Err(err.into()),
            Err(err) => {
                tracing::warn!(symbol, error = %err, "entry point unavailable");
                Ok(Self { symbol, op: None })
            }
        }
    }

    fn call(&self, args: &[HostArg<'_>]) -> BridgeResult<HostValue> {
        let op = self.op.as_ref().ok_or(BridgeError::Unlinked {
            symbol: self.symbol,
        })?;
        Ok(op.call(args)?)
    }
}

/// Safe handle on the native enry library
///
/// All entry points are resolved once, up front. The handle keeps the library
/// loaded for as long as it lives.
///
/// # Example
///
/// ```no_run
/// use enry_bridge::Enry;
///
/// let enry = Enry::open("/usr/local/lib/libenry.so")?;
/// let guess = enry.get_language_by_extension("main.py")?;
/// assert_eq!(guess.primary, "Python");
/// # Ok::<(), enry_bridge::BridgeError>(())
/// ```
pub struct Enry {
    ops: Operations,
    missing: Vec<&'static str>,
    origin: String,
    _library: Option<NativeLibrary>,
}

impl Enry {
    /// Open the library a configuration points at and bind it
    pub fn load(config: &Config) -> BridgeResult<Self> {
        let library = LibraryLoader::from_config(config).open_configured(config)?;
        Self::with_library(library, config.strict())
    }

    /// Open a library file and bind it, tolerating missing entry points
    pub fn open(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let library = LibraryLoader::open_path(path.as_ref())?;
        Self::with_library(library, false)
    }

    /// Bind an already opened library
    pub fn with_library(library: NativeLibrary, strict: bool) -> BridgeResult<Self> {
        // Safety: the library is the enry shared library, whose exports carry
        // the signatures declared below; it is kept alive inside the handle
        let mut enry = unsafe { Self::from_symbols(&library, strict)? };
        enry._library = Some(library);
        Ok(enry)
    }

    /// Bind entry points from any symbol source
    ///
    /// With `strict`, a missing entry point fails the whole binding. Otherwise
    /// it is recorded and calling it returns [`BridgeError::Unlinked`].
    ///
    /// # Safety
    ///
    /// Every address `source` yields must be a function with the declared C
    /// signature, and must stay valid while the returned handle is alive.
    pub unsafe fn from_symbols(source: &dyn SymbolSource, strict: bool) -> BridgeResult<Self> {
        let origin = source.describe();
        let ops = Operations::bind(source, strict)?;
        let missing: Vec<&'static str> = ops
            .all()
            .into_iter()
            .filter(|binding| binding.op.is_none())
            .map(|binding| binding.symbol)
            .collect();

        tracing::debug!(
            origin = %origin,
            bound = Self::SYMBOLS.len() - missing.len(),
            missing = missing.len(),
            "bound native entry points"
        );

        Ok(Self {
            ops,
            missing,
            origin,
            _library: None,
        })
    }

    /// Declared entry points that did not resolve
    pub fn missing_symbols(&self) -> &[&'static str] {
        &self.missing
    }

    /// Whether a declared entry point resolved
    pub fn is_linked(&self, symbol: &str) -> bool {
        Self::SYMBOLS.contains(&symbol) && !self.missing.contains(&symbol)
    }

    /// Where the entry points came from
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Declared signature of every bound entry point, e.g. `(text)->guess`
    pub fn signatures(&self) -> Vec<(&'static str, Option<String>)> {
        self.ops
            .all()
            .into_iter()
            .map(|binding| {
                (
                    binding.symbol,
                    binding.op.as_ref().map(BoundOperation::signature),
                )
            })
            .collect()
    }
}

impl fmt::Debug for Enry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enry")
            .field("origin", &self.origin)
            .field("missing", &self.missing)
            .finish()
    }
}

bind_operations! {
    /// Most likely language for a file, from its name and content
    fn get_language(filename: Text, content: Bytes) -> Text = "GetLanguage";

    /// Detect from content only (heuristics and classifier)
    fn get_language_by_content(filename: Text, content: Bytes) -> Guess = "GetLanguageByContent";

    fn get_language_by_extension(filename: Text) -> Guess = "GetLanguageByExtension";

    fn get_language_by_filename(filename: Text) -> Guess = "GetLanguageByFilename";

    /// Emacs or Vim modeline, whichever is present
    fn get_language_by_modeline(content: Bytes) -> Guess = "GetLanguageByModeline";

    fn get_language_by_emacs_modeline(content: Bytes) -> Guess = "GetLanguageByEmacsModeline";

    fn get_language_by_vim_modeline(content: Bytes) -> Guess = "GetLanguageByVimModeline";

    /// Interpreter named in a `#!` line
    fn get_language_by_shebang(content: Bytes) -> Guess = "GetLanguageByShebang";

    /// Every plausible language for a file
    fn get_languages(filename: Text, content: Bytes) -> TextSequence = "GetLanguages";

    /// Extensions registered for a language, leading dot included
    fn get_language_extensions(language: Text) -> TextSequence = "GetLanguageExtensions";

    /// Content strategy, narrowed to `candidates` when non-empty
    fn get_languages_by_content(filename: Text, content: Bytes, candidates: TextList) -> TextSequence = "GetLanguagesByContent";

    fn get_languages_by_extension(filename: Text, content: Bytes, candidates: TextList) -> TextSequence = "GetLanguagesByExtension";

    fn get_languages_by_filename(filename: Text, content: Bytes, candidates: TextList) -> TextSequence = "GetLanguagesByFilename";

    fn get_languages_by_modeline(filename: Text, content: Bytes, candidates: TextList) -> TextSequence = "GetLanguagesByModeline";

    fn get_languages_by_emacs_modeline(filename: Text, content: Bytes, candidates: TextList) -> TextSequence = "GetLanguagesByEmacsModeline";

    fn get_languages_by_vim_modeline(filename: Text, content: Bytes, candidates: TextList) -> TextSequence = "GetLanguagesByVimModeline";

    fn get_languages_by_shebang(filename: Text, content: Bytes, candidates: TextList) -> TextSequence = "GetLanguagesByShebang";

    /// MIME type for a path, given its detected language
    fn get_mime_type(path: Text, language: Text) -> Text = "GetMimeType";

    /// Display color as `#rrggbb`, empty when the language has none
    fn get_color(language: Text) -> Text = "GetColor";

    /// One of `programming`, `markup`, `data`, `prose`, or `unknown`
    fn get_language_type(language: Text) -> Text = "GetLanguageType";

    fn is_vendor(path: Text) -> Bool = "IsVendor";

    fn is_generated(path: Text, content: Bytes) -> Bool = "IsGenerated";

    /// Looks for a NUL byte in the first 8000 bytes
    fn is_binary(content: Bytes) -> Bool = "IsBinary";

    fn is_configuration(path: Text) -> Bool = "IsConfiguration";

    fn is_documentation(path: Text) -> Bool = "IsDocumentation";

    fn is_dot_file(path: Text) -> Bool = "IsDotFile";

    fn is_image(path: Text) -> Bool = "IsImage";

    fn is_test(path: Text) -> Bool = "IsTest";
}
