//! In-process stand-ins for the enry exports, for command tests
//!
//! Each fake has the C ABI of the export it replaces. The modeline and
//! candidate-narrowing entry points are left out, so `fake_enry` behaves like
//! an older library build.

use enry_bridge::ffi::{GuessRecord, NativeBuffer, NativeString};
use enry_bridge::{Enry, SymbolTable};
use std::ffi::{c_char, c_void};
use std::path::Path;

fn text<'a>(view: &NativeString<'a>) -> &'a str {
    std::str::from_utf8(unsafe { view.as_bytes() }).unwrap()
}

fn path<'a>(view: &NativeString<'a>) -> &'a Path {
    Path::new(text(view))
}

fn leak_str(value: &str) -> NativeString<'static> {
    NativeString::new(Box::leak(value.to_string().into_boxed_str()))
}

fn write_sequence(out: *mut NativeBuffer<'static>, items: &[&str]) {
    let pointers: Vec<*const c_char> = items
        .iter()
        .map(|item| {
            let mut owned = item.as_bytes().to_vec();
            owned.push(0);
            Box::leak(owned.into_boxed_slice()).as_ptr().cast()
        })
        .collect();
    let pointers = Box::leak(pointers.into_boxed_slice());
    unsafe {
        *out = NativeBuffer::from_raw_parts(
            pointers.as_mut_ptr() as *mut c_void,
            pointers.len() as i64,
            pointers.len() as i64,
        );
    }
}

fn guess(language: &str, safe: bool) -> GuessRecord {
    GuessRecord {
        language: leak_str(language),
        safe: safe as u8,
    }
}

fn has_extension(view: &NativeString<'_>, wanted: &str) -> bool {
    path(view).extension().is_some_and(|ext| ext == wanted)
}

extern "C" fn get_language(
    filename: NativeString<'_>,
    _content: NativeBuffer<'_>,
) -> NativeString<'static> {
    if has_extension(&filename, "rs") {
        leak_str("Rust")
    } else {
        NativeString::empty()
    }
}

extern "C" fn get_languages(
    filename: NativeString<'_>,
    _content: NativeBuffer<'_>,
    out: *mut NativeBuffer<'static>,
) {
    if has_extension(&filename, "h") {
        write_sequence(out, &["C", "C++", "Objective-C"]);
    }
}

extern "C" fn get_language_by_extension(filename: NativeString<'_>) -> GuessRecord {
    match path(&filename).extension().and_then(|ext| ext.to_str()) {
        Some("rs") => guess("Rust", true),
        Some("h") => guess("C", false),
        _ => guess("", false),
    }
}

extern "C" fn get_language_by_shebang(content: NativeBuffer<'_>) -> GuessRecord {
    if unsafe { content.as_slice::<u8>() }.starts_with(b"#!/usr/bin/env python") {
        guess("Python", true)
    } else {
        guess("", false)
    }
}

extern "C" fn get_language_extensions(
    language: NativeString<'_>,
    out: *mut NativeBuffer<'static>,
) {
    if text(&language) == "Go" {
        write_sequence(out, &[".go"]);
    }
}

extern "C" fn get_mime_type(
    path: NativeString<'_>,
    language: NativeString<'_>,
) -> NativeString<'static> {
    if text(&language) == "Go" && has_extension(&path, "go") {
        leak_str("text/x-go")
    } else {
        leak_str("text/plain")
    }
}

extern "C" fn get_color(language: NativeString<'_>) -> NativeString<'static> {
    match text(&language) {
        "Go" => leak_str("#00ADD8"),
        _ => NativeString::empty(),
    }
}

extern "C" fn get_language_type(language: NativeString<'_>) -> NativeString<'static> {
    match text(&language) {
        "Go" => leak_str("programming"),
        _ => leak_str("unknown"),
    }
}

extern "C" fn is_vendor(file: NativeString<'_>) -> u8 {
    path(&file).components().any(|c| c.as_os_str() == "vendor") as u8
}

extern "C" fn is_generated(file: NativeString<'_>, _content: NativeBuffer<'_>) -> u8 {
    text(&file).ends_with(".min.js") as u8
}

extern "C" fn is_binary(content: NativeBuffer<'_>) -> u8 {
    unsafe { content.as_slice::<u8>() }.contains(&0) as u8
}

extern "C" fn is_configuration(file: NativeString<'_>) -> u8 {
    has_extension(&file, "toml") as u8
}

extern "C" fn is_documentation(file: NativeString<'_>) -> u8 {
    path(&file).components().any(|c| c.as_os_str() == "docs") as u8
}

extern "C" fn is_dot_file(file: NativeString<'_>) -> u8 {
    path(&file)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.')) as u8
}

extern "C" fn is_image(file: NativeString<'_>) -> u8 {
    has_extension(&file, "png") as u8
}

extern "C" fn is_test(file: NativeString<'_>) -> u8 {
    text(&file).ends_with("_test.go") as u8
}

/// Entry points every `fake_enry` exports
pub fn symbol_table() -> SymbolTable {
    SymbolTable::new()
        .with("GetLanguage", get_language as *const ())
        .with("GetLanguages", get_languages as *const ())
        .with("GetLanguageByExtension", get_language_by_extension as *const ())
        .with("GetLanguageByShebang", get_language_by_shebang as *const ())
        .with("GetLanguageExtensions", get_language_extensions as *const ())
        .with("GetMimeType", get_mime_type as *const ())
        .with("GetColor", get_color as *const ())
        .with("GetLanguageType", get_language_type as *const ())
        .with("IsVendor", is_vendor as *const ())
        .with("IsGenerated", is_generated as *const ())
        .with("IsBinary", is_binary as *const ())
        .with("IsConfiguration", is_configuration as *const ())
        .with("IsDocumentation", is_documentation as *const ())
        .with("IsDotFile", is_dot_file as *const ())
        .with("IsImage", is_image as *const ())
        .with("IsTest", is_test as *const ())
}

/// A bridge bound to the fakes above instead of a shared library
pub fn fake_enry() -> Enry {
    unsafe { Enry::from_symbols(&symbol_table(), false) }.unwrap()
}
