//! Byte-level scan helpers using memchr
//!
//! These work on whatever slice of the buffer is currently loaded. They
//! report when a token runs off the end of the slice so the caller can
//! refill and retry instead of guessing.

use memchr::{memchr, memmem};

/// Outcome of scanning a name at the start of a slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameScan {
    /// First byte is not a name start character
    NoName,
    /// Name of this length, terminated inside the slice
    Complete(usize),
    /// Every byte in the slice is a name character; more input may extend it
    Incomplete,
}

/// Scan a name at the start of `input`.
///
/// `extra` lists additional bytes allowed after the first character.
pub fn scan_name(input: &[u8], extra: &[u8]) -> NameScan {
    let Some(&first) = input.first() else {
        return NameScan::Incomplete;
    };
    if !is_name_start_char(first) {
        return NameScan::NoName;
    }
    match input[1..]
        .iter()
        .position(|&b| !(is_name_char(b) || extra.contains(&b)))
    {
        Some(i) => NameScan::Complete(i + 1),
        None => NameScan::Incomplete,
    }
}

/// Find `delimiter` in `input`, returning its offset
#[inline]
pub fn find_delimiter(input: &[u8], delimiter: &[u8]) -> Option<usize> {
    match delimiter {
        [] => Some(0),
        [b] => memchr(*b, input),
        _ => memmem::find(input, delimiter),
    }
}

/// Count leading whitespace bytes
#[inline]
pub fn whitespace_len(input: &[u8]) -> usize {
    input.iter().take_while(|&&b| is_whitespace(b)).count()
}

/// Check if byte is XML whitespace
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Check if byte is valid name start character
/// Allows ASCII letters, underscore, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_') || b >= 0x80
}

/// Check if byte is valid name character
/// Allows ASCII alphanumeric, underscore, and non-ASCII (UTF-8 Unicode).
/// `-`, `.` and `:` are opted into per call site.
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_') || b >= 0x80
}

/// Split a qualified name into prefix and local name at the first colon
pub fn split_prefix(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}
