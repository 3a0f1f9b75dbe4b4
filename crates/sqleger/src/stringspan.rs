use std::ffi::{CStr, c_char};
use std::fmt;
use std::str::Utf8Error;

/// Non-owning view over a run of text bytes with an explicit length.
///
/// The bytes do not need to be nul terminated, which lets sql text and text
/// parameters be handed to sqlite straight from a `&str` without copying.
/// The contents are not required to be valid UTF-8.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct StringSpan<'a> {
    bytes: &'a [u8],
}

impl<'a> StringSpan<'a> {
    pub const fn new(text: &'a str) -> Self {
        Self { bytes: text.as_bytes() }
    }

    pub const fn from_bytes(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// # Safety
    /// `ptr` must point to `len` readable bytes that stay alive and unmodified for `'a`.
    /// A null `ptr` is accepted when `len` is zero.
    pub unsafe fn from_raw_parts(ptr: *const c_char, len: usize) -> Self {
        if ptr.is_null() || len == 0 {
            return Self::default();
        }

        Self {
            bytes: unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len) },
        }
    }

    /// Span over a nul terminated string, the length is derived from the terminator.
    /// A null `ptr` yields an empty span.
    ///
    /// # Safety
    /// `ptr` must be null or point to a nul terminated string that lives for `'a`.
    pub unsafe fn from_ptr(ptr: *const c_char) -> Self {
        if ptr.is_null() {
            return Self::default();
        }

        Self::from(unsafe { CStr::from_ptr(ptr) })
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.bytes.as_ptr().cast::<c_char>()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_str(&self) -> Result<&'a str, Utf8Error> {
        std::str::from_utf8(self.bytes)
    }

    /// Splits the span in two at byte offset `mid`, `mid` is clamped to the length.
    pub fn split_at(&self, mid: usize) -> (StringSpan<'a>, StringSpan<'a>) {
        let (head, tail) = self.bytes.split_at(mid.min(self.bytes.len()));
        (StringSpan::from_bytes(head), StringSpan::from_bytes(tail))
    }
}

impl<'a> From<&'a str> for StringSpan<'a> {
    fn from(text: &'a str) -> Self {
        StringSpan::new(text)
    }
}

impl<'a> From<&'a String> for StringSpan<'a> {
    fn from(text: &'a String) -> Self {
        StringSpan::new(text.as_str())
    }
}

impl<'a> From<&'a [u8]> for StringSpan<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        StringSpan::from_bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for StringSpan<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        StringSpan::from_bytes(bytes)
    }
}

impl<'a> From<&'a CStr> for StringSpan<'a> {
    fn from(text: &'a CStr) -> Self {
        StringSpan::from_bytes(text.to_bytes())
    }
}

impl PartialEq<str> for StringSpan<'_> {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<&str> for StringSpan<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl fmt::Debug for StringSpan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.bytes))
    }
}

impl fmt::Display for StringSpan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.bytes))
    }
}
