//! UTF-8 validation and codepoint-boundary arithmetic.
//!
//! Segments store raw bytes, so every offset the rope computes inside a
//! segment goes through here. Validation happens once, at the edge, on the
//! bytes a caller hands in. After that the rope only ever cuts buffers at
//! positions this module reports as boundaries.

use simdutf8::compat::from_utf8;

use crate::error::RopeError;

/// True if `byte` begins a codepoint (is not a `10xxxxxx` continuation byte).
#[inline]
pub fn is_lead_byte(byte: u8) -> bool {
    return (byte as i8) >= -0x40;
}

/// Validate `bytes` as UTF-8.
///
/// Rejects overlong encodings, surrogates, codepoints past U+10FFFF, stray
/// continuation bytes and truncated sequences. The error carries the length
/// of the longest valid prefix.
pub fn validate(bytes: &[u8]) -> Result<&str, RopeError> {
    return match from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => Err(RopeError::InvalidEncoding {
            valid_up_to: e.valid_up_to(),
        }),
    };
}

/// A validated run of text with its codepoint count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scan<'a> {
    pub text: &'a str,
    pub chars: usize,
}

impl Scan<'_> {
    #[inline]
    pub fn bytes(&self) -> usize {
        return self.text.len();
    }
}

/// Validate `bytes` and count its codepoints in one go.
pub fn scan(bytes: &[u8]) -> Result<Scan<'_>, RopeError> {
    let text = validate(bytes)?;
    return Ok(Scan {
        text,
        chars: char_count(bytes),
    });
}

/// Number of codepoints in a buffer of valid UTF-8.
#[inline]
pub fn char_count(bytes: &[u8]) -> usize {
    return bytecount::num_chars(bytes);
}

/// True if `offset` falls on a codepoint boundary of `buf`.
///
/// Both ends of the buffer count as boundaries. Offsets past the end do not.
#[inline]
pub fn is_char_boundary(buf: &[u8], offset: usize) -> bool {
    if offset == buf.len() {
        return true;
    }
    return match buf.get(offset) {
        Some(&b) => is_lead_byte(b),
        None => false,
    };
}

/// Byte offset of the `chars`-th codepoint in `buf`.
///
/// Clamps to `buf.len()` when `buf` holds `chars` or fewer codepoints.
pub fn byte_offset(buf: &[u8], chars: usize) -> usize {
    if chars == 0 {
        return 0;
    }
    let mut seen = 0;
    for (i, &b) in buf.iter().enumerate() {
        if is_lead_byte(b) {
            if seen == chars {
                return i;
            }
            seen += 1;
        }
    }
    return buf.len();
}

/// The largest codepoint boundary of `buf` that is `<= max_bytes`.
pub fn floor_boundary(buf: &[u8], max_bytes: usize) -> usize {
    if max_bytes >= buf.len() {
        return buf.len();
    }
    let mut i = max_bytes;
    while i > 0 && !is_lead_byte(buf[i]) {
        i -= 1;
    }
    return i;
}
