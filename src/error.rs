//! Errors surfaced by rope operations.
//!
//! Every error is detected before the rope is touched, so a failed call
//! leaves the rope exactly as it was.

use std::fmt;

/// Error returned by fallible rope operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RopeError {
    /// The bytes handed to the rope are not well-formed UTF-8.
    InvalidEncoding {
        /// Length of the longest valid prefix.
        valid_up_to: usize,
    },

    /// An insertion position lies past the end of the rope.
    OutOfBounds {
        /// The requested character position.
        pos: usize,
        /// The rope's character count at the time of the call.
        len: usize,
    },

    /// The rope would grow past `u32::MAX` bytes.
    CapacityOverflow,

    /// The allocator refused to back a new segment.
    AllocFailed {
        /// Size of the refused request, in bytes.
        bytes: usize,
    },

    /// The destination buffer cannot hold the text plus its terminator.
    BufferTooSmall {
        /// Bytes required, including the terminator.
        needed: usize,
        /// Bytes available in the destination.
        available: usize,
    },
}

impl fmt::Display for RopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RopeError::InvalidEncoding { valid_up_to } => {
                write!(f, "invalid utf-8 sequence after {} valid bytes", valid_up_to)
            }
            RopeError::OutOfBounds { pos, len } => {
                write!(f, "position {} out of bounds (len {})", pos, len)
            }
            RopeError::CapacityOverflow => write!(f, "rope size exceeds u32::MAX bytes"),
            RopeError::AllocFailed { bytes } => {
                write!(f, "allocator refused a {} byte segment", bytes)
            }
            RopeError::BufferTooSmall { needed, available } => {
                write!(f, "buffer too small: need {} bytes, have {}", needed, available)
            }
        }
    }
}

impl std::error::Error for RopeError {}
