//! Strand - a UTF-8 rope built on a skip list.
//!
//! Text lives in small fixed-capacity segments. Every segment carries one
//! skip entry per index level, and each entry records how many characters
//! it jumps over, so inserting or deleting at a character position costs
//! O(log n) expected time regardless of where in the text it happens.
//!
//! Positions and lengths are always counted in Unicode scalar values, never
//! in bytes. Input is validated once on the way in, and a failed edit leaves
//! the rope exactly as it was.
//!
//! # Quick Start
//!
//! ```
//! use strand::Rope;
//!
//! let mut rope = Rope::from("hi there");
//! rope.delete(2, 6);
//! rope.insert(2, " \u{1f44b}".as_bytes()).unwrap();
//!
//! assert_eq!(rope, "hi \u{1f44b}");
//! assert_eq!(rope.char_count(), 4);
//! assert_eq!(rope.byte_count(), 7);
//! assert!(rope.insert(1, b"\xff").is_err());
//! ```
//!
//! # Allocation
//!
//! A rope can report every segment it creates or releases to an
//! [`Allocator`], which may refuse. See [`alloc`].

pub mod alloc;
mod error;
pub mod height;
mod rope;
mod segment;
pub mod utf8;

pub use alloc::AllocError;
pub use alloc::Allocator;
pub use alloc::Global;
pub use alloc::Hooks;
pub use error::RopeError;
pub use height::BIAS;
pub use height::MAX_HEIGHT;
pub use rope::Chunks;
pub use rope::Rope;
pub use rope::Segment;
pub use rope::Segments;
pub use segment::SEGMENT_CAPACITY;
pub use segment::footprint;
