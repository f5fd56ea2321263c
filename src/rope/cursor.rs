//! Position lookup.
//!
//! A [`Cursor`] records, for every level of the skip index, the last segment
//! at that level whose span contains the target position, together with how
//! many characters into that span the position lies. Level 0 of the path is
//! the segment the position lands in.
//!
//! The walk starts at the head's top level and moves right while the target
//! lies strictly past the current span. A position exactly on a segment
//! boundary resolves to the *end* of the earlier segment, so appends find
//! the tail of the rope without a special case.

use super::Rope;
use crate::alloc::Allocator;
use crate::height::MAX_HEIGHT;
use crate::segment::NodeRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PathEntry {
    pub node: NodeRef,
    /// Characters from the start of `node` to the cursor position.
    pub offset: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct Cursor {
    pub path: [PathEntry; MAX_HEIGHT + 1],
    /// Levels in use. Tracks the head height.
    pub height: usize,
}

impl Cursor {
    /// The segment the position lands in.
    #[inline]
    pub(crate) fn here(&self) -> NodeRef {
        self.path[0].node
    }

    /// Characters into [`here`](Cursor::here) the position lies.
    #[inline]
    pub(crate) fn offset(&self) -> u32 {
        self.path[0].offset
    }

    /// Move the position `chars` further into every span on the path.
    pub(crate) fn advance(&mut self, chars: u32) {
        for entry in &mut self.path[..self.height] {
            entry.offset += chars;
        }
    }
}

impl<A: Allocator> Rope<A> {
    /// Resolve character position `pos`, which must not exceed `num_chars`.
    pub(crate) fn cursor_at(&self, pos: u32) -> Cursor {
        assert!(pos <= self.num_chars, "position {} out of bounds", pos);

        let height = self.head.height();
        let start = PathEntry {
            node: NodeRef::Head,
            offset: 0,
        };
        let mut cursor = Cursor {
            path: [start; MAX_HEIGHT + 1],
            height,
        };

        let mut node = NodeRef::Head;
        let mut offset = pos;
        for level in (0..height).rev() {
            loop {
                let entry = self.node(node).nexts[level];
                if offset <= entry.skip_chars {
                    break;
                }
                offset -= entry.skip_chars;
                match entry.next {
                    Some(id) => node = NodeRef::Seg(id),
                    None => unreachable!("skip index ends before position {}", pos),
                }
            }
            cursor.path[level] = PathEntry { node, offset };
        }

        cursor
    }
}
