//! Segment storage.
//!
//! A segment is a fixed-capacity buffer of UTF-8 bytes plus one skip entry
//! per index level it takes part in. Segments other than the head live in
//! an [`Arena`] and are addressed by [`SegmentId`]. Released slots are
//! recycled through a free list.
//!
//! # Skip Semantics
//!
//! `nexts[level].skip_chars` = characters from the start of this segment to
//! the start of `nexts[level].next`. With no successor it counts to the end
//! of the rope.
//! - At level 0 this equals the segment's own character count.
//! - At higher levels it is the sum of the level-0 counts spanned.
//!
//! `"hello world"` stored as HEAD `"he"`, A `"llo"`, B `" world"`:
//!
//! ```text
//! Level 2: HEAD |11| ---------------------> END
//! Level 1: HEAD |5|  ----------> B |6| ---> END
//! Level 0: HEAD |2|  -> A |3| -> B |6| ---> END
//! ```

use smallvec::SmallVec;

use crate::utf8;

/// Bytes of text a segment can hold. Must fit in a `u16`.
pub const SEGMENT_CAPACITY: usize = 136;

const _: () = assert!(SEGMENT_CAPACITY <= u16::MAX as usize);
const _: () = assert!(SEGMENT_CAPACITY >= 4);

/// Stable index of a segment in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct SegmentId(u32);

impl SegmentId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Either the head (stored inline in the rope) or an arena segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeRef {
    Head,
    Seg(SegmentId),
}

/// One level of a segment's skip index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SkipEntry {
    pub next: Option<SegmentId>,
    pub skip_chars: u32,
}

impl SkipEntry {
    pub(crate) const END: SkipEntry = SkipEntry {
        next: None,
        skip_chars: 0,
    };
}

/// Bytes charged to the allocator for a segment of the given height.
pub fn footprint(height: u8) -> usize {
    SEGMENT_CAPACITY
        + std::mem::size_of::<u16>()
        + height as usize * std::mem::size_of::<SkipEntry>()
}

/// A text segment.
#[derive(Clone)]
pub(crate) struct Node {
    bytes: [u8; SEGMENT_CAPACITY],
    len: u16,
    pub nexts: SmallVec<[SkipEntry; 4]>,
}

impl Node {
    pub(crate) fn new(height: u8) -> Self {
        debug_assert!(height >= 1);
        Node {
            bytes: [0; SEGMENT_CAPACITY],
            len: 0,
            nexts: SmallVec::from_elem(SkipEntry::END, height as usize),
        }
    }

    /// A segment of `height` levels holding `text`, which has `chars` codepoints.
    pub(crate) fn with_text(height: u8, text: &[u8], chars: u32) -> Self {
        let mut node = Node::new(height);
        node.insert_bytes(0, text);
        node.nexts[0].skip_chars = chars;
        node
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub(crate) fn height(&self) -> usize {
        self.nexts.len()
    }

    #[inline]
    pub(crate) fn num_chars(&self) -> u32 {
        self.nexts[0].skip_chars
    }

    #[inline]
    pub(crate) fn spare(&self) -> usize {
        SEGMENT_CAPACITY - self.len()
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    #[inline]
    pub(crate) fn as_str(&self) -> &str {
        debug_assert!(std::str::from_utf8(self.as_bytes()).is_ok());
        // SAFETY: every byte run written into a segment was validated as
        // UTF-8, and segments are only cut on codepoint boundaries.
        unsafe { std::str::from_utf8_unchecked(self.as_bytes()) }
    }

    /// Splice `data` in at byte `offset`, shifting the tail right.
    pub(crate) fn insert_bytes(&mut self, offset: usize, data: &[u8]) {
        let old_len = self.len();
        assert!(old_len + data.len() <= SEGMENT_CAPACITY);
        debug_assert!(utf8::is_char_boundary(self.as_bytes(), offset));

        self.bytes.copy_within(offset..old_len, offset + data.len());
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        self.len = (old_len + data.len()) as u16;
    }

    /// Remove `count` bytes at byte `offset`, shifting the tail left.
    pub(crate) fn remove_bytes(&mut self, offset: usize, count: usize) {
        let old_len = self.len();
        assert!(offset + count <= old_len);

        self.bytes.copy_within(offset + count..old_len, offset);
        self.len = (old_len - count) as u16;
    }

    /// Cut the segment at byte `offset`, keeping the front.
    pub(crate) fn truncate(&mut self, offset: usize) {
        assert!(offset <= self.len());
        debug_assert!(utf8::is_char_boundary(self.as_bytes(), offset));
        self.len = offset as u16;
    }

    /// Add a level on top, copied from the current top level.
    pub(crate) fn grow(&mut self) {
        let top = self.nexts[self.height() - 1];
        self.nexts.push(top);
    }
}

/// Arena of non-head segments.
#[derive(Clone, Default)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
    free_list: Vec<SegmentId>,
}

impl Arena {
    #[inline]
    pub(crate) fn get(&self, id: SegmentId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: SegmentId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn alloc(&mut self, node: Node) -> SegmentId {
        if let Some(id) = self.free_list.pop() {
            self.nodes[id.index()] = node;
            id
        } else {
            let id = SegmentId(self.nodes.len() as u32);
            self.nodes.push(node);
            id
        }
    }

    /// Release a slot. Returns the height the segment had.
    pub(crate) fn free(&mut self, id: SegmentId) -> u8 {
        let node = &mut self.nodes[id.index()];
        let height = node.height() as u8;
        node.len = 0;
        node.nexts = SmallVec::new();
        self.free_list.push(id);
        height
    }

    /// Segments currently in use.
    pub(crate) fn live(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    pub(crate) fn is_free(&self, id: SegmentId) -> bool {
        self.free_list.contains(&id)
    }
}
