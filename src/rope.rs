//! The rope container.
//!
//! A [`Rope`] keeps its totals and its head segment inline. Every other
//! segment lives in an arena. Position lookup is in [`cursor`], edits are in
//! [`edit`], and traversal is in [`iter`]. The consistency checker and the
//! structural `Debug` dump are in [`check`].

mod check;
mod cursor;
mod edit;
mod iter;

pub use iter::Chunks;
pub use iter::Segment;
pub use iter::Segments;

use std::fmt;
use std::str::FromStr;

use crate::alloc::Allocator;
use crate::alloc::Global;
use crate::error::RopeError;
use crate::height::Heights;
use crate::height::MAX_HEIGHT;
use crate::segment::Arena;
use crate::segment::Node;
use crate::segment::NodeRef;
use crate::segment::footprint;
use crate::utf8;

/// A UTF-8 string with fast inserts and deletes at character positions.
///
/// Text is stored in fixed-size segments threaded through a skip list. Each
/// skip entry records how many characters it jumps over, so finding a
/// character position takes O(log n) expected steps.
///
/// ```
/// use strand::Rope;
///
/// let mut rope = Rope::new();
/// rope.insert(0, b"hello").unwrap();
/// rope.insert(5, " world".as_bytes()).unwrap();
/// rope.delete(0, 6);
/// assert_eq!(rope, "world");
/// assert_eq!(rope.char_count(), 5);
/// ```
pub struct Rope<A: Allocator = Global> {
    /// Characters in the whole rope.
    num_chars: u32,
    /// Bytes in the whole rope.
    num_bytes: u32,
    /// First segment. Always present, possibly empty, and strictly taller
    /// than every other segment.
    head: Node,
    /// Every segment after the head.
    arena: Arena,
    heights: Heights,
    alloc: A,
}

impl Rope {
    /// Create an empty rope backed by the process allocator.
    pub fn new() -> Rope {
        Rope::empty(Global)
    }

    /// Create a rope holding `bytes`, which must be valid UTF-8.
    pub fn from_utf8(bytes: &[u8]) -> Result<Rope, RopeError> {
        let text = utf8::validate(bytes)?;
        let mut rope = Rope::new();
        rope.insert_str(0, text)?;
        Ok(rope)
    }
}

impl<A: Allocator> Rope<A> {
    fn empty(alloc: A) -> Self {
        Rope {
            num_chars: 0,
            num_bytes: 0,
            head: Node::new(1),
            arena: Arena::default(),
            heights: Heights::new(),
            alloc,
        }
    }

    /// Create an empty rope that asks `alloc` before bringing any segment
    /// into use. The head segment is charged up front.
    pub fn with_allocator(mut alloc: A) -> Result<Self, RopeError> {
        let bytes = footprint(1);
        if alloc.alloc(bytes).is_err() {
            return Err(edit::refused(bytes));
        }
        Ok(Rope::empty(alloc))
    }

    /// Restart the height generator from `seed`.
    ///
    /// Heights only affect lookup speed, so reseeding is always safe. Tests
    /// use it to make segment layouts reproducible.
    pub fn reseed(&mut self, seed: u64) {
        self.heights = Heights::from_seed(seed);
    }

    /// Number of characters (codepoints) in the rope.
    #[inline]
    pub fn char_count(&self) -> usize {
        self.num_chars as usize
    }

    /// Number of bytes the rope occupies as UTF-8.
    #[inline]
    pub fn byte_count(&self) -> usize {
        self.num_bytes as usize
    }

    /// Same as [`byte_count`](Rope::byte_count).
    #[inline]
    pub fn len(&self) -> usize {
        self.byte_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_bytes == 0
    }

    /// The allocator this rope reports segments to.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// The rope's bytes followed by a NUL terminator.
    ///
    /// The returned buffer is `byte_count() + 1` bytes long.
    pub fn to_utf8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_count() + 1);
        for chunk in self.chunks() {
            out.extend_from_slice(chunk.as_bytes());
        }
        out.push(0);
        out
    }

    /// The rope's bytes, without a terminator.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_count());
        for chunk in self.chunks() {
            out.extend_from_slice(chunk.as_bytes());
        }
        out
    }

    /// Copy the rope and a NUL terminator into `dest`.
    ///
    /// Returns the number of bytes written, `byte_count() + 1`.
    pub fn write_utf8(&self, dest: &mut [u8]) -> Result<usize, RopeError> {
        let needed = self.byte_count() + 1;
        if dest.len() < needed {
            return Err(RopeError::BufferTooSmall {
                needed,
                available: dest.len(),
            });
        }
        let mut at = 0;
        for chunk in self.chunks() {
            dest[at..at + chunk.len()].copy_from_slice(chunk.as_bytes());
            at += chunk.len();
        }
        dest[at] = 0;
        Ok(needed)
    }

    /// Deep copy, charging every segment of the copy to a clone of the
    /// allocator. If a charge is refused the partial copy is released and
    /// the error returned.
    pub fn try_clone(&self) -> Result<Self, RopeError>
    where
        A: Clone,
    {
        let mut alloc = self.alloc.clone();
        let head_bytes = footprint(self.head.height() as u8);
        if alloc.alloc(head_bytes).is_err() {
            return Err(edit::refused(head_bytes));
        }

        let mut head = self.head.clone();
        for entry in head.nexts.iter_mut() {
            entry.next = None;
        }
        let mut copy = Rope {
            num_chars: self.num_chars,
            num_bytes: self.num_bytes,
            head,
            arena: Arena::default(),
            heights: self.heights.clone(),
            alloc,
        };

        // Last segment copied at each level; the next one copied there
        // links from it.
        let mut tails = [NodeRef::Head; MAX_HEIGHT + 1];
        let mut next = self.head.nexts[0].next;
        while let Some(id) = next {
            let src = self.arena.get(id);
            let bytes = footprint(src.height() as u8);
            if copy.alloc.alloc(bytes).is_err() {
                return Err(edit::refused(bytes));
            }

            let mut node = src.clone();
            for entry in node.nexts.iter_mut() {
                entry.next = None;
            }
            let new_id = copy.arena.alloc(node);
            for (level, tail) in tails.iter_mut().enumerate().take(src.height()) {
                copy.node_mut(*tail).nexts[level].next = Some(new_id);
                *tail = NodeRef::Seg(new_id);
            }
            next = src.nexts[0].next;
        }

        Ok(copy)
    }

    #[inline]
    pub(crate) fn node(&self, at: NodeRef) -> &Node {
        match at {
            NodeRef::Head => &self.head,
            NodeRef::Seg(id) => self.arena.get(id),
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, at: NodeRef) -> &mut Node {
        match at {
            NodeRef::Head => &mut self.head,
            NodeRef::Seg(id) => self.arena.get_mut(id),
        }
    }
}

impl Default for Rope {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Allocator> Drop for Rope<A> {
    fn drop(&mut self) {
        let mut next = self.head.nexts[0].next;
        while let Some(id) = next {
            let node = self.arena.get(id);
            self.alloc.free(footprint(node.height() as u8));
            next = node.nexts[0].next;
        }
        self.alloc.free(footprint(self.head.height() as u8));
    }
}

impl<A: Allocator + Clone> Clone for Rope<A> {
    /// Deep copy. Panics if the allocator refuses, as std collections do on
    /// allocation failure. Use [`try_clone`](Rope::try_clone) to handle it.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(e) => panic!("rope clone failed: {}", e),
        }
    }
}

impl<A: Allocator, B: Allocator> PartialEq<Rope<B>> for Rope<A> {
    fn eq(&self, other: &Rope<B>) -> bool {
        self.num_bytes == other.num_bytes
            && self.num_chars == other.num_chars
            && self.bytes().eq(other.bytes())
    }
}

impl<A: Allocator> Eq for Rope<A> {}

impl<A: Allocator> PartialEq<str> for Rope<A> {
    fn eq(&self, other: &str) -> bool {
        if self.byte_count() != other.len() {
            return false;
        }
        let mut rest = other.as_bytes();
        for chunk in self.chunks() {
            let (front, back) = rest.split_at(chunk.len());
            if front != chunk.as_bytes() {
                return false;
            }
            rest = back;
        }
        true
    }
}

impl<A: Allocator> PartialEq<&str> for Rope<A> {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}

impl<A: Allocator> PartialEq<String> for Rope<A> {
    fn eq(&self, other: &String) -> bool {
        *self == *other.as_str()
    }
}

impl<A: Allocator> fmt::Display for Rope<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl FromStr for Rope {
    type Err = RopeError;

    fn from_str(s: &str) -> Result<Rope, RopeError> {
        let mut rope = Rope::new();
        rope.insert_str(0, s)?;
        Ok(rope)
    }
}

impl From<&str> for Rope {
    /// Panics if `s` is longer than `u32::MAX` bytes.
    fn from(s: &str) -> Rope {
        match s.parse() {
            Ok(rope) => rope,
            Err(e) => panic!("cannot build rope: {}", e),
        }
    }
}

impl From<String> for Rope {
    fn from(s: String) -> Rope {
        Rope::from(s.as_str())
    }
}

impl<A: Allocator> From<&Rope<A>> for String {
    fn from(rope: &Rope<A>) -> String {
        let mut out = String::with_capacity(rope.byte_count());
        for chunk in rope.chunks() {
            out.push_str(chunk);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::alloc::AllocError;

    /// Allocator that tracks live bytes and refuses past a shared limit.
    #[derive(Clone, Default)]
    struct Tally {
        live: Rc<Cell<usize>>,
        limit: Rc<Cell<Option<usize>>>,
    }

    impl Allocator for Tally {
        fn alloc(&mut self, bytes: usize) -> Result<(), AllocError> {
            let live = self.live.get() + bytes;
            if self.limit.get().is_some_and(|limit| live > limit) {
                return Err(AllocError);
            }
            self.live.set(live);
            Ok(())
        }

        fn realloc(&mut self, old: usize, new: usize) -> Result<(), AllocError> {
            let live = self.live.get() - old + new;
            if self.limit.get().is_some_and(|limit| live > limit) {
                return Err(AllocError);
            }
            self.live.set(live);
            Ok(())
        }

        fn free(&mut self, bytes: usize) {
            self.live.set(self.live.get() - bytes);
        }
    }

    #[test]
    fn empty_rope() {
        let rope = Rope::new();
        assert_eq!(rope.char_count(), 0);
        assert_eq!(rope.byte_count(), 0);
        assert!(rope.is_empty());
        assert_eq!(rope.to_utf8(), b"\0");
        assert_eq!(rope.to_vec(), b"");
        rope.check();
    }

    #[test]
    fn from_utf8_rejects_invalid() {
        assert_eq!(
            Rope::from_utf8(b"ok\xff").err(),
            Some(RopeError::InvalidEncoding { valid_up_to: 2 })
        );
    }

    #[test]
    fn from_utf8_builds_long_text() {
        let word = "za\u{17c}\u{f3}\u{142}\u{107} g\u{119}\u{15b}l\u{105} ja\u{17a}\u{144} ";
        let text = word.repeat(40);
        let rope = Rope::from_utf8(text.as_bytes()).unwrap();
        rope.check();
        assert_eq!(rope, text);
        assert_eq!(rope.char_count(), text.chars().count());
        assert_eq!(rope.byte_count(), text.len());
    }

    #[test]
    fn write_utf8_reports_length() {
        let rope = Rope::from("h\u{e9}llo");
        let mut buf = [0xffu8; 8];
        assert_eq!(rope.write_utf8(&mut buf), Ok(7));
        assert_eq!(&buf[..7], "h\u{e9}llo\0".as_bytes());
        assert_eq!(buf[7], 0xff);
    }

    #[test]
    fn write_utf8_needs_room_for_terminator() {
        let rope = Rope::from("abc");
        let mut buf = [0u8; 3];
        assert_eq!(
            rope.write_utf8(&mut buf),
            Err(RopeError::BufferTooSmall { needed: 4, available: 3 })
        );
    }

    #[test]
    fn clone_is_independent() {
        let text = "abcdefghij".repeat(50);
        let mut original = Rope::from(text.as_str());
        let mut copy = original.clone();
        copy.check();
        assert_eq!(copy, original);

        copy.insert(3, b"XYZ").unwrap();
        copy.delete(100, 200);
        assert_eq!(original, text);

        original.delete(0, 10);
        assert_eq!(copy.char_count(), 500 + 3 - 200);
        copy.check();
        original.check();
    }

    #[test]
    fn equality_ignores_segment_layout() {
        let mut a = Rope::new();
        for (i, c) in "hello world".chars().enumerate() {
            a.insert_str(i, &c.to_string()).unwrap();
        }
        let b = Rope::from("hello world");
        assert_eq!(a, b);
        assert_ne!(a, Rope::from("hello worle"));
        assert_eq!(a, "hello world");
        assert_eq!(a, String::from("hello world"));
    }

    #[test]
    fn display_and_string_conversion() {
        let rope: Rope = "\u{1f980} crab".parse().unwrap();
        assert_eq!(rope.to_string(), "\u{1f980} crab");
        assert_eq!(String::from(&rope), "\u{1f980} crab");
    }

    #[test]
    fn allocator_accounting_balances() {
        let tally = Tally::default();
        let live = tally.live.clone();
        {
            let mut rope = Rope::with_allocator(tally).unwrap();
            assert_eq!(live.get(), footprint(1));
            assert!(Rc::ptr_eq(&rope.allocator().live, &live));
            rope.insert_str(0, &"x".repeat(2000)).unwrap();
            assert!(live.get() > footprint(1) * 10);
            rope.delete(0, 1500);
            rope.check();
        }
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn refused_allocation_leaves_rope_unchanged() {
        let tally = Tally::default();
        let limit = tally.limit.clone();
        let live = tally.live.clone();
        let mut rope = Rope::with_allocator(tally).unwrap();
        rope.insert_str(0, "short").unwrap();

        limit.set(Some(live.get()));
        let before = live.get();
        let err = rope.insert_str(2, &"y".repeat(1000)).unwrap_err();
        assert!(matches!(err, RopeError::AllocFailed { .. }));
        assert_eq!(rope, "short");
        assert_eq!(live.get(), before);
        rope.check();

        // Edits that fit in existing segments still work.
        rope.insert_str(5, "!").unwrap();
        assert_eq!(rope, "short!");
        limit.set(None);
    }

    #[test]
    fn refused_head_charge() {
        let tally = Tally::default();
        tally.limit.set(Some(0));
        assert!(matches!(
            Rope::with_allocator(tally),
            Err(RopeError::AllocFailed { .. })
        ));
    }

    #[test]
    fn try_clone_releases_partial_copy() {
        let tally = Tally::default();
        let limit = tally.limit.clone();
        let live = tally.live.clone();
        let rope = {
            let mut rope = Rope::with_allocator(tally).unwrap();
            rope.insert_str(0, &"z".repeat(1000)).unwrap();
            rope
        };
        let before = live.get();
        limit.set(Some(before + before / 2));
        assert!(rope.try_clone().is_err());
        assert_eq!(live.get(), before);

        limit.set(None);
        let copy = rope.try_clone().unwrap();
        assert_eq!(live.get(), before * 2);
        assert_eq!(copy, rope);
    }
}
