//! Insertion and deletion.
//!
//! Both edits start from a [`Cursor`] and patch the skip counts of every
//! entry on its path. An insert plans its work first. It reserves every
//! segment it will create with the allocator, and only then touches the
//! rope, so validation, bounds and allocation failures all leave the rope
//! untouched.
//!
//! # Insert paths
//!
//! 1. The text fits in the target segment: splice it in.
//! 2. The position is at the end of a full segment and the next one has
//!    room: splice it at the start of the next segment.
//! 3. Otherwise split. Hold the target's tail aside, top up the target with
//!    as much of the text as fits, thread the rest through new segments of
//!    at most `SEGMENT_CAPACITY` bytes, then re-thread the tail.

use std::ops::Range;

use smallvec::SmallVec;

use super::Rope;
use super::cursor::Cursor;
use super::cursor::PathEntry;
use crate::alloc::Allocator;
use crate::alloc::Reservation;
use crate::error::RopeError;
use crate::segment::Node;
use crate::segment::NodeRef;
use crate::segment::SEGMENT_CAPACITY;
use crate::segment::SegmentId;
use crate::segment::SkipEntry;
use crate::segment::footprint;
use crate::utf8;

/// What an insert will do, decided before anything is changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Plan {
    InPlace { offset_bytes: usize },
    IntoNext { next: SegmentId },
    Split { offset_bytes: usize, first: usize, has_tail: bool },
}

pub(crate) fn refused(bytes: usize) -> RopeError {
    log::debug!("allocator refused {} bytes", bytes);
    RopeError::AllocFailed { bytes }
}

/// Cut `text` into pieces of at most `SEGMENT_CAPACITY` bytes, each ending
/// on a codepoint boundary.
fn pieces(mut text: &str) -> impl Iterator<Item = &str> {
    std::iter::from_fn(move || {
        if text.is_empty() {
            return None;
        }
        let cut = utf8::floor_boundary(text.as_bytes(), SEGMENT_CAPACITY);
        let (piece, rest) = text.split_at(cut);
        text = rest;
        Some(piece)
    })
}

fn next_reserved(heights: &mut impl Iterator<Item = u8>) -> u8 {
    match heights.next() {
        Some(height) => height,
        None => unreachable!("insert created more segments than it reserved"),
    }
}

impl<A: Allocator> Rope<A> {
    /// Insert UTF-8 `bytes` so that they start at character `pos`.
    ///
    /// Fails without changing the rope if `bytes` is not valid UTF-8, if
    /// `pos > char_count()`, or if the allocator refuses a segment.
    /// Inserting at `char_count()` appends.
    pub fn insert(&mut self, pos: usize, bytes: &[u8]) -> Result<(), RopeError> {
        let scan = match utf8::scan(bytes) {
            Ok(scan) => scan,
            Err(e) => {
                log::debug!("rejected insert at {}: {}", pos, e);
                return Err(e);
            }
        };
        self.insert_scanned(pos, scan.text, scan.chars as u32)
    }

    /// Insert `text` so that it starts at character `pos`.
    pub fn insert_str(&mut self, pos: usize, text: &str) -> Result<(), RopeError> {
        self.insert_scanned(pos, text, utf8::char_count(text.as_bytes()) as u32)
    }

    fn insert_scanned(&mut self, pos: usize, text: &str, num_chars: u32) -> Result<(), RopeError> {
        if pos > self.char_count() {
            log::debug!("rejected insert at {} past end {}", pos, self.char_count());
            return Err(RopeError::OutOfBounds {
                pos,
                len: self.char_count(),
            });
        }
        if text.is_empty() {
            return Ok(());
        }
        if self.byte_count() + text.len() > u32::MAX as usize {
            log::debug!("rejected insert of {} bytes: rope too large", text.len());
            return Err(RopeError::CapacityOverflow);
        }

        let mut cursor = self.cursor_at(pos as u32);
        let plan = self.plan(&cursor, text);
        let new_segments = match plan {
            Plan::InPlace { .. } | Plan::IntoNext { .. } => 0,
            Plan::Split { first, has_tail, .. } => {
                pieces(&text[first..]).count() + has_tail as usize
            }
        };
        let heights = self.reserve(new_segments)?;

        match plan {
            Plan::InPlace { offset_bytes } => {
                let here = cursor.here();
                self.node_mut(here).insert_bytes(offset_bytes, text.as_bytes());
                self.grow_path(&cursor, num_chars);
            }
            Plan::IntoNext { next } => {
                let height = self.arena.get(next).height();
                for entry in &mut cursor.path[..height] {
                    *entry = PathEntry {
                        node: NodeRef::Seg(next),
                        offset: 0,
                    };
                }
                self.arena.get_mut(next).insert_bytes(0, text.as_bytes());
                self.grow_path(&cursor, num_chars);
            }
            Plan::Split {
                offset_bytes,
                first,
                has_tail,
            } => {
                self.split_insert(&mut cursor, text, offset_bytes, first, has_tail, &heights);
            }
        }

        self.num_chars += num_chars;
        self.num_bytes += text.len() as u32;
        Ok(())
    }

    fn plan(&self, cursor: &Cursor, text: &str) -> Plan {
        let node = self.node(cursor.here());
        let offset_bytes = utf8::byte_offset(node.as_bytes(), cursor.offset() as usize);

        if text.len() <= node.spare() {
            return Plan::InPlace { offset_bytes };
        }
        if offset_bytes == node.len() {
            if let Some(next) = node.nexts[0].next {
                if text.len() <= self.arena.get(next).spare() {
                    return Plan::IntoNext { next };
                }
            }
        }

        let first = utf8::floor_boundary(text.as_bytes(), SEGMENT_CAPACITY - offset_bytes);
        Plan::Split {
            offset_bytes,
            first,
            has_tail: offset_bytes < node.len(),
        }
    }

    /// Draw heights for `count` new segments and charge them, along with
    /// any head growth they imply. All or nothing.
    fn reserve(&mut self, count: usize) -> Result<SmallVec<[u8; 4]>, RopeError> {
        if count == 0 {
            return Ok(SmallVec::new());
        }

        let mut reservation = Reservation::new(&mut self.alloc);
        let mut tallest = 0u8;
        for _ in 0..count {
            let height = self.heights.next_height();
            if reservation.reserve(height).is_err() {
                return Err(refused(footprint(height)));
            }
            tallest = tallest.max(height);
        }

        // The head stays strictly taller than every other segment.
        let head_height = self.head.height() as u8;
        if tallest >= head_height {
            if reservation.grow_head(head_height, tallest + 1).is_err() {
                return Err(refused(footprint(tallest + 1)));
            }
        }

        Ok(reservation.commit())
    }

    fn split_insert(
        &mut self,
        cursor: &mut Cursor,
        text: &str,
        offset_bytes: usize,
        first: usize,
        has_tail: bool,
        heights: &[u8],
    ) {
        let here = cursor.here();

        let mut tail = [0u8; SEGMENT_CAPACITY];
        let mut tail_len = 0;
        let mut tail_chars = 0;
        if has_tail {
            let node = self.node_mut(here);
            let bytes = &node.as_bytes()[offset_bytes..];
            tail_len = bytes.len();
            tail[..tail_len].copy_from_slice(bytes);
            tail_chars = node.num_chars() - cursor.offset();
            node.truncate(offset_bytes);
            self.shrink_path(cursor, tail_chars);
            log::trace!("split segment at byte {}, holding {} bytes", offset_bytes, tail_len);
        }

        let (front, rest) = text.split_at(first);
        if !front.is_empty() {
            let chars = utf8::char_count(front.as_bytes()) as u32;
            let node = self.node_mut(here);
            let end = node.len();
            node.insert_bytes(end, front.as_bytes());
            self.grow_path(cursor, chars);
            cursor.advance(chars);
        }

        let mut heights = heights.iter().copied();
        for piece in pieces(rest) {
            let chars = utf8::char_count(piece.as_bytes()) as u32;
            let height = next_reserved(&mut heights);
            self.insert_node_at(cursor, piece.as_bytes(), chars, height);
        }
        if has_tail {
            let height = next_reserved(&mut heights);
            self.insert_node_at(cursor, &tail[..tail_len], tail_chars, height);
        }
        debug_assert!(heights.next().is_none(), "reserved more segments than used");
    }

    /// Thread a new segment holding `bytes` in at the cursor, then move the
    /// cursor to its end.
    fn insert_node_at(&mut self, cursor: &mut Cursor, bytes: &[u8], chars: u32, height: u8) {
        let height = height as usize;
        while self.head.height() <= height {
            self.head.grow();
            cursor.path[cursor.height] = cursor.path[cursor.height - 1];
            cursor.height += 1;
            log::trace!("head grew to {} levels", self.head.height());
        }

        let mut node = Node::with_text(height as u8, bytes, chars);
        for level in 0..height {
            let at = cursor.path[level];
            let prev = self.node(at.node).nexts[level];
            node.nexts[level] = SkipEntry {
                next: prev.next,
                skip_chars: chars + prev.skip_chars - at.offset,
            };
        }
        let id = self.arena.alloc(node);

        for level in 0..height {
            let at = cursor.path[level];
            self.node_mut(at.node).nexts[level] = SkipEntry {
                next: Some(id),
                skip_chars: at.offset,
            };
            cursor.path[level] = PathEntry {
                node: NodeRef::Seg(id),
                offset: chars,
            };
        }
        for level in height..cursor.height {
            let at = &mut cursor.path[level];
            self.node_mut(at.node).nexts[level].skip_chars += chars;
            at.offset += chars;
        }

        log::trace!("created segment {:?}: height {}, {} bytes", id, height, bytes.len());
    }

    fn grow_path(&mut self, cursor: &Cursor, chars: u32) {
        for (level, at) in cursor.path[..cursor.height].iter().enumerate() {
            self.node_mut(at.node).nexts[level].skip_chars += chars;
        }
    }

    fn shrink_path(&mut self, cursor: &Cursor, chars: u32) {
        for (level, at) in cursor.path[..cursor.height].iter().enumerate() {
            self.node_mut(at.node).nexts[level].skip_chars -= chars;
        }
    }

    /// Remove up to `count` characters starting at `pos`.
    ///
    /// Never fails. The range is clamped to the end of the rope, and a `pos`
    /// at or past the end removes nothing.
    pub fn delete(&mut self, pos: usize, count: usize) {
        let len = self.char_count();
        if pos >= len || count == 0 {
            return;
        }
        let count = count.min(len - pos) as u32;

        let cursor = self.cursor_at(pos as u32);
        let mut here = cursor.here();
        let mut offset = cursor.offset();
        let mut remaining = count;

        while remaining > 0 {
            if offset == self.node(here).num_chars() {
                match self.node(here).nexts[0].next {
                    Some(next) => here = NodeRef::Seg(next),
                    None => unreachable!("rope ended with {} chars left to delete", remaining),
                }
                offset = 0;
            }

            let node = self.node(here);
            let node_chars = node.num_chars();
            let height = node.height();
            let removed = remaining.min(node_chars - offset);
            debug_assert!(removed > 0);

            match here {
                NodeRef::Seg(id) if removed == node_chars => {
                    self.unlink(&cursor, id, removed);
                    // Continue from the end of the predecessor, whose
                    // successor is now the unlinked segment's successor.
                    here = cursor.path[0].node;
                    offset = self.node(here).num_chars();
                }
                _ => {
                    let bytes = node.as_bytes();
                    let start = utf8::byte_offset(bytes, offset as usize);
                    let len = utf8::byte_offset(&bytes[start..], removed as usize);
                    let node = self.node_mut(here);
                    node.remove_bytes(start, len);
                    for entry in node.nexts.iter_mut() {
                        entry.skip_chars -= removed;
                    }
                    self.num_bytes -= len as u32;
                }
            }

            for level in height..cursor.height {
                let at = cursor.path[level];
                self.node_mut(at.node).nexts[level].skip_chars -= removed;
            }
            remaining -= removed;
        }

        self.num_chars -= count;
    }

    /// Remove the characters in `range`, clamped to the rope.
    pub fn delete_range(&mut self, range: Range<usize>) {
        if range.start < range.end {
            self.delete(range.start, range.end - range.start);
        }
    }

    /// Unlink segment `id` from every level it is on and release it. Its
    /// predecessors absorb its spans, less the `removed` characters.
    fn unlink(&mut self, cursor: &Cursor, id: SegmentId, removed: u32) {
        let node = self.arena.get(id);
        let nexts = node.nexts.clone();
        let len = node.len();

        for (level, entry) in nexts.iter().enumerate() {
            let pred = &mut self.node_mut(cursor.path[level].node).nexts[level];
            debug_assert_eq!(pred.next, Some(id));
            pred.next = entry.next;
            pred.skip_chars += entry.skip_chars - removed;
        }

        self.num_bytes -= len as u32;
        let height = self.arena.free(id);
        self.alloc.free(footprint(height));
        log::trace!("released segment {:?}: height {}", id, height);
    }
}
