//! In-order traversal.

use std::iter::FusedIterator;

use super::Rope;
use crate::alloc::Allocator;
use crate::segment::NodeRef;

/// A borrowed view of one segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment<'a> {
    text: &'a str,
    chars: u32,
}

impl<'a> Segment<'a> {
    #[inline]
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.text.len()
    }

    #[inline]
    pub fn char_len(&self) -> usize {
        self.chars as usize
    }
}

/// Every segment from the head to the end, including an empty head.
pub struct Segments<'a, A: Allocator> {
    rope: &'a Rope<A>,
    next: Option<NodeRef>,
}

impl<A: Allocator> Clone for Segments<'_, A> {
    fn clone(&self) -> Self {
        Segments {
            rope: self.rope,
            next: self.next,
        }
    }
}

impl<'a, A: Allocator> Iterator for Segments<'a, A> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        let at = self.next?;
        let node = self.rope.node(at);
        self.next = node.nexts[0].next.map(NodeRef::Seg);
        Some(Segment {
            text: node.as_str(),
            chars: node.num_chars(),
        })
    }
}

impl<A: Allocator> FusedIterator for Segments<'_, A> {}

/// The rope's text as non-empty `&str` pieces, in order.
pub struct Chunks<'a, A: Allocator> {
    segments: Segments<'a, A>,
}

impl<A: Allocator> Clone for Chunks<'_, A> {
    fn clone(&self) -> Self {
        Chunks {
            segments: self.segments.clone(),
        }
    }
}

impl<'a, A: Allocator> Iterator for Chunks<'a, A> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let segment = self.segments.next()?;
            if segment.byte_len() > 0 {
                return Some(segment.as_str());
            }
        }
    }
}

impl<A: Allocator> FusedIterator for Chunks<'_, A> {}

impl<A: Allocator> Rope<A> {
    /// Walk the segments in order, starting with the head.
    pub fn segments(&self) -> Segments<'_, A> {
        Segments {
            rope: self,
            next: Some(NodeRef::Head),
        }
    }

    pub fn chunks(&self) -> Chunks<'_, A> {
        Chunks {
            segments: self.segments(),
        }
    }

    pub fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.chunks().flat_map(str::bytes)
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.chunks().flat_map(str::chars)
    }
}
