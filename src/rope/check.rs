//! Consistency checking and structural dumps.

use std::fmt;

use super::Rope;
use crate::alloc::Allocator;
use crate::height::MAX_HEIGHT;
use crate::segment::NodeRef;
use crate::segment::SEGMENT_CAPACITY;
use crate::utf8;

impl<A: Allocator> Rope<A> {
    /// Verify every structural invariant of the rope. Panics on the first
    /// violation.
    ///
    /// Walks the whole rope, so this is for tests and fuzzing.
    pub fn check(&self) {
        let head_height = self.head.height();
        assert!(
            head_height >= 1 && head_height <= MAX_HEIGHT + 1,
            "INVARIANT VIOLATED: head height {} outside 1..={}",
            head_height,
            MAX_HEIGHT + 1
        );
        let top = self.head.nexts[head_height - 1];
        assert!(
            top.next.is_none(),
            "INVARIANT VIOLATED: head top level links to {:?}",
            top.next
        );
        assert_eq!(
            top.skip_chars, self.num_chars,
            "INVARIANT VIOLATED: head top skip={} != num_chars={}",
            top.skip_chars, self.num_chars
        );

        // Per level: the segment we expect to meet next, and the character
        // position it should start at.
        let mut expected = [(Some(NodeRef::Head), 0u32); MAX_HEIGHT + 1];
        let mut num_chars = 0u32;
        let mut num_bytes = 0u32;
        let mut segments = 0usize;

        let mut at = Some(NodeRef::Head);
        while let Some(here) = at {
            let node = self.node(here);
            let bytes = node.as_bytes();

            if let NodeRef::Seg(id) = here {
                segments += 1;
                assert!(
                    !self.arena.is_free(id),
                    "INVARIANT VIOLATED: segment {} is linked but free",
                    id.index()
                );
                assert!(
                    !bytes.is_empty(),
                    "INVARIANT VIOLATED: segment {} is empty",
                    id.index()
                );
                assert!(
                    node.height() < head_height,
                    "INVARIANT VIOLATED: segment {} height {} >= head height {}",
                    id.index(),
                    node.height(),
                    head_height
                );
            }

            assert!(
                node.len() <= SEGMENT_CAPACITY,
                "INVARIANT VIOLATED: segment at char {} holds {} bytes, capacity {}",
                num_chars,
                node.len(),
                SEGMENT_CAPACITY
            );
            assert!(
                utf8::validate(bytes).is_ok(),
                "INVARIANT VIOLATED: segment at char {} holds invalid utf-8",
                num_chars
            );
            let counted = utf8::char_count(bytes) as u32;
            assert_eq!(
                counted,
                node.num_chars(),
                "INVARIANT VIOLATED: segment at char {} has {} chars, level 0 skip={}",
                num_chars,
                counted,
                node.num_chars()
            );

            for (level, entry) in node.nexts.iter().enumerate() {
                let (node_expected, pos) = expected[level];
                assert_eq!(
                    node_expected,
                    Some(here),
                    "INVARIANT VIOLATED: level {} reaches {:?}, level 0 reaches {:?}",
                    level,
                    node_expected,
                    here
                );
                assert_eq!(
                    pos, num_chars,
                    "INVARIANT VIOLATED: level {} puts segment at char {}, real start {}",
                    level, pos, num_chars
                );
                expected[level] = (entry.next.map(NodeRef::Seg), pos + entry.skip_chars);
            }

            num_chars += counted;
            num_bytes += bytes.len() as u32;
            at = node.nexts[0].next.map(NodeRef::Seg);
        }

        for (level, &(node, pos)) in expected[..head_height].iter().enumerate() {
            assert_eq!(
                node, None,
                "INVARIANT VIOLATED: level {} links past the last segment",
                level
            );
            assert_eq!(
                pos, num_chars,
                "INVARIANT VIOLATED: level {} spans {} chars, rope has {}",
                level, pos, num_chars
            );
        }

        assert_eq!(
            num_chars, self.num_chars,
            "INVARIANT VIOLATED: sum of segment chars={} != num_chars={}",
            num_chars, self.num_chars
        );
        assert_eq!(
            num_bytes, self.num_bytes,
            "INVARIANT VIOLATED: sum of segment bytes={} != num_bytes={}",
            num_bytes, self.num_bytes
        );
        assert_eq!(
            segments,
            self.arena.live(),
            "INVARIANT VIOLATED: {} segments linked, {} live in arena",
            segments,
            self.arena.live()
        );
    }
}

impl<A: Allocator> fmt::Debug for Rope<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Rope {{ chars: {}, bytes: {}, height: {} }}",
            self.num_chars,
            self.num_bytes,
            self.head.height()
        )?;

        let mut at = Some(NodeRef::Head);
        while let Some(here) = at {
            let node = self.node(here);
            match here {
                NodeRef::Head => write!(f, "  head")?,
                NodeRef::Seg(id) => write!(f, "  #{:<3}", id.index())?,
            }
            write!(f, " h{} skips [", node.height())?;
            for (level, entry) in node.nexts.iter().enumerate() {
                if level > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", entry.skip_chars)?;
            }
            writeln!(f, "] {:?}", node.as_str())?;
            at = node.nexts[0].next.map(NodeRef::Seg);
        }
        Ok(())
    }
}
