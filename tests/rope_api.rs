//! Tests for the public rope API.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use strand::AllocError;
use strand::Allocator;
use strand::Hooks;
use strand::Rope;
use strand::RopeError;
use strand::SEGMENT_CAPACITY;
use strand::footprint;

// =============================================================================
// Helper functions
// =============================================================================

fn rope_of(text: &str) -> Rope {
    let rope = Rope::from_utf8(text.as_bytes()).unwrap();
    rope.check();
    rope
}

/// Text long enough to span many segments, with mixed-width characters.
fn mixed_text(chars: usize) -> String {
    const ALPHABET: [char; 6] = ['a', '\u{e9}', '\u{3b1}', '\u{4e2d}', '\u{1f600}', ' '];
    (0..chars).map(|i| ALPHABET[i % ALPHABET.len()]).collect()
}

// =============================================================================
// Construction and reading
// =============================================================================

#[test]
fn new_rope_is_empty() {
    let rope = Rope::new();
    assert_eq!(rope.char_count(), 0);
    assert_eq!(rope.byte_count(), 0);
    assert_eq!(rope.to_utf8(), vec![0]);
    assert_eq!(rope, "");
}

#[test]
fn insert_then_append() {
    let mut rope = Rope::new();
    rope.insert(0, b"hello").unwrap();
    rope.insert(5, b" world").unwrap();
    assert_eq!(rope.to_utf8(), b"hello world\0");
    assert_eq!(rope.char_count(), 11);
    assert_eq!(rope.byte_count(), 11);
    rope.check();

    rope.delete(0, 6);
    assert_eq!(rope.to_utf8(), b"world\0");
    assert_eq!(rope.char_count(), 5);
    rope.check();
}

#[test]
fn round_trip_preserves_bytes() {
    let text = mixed_text(1000);
    let rope = rope_of(&text);
    let out = rope.to_utf8();
    assert_eq!(out.len(), text.len() + 1);
    assert_eq!(&out[..text.len()], text.as_bytes());
    assert_eq!(out[text.len()], 0);
    assert_eq!(rope.char_count(), 1000);
}

#[test]
fn write_utf8_into_caller_buffer() {
    let rope = rope_of("caf\u{e9}");
    let mut buf = vec![0u8; rope.byte_count() + 1];
    assert_eq!(rope.write_utf8(&mut buf), Ok(6));
    assert_eq!(buf, "caf\u{e9}\0".as_bytes());

    let mut short = [0u8; 5];
    assert!(matches!(
        rope.write_utf8(&mut short),
        Err(RopeError::BufferTooSmall { needed: 6, available: 5 })
    ));
}

// =============================================================================
// Insert
// =============================================================================

#[test]
fn insert_in_the_middle() {
    let mut rope = rope_of("hello world");
    rope.insert(5, b",").unwrap();
    assert_eq!(rope, "hello, world");
}

#[test]
fn insert_past_end_is_rejected() {
    let mut rope = rope_of("abc");
    assert_eq!(
        rope.insert(10, b"x"),
        Err(RopeError::OutOfBounds { pos: 10, len: 3 })
    );
    assert_eq!(rope, "abc");
}

#[test]
fn invalid_utf8_is_rejected_without_change() {
    let mut rope = rope_of(&mixed_text(400));
    let before = rope.to_vec();
    let cases: [&[u8]; 5] = [
        b"\xc0\x80",         // overlong NUL
        b"\xed\xa0\x80",     // surrogate
        b"\xf4\x90\x80\x80", // past U+10FFFF
        b"\x80",             // stray continuation
        b"ok\xe2\x82",       // truncated
    ];
    for bytes in cases {
        assert!(matches!(
            rope.insert(3, bytes),
            Err(RopeError::InvalidEncoding { .. })
        ));
    }
    assert_eq!(rope.to_vec(), before);
    assert_eq!(rope.char_count(), 400);
    rope.check();
}

#[test]
fn positions_count_characters() {
    let mut rope = rope_of("\u{1f600}\u{1f600}\u{1f600}");
    rope.insert(2, b"-").unwrap();
    assert_eq!(rope, "\u{1f600}\u{1f600}-\u{1f600}");
    assert_eq!(rope.char_count(), 4);
    assert_eq!(rope.byte_count(), 13);
}

#[test]
fn many_small_inserts_at_the_front() {
    let mut rope = Rope::new();
    let mut expected = String::new();
    for i in 0..2000 {
        let c = char::from(b'a' + (i % 26) as u8);
        rope.insert_str(0, c.encode_utf8(&mut [0; 4])).unwrap();
        expected.insert(0, c);
    }
    rope.check();
    assert_eq!(rope, expected);
}

#[test]
fn segments_stay_within_capacity() {
    let mut rope = rope_of(&mixed_text(3000));
    rope.insert_str(1234, &mixed_text(777)).unwrap();
    rope.check();
    for segment in rope.segments() {
        assert!(segment.byte_len() <= SEGMENT_CAPACITY);
        assert_eq!(segment.as_str().chars().count(), segment.char_len());
    }
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn delete_multibyte_char() {
    let mut rope = rope_of("h\u{e9}llo");
    rope.delete(1, 1);
    assert_eq!(rope.to_utf8(), b"hllo\0");
    assert_eq!(rope.char_count(), 4);
    assert_eq!(rope.byte_count(), 4);
}

#[test]
fn delete_clamps_to_end() {
    let mut rope = rope_of("hello world");
    rope.delete(6, 1000);
    assert_eq!(rope, "hello ");
    rope.delete(6, 1);
    rope.delete(100, 1);
    assert_eq!(rope, "hello ");
    rope.check();
}

#[test]
fn delete_everything_then_reuse() {
    let text = mixed_text(5000);
    let mut rope = rope_of(&text);
    rope.delete(0, 5000);
    assert!(rope.is_empty());
    assert_eq!(rope.to_utf8(), vec![0]);
    rope.check();

    rope.insert_str(0, &text).unwrap();
    assert_eq!(rope, text);
    rope.check();
}

#[test]
fn delete_range_matches_string() {
    let text = mixed_text(900);
    let mut rope = rope_of(&text);
    rope.delete_range(100..700);

    let expected: String = text.chars().take(100).chain(text.chars().skip(700)).collect();
    assert_eq!(rope, expected);
    rope.check();
}

// =============================================================================
// Copy, compare, traverse
// =============================================================================

#[test]
fn copy_does_not_share_state() {
    let mut original = rope_of(&mixed_text(600));
    let copy = original.clone();
    original.delete(0, 300);
    original.insert_str(0, "changed").unwrap();
    assert_eq!(copy, mixed_text(600));
    copy.check();
    original.check();
}

#[test]
fn segments_concatenate_to_content() {
    let text = mixed_text(2500);
    let rope = rope_of(&text);
    let joined: String = rope.segments().map(|s| s.as_str()).collect();
    assert_eq!(joined, text);
    assert_eq!(rope.chunks().collect::<String>(), text);
}

#[test]
fn conversions() {
    let rope: Rope = "parsed".parse().unwrap();
    assert_eq!(rope, "parsed");
    let rope = Rope::from(String::from("owned"));
    assert_eq!(format!("<{}>", rope), "<owned>");
    assert_eq!(String::from(&rope), "owned");
}

// =============================================================================
// Allocator hooks
// =============================================================================

static LIVE: AtomicUsize = AtomicUsize::new(0);
static REFUSE: AtomicBool = AtomicBool::new(false);

fn hook_alloc(bytes: usize) -> bool {
    if REFUSE.load(Ordering::SeqCst) {
        return false;
    }
    LIVE.fetch_add(bytes, Ordering::SeqCst);
    true
}

fn hook_realloc(old: usize, new: usize) -> bool {
    if REFUSE.load(Ordering::SeqCst) {
        return false;
    }
    LIVE.fetch_add(new, Ordering::SeqCst);
    LIVE.fetch_sub(old, Ordering::SeqCst);
    true
}

fn hook_free(bytes: usize) {
    LIVE.fetch_sub(bytes, Ordering::SeqCst);
}

#[test]
fn hooks_see_every_segment() {
    let hooks = Hooks::new(hook_alloc, hook_realloc, hook_free);
    {
        let mut rope = Rope::with_allocator(hooks).unwrap();
        assert_eq!(LIVE.load(Ordering::SeqCst), footprint(1));

        rope.insert_str(0, &mixed_text(3000)).unwrap();
        let grown = LIVE.load(Ordering::SeqCst);
        assert!(grown >= footprint(1) * (rope.segments().count()));

        REFUSE.store(true, Ordering::SeqCst);
        let before = rope.to_vec();
        let err = rope.insert_str(10, &mixed_text(500)).unwrap_err();
        assert!(matches!(err, RopeError::AllocFailed { .. }));
        assert_eq!(rope.to_vec(), before);
        assert_eq!(LIVE.load(Ordering::SeqCst), grown);
        REFUSE.store(false, Ordering::SeqCst);

        rope.delete(0, 2000);
        rope.check();
    }
    assert_eq!(LIVE.load(Ordering::SeqCst), 0);
}

/// Allocator that refuses once a fixed number of segments are live.
struct Quota {
    left: usize,
}

impl Allocator for Quota {
    fn alloc(&mut self, _bytes: usize) -> Result<(), AllocError> {
        if self.left == 0 {
            return Err(AllocError);
        }
        self.left -= 1;
        Ok(())
    }

    fn realloc(&mut self, _old: usize, _new: usize) -> Result<(), AllocError> {
        Ok(())
    }

    fn free(&mut self, _bytes: usize) {
        self.left += 1;
    }
}

#[test]
fn borrowed_allocator_is_returned_to() {
    let mut quota = Quota { left: 4 };
    {
        let mut rope = Rope::with_allocator(&mut quota).unwrap();
        rope.insert_str(0, &"q".repeat(SEGMENT_CAPACITY * 3)).unwrap();
        assert!(rope.insert_str(0, &"r".repeat(SEGMENT_CAPACITY * 2)).is_err());
        assert_eq!(rope.char_count(), SEGMENT_CAPACITY * 3);
        rope.check();
    }
    assert_eq!(quota.left, 4);
}
