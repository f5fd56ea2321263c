//! AFL fuzz harness for the rope.
//!
//! Replays a byte-coded edit script against both a rope and a plain
//! `String`, checking structure and content after every step. Raw fuzzer
//! bytes are also fed to `insert` so malformed UTF-8 gets exercised.
//!
//! Build with: cargo afl build --features afl --bin fuzz_rope

use afl::fuzz;
use strand::Rope;

const PIECES: [&str; 6] = ["a", "bc", "\u{e9}", "\u{4e2d}\u{6587}", "\u{1f600}", "     "];

#[derive(Debug, Clone, Copy)]
enum FuzzOp<'a> {
    /// Insert a known-good piece, repeated
    Insert { pos_frac: u8, piece: u8, repeat: u8 },
    /// Insert whatever bytes follow, valid or not
    InsertRaw { pos_frac: u8, bytes: &'a [u8] },
    Delete { pos_frac: u8, len: u8 },
    /// Replace the rope with a copy of itself
    Duplicate,
}

impl<'a> FuzzOp<'a> {
    fn from_bytes(bytes: &'a [u8]) -> Option<(FuzzOp<'a>, &'a [u8])> {
        let (&tag, rest) = bytes.split_first()?;
        match tag % 4 {
            0 if rest.len() >= 3 => {
                let op = FuzzOp::Insert {
                    pos_frac: rest[0],
                    piece: rest[1],
                    repeat: rest[2],
                };
                Some((op, &rest[3..]))
            }
            1 if rest.len() >= 2 => {
                let n = (rest[1] % 16) as usize;
                let end = (2 + n).min(rest.len());
                let op = FuzzOp::InsertRaw {
                    pos_frac: rest[0],
                    bytes: &rest[2..end],
                };
                Some((op, &rest[end..]))
            }
            2 if rest.len() >= 2 => {
                let op = FuzzOp::Delete {
                    pos_frac: rest[0],
                    len: rest[1],
                };
                Some((op, &rest[2..]))
            }
            3 => Some((FuzzOp::Duplicate, rest)),
            _ => None,
        }
    }
}

fn scaled(pos_frac: u8, len: usize) -> usize {
    (pos_frac as usize * len / 255).min(len)
}

fn byte_index(model: &str, chars: usize) -> usize {
    model.char_indices().nth(chars).map_or(model.len(), |(i, _)| i)
}

fn main() {
    fuzz!(|data: &[u8]| {
        let mut rope = Rope::new();
        rope.reseed(1);
        let mut model = String::new();
        let mut remaining = data;

        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;
            let len = model.chars().count();

            match op {
                FuzzOp::Insert { pos_frac, piece, repeat } => {
                    let pos = scaled(pos_frac, len);
                    let text = PIECES[piece as usize % PIECES.len()].repeat(repeat as usize + 1);
                    rope.insert_str(pos, &text).unwrap();
                    model.insert_str(byte_index(&model, pos), &text);
                }
                FuzzOp::InsertRaw { pos_frac, bytes } => {
                    let pos = scaled(pos_frac, len);
                    match std::str::from_utf8(bytes) {
                        Ok(text) => {
                            rope.insert(pos, bytes).unwrap();
                            model.insert_str(byte_index(&model, pos), text);
                        }
                        Err(_) => {
                            assert!(rope.insert(pos, bytes).is_err(), "accepted invalid utf-8");
                        }
                    }
                }
                FuzzOp::Delete { pos_frac, len: count } => {
                    let pos = scaled(pos_frac, len);
                    rope.delete(pos, count as usize);
                    let start = byte_index(&model, pos);
                    let end = byte_index(&model, pos + count as usize);
                    model.replace_range(start..end, "");
                }
                FuzzOp::Duplicate => {
                    rope = rope.clone();
                }
            }

            rope.check();
            assert_eq!(rope, model, "content diverged from model");
            assert_eq!(rope.char_count(), model.chars().count());
        }
    });
}
