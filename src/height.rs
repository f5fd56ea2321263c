//! Random segment heights.
//!
//! A new segment gets height `h` with `P(h = k + 1 | h >= k) = BIAS%`, capped
//! at `MAX_HEIGHT`. With a 25% bias each level holds about a quarter of the
//! segments of the level below, which keeps expected search depth
//! logarithmic. Heights only need to be "random enough". There is no
//! reproducibility contract unless a caller seeds explicitly.

use rand_core::OsRng;
use rand_core::RngCore;

/// Probability (percent) that a segment is one level taller than `k`,
/// given it is at least `k` levels tall.
pub const BIAS: u64 = 25;

/// Tallest height a segment can be given. The head may reach one more.
pub const MAX_HEIGHT: usize = 20;

/// Seed used when the OS source is unavailable or a zero seed is given.
/// Xorshift never leaves the all-zero state.
const FALLBACK_SEED: u64 = 0x12345678_9abcdef0;

/// Xorshift64 height generator.
#[derive(Clone, Debug)]
pub struct Heights {
    state: u64,
}

impl Heights {
    /// A generator seeded from the operating system.
    pub fn new() -> Self {
        let mut seed = [0u8; 8];
        match OsRng.try_fill_bytes(&mut seed) {
            Ok(()) => Self::from_seed(u64::from_le_bytes(seed)),
            Err(e) => {
                log::debug!("os rng unavailable ({}), using fixed height seed", e);
                Self::from_seed(FALLBACK_SEED)
            }
        }
    }

    /// A generator with a reproducible sequence.
    pub fn from_seed(seed: u64) -> Self {
        let state = if seed == 0 { FALLBACK_SEED } else { seed };
        Heights { state }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Draw a height in `1..=MAX_HEIGHT`.
    pub fn next_height(&mut self) -> u8 {
        let mut height = 1;
        while height < MAX_HEIGHT && (self.next_u64() >> 32) % 100 < BIAS {
            height += 1;
        }
        height as u8
    }
}

impl Default for Heights {
    fn default() -> Self {
        Self::new()
    }
}
