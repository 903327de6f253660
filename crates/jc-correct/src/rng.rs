//! Per-event random streams.
//!
//! There is no shared generator. Every event gets its own [`StdRng`] derived from
//! the run seed and an event stream id, so draws do not depend on which worker
//! processes the event or on the thread count.

use rand::SeedableRng;
use rand::rngs::StdRng;

/// SplitMix64 finalizer.
#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Counter-based stream RNG. Same `(seed, stream)` gives the same draw sequence.
///
/// The stream id is hashed before it is combined with the seed, so stream
/// families of different seeds do not overlap.
#[inline]
pub fn stream_rng(seed: u64, stream: u64) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_mul(2654435761).wrapping_add(splitmix64(stream)))
}

/// Stream id for the `index`-th event of `run`.
#[inline]
pub fn event_stream(run: u32, index: u64) -> u64 {
    ((run as u64) << 32) ^ index
}
