//! Seeded pseudo-random number generator.
//!
//! A string seed is folded into 32 bits with an xmur3-style hash and then
//! drives a mulberry32 step. Not cryptographic; only determinism and a
//! reasonably flat distribution matter here.

/// Deterministic generator of `f64` values in `[0, 1)`.
///
/// Every instance is independent: two generators built from the same seed
/// yield the same infinite sequence, and advancing one never affects another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prng {
    state: u32,
}

impl Prng {
    /// Create a generator from an arbitrary string seed.
    pub fn from_seed(seed: &str) -> Self {
        Self {
            state: hash_seed(seed),
        }
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Next value in `[-1, 1)`.
    pub fn next_signed(&mut self) -> f64 {
        self.next_f64() * 2.0 - 1.0
    }

    /// Next raw 32-bit output (mulberry32).
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

/// Shorthand for [`Prng::from_seed`].
pub fn create_prng(seed: &str) -> Prng {
    Prng::from_seed(seed)
}

fn hash_seed(seed: &str) -> u32 {
    let mut h: u32 = 1_779_033_703 ^ seed.len() as u32;
    for byte in seed.bytes() {
        h = (h ^ u32::from(byte)).wrapping_mul(3_432_918_353);
        h = h.rotate_left(13);
    }
    // final avalanche
    h = (h ^ (h >> 16)).wrapping_mul(2_246_822_507);
    h = (h ^ (h >> 13)).wrapping_mul(3_266_489_909);
    h ^ (h >> 16)
}
