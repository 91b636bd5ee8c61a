use rand::SeedableRng;
use rand::rngs::StdRng;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Mix `(seed, stream)` into an independent 64-bit seed (splitmix64 finalizer).
///
/// Every Monte Carlo iteration gets its own stream so results do not depend
/// on which worker thread runs which iteration.
#[must_use]
pub const fn derive_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seeded RNG for one iteration of a run.
#[must_use]
pub fn iteration_rng(seed: u64, iteration: u64) -> StdRng {
    StdRng::seed_from_u64(derive_seed(seed, iteration))
}

/// Draw a fresh run seed from OS entropy.
#[must_use]
pub fn fresh_seed() -> u64 {
    rand::random()
}
