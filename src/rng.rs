use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// The pseudorandom stream behind every stochastic decision in a grid.
///
/// Each grid owns exactly one; the engine never consults a thread-local or
/// global source, so a fixed seed pins an entire run on a given build.
pub type SimRng = ChaCha8Rng;

/// Build a stream from an optional fixed seed, falling back to OS entropy.
pub fn stream(seed: Option<u64>) -> SimRng {
    match seed {
        Some(seed) => SimRng::seed_from_u64(seed),
        None => SimRng::from_entropy(),
    }
}
