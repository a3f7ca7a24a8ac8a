// vitrack_sim/src/simulation/prng.rs

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// The single deterministic pseudo-random number generator of a run.
///
/// Every sensor draws from this one stream, in the order sensors are listed
/// in the scenario, so a seed reproduces a run exactly.
#[derive(Debug, Clone)]
pub struct SimulationRng(pub ChaCha8Rng);

impl SimulationRng {
    pub fn seeded(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}
