use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The single random stream shared by every part of one simulation.
///
/// Seeded runs are reproducible bit for bit; unseeded runs draw their seed
/// from the operating system.
pub struct SimRng {
    inner: StdRng,
    seed: Option<u64>,
}

impl SimRng {
    pub fn new(seed: Option<u64>) -> Self {
        let inner = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { inner, seed }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    /// Seed this stream was created from, if any
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Uniform float in [0, 1)
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform integer in [0, n). `n` must be positive.
    #[inline]
    pub fn index(&mut self, n: usize) -> usize {
        self.inner.gen_range(0..n)
    }
}
