//! Deterministic random number generation.
//!
//! RULE: Nothing in the engine may call any platform RNG.
//! The single stochastic computation (the volatile growth pattern)
//! draws from a per-product stream derived from one master seed:
//!   - The same (seed, product) pair always yields the same stream.
//!   - Forecasts are reproducible no matter how a batch is ordered
//!     or split across requests.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use crate::types::ProductId;

/// A deterministic RNG stream for a single product's forecast.
pub struct ProductRng {
    inner: Pcg64Mcg,
}

impl ProductRng {
    /// Derive a product's stream from the master seed and its stable
    /// catalog id.
    pub fn new(master_seed: u64, product_id: ProductId) -> Self {
        let derived_seed =
            master_seed ^ (product_id as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform draw in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }
}

/// Factory for per-product streams. Held by the engine for the life
/// of a run; cheap to derive streams from on every call.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_product(&self, product_id: ProductId) -> ProductRng {
        ProductRng::new(self.master_seed, product_id)
    }
}
