//! Seeded RNG management for reproducible snapshots.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Creates independent child RNGs from one master seed.
///
/// Each relation gets its own named stream so that, for example, adding a
/// review field does not shift the prices generated for order items.
///
/// # Example
/// ```
/// use marketfit_testdata::rng::SeededRngFactory;
/// use rand::Rng;
///
/// let factory = SeededRngFactory::new(42);
/// let mut a = factory.stream("items");
/// let mut b = factory.stream("items");
/// assert_eq!(a.gen::<u64>(), b.gen::<u64>());
/// ```
pub struct SeededRngFactory {
    master_seed: u64,
}

impl SeededRngFactory {
    pub fn new(seed: u64) -> Self {
        Self { master_seed: seed }
    }

    /// Child RNG for a named stream ("orders", "items", ...).
    ///
    /// The stream id is a fixed hash of `name`, so snapshots do not change
    /// between toolchains.
    pub fn stream(&self, name: &str) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.master_seed);
        rng.set_stream(stream_id(name));
        rng
    }

    pub fn seed(&self) -> u64 {
        self.master_seed
    }
}

/// 64-bit FNV-1a.
fn stream_id(name: &str) -> u64 {
    name.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

impl Default for SeededRngFactory {
    fn default() -> Self {
        Self::new(42)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut rng1 = SeededRngFactory::new(7).stream("orders");
        let mut rng2 = SeededRngFactory::new(7).stream("orders");

        let values1: Vec<u32> = (0..10).map(|_| rng1.gen()).collect();
        let values2: Vec<u32> = (0..10).map(|_| rng2.gen()).collect();

        assert_eq!(values1, values2);
    }

    #[test]
    fn test_streams_are_independent() {
        let factory = SeededRngFactory::new(7);
        let mut orders = factory.stream("orders");
        let mut reviews = factory.stream("reviews");

        let a: Vec<u32> = (0..10).map(|_| orders.gen()).collect();
        let b: Vec<u32> = (0..10).map(|_| reviews.gen()).collect();

        assert_ne!(a, b);
    }

    #[test]
    fn test_stream_ids_are_fixed() {
        assert_eq!(stream_id(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(stream_id("items"), 0x3e78_84bf_4f41_2c6f);
        assert_eq!(SeededRngFactory::new(7).stream("items").get_stream(), stream_id("items"));
    }
}
