//! The random number source shared by every stochastic
//! operator of an evolution run.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The generator threaded through evolution.
/// Its draw order is deterministic for a given seed.
pub type NeatRng = ChaCha8Rng;

/// Returns a generator seeded with `seed`.
///
/// # Examples
/// ```
/// use rand::Rng;
///
/// let mut a = cppneat::rng::seeded(7);
/// let mut b = cppneat::rng::seeded(7);
///
/// assert_eq!(a.gen::<u64>(), b.gen::<u64>());
/// ```
pub fn seeded(seed: u64) -> NeatRng {
    NeatRng::seed_from_u64(seed)
}

/// Returns `true` with probability `chance`.
/// Values outside [0, 1] saturate instead of panicking.
pub(crate) fn gen_bool<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    rng.gen::<f64>() < chance
}

/// Number of successes in `trials` independent
/// draws of probability `rate`.
pub(crate) fn num_mutations<R: Rng + ?Sized>(rng: &mut R, rate: f64, trials: usize) -> usize {
    (0..trials).filter(|_| gen_bool(rng, rate)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certain_and_impossible_events() {
        let mut rng = seeded(0);
        assert_eq!(num_mutations(&mut rng, 1.0, 17), 17);
        assert_eq!(num_mutations(&mut rng, 0.0, 17), 0);
        assert!(!gen_bool(&mut rng, -3.0));
        assert!(gen_bool(&mut rng, 3.0));
    }
}
