//! Seeded random sampling shared by the spawner, the vehicle factory and the
//! behaviour models.
//!
//! Every stochastic draw in the simulation flows through an explicit [`SimRng`]
//! owned by the driver, so a fixed seed and a fixed configuration reproduce the
//! full tick-by-tick trajectory.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, Poisson};

/// Random source threaded through the whole simulation.
pub type SimRng = StdRng;

/// Creates the run-level random source from an explicit seed.
///
/// # Example
/// ```rust
/// use multilane_traffic_sim_core::utils::rand::{rng_from_seed, normal};
///
/// let mut a = rng_from_seed(42);
/// let mut b = rng_from_seed(42);
/// assert_eq!(normal(&mut a, 10.0, 1.0), normal(&mut b, 10.0, 1.0));
/// ```
pub fn rng_from_seed(seed: u64) -> SimRng {
    StdRng::seed_from_u64(seed)
}

/// Draws a sample from `N(mu, sigma)`.
///
/// A degenerate deviation (negative or non-finite) collapses the draw to the
/// mean; deviations are validated upstream when they come from a
/// configuration document.
pub fn normal(rng: &mut SimRng, mu: f64, sigma: f64) -> f64 {
    match Normal::new(mu, sigma) {
        Ok(dist) => dist.sample(rng),
        Err(_) => mu,
    }
}

/// Draws a sample from `Poisson(lambda)`. A rate of zero (or below) yields 0.
pub fn poisson(rng: &mut SimRng, lambda: f64) -> u64 {
    if lambda <= 0.0 {
        return 0;
    }
    match Poisson::new(lambda) {
        Ok(dist) => dist.sample(rng) as u64,
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_reproducibility() {
        let mut first = rng_from_seed(7);
        let mut second = rng_from_seed(7);
        for _ in 0..10 {
            assert_eq!(
                normal(&mut first, 27.78, 2.78),
                normal(&mut second, 27.78, 2.78),
                "Same seed must produce the same sequence"
            );
        }
    }

    #[test]
    fn test_normal_zero_deviation_is_mean() {
        let mut rng = rng_from_seed(1);
        assert_eq!(normal(&mut rng, 13.9, 0.0), 13.9);
    }

    #[test]
    fn test_normal_degenerate_deviation_collapses_to_mean() {
        let mut rng = rng_from_seed(1);
        assert_eq!(normal(&mut rng, 5.0, -1.0), 5.0);
        assert_eq!(normal(&mut rng, 5.0, f64::NAN), 5.0);
    }

    #[test]
    fn test_poisson_zero_rate() {
        let mut rng = rng_from_seed(1);
        assert_eq!(poisson(&mut rng, 0.0), 0);
        assert_eq!(poisson(&mut rng, -3.0), 0);
    }

    #[test]
    fn test_poisson_mean_is_close_to_lambda() {
        let mut rng = rng_from_seed(99);
        let lambda = 4.0;
        let draws = 10_000;
        let total: u64 = (0..draws).map(|_| poisson(&mut rng, lambda)).sum();
        let mean = total as f64 / draws as f64;
        assert!(
            (mean - lambda).abs() < 0.1,
            "Poisson sample mean {} too far from lambda {}",
            mean,
            lambda
        );
    }
}
