use serde::{Deserialize, Serialize};

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: usize,
    /// Fraction of the population surviving selection.
    /// Also the fraction of offspring produced by cloning;
    /// crossover produces `1 - 2 * survival_rate`.
    /// Must be below 0.5.
    pub survival_rate: f64,
    /// Whether the fittest chromosome of each large
    /// enough specie always survives selection.
    pub elitism: bool,
    /// Minimum specie size for its champion
    /// to be considered an elite.
    pub elitism_min_specie_size: usize,
    /// Whether survivors are drawn by fitness-weighted
    /// roulette instead of truncation.
    pub roulette: bool,
    /// Genetic distance below which a chromosome
    /// joins a specie.
    pub speciation_threshold: f64,
    /// Whether structural innovation lookups are kept
    /// across generations. When `false` they are
    /// forgotten after each generation, but innovation
    /// numbers keep increasing.
    pub innovation_persist: bool,
    /// Seed of the evolution's random number generator.
    pub random_seed: u64,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0 or false.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use cppneat::PopulationConfig;
    ///
    /// let cfg = PopulationConfig {
    ///     // Specify some values here...
    ///     size: 30,
    ///     survival_rate: 0.25,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: 0,
            survival_rate: 0.0,
            elitism: false,
            elitism_min_specie_size: 0,
            roulette: false,
            speciation_threshold: 0.0,
            innovation_persist: false,
            random_seed: 0,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> PopulationConfig {
        PopulationConfig {
            size: 100,
            survival_rate: 0.2,
            elitism: true,
            elitism_min_specie_size: 6,
            roulette: false,
            speciation_threshold: 0.2,
            innovation_persist: true,
            random_seed: 0,
        }
    }
}
