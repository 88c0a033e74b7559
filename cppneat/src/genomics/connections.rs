use crate::genomics::{GeneticConfig, WeightDistribution};
use crate::Innovation;

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Connection alleles link two neurons of a
/// genome, and become weighted network edges
/// in the genome's phenotype.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConnectionAllele {
    id: Innovation,
    src: Innovation,
    dest: Innovation,
    weight: f64,
}

impl ConnectionAllele {
    /// Returns a new connection allele with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::ConnectionAllele;
    ///
    /// let connection = ConnectionAllele::new(42, 3, 9, 2.0);
    /// ```
    pub fn new(id: Innovation, src: Innovation, dest: Innovation, weight: f64) -> ConnectionAllele {
        ConnectionAllele {
            id,
            src,
            dest,
            weight,
        }
    }

    /// Returns a random weight drawn from the configured
    /// perturbation distribution around zero, clamped
    /// into the configured weight bounds.
    pub(crate) fn random_weight<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> f64 {
        perturbation(config, rng).clamp(config.weight_min, config.weight_max)
    }

    /// Nudges the connection's weight by a random amount.
    /// Uses either a gaussian with standard deviation
    /// [`weight_mutation_std_dev`], or a uniform distribution
    /// over the range ±[`weight_mutation_std_dev`], according
    /// to the configured [`weight_mutation_distribution`].
    /// The result is clamped into [`weight_min`, `weight_max`].
    ///
    /// [`weight_mutation_std_dev`]: crate::genomics::GeneticConfig::weight_mutation_std_dev
    /// [`weight_mutation_distribution`]: crate::genomics::GeneticConfig::weight_mutation_distribution
    /// [`weight_min`, `weight_max`]: crate::genomics::GeneticConfig::weight_min
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ConnectionAllele, GeneticConfig, WeightDistribution};
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
    /// let mut connection = ConnectionAllele::new(42, 3, 9, 3.0);
    ///
    /// connection.perturb_weight(
    ///     &GeneticConfig {
    ///         weight_mutation_std_dev: 2.5,
    ///         weight_mutation_distribution: WeightDistribution::Uniform,
    ///         weight_min: -5.0,
    ///         weight_max: 5.0,
    ///         ..GeneticConfig::zero()
    ///     },
    ///     &mut rng,
    /// );
    ///
    /// assert!((connection.weight() - 3.0).abs() <= 2.5);
    /// assert!(connection.weight().abs() <= 5.0);
    /// ```
    pub fn perturb_weight<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        self.weight =
            (self.weight + perturbation(config, rng)).clamp(config.weight_min, config.weight_max);
    }

    /// Returns the connection's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns the innovation number of the source neuron.
    pub fn src(&self) -> Innovation {
        self.src
    }

    /// Returns the innovation number of the destination neuron.
    pub fn dest(&self) -> Innovation {
        self.dest
    }

    /// Returns the connection's source and destination
    /// neurons' innovation numbers.
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.src, self.dest)
    }

    /// Returns the connection's weight.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::ConnectionAllele;
    ///
    /// let connection = ConnectionAllele::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(connection.weight(), 2.0);
    /// ```
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Sets the connection's weight.
    pub fn set_weight(&mut self, w: f64) {
        self.weight = w;
    }
}

fn perturbation<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> f64 {
    let power = config.weight_mutation_std_dev;
    if power <= 0.0 {
        return 0.0;
    }
    match config.weight_mutation_distribution {
        WeightDistribution::Gaussian => rng.sample::<f64, _>(StandardNormal) * power,
        WeightDistribution::Uniform => rng.gen_range(-power..=power),
    }
}

impl fmt::Display for ConnectionAllele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{:?}->{:?}, {:.3}]",
            self.id, self.src, self.dest, self.weight,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn perturbation_respects_bounds() {
        let config = GeneticConfig {
            weight_mutation_std_dev: 10.0,
            weight_mutation_distribution: WeightDistribution::Gaussian,
            weight_min: -1.0,
            weight_max: 1.0,
            ..GeneticConfig::zero()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut connection = ConnectionAllele::new(0, 1, 2, 0.0);
        for _ in 0..100 {
            connection.perturb_weight(&config, &mut rng);
            assert!(connection.weight() >= -1.0 && connection.weight() <= 1.0);
        }
    }

    #[test]
    fn zero_power_leaves_weight_untouched() {
        let config = GeneticConfig {
            weight_min: -5.0,
            weight_max: 5.0,
            ..GeneticConfig::zero()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut connection = ConnectionAllele::new(0, 1, 2, 1.25);
        connection.perturb_weight(&config, &mut rng);
        assert_eq!(connection.weight(), 1.25);
        assert_eq!(ConnectionAllele::random_weight(&config, &mut rng), 0.0);
    }
}
