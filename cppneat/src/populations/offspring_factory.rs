use crate::genomics::ChromosomeMaterial;
use crate::populations::{Chromosome, PopulationConfig, Specie};

use rand::Rng;
use tracing::debug;

/// Auxiliary type for offspring generation.
/// Produces the clone and crossover slices of the
/// next generation from the surviving species,
/// allotting offspring to each specie in proportion
/// to its average fitness.
pub(super) struct OffspringFactory<'a> {
    species: &'a [Specie],
    population_config: &'a PopulationConfig,
}

impl<'a> OffspringFactory<'a> {
    pub(super) fn new(
        species: &'a [Specie],
        population_config: &'a PopulationConfig,
    ) -> OffspringFactory<'a> {
        OffspringFactory {
            species,
            population_config,
        }
    }

    /// Generates the cloned and mated offspring, in that order.
    pub(super) fn generate_offspring<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ChromosomeMaterial> {
        let size = self.population_config.size as f64;
        let rate = self.population_config.survival_rate;
        let clone_count = (size * rate).round() as usize;
        let crossover_count = (size * (1.0 - 2.0 * rate)).max(0.0).round() as usize;

        let clone_allotment = self.allot(clone_count);
        let crossover_allotment = self.allot(crossover_count);
        debug!(
            clones = clone_count,
            crossovers = crossover_count,
            "allotted offspring"
        );

        let mut offspring = Vec::with_capacity(clone_count + crossover_count);
        for (specie, &count) in self.species.iter().zip(&clone_allotment) {
            Self::add_clones(specie, count, &mut offspring);
        }
        for (specie, &count) in self.species.iter().zip(&crossover_allotment) {
            Self::add_mated_offspring(specie, count, &mut offspring, rng);
        }
        offspring
    }

    /// Splits `total` offspring among species proportionally
    /// to their average fitness, or equally if no specie
    /// has any fitness.
    fn allot(&self, total: usize) -> Vec<usize> {
        let fitnesses: Vec<f64> = self.species.iter().map(|s| s.average_fitness()).collect();
        let sum: f64 = fitnesses.iter().sum();
        let shares: Vec<f64> = if sum > 0.0 {
            fitnesses.iter().map(|f| f / sum * total as f64).collect()
        } else {
            vec![total as f64 / self.species.len().max(1) as f64; self.species.len()]
        };
        round_retain_sum(&shares, total)
    }

    /// Clones members round-robin, fittest first.
    fn add_clones(specie: &Specie, count: usize, offspring: &mut Vec<ChromosomeMaterial>) {
        let parents = by_fitness_descending(specie);
        if parents.is_empty() {
            return;
        }
        offspring.extend(
            parents
                .iter()
                .cycle()
                .take(count)
                .map(|parent| parent.material().clone_material(parent.id())),
        );
    }

    /// Mates random pairs of members, the fitter one dominant.
    fn add_mated_offspring<R: Rng + ?Sized>(
        specie: &Specie,
        count: usize,
        offspring: &mut Vec<ChromosomeMaterial>,
        rng: &mut R,
    ) {
        let parents: Vec<&Chromosome> = specie.members().collect();
        if parents.is_empty() {
            return;
        }
        for _ in 0..count {
            let first = parents[rng.gen_range(0..parents.len())];
            let second = parents[rng.gen_range(0..parents.len())];
            let (dominant, recessive) = if second.fitness_value() > first.fitness_value() {
                (second, first)
            } else {
                (first, second)
            };
            let mut child = dominant.material().mate_with(recessive.material(), rng);
            child.set_parents(Some(dominant.id()), Some(recessive.id()));
            offspring.push(child);
        }
    }
}

fn by_fitness_descending(specie: &Specie) -> Vec<&Chromosome> {
    let mut members: Vec<&Chromosome> = specie.members().collect();
    members.sort_by(|a, b| b.fitness_value().total_cmp(&a.fitness_value()));
    members
}

/// Rounds `values` to integers summing to `total`,
/// giving the remainder to the largest fractional parts.
/// `values` must sum to `total`, up to float error.
fn round_retain_sum(values: &[f64], total: usize) -> Vec<usize> {
    if values.is_empty() {
        return vec![];
    }
    let mut truncated: Vec<(usize, usize, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let u = f.max(0.0).floor();
            (i, u as usize, f - u)
        })
        .collect();
    let truncated_sum: usize = truncated.iter().map(|(_, u, _)| *u).sum();
    let remainder = total.saturating_sub(truncated_sum).min(truncated.len());
    // Sort in decreasing order of error
    truncated.sort_by(|a, b| b.2.total_cmp(&a.2));
    for (_, u, _) in &mut truncated[..remainder] {
        *u += 1;
    }
    truncated.sort_by_key(|(i, ..)| *i);
    truncated.iter().map(|(_, u, _)| *u).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{GeneticConfig, InnovationTracker};
    use crate::rng::seeded;

    #[test]
    fn round_retain_sum() {
        let v = [
            5.2,
            9.5,
            2.8,
            1.3,
            2.2,
            2.7,
            6.3,
            1.0000000000001,
            0.9999999999999,
        ];
        let w = super::round_retain_sum(&v, 32);
        assert_eq!(w, [5, 10, 3, 1, 2, 3, 6, 1, 1]);
        assert_eq!(super::round_retain_sum(&[2.5, 2.5], 5).iter().sum::<usize>(), 5);
    }

    fn species() -> Vec<Specie> {
        let config = GeneticConfig {
            input_count: 2,
            output_count: 1,
            initial_fully_connected: true,
            ..GeneticConfig::zero()
        };
        let mut rng = seeded(0);
        let material = ChromosomeMaterial::initial(&config, &mut InnovationTracker::new(), &mut rng);
        let chromosome = |id, fitness| {
            let mut c = Chromosome::new(id, material.clone());
            c.set_fitness(fitness);
            c
        };
        let mut strong = Specie::new(chromosome(1, 9.0));
        strong.add(chromosome(2, 3.0));
        let weak = Specie::new(chromosome(3, 0.0));
        vec![strong, weak]
    }

    #[test]
    fn offspring_counts_follow_survival_rate() {
        let species = species();
        let config = PopulationConfig {
            size: 20,
            survival_rate: 0.2,
            ..PopulationConfig::zero()
        };
        let offspring = OffspringFactory::new(&species, &config).generate_offspring(&mut seeded(1));
        // 4 clones and 12 crossovers, all from the fit specie.
        assert_eq!(offspring.len(), 4 + 12);
        let clones: Vec<_> = offspring[..4].iter().map(|o| o.primary_parent()).collect();
        assert_eq!(clones, [Some(1), Some(2), Some(1), Some(2)]);
        assert!(offspring[..4].iter().all(|o| o.secondary_parent().is_none()));
        for child in &offspring[4..] {
            assert!(child.secondary_parent().is_some());
            assert_ne!(child.primary_parent(), Some(3));
        }
    }

    #[test]
    fn fitter_parent_dominates() {
        let species = species();
        let config = PopulationConfig {
            size: 10,
            survival_rate: 0.0,
            ..PopulationConfig::zero()
        };
        let offspring = OffspringFactory::new(&species, &config).generate_offspring(&mut seeded(2));
        for child in &offspring {
            if child.primary_parent() != child.secondary_parent() {
                assert_eq!(child.primary_parent(), Some(1));
            }
        }
    }

    #[test]
    fn zero_fitness_allots_equally() {
        let mut species = species();
        for specie in &mut species {
            for member in &mut specie.members {
                member.set_fitness(0.0);
            }
        }
        let config = PopulationConfig {
            size: 4,
            survival_rate: 0.0,
            ..PopulationConfig::zero()
        };
        assert_eq!(OffspringFactory::new(&species, &config).allot(4), [2, 2]);
    }
}
