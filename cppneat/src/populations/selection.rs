use crate::populations::{Chromosome, PopulationConfig, Specie};
use crate::ChromosomeId;

use rand::Rng;

/// How non-elite survivors are picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    /// The fittest chromosomes survive.
    Truncation,
    /// Survivors are drawn with probability proportional
    /// to their fitness, without replacement.
    Roulette,
}

/// Chooses which chromosomes survive a generation.
///
/// Fitness is compared after fitness sharing: each
/// chromosome's fitness divided by its specie's size.
#[derive(Debug, Clone)]
pub struct NaturalSelector {
    survival_rate: f64,
    elitism: bool,
    elitism_min_specie_size: usize,
    kind: SelectorKind,
}

impl NaturalSelector {
    pub fn new(config: &PopulationConfig) -> NaturalSelector {
        NaturalSelector {
            survival_rate: config.survival_rate,
            elitism: config.elitism,
            elitism_min_specie_size: config.elitism_min_specie_size,
            kind: if config.roulette {
                SelectorKind::Roulette
            } else {
                SelectorKind::Truncation
            },
        }
    }

    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    /// Returns the ids of the surviving chromosomes:
    /// `round(population × survival_rate)` of them.
    ///
    /// With elitism, the fittest member of every specie of at
    /// least [`elitism_min_specie_size`] members survives first.
    /// If elites alone exceed the quota, the least fit elites
    /// are dropped.
    ///
    /// [`elitism_min_specie_size`]: PopulationConfig::elitism_min_specie_size
    pub fn select<R: Rng + ?Sized>(&self, species: &[Specie], rng: &mut R) -> Vec<ChromosomeId> {
        let mut elite: Vec<(&Chromosome, f64)> = Vec::new();
        let mut candidates: Vec<(&Chromosome, f64)> = Vec::new();
        let mut total = 0usize;

        for specie in species {
            let size = specie.len().max(1) as f64;
            let champion = specie.fittest().map(|c| c.id());
            for chromosome in specie.members() {
                total += 1;
                let shared = chromosome.fitness_value() / size;
                if self.elitism
                    && specie.len() >= self.elitism_min_specie_size
                    && champion == Some(chromosome.id())
                {
                    elite.push((chromosome, shared));
                } else {
                    candidates.push((chromosome, shared));
                }
            }
        }

        let quota = (total as f64 * self.survival_rate + 0.5) as usize;
        if elite.len() > quota {
            sort_ascending(&mut elite);
            elite.drain(..elite.len() - quota);
            return elite.into_iter().map(|(c, _)| c.id()).collect();
        }

        let more = quota - elite.len();
        let mut survivors: Vec<ChromosomeId> = elite.into_iter().map(|(c, _)| c.id()).collect();
        match self.kind {
            SelectorKind::Truncation => {
                sort_ascending(&mut candidates);
                let start = candidates.len().saturating_sub(more);
                survivors.extend(candidates[start..].iter().map(|(c, _)| c.id()));
            }
            SelectorKind::Roulette => {
                survivors.extend(spin_roulette(candidates, more, rng));
            }
        }
        survivors
    }
}

fn sort_ascending(chromosomes: &mut [(&Chromosome, f64)]) {
    chromosomes.sort_by(|a, b| a.1.total_cmp(&b.1));
}

/// Weighted sampling without replacement. Falls back
/// to uniform weights when every weight is zero.
fn spin_roulette<R: Rng + ?Sized>(
    mut wheel: Vec<(&Chromosome, f64)>,
    count: usize,
    rng: &mut R,
) -> Vec<ChromosomeId> {
    let mut picked = Vec::with_capacity(count.min(wheel.len()));
    while picked.len() < count && !wheel.is_empty() {
        let total: f64 = wheel.iter().map(|(_, w)| *w).sum();
        let index = if total > 0.0 {
            let mut spin = rng.gen::<f64>() * total;
            wheel
                .iter()
                .position(|(_, w)| {
                    spin -= *w;
                    spin < 0.0
                })
                .unwrap_or(wheel.len() - 1)
        } else {
            rng.gen_range(0..wheel.len())
        };
        picked.push(wheel.remove(index).0.id());
    }
    picked
}
