use crate::genomics::{ChromosomeMaterial, GeneticConfig};
use crate::populations::Chromosome;
use crate::ChromosomeId;

use serde::{Deserialize, Serialize};

use std::cmp::Ordering;

/// Specie identifier: the id of the
/// chromosome that founded the specie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpecieId(pub ChromosomeId);

/// Species are collections of reproductively
/// compatible (within a certain [genetic distance])
/// chromosomes. Membership is determined by the
/// distance from a fixed _representative_, the
/// material of the chromosome that founded the specie.
///
/// [genetic distance]: crate::PopulationConfig::speciation_threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specie {
    id: SpecieId,
    representative: ChromosomeMaterial,
    pub(super) members: Vec<Chromosome>,
}

impl Specie {
    /// Creates a new specie founded by `founder`,
    /// which becomes its representative and first member.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::ChromosomeMaterial;
    /// use cppneat::populations::{Chromosome, Specie, SpecieId};
    ///
    /// let specie = Specie::new(Chromosome::new(7, ChromosomeMaterial::new()));
    ///
    /// assert_eq!(specie.id(), SpecieId(7));
    /// assert_eq!(specie.members().next().unwrap().specie(), Some(SpecieId(7)));
    /// ```
    pub fn new(mut founder: Chromosome) -> Specie {
        let id = SpecieId(founder.id());
        founder.set_specie(Some(id));
        Specie {
            id,
            representative: founder.material().clone(),
            members: vec![founder],
        }
    }

    /// Returns the specie's id.
    pub fn id(&self) -> SpecieId {
        self.id
    }

    /// Returns the material every candidate member is compared to.
    pub fn representative(&self) -> &ChromosomeMaterial {
        &self.representative
    }

    /// Returns the genetic distance from the
    /// specie's representative to `material`.
    pub fn distance(&self, material: &ChromosomeMaterial, config: &GeneticConfig) -> f64 {
        self.representative.distance(material, config)
    }

    /// Adds a chromosome to the specie.
    pub fn add(&mut self, mut chromosome: Chromosome) {
        chromosome.set_specie(Some(self.id));
        self.members.push(chromosome);
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns an iterator over the specie's members.
    pub fn members(&self) -> impl Iterator<Item = &Chromosome> {
        self.members.iter()
    }

    /// Keeps only the members for which `keep` holds.
    pub(super) fn cull(&mut self, mut keep: impl FnMut(ChromosomeId) -> bool) {
        self.members.retain(|c| keep(c.id()));
    }

    /// Returns the member with the highest fitness.
    /// Ties go to the earliest member.
    pub fn fittest(&self) -> Option<&Chromosome> {
        self.members.iter().reduce(|best, c| {
            match c.fitness_value().partial_cmp(&best.fitness_value()) {
                Some(Ordering::Greater) => c,
                _ => best,
            }
        })
    }

    /// Returns the average member fitness, or 0 for
    /// an empty specie.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::ChromosomeMaterial;
    /// use cppneat::populations::{Chromosome, Specie};
    ///
    /// let mut first = Chromosome::new(1, ChromosomeMaterial::new());
    /// let mut second = Chromosome::new(2, ChromosomeMaterial::new());
    /// first.set_fitness(20.0);
    /// second.set_fitness(30.0);
    ///
    /// let mut specie = Specie::new(first);
    /// specie.add(second);
    ///
    /// assert_eq!(specie.average_fitness(), 25.0);
    /// ```
    pub fn average_fitness(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.members.iter().map(|c| c.fitness_value()).sum::<f64>() / self.members.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chromosome(id: ChromosomeId, fitness: f64) -> Chromosome {
        let mut c = Chromosome::new(id, ChromosomeMaterial::new());
        c.set_fitness(fitness);
        c
    }

    #[test]
    fn fittest_prefers_first_on_ties() {
        let mut specie = Specie::new(chromosome(1, 3.0));
        specie.add(chromosome(2, 5.0));
        specie.add(chromosome(3, 5.0));
        assert_eq!(specie.fittest().map(|c| c.id()), Some(2));
    }

    #[test]
    fn cull_keeps_representative() {
        let mut specie = Specie::new(chromosome(1, 3.0));
        specie.add(chromosome(2, 5.0));
        specie.cull(|id| id == 2);
        assert_eq!(specie.len(), 1);
        assert_eq!(specie.id(), SpecieId(1));
        assert_eq!(specie.representative(), &ChromosomeMaterial::new());
    }
}
