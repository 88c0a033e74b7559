use crate::genomics::ChromosomeMaterial;
use crate::populations::SpecieId;
use crate::ChromosomeId;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A member of the population: genetic material
/// plus the fitness and specie assigned to it
/// during evolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    id: ChromosomeId,
    material: ChromosomeMaterial,
    fitness: Option<f64>,
    specie: Option<SpecieId>,
}

impl Chromosome {
    /// Creates an unevaluated, unspeciated chromosome.
    pub fn new(id: ChromosomeId, material: ChromosomeMaterial) -> Chromosome {
        Chromosome {
            id,
            material,
            fitness: None,
            specie: None,
        }
    }

    /// Returns the chromosome's id.
    pub fn id(&self) -> ChromosomeId {
        self.id
    }

    /// Returns the chromosome's genetic material.
    pub fn material(&self) -> &ChromosomeMaterial {
        &self.material
    }

    /// Returns the assigned fitness, or `None` if
    /// the chromosome has not been evaluated.
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Returns the assigned fitness, or 0 if unset.
    pub fn fitness_value(&self) -> f64 {
        self.fitness.unwrap_or(0.0)
    }

    /// Assigns the chromosome's fitness.
    ///
    /// # Panics
    /// Panics if `fitness` is negative or NaN.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::ChromosomeMaterial;
    /// use cppneat::populations::Chromosome;
    ///
    /// let mut chromosome = Chromosome::new(1, ChromosomeMaterial::new());
    /// assert_eq!(chromosome.fitness(), None);
    ///
    /// chromosome.set_fitness(2.5);
    /// assert_eq!(chromosome.fitness(), Some(2.5));
    /// ```
    pub fn set_fitness(&mut self, fitness: f64) {
        assert!(
            fitness >= 0.0,
            "invalid fitness {} for chromosome {}",
            fitness,
            self.id
        );
        self.fitness = Some(fitness);
    }

    pub(crate) fn clear_fitness(&mut self) {
        self.fitness = None;
    }

    /// Returns the specie the chromosome belongs to.
    pub fn specie(&self) -> Option<SpecieId> {
        self.specie
    }

    pub(crate) fn set_specie(&mut self, specie: Option<SpecieId>) {
        self.specie = specie;
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chromosome")
            .field("ID", &self.id)
            .field("Fitness", &self.fitness)
            .field("Specie", &self.specie.map(|s| s.0))
            .field("Material", &format_args!("{}", self.material))
            .finish()
    }
}
