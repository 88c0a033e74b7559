use crate::populations::Chromosome;

use rayon::prelude::*;

/// Assigns fitness to a whole generation at once.
///
/// Implementations must call [`Chromosome::set_fitness`]
/// on every chromosome they are given.
pub trait BulkFitnessFunction {
    fn evaluate(&mut self, chromosomes: &mut [Chromosome]);

    /// The best attainable fitness, if known.
    fn max_fitness(&self) -> f64 {
        f64::MAX
    }
}

/// Evaluates chromosomes in parallel with a per-chromosome
/// function. The function should build its own phenotype
/// from the chromosome's material.
///
/// # Examples
/// ```
/// use cppneat::genomics::ChromosomeMaterial;
/// use cppneat::populations::{BulkFitnessFunction, Chromosome, ParallelFitness};
///
/// let mut fitness = ParallelFitness::new(|c: &Chromosome| c.material().len() as f64, 100.0);
/// let mut chromosomes = vec![Chromosome::new(1, ChromosomeMaterial::new())];
///
/// fitness.evaluate(&mut chromosomes);
///
/// assert_eq!(chromosomes[0].fitness(), Some(0.0));
/// ```
pub struct ParallelFitness<F> {
    function: F,
    max_fitness: f64,
}

impl<F> ParallelFitness<F>
where
    F: Fn(&Chromosome) -> f64 + Sync,
{
    pub fn new(function: F, max_fitness: f64) -> ParallelFitness<F> {
        ParallelFitness {
            function,
            max_fitness,
        }
    }
}

impl<F> BulkFitnessFunction for ParallelFitness<F>
where
    F: Fn(&Chromosome) -> f64 + Sync,
{
    fn evaluate(&mut self, chromosomes: &mut [Chromosome]) {
        let function = &self.function;
        chromosomes.par_iter_mut().for_each(|c| {
            let fitness = function(c);
            c.set_fitness(fitness);
        });
    }

    fn max_fitness(&self) -> f64 {
        self.max_fitness
    }
}
