//! A Genotype is a population of chromosomes.
//! These are grouped into species, and evolved
//! one generation at a time using a bulk fitness
//! function as the source of selective pressure.
mod chromosome;
mod config;
mod errors;
mod events;
mod fitness;
pub mod logging;
mod offspring_factory;
mod selection;
mod species;

pub use chromosome::Chromosome;
pub use config::PopulationConfig;
pub use errors::EvolutionError;
pub use events::{EvolutionEvent, EvolutionListener, EvolutionStage};
pub use fitness::{BulkFitnessFunction, ParallelFitness};
pub use selection::{NaturalSelector, SelectorKind};
pub use species::{Specie, SpecieId};

use crate::genomics::{ChromosomeMaterial, GeneticConfig, InnovationTracker};
use crate::rng::{seeded, NeatRng};
use crate::{ChromosomeId, NeatConfig};
use offspring_factory::OffspringFactory;

use rand::seq::SliceRandom;
use tracing::{debug, info};

use std::cmp::Ordering;
use std::collections::BTreeSet;

/// A population of chromosomes, grouped into species.
pub struct Genotype {
    species: Vec<Specie>,
    tracker: InnovationTracker,
    config: NeatConfig,
    generation: usize,
    next_chromosome_id: ChromosomeId,
    stage: EvolutionStage,
    rng: NeatRng,
    listeners: Vec<Box<dyn EvolutionListener>>,
}

impl Genotype {
    /// Creates a random initial population with a fresh
    /// innovation tracker.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::GeneticConfig;
    /// use cppneat::{Genotype, PopulationConfig};
    ///
    /// let genotype = Genotype::new(
    ///     PopulationConfig {
    ///         size: 10,
    ///         speciation_threshold: 1.0,
    ///         ..PopulationConfig::zero()
    ///     },
    ///     GeneticConfig {
    ///         input_count: 2,
    ///         output_count: 1,
    ///         initial_fully_connected: true,
    ///         ..GeneticConfig::zero()
    ///     },
    /// );
    ///
    /// assert_eq!(genotype.chromosomes().count(), 10);
    /// ```
    pub fn new(population_config: PopulationConfig, genetic_config: GeneticConfig) -> Genotype {
        Genotype::random_initial(
            NeatConfig {
                genetic: genetic_config,
                population: population_config,
            },
            InnovationTracker::new(),
        )
    }

    /// Creates a population of [`size`] chromosomes sharing the
    /// initial topology, each with random weights. Structure is
    /// named through `tracker`, which may have been loaded from
    /// a previous run.
    ///
    /// [`size`]: PopulationConfig::size
    pub fn random_initial(config: NeatConfig, mut tracker: InnovationTracker) -> Genotype {
        let mut rng = seeded(config.population.random_seed);
        let sample = ChromosomeMaterial::initial(&config.genetic, &mut tracker, &mut rng);
        let materials: Vec<ChromosomeMaterial> = (0..config.population.size)
            .map(|_| sample.with_random_weights(&config.genetic, &mut rng))
            .collect();
        let mut genotype = Genotype::empty(config, tracker, rng);
        genotype.add_materials(materials);
        genotype
    }

    /// Creates a population from existing genetic material,
    /// e.g. chromosomes restored from persistence.
    pub fn from_materials(
        config: NeatConfig,
        tracker: InnovationTracker,
        materials: impl IntoIterator<Item = ChromosomeMaterial>,
    ) -> Genotype {
        let rng = seeded(config.population.random_seed);
        let mut genotype = Genotype::empty(config, tracker, rng);
        genotype.add_materials(materials);
        genotype
    }

    fn empty(config: NeatConfig, tracker: InnovationTracker, rng: NeatRng) -> Genotype {
        Genotype {
            species: vec![],
            tracker,
            config,
            generation: 0,
            next_chromosome_id: 1,
            stage: EvolutionStage::Evaluate,
            rng,
            listeners: vec![],
        }
    }

    /// Registers a listener. Listeners are notified
    /// in registration order.
    pub fn add_listener(&mut self, listener: Box<dyn EvolutionListener>) {
        self.listeners.push(listener);
    }

    /// Runs one generation: evaluation, selection, reproduction,
    /// mutation of the offspring, and speciation of the new
    /// population, firing lifecycle events along the way.
    ///
    /// # Errors
    /// Returns an error if the fitness function leaves a chromosome
    /// unevaluated, or if no chromosome survives selection. The
    /// population is left as it was before the failing step.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::GeneticConfig;
    /// use cppneat::populations::{Chromosome, ParallelFitness};
    /// use cppneat::{Genotype, PopulationConfig};
    ///
    /// let mut genotype = Genotype::new(
    ///     PopulationConfig {
    ///         size: 20,
    ///         survival_rate: 0.2,
    ///         speciation_threshold: 0.5,
    ///         ..PopulationConfig::zero()
    ///     },
    ///     GeneticConfig {
    ///         input_count: 2,
    ///         output_count: 1,
    ///         initial_fully_connected: true,
    ///         add_neuron_rate: 0.1,
    ///         ..GeneticConfig::zero()
    ///     },
    /// );
    /// let mut fitness = ParallelFitness::new(|c: &Chromosome| c.material().len() as f64, 100.0);
    ///
    /// genotype.evolve(&mut fitness).unwrap();
    ///
    /// assert_eq!(genotype.generation(), 1);
    /// assert_eq!(genotype.chromosomes().count(), 20);
    /// ```
    pub fn evolve(&mut self, fitness: &mut dyn BulkFitnessFunction) -> Result<(), EvolutionError> {
        self.stage = EvolutionStage::Evaluate;
        self.evaluate(fitness)?;
        self.fire(EvolutionEvent::Evaluated);

        self.stage = EvolutionStage::Select;
        let survivors: BTreeSet<ChromosomeId> = NaturalSelector::new(&self.config.population)
            .select(&self.species, &mut self.rng)
            .into_iter()
            .collect();
        if survivors.is_empty() {
            return Err(EvolutionError::NoSurvivors);
        }
        for specie in &mut self.species {
            specie.cull(|id| survivors.contains(&id));
        }
        self.species.retain(|s| !s.is_empty());
        debug!(survivors = survivors.len(), species = self.species.len(), "selected");

        self.stage = EvolutionStage::ReproduceStart;
        self.fire(EvolutionEvent::ReproduceStart);

        self.stage = EvolutionStage::Reproduce;
        let mut offspring = OffspringFactory::new(&self.species, &self.config.population)
            .generate_offspring(&mut self.rng);

        self.stage = EvolutionStage::Mutate;
        for child in &mut offspring {
            child.mutate(&mut self.tracker, &self.config.genetic, &mut self.rng);
        }
        offspring.shuffle(&mut self.rng);
        let target = self.config.population.size.saturating_sub(survivors.len());
        self.adjust_offspring(&mut offspring, target);
        self.add_materials(offspring);

        self.stage = EvolutionStage::ReproduceFinish;
        self.fire(EvolutionEvent::ReproduceFinish);

        if !self.config.population.innovation_persist {
            self.tracker.clear_mappings();
        }
        self.generation += 1;
        self.stage = EvolutionStage::Evolved;
        self.fire(EvolutionEvent::Evolved);

        info!(
            generation = self.generation,
            species = self.species.len(),
            population = self.chromosomes().count(),
            "evolved"
        );
        Ok(())
    }

    /// Hands every chromosome to the fitness function,
    /// clearing stale fitness values first.
    fn evaluate(&mut self, fitness: &mut dyn BulkFitnessFunction) -> Result<(), EvolutionError> {
        let counts: Vec<usize> = self.species.iter().map(Specie::len).collect();
        let mut chromosomes: Vec<Chromosome> = self
            .species
            .iter_mut()
            .flat_map(|s| s.members.drain(..))
            .collect();
        chromosomes.iter_mut().for_each(Chromosome::clear_fitness);

        fitness.evaluate(&mut chromosomes);
        let unevaluated = chromosomes
            .iter()
            .find(|c| c.fitness().is_none())
            .map(|c| c.id());

        let mut chromosomes = chromosomes.into_iter();
        for (specie, count) in self.species.iter_mut().zip(counts) {
            specie.members.extend(chromosomes.by_ref().take(count));
        }

        match unevaluated {
            Some(id) => Err(EvolutionError::Unevaluated(id)),
            None => Ok(()),
        }
    }

    /// Pads `offspring` to `target` with shuffled copies of
    /// itself, or truncates it. An empty pool is seeded with
    /// clones of the survivors.
    fn adjust_offspring(&mut self, offspring: &mut Vec<ChromosomeMaterial>, target: usize) {
        if offspring.is_empty() && target > 0 {
            offspring.extend(
                self.chromosomes()
                    .map(|c| c.material().clone_material(c.id())),
            );
        }
        if offspring.is_empty() {
            return;
        }
        let mut more = offspring.clone();
        while offspring.len() < target {
            more.shuffle(&mut self.rng);
            offspring.extend_from_slice(&more);
        }
        offspring.truncate(target);
    }

    fn add_materials(&mut self, materials: impl IntoIterator<Item = ChromosomeMaterial>) {
        for material in materials {
            let id = self.next_chromosome_id;
            self.next_chromosome_id += 1;
            self.speciate(Chromosome::new(id, material));
        }
    }

    /// Adds the chromosome to the first specie whose
    /// representative is close enough, or founds a new one.
    fn speciate(&mut self, chromosome: Chromosome) {
        let threshold = self.config.population.speciation_threshold;
        let genetic = &self.config.genetic;
        match self
            .species
            .iter()
            .position(|s| s.distance(chromosome.material(), genetic) < threshold)
        {
            Some(i) => self.species[i].add(chromosome),
            None => self.species.push(Specie::new(chromosome)),
        }
    }

    fn fire(&mut self, event: EvolutionEvent) {
        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in &mut listeners {
            listener.on_event(event, self);
        }
        self.listeners = listeners;
    }

    /// Returns an iterator over every chromosome,
    /// specie by specie.
    pub fn chromosomes(&self) -> impl Iterator<Item = &Chromosome> {
        self.species.iter().flat_map(|s| s.members())
    }

    /// Returns the current species.
    pub fn species(&self) -> &[Specie] {
        &self.species
    }

    /// Returns the chromosome with the highest fitness,
    /// the earliest one on ties.
    pub fn fittest(&self) -> Option<&Chromosome> {
        self.chromosomes().reduce(|best, c| {
            match c.fitness_value().partial_cmp(&best.fitness_value()) {
                Some(Ordering::Greater) => c,
                _ => best,
            }
        })
    }

    /// Returns the number of generations evolved so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the innovation tracker.
    pub fn innovations(&self) -> &InnovationTracker {
        &self.tracker
    }

    /// Returns the configuration the genotype evolves under.
    pub fn config(&self) -> &NeatConfig {
        &self.config
    }

    /// Returns the step of the generation cycle
    /// the genotype is currently in.
    pub fn stage(&self) -> EvolutionStage {
        self.stage
    }
}
