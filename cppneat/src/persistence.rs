//! Storage of run records, chromosomes and
//! innovation ids, and a listener that keeps a
//! store up to date as a genotype evolves.
use crate::genomics::InnovationTracker;
use crate::populations::{Chromosome, EvolutionEvent, EvolutionListener, Genotype};
use crate::ChromosomeId;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use std::collections::BTreeMap;

/// Errors raised by a [`Persistence`] store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("no stored chromosome with id {0}")]
    MissingChromosome(ChromosomeId),
    #[error("no stored run named {0:?}")]
    MissingRun(String),
    /// The backing store failed.
    #[error("persistence store unavailable: {0}")]
    Unavailable(String),
}

/// A store for evolution artifacts.
pub trait Persistence {
    fn store_chromosome(&mut self, chromosome: &Chromosome) -> Result<(), PersistenceError>;
    fn store_run(&mut self, run: &Run) -> Result<(), PersistenceError>;
    fn store_innovations(&mut self, tracker: &InnovationTracker) -> Result<(), PersistenceError>;

    fn load_chromosome(&self, id: ChromosomeId) -> Result<Chromosome, PersistenceError>;
    fn load_run(&self, name: &str) -> Result<Run, PersistenceError>;
    /// Returns `None` if no tracker was ever stored.
    fn load_innovations(&self) -> Result<Option<InnovationTracker>, PersistenceError>;

    fn delete_chromosome(&mut self, id: ChromosomeId) -> Result<(), PersistenceError>;
}

/// An in-memory [`Persistence`] store.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    chromosomes: BTreeMap<ChromosomeId, Chromosome>,
    runs: BTreeMap<String, Run>,
    innovations: Option<InnovationTracker>,
}

impl MemoryPersistence {
    pub fn new() -> MemoryPersistence {
        MemoryPersistence::default()
    }

    /// Returns the ids of every stored chromosome, in order.
    pub fn chromosome_ids(&self) -> impl Iterator<Item = ChromosomeId> + '_ {
        self.chromosomes.keys().copied()
    }
}

impl Persistence for MemoryPersistence {
    fn store_chromosome(&mut self, chromosome: &Chromosome) -> Result<(), PersistenceError> {
        self.chromosomes.insert(chromosome.id(), chromosome.clone());
        Ok(())
    }

    fn store_run(&mut self, run: &Run) -> Result<(), PersistenceError> {
        self.runs.insert(run.name.clone(), run.clone());
        Ok(())
    }

    fn store_innovations(&mut self, tracker: &InnovationTracker) -> Result<(), PersistenceError> {
        self.innovations = Some(tracker.clone());
        Ok(())
    }

    fn load_chromosome(&self, id: ChromosomeId) -> Result<Chromosome, PersistenceError> {
        self.chromosomes
            .get(&id)
            .cloned()
            .ok_or(PersistenceError::MissingChromosome(id))
    }

    fn load_run(&self, name: &str) -> Result<Run, PersistenceError> {
        self.runs
            .get(name)
            .cloned()
            .ok_or_else(|| PersistenceError::MissingRun(name.to_string()))
    }

    fn load_innovations(&self) -> Result<Option<InnovationTracker>, PersistenceError> {
        Ok(self.innovations.clone())
    }

    fn delete_chromosome(&mut self, id: ChromosomeId) -> Result<(), PersistenceError> {
        self.chromosomes
            .remove(&id)
            .map(|_| ())
            .ok_or(PersistenceError::MissingChromosome(id))
    }
}

/// The record of an evolution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub name: String,
    pub generations: Vec<Generation>,
}

impl Run {
    pub fn new(name: impl Into<String>) -> Run {
        Run {
            name: name.into(),
            generations: vec![],
        }
    }
}

/// Summary of one evaluated generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub number: usize,
    pub champion_id: Option<ChromosomeId>,
    pub champion_fitness: f64,
    pub max_fitness: f64,
    pub min_fitness: f64,
    pub avg_fitness: f64,
    pub species_count: usize,
    pub champion_neuron_count: usize,
    pub champion_connection_count: usize,
}

impl Generation {
    /// Summarizes an evaluated genotype.
    pub fn of(genotype: &Genotype) -> Generation {
        let champion = genotype.fittest();
        let fitnesses: Vec<f64> = genotype.chromosomes().map(|c| c.fitness_value()).collect();
        let (max, min, sum) = fitnesses
            .iter()
            .fold((f64::MIN, f64::MAX, 0.0), |(max, min, sum), &f| {
                (max.max(f), min.min(f), sum + f)
            });
        let (max_fitness, min_fitness, avg_fitness) = if fitnesses.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (max, min, sum / fitnesses.len() as f64)
        };
        Generation {
            number: genotype.generation(),
            champion_id: champion.map(|c| c.id()),
            champion_fitness: champion.map_or(0.0, |c| c.fitness_value()),
            max_fitness,
            min_fitness,
            avg_fitness,
            species_count: genotype.species().len(),
            champion_neuron_count: champion.map_or(0, |c| c.material().neuron_count()),
            champion_connection_count: champion.map_or(0, |c| c.material().connection_count()),
        }
    }
}

/// Keeps a [`Persistence`] store up to date with a run.
///
/// Once a generation is evaluated its summary is appended
/// to the run, and the run and the generation champion are
/// stored. Once reproduction finishes the innovation tracker
/// is stored. Store failures are logged and otherwise ignored.
pub struct PersistenceListener<P> {
    store: P,
    run: Run,
    keep_all_champions: bool,
    last_champion: Option<ChromosomeId>,
}

impl<P: Persistence> PersistenceListener<P> {
    /// When `keep_all_champions` is `false`, only the latest
    /// champion is kept in the store.
    pub fn new(store: P, run_name: impl Into<String>, keep_all_champions: bool) -> PersistenceListener<P> {
        PersistenceListener {
            store,
            run: Run::new(run_name),
            keep_all_champions,
            last_champion: None,
        }
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    fn genotype_evaluated(&mut self, genotype: &Genotype) {
        let generation = Generation::of(genotype);
        self.run.generations.push(generation);

        if let Some(champion) = genotype.fittest() {
            if self.last_champion != Some(champion.id()) {
                if let Err(e) = self.store.store_chromosome(champion) {
                    error!(chromosome = champion.id(), "failed to store champion: {}", e);
                }
                if !self.keep_all_champions {
                    if let Some(previous) = self.last_champion {
                        if let Err(e) = self.store.delete_chromosome(previous) {
                            error!(chromosome = previous, "failed to delete champion: {}", e);
                        }
                    }
                }
                self.last_champion = Some(champion.id());
            }
        }
        if let Err(e) = self.store.store_run(&self.run) {
            error!(run = %self.run.name, "failed to store run: {}", e);
        }
    }

    fn reproduction_finished(&mut self, genotype: &Genotype) {
        match self.store.store_innovations(genotype.innovations()) {
            Ok(()) => debug!(max_innovation = ?genotype.innovations().max_innovation(), "stored innovations"),
            Err(e) => error!("failed to store innovations: {}", e),
        }
    }
}

impl<P: Persistence> EvolutionListener for PersistenceListener<P> {
    fn on_event(&mut self, event: EvolutionEvent, genotype: &Genotype) {
        match event {
            EvolutionEvent::Evaluated => self.genotype_evaluated(genotype),
            EvolutionEvent::ReproduceFinish => self.reproduction_finished(genotype),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ChromosomeMaterial, GeneticConfig};
    use crate::populations::ParallelFitness;
    use crate::PopulationConfig;

    use std::cell::RefCell;
    use std::rc::Rc;

    struct BrokenStore;

    impl Persistence for BrokenStore {
        fn store_chromosome(&mut self, _: &Chromosome) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("disk full".into()))
        }
        fn store_run(&mut self, _: &Run) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("disk full".into()))
        }
        fn store_innovations(&mut self, _: &InnovationTracker) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("disk full".into()))
        }
        fn load_chromosome(&self, id: ChromosomeId) -> Result<Chromosome, PersistenceError> {
            Err(PersistenceError::MissingChromosome(id))
        }
        fn load_run(&self, name: &str) -> Result<Run, PersistenceError> {
            Err(PersistenceError::MissingRun(name.into()))
        }
        fn load_innovations(&self) -> Result<Option<InnovationTracker>, PersistenceError> {
            Err(PersistenceError::Unavailable("offline".into()))
        }
        fn delete_chromosome(&mut self, id: ChromosomeId) -> Result<(), PersistenceError> {
            Err(PersistenceError::MissingChromosome(id))
        }
    }

    fn genotype() -> Genotype {
        Genotype::new(
            PopulationConfig {
                size: 12,
                survival_rate: 0.25,
                speciation_threshold: 0.5,
                ..PopulationConfig::zero()
            },
            GeneticConfig {
                input_count: 2,
                output_count: 1,
                initial_fully_connected: true,
                weight_min: -1.0,
                weight_max: 1.0,
                weight_mutation_rate: 1.0,
                weight_mutation_std_dev: 0.5,
                ..GeneticConfig::zero()
            },
        )
    }

    fn fitness() -> ParallelFitness<impl Fn(&Chromosome) -> f64 + Sync> {
        ParallelFitness::new(
            |c: &Chromosome| c.material().connections().map(|c| c.weight() + 1.0).sum(),
            6.0,
        )
    }

    #[test]
    fn memory_round_trip() {
        let mut store = MemoryPersistence::new();
        let chromosome = Chromosome::new(4, ChromosomeMaterial::new());
        store.store_chromosome(&chromosome).unwrap();
        assert_eq!(store.load_chromosome(4).unwrap(), chromosome);
        store.delete_chromosome(4).unwrap();
        assert_eq!(
            store.load_chromosome(4),
            Err(PersistenceError::MissingChromosome(4))
        );
        assert_eq!(
            store.load_run("nope"),
            Err(PersistenceError::MissingRun("nope".into()))
        );
    }

    #[test]
    fn listener_records_every_generation() {
        let listener = Rc::new(RefCell::new(PersistenceListener::new(
            MemoryPersistence::new(),
            "test",
            false,
        )));
        let mut genotype = genotype();
        genotype.add_listener(Box::new(listener.clone()));
        let mut fitness = fitness();
        for _ in 0..3 {
            genotype.evolve(&mut fitness).unwrap();
        }

        let listener = listener.borrow();
        let run = listener.store().load_run("test").unwrap();
        assert_eq!(run.generations.len(), 3);
        assert_eq!(
            run.generations.iter().map(|g| g.number).collect::<Vec<_>>(),
            [0, 1, 2]
        );
        assert!(listener.store().chromosome_ids().count() <= 1);
        let champion = run.generations[2].champion_id.unwrap();
        assert_eq!(listener.store().load_chromosome(champion).unwrap().id(), champion);
        assert!(listener.store().load_innovations().unwrap().is_some());
    }

    #[test]
    fn store_failures_do_not_stop_evolution() {
        let mut genotype = genotype();
        genotype.add_listener(Box::new(PersistenceListener::new(BrokenStore, "broken", true)));
        genotype.evolve(&mut fitness()).unwrap();
        assert_eq!(genotype.generation(), 1);
    }

    #[test]
    fn failed_tracker_load_is_a_config_error() {
        assert!(matches!(
            InnovationTracker::load(&BrokenStore),
            Err(crate::ConfigError::IdFactory(_))
        ));
    }
}
