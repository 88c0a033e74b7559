use crate::populations::{Chromosome, EvolutionEvent, EvolutionListener, Genotype, SpecieId};

use tracing::info;

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllChromosomes,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no chromosomes.
    NoChromosomes,
}

/// A snapshot of an evaluated generation.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord,
    pub species_count: usize,
    pub fitness: Stats,
    pub neurons: Stats,
    pub connections: Stats,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration_number: {:?}\n\
            \tspecies_count: {:?}\n\
            \tfitness: {:?}\n\
            \tneurons: {:?}\n\
            \tconnections: {:?}\n\
            }}",
            self.generation_number, self.species_count, self.fitness, self.neurons, self.connections,
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// An empty sequence yields all zeros.
    ///
    /// # Examples
    /// ```
    /// use cppneat::populations::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        if data.is_empty() {
            return Stats::default();
        }
        data.sort_by(f64::total_cmp);
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f64>() / data.len() as f64,
            median,
        }
    }
}

/// A reporting-level dependant store
/// of chromosomes from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord {
    /// Specie ids and their members.
    Species(Vec<(SpecieId, Vec<Chromosome>)>),
    /// Only specie ids and specie champions.
    SpeciesChampions(Vec<(SpecieId, Chromosome)>),
    /// Only the population champion.
    PopulationChampion(Chromosome),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
///
/// Registered as a listener, it takes a snapshot of
/// every generation once it has been evaluated.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    ///
    /// # Examples
    /// ```
    /// use cppneat::populations::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::NoChromosomes);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a genotype.
    pub fn log(&mut self, genotype: &Genotype) {
        let chromosomes = || genotype.species().iter().flat_map(|s| s.members());
        let log = Log {
            generation_number: genotype.generation(),
            generation_sample: match self.reporting_level {
                ReportingLevel::AllChromosomes => GenerationMemberRecord::Species(
                    genotype
                        .species()
                        .iter()
                        .map(|s| (s.id(), s.members().cloned().collect()))
                        .collect(),
                ),
                ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                    genotype
                        .species()
                        .iter()
                        .filter_map(|s| s.fittest().map(|c| (s.id(), c.clone())))
                        .collect(),
                ),
                ReportingLevel::PopulationChampion => match genotype.fittest() {
                    Some(champion) => GenerationMemberRecord::PopulationChampion(champion.clone()),
                    None => GenerationMemberRecord::None,
                },
                ReportingLevel::NoChromosomes => GenerationMemberRecord::None,
            },
            species_count: genotype.species().len(),
            fitness: Stats::from(chromosomes().map(|c| c.fitness_value())),
            neurons: Stats::from(chromosomes().map(|c| c.material().neuron_count() as f64)),
            connections: Stats::from(chromosomes().map(|c| c.material().connection_count() as f64)),
        };
        info!(
            generation = log.generation_number,
            species = log.species_count,
            max_fitness = log.fitness.maximum,
            mean_fitness = log.fitness.mean,
            mean_connections = log.connections.mean,
            "generation evaluated"
        );
        self.logs.push(log);
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}

impl EvolutionListener for EvolutionLogger {
    fn on_event(&mut self, event: EvolutionEvent, genotype: &Genotype) {
        if event == EvolutionEvent::Evaluated {
            self.log(genotype);
        }
    }
}
