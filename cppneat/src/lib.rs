//! An implementation of NeuroEvolution of Augmenting Topologies
//! geared towards Compositional Pattern-Producing Networks,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Genomes are sets of neuron and connection alleles identified by
//! innovation numbers. A [`Genotype`] groups chromosomes into species,
//! and evolves them one generation at a time: evaluation, selection,
//! cloning and crossover, and mutation of the offspring. Listeners
//! are notified at each step of a generation, which is how logging
//! ([`EvolutionLogger`]) and persistence ([`PersistenceListener`])
//! are attached to a run.
//!
//! Genomes are turned into runnable networks by the
//! [`cppneat-nn`](../cppneat_nn/index.html) crate.
//!
//! [`EvolutionLogger`]: crate::populations::logging::EvolutionLogger
//! [`PersistenceListener`]: crate::persistence::PersistenceListener
//!
//! # Example usage: Evolution of a bright centered blob
//! ```
//! use cppneat::genomics::{ActivationFunction, GeneticConfig, HiddenActivation};
//! use cppneat::populations::{Chromosome, ParallelFitness};
//! use cppneat::{Genotype, PopulationConfig};
//! use cppneat_nn::cppn::{Cppn, InputScaling};
//!
//! // Rewards bright pixels near the center of the image, dark ones elsewhere.
//! fn blob(chromosome: &Chromosome) -> f64 {
//!     let mut cppn = Cppn::from_material(chromosome.material(), InputScaling::default());
//!     let mut error = 0.0;
//!     for i in 0..8 {
//!         for j in 0..8 {
//!             let (x, y) = (i as f64 / 3.5 - 1.0, j as f64 / 3.5 - 1.0);
//!             let target = if x * x + y * y < 0.25 { 1.0 } else { 0.0 };
//!             error += (cppn.evaluate_at(x, y)[0] - target).abs();
//!         }
//!     }
//!     64.0 - error.min(64.0)
//! }
//!
//! fn main() {
//!     let genetic_config = GeneticConfig {
//!         output_activation: ActivationFunction::Sigmoid,
//!         hidden_activation: HiddenActivation::RandomCppn,
//!         weight_min: -5.0,
//!         weight_max: 5.0,
//!         ..GeneticConfig::default()
//!     };
//!     let population_config = PopulationConfig {
//!         size: 30,
//!         random_seed: 7,
//!         ..PopulationConfig::default()
//!     };
//!
//!     let mut genotype = Genotype::new(population_config, genetic_config);
//!     let mut fitness = ParallelFitness::new(blob, 64.0);
//!     for _ in 0..5 {
//!         if let Err(e) = genotype.evolve(&mut fitness) {
//!             eprintln!("{}", e);
//!             break;
//!         }
//!     }
//!     assert_eq!(genotype.generation(), 5);
//! }
//! ```

mod config;
pub mod genomics;
pub mod persistence;
pub mod populations;
mod properties;
pub mod rng;

pub use config::{ConfigError, NeatConfig};
pub use populations::{Genotype, PopulationConfig};
pub use properties::Properties;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = i64;

/// Identifier of a chromosome within a run.
pub type ChromosomeId = i64;
