//! Genomes are the genotypic encodings of networks.
//! They are made of neuron and connection _alleles_,
//! each carrying a historical marking (innovation number)
//! that identifies homologous structure across genomes.
mod activation;
mod config;
mod connections;
mod crossover;
mod errors;
mod history;
mod mutation;
mod neurons;

pub use activation::{ActivationFunction, UnknownActivationError};
pub use config::{GeneticConfig, HiddenActivation, RecurrencyPolicy, WeightDistribution};
pub use connections::ConnectionAllele;
use errors::AlleleValidityError;
pub use history::InnovationTracker;
pub use neurons::{NeuronAllele, NeuronType};

use crate::{ChromosomeId, Innovation};

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

/// A reference to either kind of allele in a genome.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Allele<'a> {
    Neuron(&'a NeuronAllele),
    Connection(&'a ConnectionAllele),
}

impl Allele<'_> {
    /// Returns the allele's innovation number.
    pub fn innovation(&self) -> Innovation {
        match self {
            Allele::Neuron(n) => n.innovation(),
            Allele::Connection(c) => c.innovation(),
        }
    }
}

/// The genetic material of one individual: an ordered
/// set of neuron and connection alleles, plus the ids of
/// the chromosomes it descends from.
///
/// No innovation number is used twice within one genome,
/// and every connection links two neurons of the genome.
/// Breaking either invariant is a programming error and panics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChromosomeMaterial {
    neurons: BTreeMap<Innovation, NeuronAllele>,
    connections: BTreeMap<Innovation, ConnectionAllele>,
    primary_parent: Option<ChromosomeId>,
    secondary_parent: Option<ChromosomeId>,
}

impl ChromosomeMaterial {
    /// Returns an empty genome.
    pub fn new() -> ChromosomeMaterial {
        ChromosomeMaterial::default()
    }

    /// Generates the initial topology described by `config`:
    /// input neurons, then output neurons, then the initial
    /// hidden layer, each minted by `tracker` in that order.
    /// If the topology is fully connected, every input is
    /// linked to every output, or, with a hidden layer, every
    /// input to every hidden neuron and every hidden neuron
    /// to every output. Weights are random.
    ///
    /// Calling this twice with the same tracker yields different
    /// neuron ids; a population should be created from one sample
    /// using [`with_random_weights`].
    ///
    /// [`with_random_weights`]: ChromosomeMaterial::with_random_weights
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ChromosomeMaterial, GeneticConfig, InnovationTracker};
    /// use rand::SeedableRng;
    ///
    /// let config = GeneticConfig {
    ///     input_count: 3,
    ///     output_count: 2,
    ///     initial_fully_connected: true,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
    /// let genome = ChromosomeMaterial::initial(&config, &mut InnovationTracker::new(), &mut rng);
    ///
    /// assert_eq!(genome.neurons().count(), 3 + 2);
    /// assert_eq!(genome.connections().count(), 3 * 2);
    /// ```
    pub fn initial<R: Rng + ?Sized>(
        config: &GeneticConfig,
        tracker: &mut InnovationTracker,
        rng: &mut R,
    ) -> ChromosomeMaterial {
        let mut genome = ChromosomeMaterial::new();

        let inputs = Self::generate_neurons(
            &mut genome,
            tracker,
            NeuronType::Input,
            config.input_count,
            &config.input_labels,
            |_| config.input_activation,
            rng,
        );
        let outputs = Self::generate_neurons(
            &mut genome,
            tracker,
            NeuronType::Output,
            config.output_count,
            &config.output_labels,
            |_| config.output_activation,
            rng,
        );
        let hidden = Self::generate_neurons(
            &mut genome,
            tracker,
            NeuronType::Hidden,
            config.initial_hidden_count,
            &[],
            |rng| config.hidden_activation.pick(rng),
            rng,
        );

        if config.initial_fully_connected {
            let layers: Vec<(&[Innovation], &[Innovation])> = if hidden.is_empty() {
                vec![(inputs.as_slice(), outputs.as_slice())]
            } else {
                vec![
                    (inputs.as_slice(), hidden.as_slice()),
                    (hidden.as_slice(), outputs.as_slice()),
                ]
            };
            for (sources, destinations) in layers {
                for &src in sources {
                    for &dest in destinations {
                        let id = tracker.find_or_create_connection_id(src, dest);
                        let weight = ConnectionAllele::random_weight(config, rng);
                        genome.add_connection(ConnectionAllele::new(id, src, dest, weight));
                    }
                }
            }
        }

        genome
    }

    /// Adds `count` neurons of the given type, returning their ids.
    fn generate_neurons<R: Rng + ?Sized>(
        genome: &mut ChromosomeMaterial,
        tracker: &mut InnovationTracker,
        neuron_type: NeuronType,
        count: usize,
        labels: &[String],
        mut activation: impl FnMut(&mut R) -> ActivationFunction,
        rng: &mut R,
    ) -> Vec<Innovation> {
        (0..count)
            .map(|i| {
                let id = tracker.mint();
                let mut neuron = NeuronAllele::new(id, neuron_type, activation(rng));
                if let Some(label) = labels.get(i) {
                    neuron = neuron.with_label(label.clone());
                }
                genome.add_neuron(neuron);
                id
            })
            .collect()
    }

    /// Returns a copy of the genome with every connection
    /// weight redrawn at random.
    pub fn with_random_weights<R: Rng + ?Sized>(
        &self,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> ChromosomeMaterial {
        let mut genome = self.clone();
        for connection in genome.connections.values_mut() {
            connection.set_weight(ConnectionAllele::random_weight(config, rng));
        }
        genome
    }

    /// Returns a deep copy of the genome whose lineage
    /// records `parent` as its only parent.
    pub fn clone_material(&self, parent: ChromosomeId) -> ChromosomeMaterial {
        let mut genome = self.clone();
        genome.set_parents(Some(parent), None);
        genome
    }

    /// Adds a neuron to the genome.
    ///
    /// # Panics
    /// This function panics if the neuron's innovation
    /// number is already in use in the genome.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ActivationFunction, ChromosomeMaterial, NeuronAllele, NeuronType};
    ///
    /// let mut genome = ChromosomeMaterial::new();
    /// genome.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear));
    ///
    /// assert!(genome.neuron(0).is_some());
    /// ```
    pub fn add_neuron(&mut self, neuron: NeuronAllele) {
        self.check_innovation_unused(neuron.innovation())
            .unwrap_or_else(|e| panic!("{} in {}", e, self));
        self.neurons.insert(neuron.innovation(), neuron);
    }

    /// Adds a connection to the genome.
    ///
    /// # Panics
    /// This function panics if the connection's innovation
    /// number is already in use, if either endpoint is absent
    /// from the genome, if the destination is an input neuron,
    /// or if the endpoints are already linked.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{
    ///     ActivationFunction, ChromosomeMaterial, ConnectionAllele, NeuronAllele, NeuronType,
    /// };
    ///
    /// let mut genome = ChromosomeMaterial::new();
    /// genome.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear));
    /// genome.add_neuron(NeuronAllele::new(1, NeuronType::Output, ActivationFunction::Sigmoid));
    /// genome.add_connection(ConnectionAllele::new(2, 0, 1, 0.5));
    ///
    /// assert_eq!(genome.connection_between(0, 1).map(|c| c.innovation()), Some(2));
    /// ```
    pub fn add_connection(&mut self, connection: ConnectionAllele) {
        self.check_connection_viability(&connection)
            .unwrap_or_else(|e| panic!("{} in {}", e, self));
        self.connections.insert(connection.innovation(), connection);
    }

    fn check_innovation_unused(&self, id: Innovation) -> Result<(), AlleleValidityError> {
        if self.neurons.contains_key(&id) || self.connections.contains_key(&id) {
            Err(AlleleValidityError::DuplicateInnovation(id))
        } else {
            Ok(())
        }
    }

    fn check_connection_viability(
        &self,
        connection: &ConnectionAllele,
    ) -> Result<(), AlleleValidityError> {
        use AlleleValidityError::*;
        let id = connection.innovation();
        self.check_innovation_unused(id)?;
        for endpoint in [connection.src(), connection.dest()] {
            if !self.neurons.contains_key(&endpoint) {
                return Err(MissingEndpoint {
                    connection: id,
                    neuron: endpoint,
                });
            }
        }
        if self.neurons[&connection.dest()].neuron_type() == NeuronType::Input {
            return Err(InputDestination {
                connection: id,
                neuron: connection.dest(),
            });
        }
        if let Some(existing) = self.connection_between(connection.src(), connection.dest()) {
            return Err(DuplicateEndpoints {
                connection: id,
                existing: existing.innovation(),
                src: connection.src(),
                dest: connection.dest(),
            });
        }
        Ok(())
    }

    /// Removes and returns the connection with
    /// the given innovation number, if present.
    pub fn remove_connection(&mut self, id: Innovation) -> Option<ConnectionAllele> {
        self.connections.remove(&id)
    }

    /// Removes and returns the neuron with the given
    /// innovation number, if present, along with every
    /// connection entering or leaving it.
    pub fn remove_neuron(&mut self, id: Innovation) -> Option<(NeuronAllele, Vec<ConnectionAllele>)> {
        let neuron = self.neurons.remove(&id)?;
        let incident: Vec<Innovation> = self
            .connections
            .values()
            .filter(|c| c.src() == id || c.dest() == id)
            .map(|c| c.innovation())
            .collect();
        let removed = incident
            .into_iter()
            .filter_map(|c| self.connections.remove(&c))
            .collect();
        Some((neuron, removed))
    }

    /// Returns an iterator over the genome's neurons,
    /// in innovation order.
    pub fn neurons(&self) -> impl Iterator<Item = &NeuronAllele> {
        self.neurons.values()
    }

    /// Returns an iterator over the genome's connections,
    /// in innovation order.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionAllele> {
        self.connections.values()
    }

    pub(crate) fn connections_mut(&mut self) -> impl Iterator<Item = &mut ConnectionAllele> {
        self.connections.values_mut()
    }

    /// Returns an iterator over every allele, neurons first,
    /// each kind in innovation order.
    pub fn alleles(&self) -> impl Iterator<Item = Allele<'_>> {
        self.neurons
            .values()
            .map(Allele::Neuron)
            .chain(self.connections.values().map(Allele::Connection))
    }

    /// Returns an iterator over the neurons of one type,
    /// in innovation order.
    pub fn neurons_of_type(&self, neuron_type: NeuronType) -> impl Iterator<Item = &NeuronAllele> {
        self.neurons
            .values()
            .filter(move |n| n.neuron_type() == neuron_type)
    }

    /// Returns the ids of the input neurons, in innovation order.
    pub fn input_ids(&self) -> Vec<Innovation> {
        self.neurons_of_type(NeuronType::Input)
            .map(|n| n.innovation())
            .collect()
    }

    /// Returns the ids of the output neurons, in innovation order.
    pub fn output_ids(&self) -> Vec<Innovation> {
        self.neurons_of_type(NeuronType::Output)
            .map(|n| n.innovation())
            .collect()
    }

    /// Returns the neuron with the given innovation number.
    pub fn neuron(&self, id: Innovation) -> Option<&NeuronAllele> {
        self.neurons.get(&id)
    }

    /// Returns the connection with the given innovation number.
    pub fn connection(&self, id: Innovation) -> Option<&ConnectionAllele> {
        self.connections.get(&id)
    }

    /// Returns the connection linking `src` to `dest`, if any.
    pub fn connection_between(&self, src: Innovation, dest: Innovation) -> Option<&ConnectionAllele> {
        self.connections
            .values()
            .find(|c| c.src() == src && c.dest() == dest)
    }

    /// Number of neurons in the genome.
    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    /// Number of connections in the genome.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Total number of alleles in the genome.
    pub fn len(&self) -> usize {
        self.neurons.len() + self.connections.len()
    }

    /// Returns whether the genome has no alleles.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the highest innovation number in the genome.
    pub fn max_innovation(&self) -> Option<Innovation> {
        let max_neuron = self.neurons.keys().next_back().copied();
        let max_connection = self.connections.keys().next_back().copied();
        max_neuron.max(max_connection)
    }

    /// Returns whether a directed path leads from
    /// `src` to `dest` (or `src == dest`).
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{
    ///     ActivationFunction, ChromosomeMaterial, ConnectionAllele, NeuronAllele, NeuronType,
    /// };
    ///
    /// let mut genome = ChromosomeMaterial::new();
    /// for id in 0..3 {
    ///     genome.add_neuron(NeuronAllele::new(id, NeuronType::Hidden, ActivationFunction::Linear));
    /// }
    /// genome.add_connection(ConnectionAllele::new(3, 0, 1, 1.0));
    /// genome.add_connection(ConnectionAllele::new(4, 1, 2, 1.0));
    ///
    /// assert!(genome.neurons_are_connected(0, 2));
    /// assert!(!genome.neurons_are_connected(2, 0));
    /// ```
    pub fn neurons_are_connected(&self, src: Innovation, dest: Innovation) -> bool {
        let mut visited = BTreeSet::new();
        let mut pending = VecDeque::from([src]);
        while let Some(current) = pending.pop_front() {
            if current == dest {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            pending.extend(
                self.connections
                    .values()
                    .filter(|c| c.src() == current)
                    .map(|c| c.dest()),
            );
        }
        false
    }

    /// Returns the genetic distance from `self` to `candidate`:
    ///
    /// `(excess_coefficient × E + disjoint_coefficient × D) / N
    ///  + common_coefficient × W`
    ///
    /// where `E` counts unmatched alleles beyond the other genome's
    /// highest innovation number, `D` the remaining unmatched alleles,
    /// `N` the allele count of the larger genome (at least 1), and `W`
    /// the average weight difference of matching connections.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ChromosomeMaterial, GeneticConfig, InnovationTracker};
    /// use rand::SeedableRng;
    ///
    /// let config = GeneticConfig {
    ///     input_count: 2,
    ///     output_count: 1,
    ///     initial_fully_connected: true,
    ///     excess_coefficient: 1.0,
    ///     disjoint_coefficient: 1.0,
    ///     common_coefficient: 0.4,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
    /// let genome = ChromosomeMaterial::initial(&config, &mut InnovationTracker::new(), &mut rng);
    ///
    /// assert_eq!(genome.distance(&genome, &config), 0.0);
    /// ```
    pub fn distance(&self, candidate: &ChromosomeMaterial, config: &GeneticConfig) -> f64 {
        let own_max = self.max_innovation();
        let candidate_max = candidate.max_innovation();
        let mut excess = 0usize;
        let mut disjoint = 0usize;
        let mut classify_unmatched = |id: Innovation, other_max: Option<Innovation>| {
            if other_max.map_or(true, |max| id > max) {
                excess += 1;
            } else {
                disjoint += 1;
            }
        };

        for id in self.neurons.keys() {
            if !candidate.neurons.contains_key(id) {
                classify_unmatched(*id, candidate_max);
            }
        }
        for id in candidate.neurons.keys() {
            if !self.neurons.contains_key(id) {
                classify_unmatched(*id, own_max);
            }
        }

        let mut common = 0usize;
        let mut weight_difference = 0.0;
        for (id, connection) in &self.connections {
            match candidate.connections.get(id) {
                Some(other) => {
                    common += 1;
                    weight_difference += (connection.weight() - other.weight()).abs();
                }
                None => classify_unmatched(*id, candidate_max),
            }
        }
        for id in candidate.connections.keys() {
            if !self.connections.contains_key(id) {
                classify_unmatched(*id, own_max);
            }
        }

        let size = self.len().max(candidate.len()).max(1) as f64;
        let average_weight_difference = if common > 0 {
            weight_difference / common as f64
        } else {
            0.0
        };
        (config.excess_coefficient * excess as f64 + config.disjoint_coefficient * disjoint as f64)
            / size
            + config.common_coefficient * average_weight_difference
    }

    /// Returns the chromosome this genome was cloned
    /// from, or the dominant parent of the crossover
    /// that produced it.
    pub fn primary_parent(&self) -> Option<ChromosomeId> {
        self.primary_parent
    }

    /// Returns the recessive parent of the crossover
    /// that produced this genome, if any.
    pub fn secondary_parent(&self) -> Option<ChromosomeId> {
        self.secondary_parent
    }

    /// Records the chromosomes this genome descends from.
    pub fn set_parents(&mut self, primary: Option<ChromosomeId>, secondary: Option<ChromosomeId>) {
        self.primary_parent = primary;
        self.secondary_parent = secondary;
    }
}

impl fmt::Display for ChromosomeMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let neurons: Vec<String> = self.neurons.values().map(|n| n.to_string()).collect();
        let connections: Vec<String> = self.connections.values().map(|c| c.to_string()).collect();
        f.debug_struct("ChromosomeMaterial")
            .field("Neurons", &neurons)
            .field("Connections", &connections)
            .field("Parents", &(self.primary_parent, self.secondary_parent))
            .finish()
    }
}
