use crate::networks::{Connection, Neuron, RealTimeNetwork};
use crate::RecurrencyPolicy;
use cppneat::genomics::{ChromosomeMaterial, ConnectionAllele, GeneticConfig, NeuronAllele, NeuronType};
use cppneat::Innovation;

use ahash::RandomState;
use thiserror::Error;
use tracing::{debug, warn};

use std::collections::{BTreeSet, HashMap};

/// Errors raised while transcribing a genome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranscriberError {
    #[error("connection {connection} has missing source neuron {neuron}")]
    MissingSource {
        connection: Innovation,
        neuron: Innovation,
    },
    #[error("connection {connection} has missing destination neuron {neuron}")]
    MissingDestination {
        connection: Innovation,
        neuron: Innovation,
    },
}

/// Builds [`RealTimeNetwork`]s from genomes.
///
/// Connections are gathered layer by layer, walking backwards from
/// the output neurons. Whether a connection reads its source's
/// current value or the value from the previous step is decided
/// by the [`RecurrencyPolicy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transcriber {
    policy: RecurrencyPolicy,
    cycles: usize,
}

impl Transcriber {
    /// Creates a transcriber producing networks
    /// fully activated once per step.
    pub fn new(policy: RecurrencyPolicy) -> Transcriber {
        Transcriber { policy, cycles: 1 }
    }

    /// Creates a transcriber using the policy and
    /// cycle count of a genetic configuration.
    pub fn from_config(config: &GeneticConfig) -> Transcriber {
        Transcriber::new(config.recurrency).with_cycles(config.recurrent_cycles)
    }

    /// Sets the number of full activations per step.
    pub fn with_cycles(mut self, cycles: usize) -> Transcriber {
        self.cycles = cycles;
        self
    }

    pub fn policy(&self) -> RecurrencyPolicy {
        self.policy
    }

    /// Generates a network from the passed genome.
    ///
    /// Connections and neurons not reachable backwards from
    /// the outputs are left out of the activation path, and
    /// logged as a warning.
    ///
    /// # Errors
    /// Returns an error if a connection references
    /// a neuron missing from the genome.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ChromosomeMaterial, GeneticConfig, InnovationTracker};
    /// use cppneat::rng::seeded;
    /// use cppneat_nn::{RecurrencyPolicy, Transcriber};
    ///
    /// let config = GeneticConfig {
    ///     input_count: 3,
    ///     output_count: 2,
    ///     initial_fully_connected: true,
    ///     ..GeneticConfig::zero()
    /// };
    /// let material = ChromosomeMaterial::initial(&config, &mut InnovationTracker::new(), &mut seeded(0));
    ///
    /// let network = Transcriber::new(RecurrencyPolicy::BestGuess)
    ///     .transcribe(&material)
    ///     .unwrap();
    ///
    /// assert_eq!(network.input_count(), 3);
    /// assert_eq!(network.output_count(), 2);
    /// assert!(!network.is_recurrent());
    /// ```
    pub fn transcribe(&self, material: &ChromosomeMaterial) -> Result<RealTimeNetwork, TranscriberError> {
        let input_ids: Vec<Innovation> = material.input_ids();
        let output_ids: Vec<Innovation> = material.output_ids();

        let ordered: Vec<&NeuronAllele> = [NeuronType::Input, NeuronType::Output, NeuronType::Hidden]
            .iter()
            .flat_map(|t| material.neurons_of_type(*t))
            .collect();
        let index_of: HashMap<Innovation, usize, RandomState> = ordered
            .iter()
            .enumerate()
            .map(|(i, n)| (n.innovation(), i))
            .collect();
        let mut neurons: Vec<Neuron> = ordered
            .iter()
            .map(|n| Neuron::new(n.innovation(), n.activation()))
            .collect();

        let mut remaining: Vec<&ConnectionAllele> = material.connections().collect();
        let mut current: BTreeSet<Innovation> = output_ids.iter().copied().collect();
        let mut traversed = current.clone();
        let mut layer_count = 0;

        while !remaining.is_empty() && !current.is_empty() {
            let (layer, rest): (Vec<_>, Vec<_>) =
                remaining.into_iter().partition(|c| current.contains(&c.dest()));
            remaining = rest;

            let mut next = BTreeSet::new();
            for allele in layer {
                let src = *index_of
                    .get(&allele.src())
                    .ok_or(TranscriberError::MissingSource {
                        connection: allele.innovation(),
                        neuron: allele.src(),
                    })?;
                let dest = *index_of
                    .get(&allele.dest())
                    .ok_or(TranscriberError::MissingDestination {
                        connection: allele.innovation(),
                        neuron: allele.dest(),
                    })?;
                let cached = match self.policy {
                    RecurrencyPolicy::Lazy => true,
                    RecurrencyPolicy::Disallowed => false,
                    RecurrencyPolicy::BestGuess => traversed.contains(&allele.src()),
                };
                let connection = if cached {
                    Connection::recurrent(allele.innovation(), src, allele.weight())
                } else {
                    Connection::feed_forward(allele.innovation(), src, allele.weight())
                };
                neurons[dest].add_incoming(connection);
                next.insert(allele.src());
            }
            traversed.extend(next.iter().copied());
            current = next;
            layer_count += 1;
        }

        if !remaining.is_empty() {
            warn!(
                unhandled = remaining.len(),
                "not all connection genes handled: {}", material
            );
        }
        traversed.extend(input_ids.iter().copied());
        if traversed.len() != neurons.len() {
            warn!(
                untraversed = neurons.len() - traversed.len(),
                "did not traverse all neurons: {}", material
            );
        }
        debug!(
            layers = layer_count,
            neurons = neurons.len(),
            policy = %self.policy,
            "transcribed network"
        );

        Ok(RealTimeNetwork::new(
            input_ids.len(),
            output_ids.len(),
            neurons,
            self.cycles,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cppneat::genomics::ActivationFunction;

    use assert_approx_eq::assert_approx_eq;

    /// 0, 1 -> 2 -> 3 (output), with 3 -> 2 closing a loop.
    fn looped() -> ChromosomeMaterial {
        let mut material = ChromosomeMaterial::new();
        material.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear));
        material.add_neuron(NeuronAllele::new(1, NeuronType::Input, ActivationFunction::Linear));
        material.add_neuron(NeuronAllele::new(2, NeuronType::Hidden, ActivationFunction::Linear));
        material.add_neuron(NeuronAllele::new(3, NeuronType::Output, ActivationFunction::Linear));
        material.add_connection(ConnectionAllele::new(4, 0, 2, 1.0));
        material.add_connection(ConnectionAllele::new(5, 1, 2, 1.0));
        material.add_connection(ConnectionAllele::new(6, 2, 3, 1.0));
        material.add_connection(ConnectionAllele::new(7, 3, 2, 0.5));
        material
    }

    #[test]
    fn policies_classify_connections() {
        let disallowed = Transcriber::new(RecurrencyPolicy::Disallowed)
            .transcribe(&looped())
            .unwrap();
        assert!(!disallowed.is_recurrent());

        let lazy = Transcriber::new(RecurrencyPolicy::Lazy)
            .transcribe(&looped())
            .unwrap();
        assert!(lazy.is_recurrent());

        // Only 3 -> 2 has a source already visited by the backward walk.
        let mut best_guess = Transcriber::new(RecurrencyPolicy::BestGuess)
            .transcribe(&looped())
            .unwrap();
        assert!(best_guess.is_recurrent());
        assert_approx_eq!(best_guess.activate(&[1.0, 1.0])[0], 2.0);
        assert_approx_eq!(best_guess.activate(&[1.0, 1.0])[0], 3.0);
    }

    #[test]
    fn neurons_are_ordered_inputs_outputs_hidden() {
        let network = Transcriber::new(RecurrencyPolicy::Disallowed)
            .transcribe(&looped())
            .unwrap();
        let text = network.to_string();
        let order: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|l| l.trim().split(' ').next().unwrap())
            .collect();
        assert_eq!(order, ["0", "1", "3", "2"]);
    }

    #[test]
    fn unreached_structure_is_not_fatal() {
        let mut material = looped();
        material.add_neuron(NeuronAllele::new(8, NeuronType::Hidden, ActivationFunction::Sigmoid));
        material.add_connection(ConnectionAllele::new(9, 0, 8, 1.0));
        let mut network = Transcriber::new(RecurrencyPolicy::BestGuess)
            .transcribe(&material)
            .unwrap();
        assert_approx_eq!(network.activate(&[1.0, 1.0])[0], 2.0);
    }

    #[test]
    fn missing_neuron_is_an_error() {
        let mut value = serde_json::to_value(looped()).unwrap();
        value["neurons"].as_object_mut().unwrap().remove("1");
        let broken: ChromosomeMaterial = serde_json::from_value(value).unwrap();
        assert_eq!(
            Transcriber::new(RecurrencyPolicy::Disallowed)
                .transcribe(&broken)
                .err(),
            Some(TranscriberError::MissingSource {
                connection: 5,
                neuron: 1
            })
        );
    }

    #[test]
    fn config_sets_policy_and_cycles() {
        let transcriber = Transcriber::from_config(&GeneticConfig {
            recurrency: RecurrencyPolicy::Lazy,
            recurrent_cycles: 4,
            ..GeneticConfig::zero()
        });
        assert_eq!(transcriber.policy(), RecurrencyPolicy::Lazy);
        let network = transcriber.transcribe(&looped()).unwrap();
        assert_eq!(network.cycles(), 4);
    }
}
