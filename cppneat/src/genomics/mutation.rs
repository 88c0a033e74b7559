use crate::genomics::{
    ActivationFunction, ChromosomeMaterial, ConnectionAllele, GeneticConfig, InnovationTracker,
    NeuronAllele, NeuronType,
};
use crate::rng::{gen_bool, num_mutations};
use crate::Innovation;

use rand::seq::SliceRandom;
use rand::Rng;

use std::collections::{BTreeSet, VecDeque};

impl ChromosomeMaterial {
    /// Applies every mutation operator to the genome, in order:
    /// topological mutations, activation replacement, weight
    /// perturbation, weak connection removal and pruning.
    ///
    /// New structure is named through `tracker`, so identical
    /// mutations across the population share innovation numbers.
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        tracker: &mut InnovationTracker,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        if config.topology_mutation_classic {
            self.mutate_topology_classic(tracker, config, rng);
        } else {
            self.mutate_add_connections(tracker, config, rng);
            self.mutate_add_neurons(tracker, config, rng);
        }
        self.mutate_activations(tracker, rng, config.activation_mutation_rate);
        self.mutate_weights(config, rng);
        self.mutate_remove_connections(config, rng);
        if gen_bool(rng, config.prune_rate) {
            self.prune();
        }
    }

    /// Applies at most one topological mutation: a neuron
    /// addition with chance [`add_neuron_rate`], otherwise a
    /// connection addition with chance [`add_connection_rate`].
    ///
    /// [`add_neuron_rate`]: GeneticConfig::add_neuron_rate
    /// [`add_connection_rate`]: GeneticConfig::add_connection_rate
    fn mutate_topology_classic<R: Rng + ?Sized>(
        &mut self,
        tracker: &mut InnovationTracker,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        let roll = rng.gen::<f64>();
        if roll < config.add_neuron_rate {
            let ids: Vec<Innovation> = self.connections().map(|c| c.innovation()).collect();
            if let Some(&id) = ids.choose(rng) {
                self.split_connection(id, tracker, config, rng);
            }
        } else if roll < config.add_neuron_rate + config.add_connection_rate {
            for _ in 0..self.neuron_count() {
                if self.try_add_random_connection(tracker, config, rng).is_some() {
                    break;
                }
            }
        }
    }

    /// Attempts one connection addition per neuron with chance
    /// [`add_connection_rate`] each. Returns the ids of the
    /// connections actually added.
    ///
    /// [`add_connection_rate`]: GeneticConfig::add_connection_rate
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ChromosomeMaterial, GeneticConfig, InnovationTracker};
    ///
    /// let config = GeneticConfig {
    ///     input_count: 2,
    ///     output_count: 2,
    ///     add_connection_rate: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = cppneat::rng::seeded(3);
    /// let mut tracker = InnovationTracker::new();
    /// let mut genome = ChromosomeMaterial::initial(&config, &mut tracker, &mut rng);
    ///
    /// let added = genome.mutate_add_connections(&mut tracker, &config, &mut rng);
    ///
    /// assert_eq!(genome.connections().count(), added.len());
    /// ```
    pub fn mutate_add_connections<R: Rng + ?Sized>(
        &mut self,
        tracker: &mut InnovationTracker,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Vec<Innovation> {
        let attempts = num_mutations(rng, config.add_connection_rate, self.neuron_count());
        (0..attempts)
            .filter_map(|_| self.try_add_random_connection(tracker, config, rng))
            .collect()
    }

    /// Picks a random source and a random non-input destination,
    /// and links them unless they already are, they are the same
    /// neuron, or the link would close a forbidden loop.
    fn try_add_random_connection<R: Rng + ?Sized>(
        &mut self,
        tracker: &mut InnovationTracker,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Option<Innovation> {
        let sources: Vec<Innovation> = self.neurons().map(|n| n.innovation()).collect();
        let destinations: Vec<Innovation> = self
            .neurons()
            .filter(|n| n.neuron_type() != NeuronType::Input)
            .map(|n| n.innovation())
            .collect();
        let src = *sources.choose(rng)?;
        let dest = *destinations.choose(rng)?;

        if src == dest || self.connection_between(src, dest).is_some() {
            return None;
        }
        if !config.recurrency.allows_loops() && self.neurons_are_connected(dest, src) {
            return None;
        }

        let id = tracker.find_or_create_connection_id(src, dest);
        if self.connection(id).is_some() || self.neuron(id).is_some() {
            return None;
        }
        let weight = ConnectionAllele::random_weight(config, rng);
        self.add_connection(ConnectionAllele::new(id, src, dest, weight));
        Some(id)
    }

    /// Splits each connection present before the call with chance
    /// [`add_neuron_rate`]. Returns the ids of the new neurons.
    ///
    /// [`add_neuron_rate`]: GeneticConfig::add_neuron_rate
    pub fn mutate_add_neurons<R: Rng + ?Sized>(
        &mut self,
        tracker: &mut InnovationTracker,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Vec<Innovation> {
        let ids: Vec<Innovation> = self.connections().map(|c| c.innovation()).collect();
        ids.into_iter()
            .filter(|_| gen_bool(rng, config.add_neuron_rate))
            .collect::<Vec<_>>()
            .into_iter()
            .filter_map(|id| self.split_connection(id, tracker, config, rng))
            .collect()
    }

    /// Replaces connection `id` with a hidden neuron and two
    /// connections: one into the neuron with weight 1, and one out
    /// of it carrying the old weight. Returns the new neuron's id,
    /// or `None` if the connection is absent or the genome already
    /// holds the neuron this split maps to.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ChromosomeMaterial, GeneticConfig, InnovationTracker};
    ///
    /// let config = GeneticConfig {
    ///     input_count: 1,
    ///     output_count: 1,
    ///     initial_fully_connected: true,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = cppneat::rng::seeded(0);
    /// let mut tracker = InnovationTracker::new();
    /// let mut genome = ChromosomeMaterial::initial(&config, &mut tracker, &mut rng);
    /// let split = genome.connections().next().unwrap().clone();
    ///
    /// let neuron = genome
    ///     .split_connection(split.innovation(), &mut tracker, &config, &mut rng)
    ///     .unwrap();
    ///
    /// assert!(genome.connection(split.innovation()).is_none());
    /// assert_eq!(genome.connection_between(split.src(), neuron).unwrap().weight(), 1.0);
    /// assert_eq!(genome.connection_between(neuron, split.dest()).unwrap().weight(), split.weight());
    /// ```
    pub fn split_connection<R: Rng + ?Sized>(
        &mut self,
        id: Innovation,
        tracker: &mut InnovationTracker,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Option<Innovation> {
        let (src, dest, weight) = {
            let split = self.connection(id)?;
            (split.src(), split.dest(), split.weight())
        };
        let neuron_id = tracker.find_or_create_neuron_id(id);
        if self.neuron(neuron_id).is_some() {
            return None;
        }

        self.remove_connection(id);
        let activation = config.hidden_activation.pick(rng);
        self.add_neuron(NeuronAllele::new(neuron_id, NeuronType::Hidden, activation));
        let into = tracker.find_or_create_connection_id(src, neuron_id);
        self.add_connection(ConnectionAllele::new(into, src, neuron_id, 1.0));
        let out_of = tracker.find_or_create_connection_id(neuron_id, dest);
        self.add_connection(ConnectionAllele::new(out_of, neuron_id, dest, weight));
        Some(neuron_id)
    }

    /// Replaces each hidden neuron, with chance `rate`, by a new
    /// neuron with a freshly minted id and a random CPPN activation,
    /// wired to the same neighbours with the same weights.
    /// Returns the ids of the replacement neurons.
    pub fn mutate_activations<R: Rng + ?Sized>(
        &mut self,
        tracker: &mut InnovationTracker,
        rng: &mut R,
        rate: f64,
    ) -> Vec<Innovation> {
        let hidden: Vec<Innovation> = self
            .neurons_of_type(NeuronType::Hidden)
            .map(|n| n.innovation())
            .collect();
        hidden
            .into_iter()
            .filter(|_| gen_bool(rng, rate))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|old| self.replace_neuron(old, ActivationFunction::random_cppn(rng), tracker))
            .collect()
    }

    fn replace_neuron(
        &mut self,
        old: Innovation,
        activation: ActivationFunction,
        tracker: &mut InnovationTracker,
    ) -> Innovation {
        let new = tracker.mint();
        let mut neuron = NeuronAllele::new(new, NeuronType::Hidden, activation);
        if let Some(label) = self.neuron(old).and_then(|n| n.label()) {
            neuron = neuron.with_label(label);
        }
        self.add_neuron(neuron);

        let rewired: Vec<(Innovation, Innovation, f64)> = self
            .connections()
            .filter(|c| c.src() == old || c.dest() == old)
            .map(|c| {
                let src = if c.src() == old { new } else { c.src() };
                let dest = if c.dest() == old { new } else { c.dest() };
                (src, dest, c.weight())
            })
            .collect();
        self.remove_neuron(old);
        for (src, dest, weight) in rewired {
            let id = tracker.find_or_create_connection_id(src, dest);
            self.add_connection(ConnectionAllele::new(id, src, dest, weight));
        }
        new
    }

    /// Perturbs each connection weight with chance
    /// [`weight_mutation_rate`].
    ///
    /// [`weight_mutation_rate`]: GeneticConfig::weight_mutation_rate
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for connection in self.connections_mut() {
            if gen_bool(rng, config.weight_mutation_rate) {
                connection.perturb_weight(config, rng);
            }
        }
    }

    /// Removes each connection whose weight magnitude is below
    /// [`remove_connection_max_weight`] with chance
    /// [`remove_connection_rate`]. Returns the removed connections.
    ///
    /// [`remove_connection_max_weight`]: GeneticConfig::remove_connection_max_weight
    /// [`remove_connection_rate`]: GeneticConfig::remove_connection_rate
    pub fn mutate_remove_connections<R: Rng + ?Sized>(
        &mut self,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Vec<ConnectionAllele> {
        let weak: Vec<Innovation> = self
            .connections()
            .filter(|c| c.weight().abs() < config.remove_connection_max_weight)
            .map(|c| c.innovation())
            .collect();
        weak.into_iter()
            .filter(|_| gen_bool(rng, config.remove_connection_rate))
            .collect::<Vec<_>>()
            .into_iter()
            .filter_map(|id| self.remove_connection(id))
            .collect()
    }

    /// Removes every hidden neuron and connection from which
    /// no output neuron can be reached. Input and output neurons
    /// are always kept.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{
    ///     ActivationFunction, ChromosomeMaterial, ConnectionAllele, NeuronAllele, NeuronType,
    /// };
    ///
    /// let mut genome = ChromosomeMaterial::new();
    /// genome.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear));
    /// genome.add_neuron(NeuronAllele::new(1, NeuronType::Output, ActivationFunction::Linear));
    /// genome.add_neuron(NeuronAllele::new(2, NeuronType::Hidden, ActivationFunction::Linear));
    /// genome.add_connection(ConnectionAllele::new(3, 0, 1, 1.0));
    /// genome.add_connection(ConnectionAllele::new(4, 0, 2, 1.0));
    ///
    /// genome.prune();
    ///
    /// assert!(genome.neuron(2).is_none());
    /// assert!(genome.connection(4).is_none());
    /// assert!(genome.connection(3).is_some());
    /// ```
    pub fn prune(&mut self) {
        let mut reaching: BTreeSet<Innovation> = BTreeSet::new();
        let mut pending: VecDeque<Innovation> = self
            .neurons_of_type(NeuronType::Output)
            .map(|n| n.innovation())
            .collect();
        while let Some(current) = pending.pop_front() {
            if !reaching.insert(current) {
                continue;
            }
            pending.extend(
                self.connections()
                    .filter(|c| c.dest() == current)
                    .map(|c| c.src()),
            );
        }

        let dead_connections: Vec<Innovation> = self
            .connections()
            .filter(|c| !reaching.contains(&c.dest()))
            .map(|c| c.innovation())
            .collect();
        for id in dead_connections {
            self.remove_connection(id);
        }
        let dead_neurons: Vec<Innovation> = self
            .neurons_of_type(NeuronType::Hidden)
            .filter(|n| !reaching.contains(&n.innovation()))
            .map(|n| n.innovation())
            .collect();
        for id in dead_neurons {
            self.remove_neuron(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{HiddenActivation, RecurrencyPolicy};
    use crate::rng::seeded;

    fn config() -> GeneticConfig {
        GeneticConfig {
            input_count: 3,
            output_count: 2,
            initial_fully_connected: true,
            weight_min: -5.0,
            weight_max: 5.0,
            weight_mutation_std_dev: 1.0,
            hidden_activation: HiddenActivation::RandomCppn,
            ..GeneticConfig::zero()
        }
    }

    #[test]
    fn split_scenario_replays_neuron_id() {
        let config = config();
        let mut rng = seeded(5);
        let mut tracker = InnovationTracker::new();
        let sample = ChromosomeMaterial::initial(&config, &mut tracker, &mut rng);
        let split = sample.connections().nth(2).unwrap().clone();

        let mut first = sample.clone();
        let n1 = first.split_connection(split.innovation(), &mut tracker, &config, &mut rng).unwrap();
        assert!(first.connection(split.innovation()).is_none());
        assert_eq!(first.connection_between(split.src(), n1).unwrap().weight(), 1.0);
        assert_eq!(first.connection_between(n1, split.dest()).unwrap().weight(), split.weight());
        assert_eq!(first.neuron(n1).unwrap().neuron_type(), NeuronType::Hidden);

        let mut second = sample.clone();
        let n2 = second.split_connection(split.innovation(), &mut tracker, &config, &mut rng).unwrap();
        assert_eq!(n1, n2);
        assert_eq!(
            first.connections().map(|c| c.innovation()).collect::<Vec<_>>(),
            second.connections().map(|c| c.innovation()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn split_twice_in_one_genome_is_refused() {
        let config = config();
        let mut rng = seeded(5);
        let mut tracker = InnovationTracker::new();
        let mut genome = ChromosomeMaterial::initial(&config, &mut tracker, &mut rng);
        let id = genome.connections().next().unwrap().innovation();
        assert!(genome.split_connection(id, &mut tracker, &config, &mut rng).is_some());
        assert!(genome.split_connection(id, &mut tracker, &config, &mut rng).is_none());
    }

    #[test]
    fn connection_additions_share_innovations() {
        // One input and one output leave a single legal connection.
        let config = GeneticConfig {
            input_count: 1,
            output_count: 1,
            initial_fully_connected: false,
            add_connection_rate: 1.0,
            recurrency: RecurrencyPolicy::Disallowed,
            ..config()
        };
        let mut tracker = InnovationTracker::new();
        let sample = ChromosomeMaterial::initial(&config, &mut tracker, &mut seeded(8));
        let (input, output) = (sample.input_ids()[0], sample.output_ids()[0]);

        let mut added = vec![];
        for seed in [1, 2] {
            let mut rng = seeded(seed);
            let mut genome = sample.clone();
            for _ in 0..50 {
                if genome.connections().count() > 0 {
                    break;
                }
                genome.mutate_add_connections(&mut tracker, &config, &mut rng);
            }
            let connection = genome.connection_between(input, output).unwrap();
            assert_eq!(genome.connections().count(), 1);
            added.push(connection.innovation());
        }
        assert_eq!(added[0], added[1]);
        assert_eq!(tracker.connection_id(input, output), Some(added[0]));
    }

    #[test]
    fn disallowed_recurrency_never_closes_loops() {
        let config = GeneticConfig {
            add_connection_rate: 1.0,
            add_neuron_rate: 0.3,
            recurrency: RecurrencyPolicy::Disallowed,
            ..config()
        };
        let mut rng = seeded(11);
        let mut tracker = InnovationTracker::new();
        let mut genome = ChromosomeMaterial::initial(&config, &mut tracker, &mut rng);
        for _ in 0..20 {
            genome.mutate_add_neurons(&mut tracker, &config, &mut rng);
            genome.mutate_add_connections(&mut tracker, &config, &mut rng);
        }
        for c in genome.connections() {
            assert_ne!(c.src(), c.dest());
            assert!(!genome.neurons_are_connected(c.dest(), c.src()));
        }
    }

    #[test]
    fn activation_mutation_rewires_replacement() {
        let config = GeneticConfig {
            initial_hidden_count: 2,
            ..config()
        };
        let mut rng = seeded(2);
        let mut tracker = InnovationTracker::new();
        let mut genome = ChromosomeMaterial::initial(&config, &mut tracker, &mut rng);
        let connections_before = genome.connection_count();
        let old: Vec<Innovation> = genome
            .neurons_of_type(NeuronType::Hidden)
            .map(|n| n.innovation())
            .collect();

        let replacements = genome.mutate_activations(&mut tracker, &mut rng, 1.0);

        assert_eq!(replacements.len(), 2);
        assert_eq!(genome.connection_count(), connections_before);
        for id in old {
            assert!(genome.neuron(id).is_none());
        }
        for id in replacements {
            let neuron = genome.neuron(id).unwrap();
            assert!(ActivationFunction::CPPN.contains(&neuron.activation()));
            assert_eq!(genome.connections().filter(|c| c.dest() == id).count(), 3);
            assert_eq!(genome.connections().filter(|c| c.src() == id).count(), 2);
        }
    }

    #[test]
    fn activation_mutation_keeps_self_loops() {
        let mut genome = ChromosomeMaterial::new();
        genome.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear));
        genome.add_neuron(NeuronAllele::new(1, NeuronType::Hidden, ActivationFunction::Linear));
        genome.add_neuron(NeuronAllele::new(2, NeuronType::Output, ActivationFunction::Linear));
        genome.add_connection(ConnectionAllele::new(3, 0, 1, 0.5));
        genome.add_connection(ConnectionAllele::new(4, 1, 1, 0.25));
        genome.add_connection(ConnectionAllele::new(5, 1, 2, 2.0));
        let mut tracker = InnovationTracker::new();
        for _ in 0..6 {
            tracker.mint();
        }

        let new = genome.mutate_activations(&mut tracker, &mut seeded(0), 1.0)[0];

        assert_eq!(genome.connection_between(0, new).unwrap().weight(), 0.5);
        assert_eq!(genome.connection_between(new, new).unwrap().weight(), 0.25);
        assert_eq!(genome.connection_between(new, 2).unwrap().weight(), 2.0);
        assert_eq!(genome.connection_count(), 3);
    }

    #[test]
    fn weak_connection_removal() {
        let mut genome = ChromosomeMaterial::new();
        genome.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear));
        genome.add_neuron(NeuronAllele::new(1, NeuronType::Output, ActivationFunction::Linear));
        genome.add_neuron(NeuronAllele::new(2, NeuronType::Output, ActivationFunction::Linear));
        genome.add_connection(ConnectionAllele::new(3, 0, 1, 0.001));
        genome.add_connection(ConnectionAllele::new(4, 0, 2, 3.0));
        let config = GeneticConfig {
            remove_connection_rate: 1.0,
            remove_connection_max_weight: 0.01,
            ..GeneticConfig::zero()
        };

        let removed = genome.mutate_remove_connections(&config, &mut seeded(0));

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].innovation(), 3);
        assert!(genome.connection(4).is_some());
    }

    #[test]
    fn classic_mode_adds_at_most_one_structure() {
        let config = GeneticConfig {
            topology_mutation_classic: true,
            add_connection_rate: 0.5,
            add_neuron_rate: 0.5,
            initial_hidden_count: 1,
            ..config()
        };
        let mut rng = seeded(21);
        let mut tracker = InnovationTracker::new();
        let sample = ChromosomeMaterial::initial(&config, &mut tracker, &mut rng);
        for _ in 0..25 {
            let mut genome = sample.clone();
            genome.mutate_topology_classic(&mut tracker, &config, &mut rng);
            let neurons = genome.neuron_count() - sample.neuron_count();
            let connections = genome.connection_count() as i64 - sample.connection_count() as i64;
            assert!(
                (neurons == 0 && (0..=1).contains(&connections))
                    || (neurons == 1 && connections == 1)
            );
        }
    }

    #[test]
    fn mutation_is_reproducible() {
        let config = GeneticConfig {
            add_connection_rate: 0.3,
            add_neuron_rate: 0.3,
            weight_mutation_rate: 0.8,
            activation_mutation_rate: 0.2,
            prune_rate: 1.0,
            ..config()
        };
        let run = || {
            let mut rng = seeded(99);
            let mut tracker = InnovationTracker::new();
            let mut genome = ChromosomeMaterial::initial(&config, &mut tracker, &mut rng);
            for _ in 0..15 {
                genome.mutate(&mut tracker, &config, &mut rng);
            }
            genome
        };
        assert_eq!(run(), run());
    }
}
