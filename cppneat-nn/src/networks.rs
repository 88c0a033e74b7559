//! A network is a near-isomorphism of a genome,
//! generated as its phenotype. Neuron alleles become
//! network neurons, and connection alleles become
//! incoming connections of their destination neuron.
//!
//! The [`RealTimeNetwork`] type is best suited for real-time
//! control tasks, with new inputs set for each activation,
//! and multiple time-steps involved. Networks are built
//! by a [`Transcriber`].
//!
//! [`Transcriber`]: crate::Transcriber
mod connection;

pub(crate) use connection::Connection;

use cppneat::genomics::ActivationFunction;
use cppneat::Innovation;

use std::fmt;

/// Resource cost of a neuron without connections.
const NEURON_COST: u64 = 315;
/// Resource cost of reading one incoming connection.
const CONNECTION_COST: u64 = 57;
/// Resource cost of iterating over one incoming connection.
const CONNECTION_ITERATION_COST: u64 = 115;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NeuronState {
    /// The value must be recomputed before being read.
    Dirty,
    /// The value is being computed; reading it
    /// yields the previous one.
    Evaluating,
    /// The value is up to date for the current step.
    Clean,
}

#[derive(Clone, Debug)]
pub(crate) struct Neuron {
    id: Innovation,
    activation: ActivationFunction,
    incoming: Vec<Connection>,
    value: f64,
    state: NeuronState,
}

impl Neuron {
    pub fn new(id: Innovation, activation: ActivationFunction) -> Neuron {
        Neuron {
            id,
            activation,
            incoming: vec![],
            value: 0.0,
            state: NeuronState::Dirty,
        }
    }

    pub fn add_incoming(&mut self, connection: Connection) {
        self.incoming.push(connection);
    }

    fn cost(&self) -> u64 {
        NEURON_COST
            + self.incoming.len() as u64 * (CONNECTION_COST + CONNECTION_ITERATION_COST)
            + self.activation.cost()
    }
}

/// An arbitrarily-structured neural network.
///
/// Neuron values are computed lazily: reading an output
/// pulls values through feed-forward connections, while
/// recurrent connections read the value their source
/// had at the previous [`step`].
///
/// [`step`]: RealTimeNetwork::step
#[derive(Clone, Debug)]
pub struct RealTimeNetwork {
    input_count: usize,
    output_count: usize,
    /// Inputs, then outputs, then hidden neurons,
    /// each group ordered by innovation number.
    neurons: Box<[Neuron]>,
    /// (neuron index, connection index) of every
    /// recurrent connection.
    recurrent: Box<[(usize, usize)]>,
    cycles: usize,
}

impl RealTimeNetwork {
    pub(crate) fn new(
        input_count: usize,
        output_count: usize,
        neurons: Vec<Neuron>,
        cycles: usize,
    ) -> RealTimeNetwork {
        let recurrent = neurons
            .iter()
            .enumerate()
            .flat_map(|(n, neuron)| {
                neuron
                    .incoming
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.is_recurrent())
                    .map(move |(c, _)| (n, c))
            })
            .collect();
        let mut network = RealTimeNetwork {
            input_count,
            output_count,
            neurons: neurons.into(),
            recurrent,
            cycles: cycles.max(1),
        };
        network.reset();
        network
    }

    /// Clamps each input neuron to the corresponding
    /// value in `values`, through its activation function.
    ///
    /// # Panics
    /// Panics if the length of `values` is not equal
    /// to the number of inputs in the network.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ActivationFunction, ChromosomeMaterial, NeuronAllele, NeuronType};
    /// use cppneat_nn::{RecurrencyPolicy, Transcriber};
    ///
    /// let mut material = ChromosomeMaterial::new();
    /// material.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear));
    ///
    /// let mut network = Transcriber::new(RecurrencyPolicy::Disallowed)
    ///     .transcribe(&material)
    ///     .unwrap();
    /// network.set_inputs(&[1.0]);
    /// ```
    pub fn set_inputs(&mut self, values: &[f64]) {
        assert_eq!(
            values.len(),
            self.input_count,
            "expected {} inputs",
            self.input_count
        );
        for (neuron, value) in self.neurons[..self.input_count].iter_mut().zip(values) {
            neuron.value = neuron.activation.apply(*value);
            neuron.state = NeuronState::Clean;
        }
    }

    /// Computes the value of every neuron
    /// for the current step.
    pub fn fully_activate(&mut self) {
        for index in 0..self.neurons.len() {
            self.value_of(index);
        }
    }

    /// Moves the network to the next time-step: recurrent
    /// connections latch their source's current value, and
    /// every non-input neuron is marked for recomputation.
    pub fn step(&mut self) {
        for &(neuron, connection) in self.recurrent.iter() {
            let src = self.neurons[neuron].incoming[connection].src;
            let value = self.neurons[src].value;
            self.neurons[neuron].incoming[connection].cache = Some(value);
        }
        for neuron in self.neurons[self.input_count..].iter_mut() {
            neuron.state = NeuronState::Dirty;
        }
    }

    /// Sets the inputs, fully activates the network once
    /// per configured recurrent cycle, reads the outputs
    /// and steps the network.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ActivationFunction, ChromosomeMaterial, ConnectionAllele, NeuronAllele, NeuronType};
    /// use cppneat_nn::{RecurrencyPolicy, Transcriber};
    ///
    /// let mut material = ChromosomeMaterial::new();
    /// material.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear));
    /// material.add_neuron(NeuronAllele::new(1, NeuronType::Input, ActivationFunction::Linear));
    /// material.add_neuron(NeuronAllele::new(2, NeuronType::Output, ActivationFunction::Linear));
    /// material.add_connection(ConnectionAllele::new(3, 0, 2, 2.5));
    /// material.add_connection(ConnectionAllele::new(4, 1, 2, -2.5));
    ///
    /// let mut network = Transcriber::new(RecurrencyPolicy::Disallowed)
    ///     .transcribe(&material)
    ///     .unwrap();
    ///
    /// assert_eq!(network.activate(&[0.5, 1.0]), vec![0.5 * 2.5 + 1.0 * -2.5]);
    /// ```
    pub fn activate(&mut self, inputs: &[f64]) -> Vec<f64> {
        self.set_inputs(inputs);
        for cycle in 0..self.cycles {
            if cycle > 0 {
                self.step();
            }
            self.fully_activate();
        }
        let outputs = self.outputs();
        self.step();
        outputs
    }

    /// Returns the output neuron values, computing
    /// any that are not up to date.
    pub fn outputs(&mut self) -> Vec<f64> {
        (self.input_count..self.input_count + self.output_count)
            .map(|index| self.value_of(index))
            .collect()
    }

    /// Clears the state of all neurons and
    /// recurrent connections.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ActivationFunction, ChromosomeMaterial, ConnectionAllele, NeuronAllele, NeuronType};
    /// use cppneat_nn::{RecurrencyPolicy, Transcriber};
    ///
    /// let mut material = ChromosomeMaterial::new();
    /// material.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear));
    /// material.add_neuron(NeuronAllele::new(1, NeuronType::Output, ActivationFunction::Linear));
    /// material.add_connection(ConnectionAllele::new(2, 0, 1, 1.0));
    ///
    /// let mut network = Transcriber::new(RecurrencyPolicy::Lazy)
    ///     .transcribe(&material)
    ///     .unwrap();
    /// network.activate(&[1.0]);
    /// assert_eq!(network.activate(&[0.0]), vec![1.0]);
    ///
    /// network.reset();
    ///
    /// assert_eq!(network.activate(&[0.0]), vec![0.0]);
    /// ```
    pub fn reset(&mut self) {
        for neuron in self.neurons.iter_mut() {
            neuron.value = 0.0;
            neuron.state = NeuronState::Dirty;
            for connection in neuron.incoming.iter_mut().filter(|c| c.is_recurrent()) {
                connection.cache = Some(0.0);
            }
        }
        for neuron in self.neurons[..self.input_count].iter_mut() {
            neuron.state = NeuronState::Clean;
        }
    }

    /// Returns the value of the neuron at `index`, computing it
    /// from its incoming connections if it is out of date. A
    /// neuron reached again while being computed yields its
    /// previous value.
    fn value_of(&mut self, index: usize) -> f64 {
        match self.neurons[index].state {
            NeuronState::Clean | NeuronState::Evaluating => return self.neurons[index].value,
            NeuronState::Dirty => {}
        }
        self.neurons[index].state = NeuronState::Evaluating;
        let mut sum = 0.0;
        for c in 0..self.neurons[index].incoming.len() {
            let connection = self.neurons[index].incoming[c];
            let value = match connection.cache {
                Some(cached) => cached,
                None => self.value_of(connection.src),
            };
            sum += connection.weight * value;
        }
        let neuron = &mut self.neurons[index];
        neuron.value = neuron.activation.apply(sum).clamp(-f64::MAX, f64::MAX);
        neuron.state = NeuronState::Clean;
        neuron.value
    }

    /// Returns the resources needed to activate the network once.
    pub fn cost(&self) -> u64 {
        self.neurons.iter().map(Neuron::cost).sum()
    }

    /// Returns whether any connection is recurrent.
    pub fn is_recurrent(&self) -> bool {
        !self.recurrent.is_empty()
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Returns the number of full activations per call
    /// to [`activate`](RealTimeNetwork::activate).
    pub fn cycles(&self) -> usize {
        self.cycles
    }
}

impl fmt::Display for RealTimeNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "RealTimeNetwork ({} in, {} out, {} neurons)",
            self.input_count,
            self.output_count,
            self.neurons.len()
        )?;
        for neuron in self.neurons.iter() {
            write!(f, "\t{} {}:", neuron.id, neuron.activation.name())?;
            for connection in &neuron.incoming {
                write!(f, " [{:?}]", connection)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecurrencyPolicy, Transcriber};
    use cppneat::genomics::{ChromosomeMaterial, ConnectionAllele, NeuronAllele, NeuronType};

    use assert_approx_eq::assert_approx_eq;

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    fn single(output: ActivationFunction) -> ChromosomeMaterial {
        let mut material = ChromosomeMaterial::new();
        material.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear));
        material.add_neuron(NeuronAllele::new(1, NeuronType::Output, output));
        material.add_connection(ConnectionAllele::new(2, 0, 1, 1.0));
        material
    }

    #[test]
    fn activate_single() {
        let mut network = Transcriber::new(RecurrencyPolicy::Disallowed)
            .transcribe(&single(ActivationFunction::Sigmoid))
            .unwrap();
        for input in -20..=20 {
            let input = input as f64 / 10.0;
            assert_approx_eq!(network.activate(&[input])[0], sigmoid(input));
        }
    }

    #[test]
    fn activate_double() {
        let mut material = single(ActivationFunction::Sigmoid);
        material.add_neuron(NeuronAllele::new(3, NeuronType::Hidden, ActivationFunction::Sigmoid));
        material.remove_connection(2);
        material.add_connection(ConnectionAllele::new(4, 0, 3, 1.0));
        material.add_connection(ConnectionAllele::new(5, 3, 1, 1.0));
        let mut network = Transcriber::new(RecurrencyPolicy::BestGuess)
            .transcribe(&material)
            .unwrap();
        assert!(!network.is_recurrent());
        for input in -20..=20 {
            let input = input as f64 / 10.0;
            assert_approx_eq!(network.activate(&[input])[0], sigmoid(sigmoid(input)));
        }
    }

    #[test]
    fn activate_single_recursive() {
        let mut material = single(ActivationFunction::Sigmoid);
        material.add_connection(ConnectionAllele::new(3, 1, 1, -1.0));
        let mut network = Transcriber::new(RecurrencyPolicy::BestGuess)
            .transcribe(&material)
            .unwrap();
        assert!(network.is_recurrent());
        let mut previous = 0.0;
        for input in -20..=20 {
            let input = input as f64 / 10.0;
            let output = network.activate(&[input])[0];
            assert_approx_eq!(output, sigmoid(input - previous));
            previous = output;
        }
    }

    #[test]
    fn feed_forward_loop_reads_previous_value() {
        let mut material = single(ActivationFunction::Linear);
        material.add_connection(ConnectionAllele::new(3, 1, 1, 1.0));
        let mut network = Transcriber::new(RecurrencyPolicy::Disallowed)
            .transcribe(&material)
            .unwrap();
        assert!(!network.is_recurrent());
        assert_eq!(network.activate(&[1.0]), vec![1.0]);
        assert_eq!(network.activate(&[1.0]), vec![2.0]);
    }

    #[test]
    fn multiple_cycles_per_activation() {
        let mut network = Transcriber::new(RecurrencyPolicy::Lazy)
            .with_cycles(3)
            .transcribe(&single(ActivationFunction::Linear))
            .unwrap();
        assert_eq!(network.cycles(), 3);
        // Every connection is cached under the lazy policy, so
        // the input needs one cycle to reach the output.
        assert_eq!(network.activate(&[1.0]), vec![1.0]);
    }

    #[test]
    fn cost_counts_neurons_and_connections() {
        let network = Transcriber::new(RecurrencyPolicy::Disallowed)
            .transcribe(&single(ActivationFunction::Sigmoid))
            .unwrap();
        let linear = ActivationFunction::Linear.cost();
        let sigmoid = ActivationFunction::Sigmoid.cost();
        assert_eq!(network.cost(), 315 + linear + 315 + 57 + 115 + sigmoid);
    }

    #[test]
    #[should_panic]
    fn wrong_input_count() {
        let mut network = Transcriber::new(RecurrencyPolicy::Disallowed)
            .transcribe(&single(ActivationFunction::Sigmoid))
            .unwrap();
        network.set_inputs(&[1.0, 2.0]);
    }
}
