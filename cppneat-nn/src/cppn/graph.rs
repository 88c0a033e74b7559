use super::layers::{InputLayer, InputScaling};

use cppneat::genomics::{ActivationFunction, ChromosomeMaterial, NeuronAllele, NeuronType};
use cppneat::Innovation;

use ahash::RandomState;

use std::collections::{HashMap, VecDeque};

#[derive(Clone, Debug)]
pub(super) struct CppnNeuron {
    activation: ActivationFunction,
    input: f64,
    reset_value: f64,
    pub output: f64,
    pub active: bool,
}

impl CppnNeuron {
    fn new(activation: ActivationFunction) -> CppnNeuron {
        CppnNeuron {
            activation,
            input: 0.0,
            reset_value: 0.0,
            output: 0.0,
            active: false,
        }
    }

    /// Computes the output of an active neuron
    /// from its accumulated input.
    pub fn activate(&mut self) {
        if self.active {
            self.output = self.activation.apply(self.input);
            self.input = self.reset_value;
        }
    }

    pub fn add_input(&mut self, value: f64) {
        self.input += value;
    }

    /// Clamps the neuron to `value` until the next clear.
    pub fn set_input(&mut self, value: f64) {
        self.input = value;
        self.reset_value = value;
        self.active = true;
    }

    fn clear(&mut self) {
        self.input = 0.0;
        self.reset_value = 0.0;
        self.output = 0.0;
        self.active = false;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Link {
    pub src: usize,
    pub dest: usize,
    pub weight: f64,
}

/// Neurons and links of a CPPN, stored in flat arenas
/// and addressed by index. Neurons are in id order.
#[derive(Clone, Debug)]
pub(super) struct Graph {
    pub neurons: Vec<CppnNeuron>,
    pub links: Vec<Link>,
    inputs: InputLayer,
    outputs: Vec<usize>,
    output_labels: Vec<Option<String>>,
}

impl Graph {
    /// Builds one neuron per neuron allele and one
    /// link per connection allele.
    ///
    /// # Panics
    /// Panics if a connection references a neuron
    /// missing from `material`.
    pub fn new(material: &ChromosomeMaterial, scaling: InputScaling) -> Graph {
        let index_of: HashMap<Innovation, usize, RandomState> = material
            .neurons()
            .enumerate()
            .map(|(i, n)| (n.innovation(), i))
            .collect();
        let neurons = material
            .neurons()
            .map(|n| CppnNeuron::new(n.activation()))
            .collect();
        let index = |connection: Innovation, neuron: Innovation| {
            *index_of.get(&neuron).unwrap_or_else(|| {
                panic!(
                    "connection {} references missing neuron {} in {}",
                    connection, neuron, material
                )
            })
        };
        let links = material
            .connections()
            .map(|c| Link {
                src: index(c.innovation(), c.src()),
                dest: index(c.innovation(), c.dest()),
                weight: c.weight(),
            })
            .collect();

        let outputs = indexed_of_type(material, NeuronType::Output);
        Graph {
            neurons,
            links,
            inputs: InputLayer::new(&indexed_of_type(material, NeuronType::Input), scaling),
            outputs: outputs.iter().map(|(i, _)| *i).collect(),
            output_labels: outputs
                .iter()
                .map(|(_, n)| n.label().map(str::to_string))
                .collect(),
        }
    }

    /// Returns the links in an order where every link comes after
    /// all links into its source, or `None` if the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        let (mut in_degrees, outgoing) = self.degrees()?;
        let mut queue: VecDeque<usize> = (0..self.neurons.len())
            .filter(|n| in_degrees[*n] == 0)
            .collect();
        let mut found = queue.len();
        let mut order = Vec::with_capacity(self.links.len());
        while let Some(neuron) = queue.pop_front() {
            for &link in &outgoing[neuron] {
                order.push(link);
                let dest = self.links[link].dest;
                in_degrees[dest] -= 1;
                if in_degrees[dest] == 0 {
                    found += 1;
                    queue.push_back(dest);
                }
            }
        }
        (found == self.neurons.len()).then(|| order)
    }

    /// Returns the number of neurons on the longest path through
    /// the graph, or the neuron count if the graph has a cycle.
    pub fn height(&self) -> usize {
        let (mut in_degrees, outgoing) = match self.degrees() {
            Some(degrees) => degrees,
            None => return self.neurons.len(),
        };
        let mut level: Vec<usize> = (0..self.neurons.len())
            .filter(|n| in_degrees[*n] == 0)
            .collect();
        let mut found = 0;
        let mut depth = 0;
        while !level.is_empty() {
            depth += 1;
            found += level.len();
            let mut next = vec![];
            for neuron in level {
                for &link in &outgoing[neuron] {
                    let dest = self.links[link].dest;
                    in_degrees[dest] -= 1;
                    if in_degrees[dest] == 0 {
                        next.push(dest);
                    }
                }
            }
            level = next;
        }
        if found == self.neurons.len() {
            depth
        } else {
            self.neurons.len()
        }
    }

    /// Returns the in-degree and outgoing links of every
    /// neuron, or `None` if a link is a self-loop.
    fn degrees(&self) -> Option<(Vec<usize>, Vec<Vec<usize>>)> {
        let mut in_degrees = vec![0; self.neurons.len()];
        let mut outgoing = vec![vec![]; self.neurons.len()];
        for (i, link) in self.links.iter().enumerate() {
            if link.src == link.dest {
                return None;
            }
            outgoing[link.src].push(i);
            in_degrees[link.dest] += 1;
        }
        Some((in_degrees, outgoing))
    }

    /// Resets every neuron and writes
    /// the query point to the inputs.
    pub fn prepare(&mut self, x: f64, y: f64) {
        for neuron in &mut self.neurons {
            neuron.clear();
        }
        self.inputs.write(&mut self.neurons, x, y);
    }

    /// Returns the output values, in output id order.
    pub fn read_outputs(&self) -> Vec<f64> {
        self.outputs.iter().map(|i| self.neurons[*i].output).collect()
    }

    pub fn output_labels(&self) -> &[Option<String>] {
        &self.output_labels
    }
}

/// Returns the neurons of a type, paired with their graph index.
fn indexed_of_type(material: &ChromosomeMaterial, neuron_type: NeuronType) -> Vec<(usize, &NeuronAllele)> {
    material
        .neurons()
        .enumerate()
        .filter(|(_, n)| n.neuron_type() == neuron_type)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cppneat::genomics::ConnectionAllele;

    fn chain() -> ChromosomeMaterial {
        let mut material = ChromosomeMaterial::new();
        material.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear));
        material.add_neuron(NeuronAllele::new(1, NeuronType::Input, ActivationFunction::Linear));
        material.add_neuron(NeuronAllele::new(2, NeuronType::Output, ActivationFunction::Linear));
        material.add_neuron(NeuronAllele::new(3, NeuronType::Hidden, ActivationFunction::Linear));
        material.add_neuron(NeuronAllele::new(4, NeuronType::Hidden, ActivationFunction::Linear));
        material.add_connection(ConnectionAllele::new(5, 0, 3, 1.0));
        material.add_connection(ConnectionAllele::new(6, 3, 4, 1.0));
        material.add_connection(ConnectionAllele::new(7, 4, 2, 1.0));
        material.add_connection(ConnectionAllele::new(8, 1, 2, 1.0));
        material.add_connection(ConnectionAllele::new(9, 0, 4, 1.0));
        material
    }

    #[test]
    fn sort_emits_every_link_after_its_source_inputs() {
        let graph = Graph::new(&chain(), InputScaling::default());
        let order = graph.topological_order().unwrap();
        assert_eq!(order.len(), graph.links.len());
        for (position, &link) in order.iter().enumerate() {
            let src = graph.links[link].src;
            for &earlier in &order[position..] {
                assert_ne!(graph.links[earlier].dest, src);
            }
        }
    }

    #[test]
    fn height_is_longest_path() {
        let graph = Graph::new(&chain(), InputScaling::default());
        assert_eq!(graph.height(), 4);
    }

    #[test]
    fn cycles_are_detected() {
        let mut material = chain();
        material.add_connection(ConnectionAllele::new(10, 4, 3, 1.0));
        let graph = Graph::new(&material, InputScaling::default());
        assert_eq!(graph.topological_order(), None);
        assert_eq!(graph.height(), 5);

        let mut material = chain();
        material.add_connection(ConnectionAllele::new(10, 2, 2, 1.0));
        let graph = Graph::new(&material, InputScaling::default());
        assert_eq!(graph.topological_order(), None);
        assert_eq!(graph.height(), 5);
    }

    #[test]
    fn outputs_in_id_order_with_labels() {
        let mut material = chain();
        material.add_neuron(
            NeuronAllele::new(11, NeuronType::Output, ActivationFunction::Linear).with_label("ink"),
        );
        let graph = Graph::new(&material, InputScaling::default());
        assert_eq!(graph.outputs, [2, 5]);
        assert_eq!(graph.output_labels(), [None, Some("ink".to_string())]);
    }
}
