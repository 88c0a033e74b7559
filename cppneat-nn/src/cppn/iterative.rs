use super::graph::Graph;
use super::layers::InputScaling;

use cppneat::genomics::ChromosomeMaterial;

/// A CPPN that may contain cycles, activated in lock-step
/// enough times for a signal to cross it end-to-end.
#[derive(Clone, Debug)]
pub struct IterativeCppn {
    graph: Graph,
    height: usize,
}

impl IterativeCppn {
    pub fn new(material: &ChromosomeMaterial, scaling: InputScaling) -> IterativeCppn {
        IterativeCppn::from_graph(Graph::new(material, scaling))
    }

    pub(super) fn from_graph(graph: Graph) -> IterativeCppn {
        let height = graph.height();
        IterativeCppn { graph, height }
    }

    /// Returns the number of activations per query: the
    /// longest path length, or the neuron count if the
    /// network has a cycle.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the output channel values at a point.
    pub fn evaluate_at(&mut self, x: f64, y: f64) -> Vec<f64> {
        self.graph.prepare(x, y);
        for neuron in &mut self.graph.neurons {
            neuron.active = true;
        }
        for _ in 0..self.height {
            self.activate_once();
        }
        self.graph.read_outputs()
    }

    /// Every link carries its source's previous output, then
    /// every neuron recomputes its output. A neuron without
    /// incoming links settles at the activation of zero.
    fn activate_once(&mut self) {
        let graph = &mut self.graph;
        for link in &graph.links {
            let signal = link.weight * graph.neurons[link.src].output;
            graph.neurons[link.dest].add_input(signal);
        }
        for neuron in &mut graph.neurons {
            neuron.activate();
        }
    }

    pub fn output_labels(&self) -> &[Option<String>] {
        self.graph.output_labels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cppn::AcyclicCppn;
    use cppneat::genomics::{ActivationFunction, ConnectionAllele, NeuronAllele, NeuronType};
    use cppneat::rng::seeded;

    use assert_approx_eq::assert_approx_eq;
    use rand::Rng;

    /// bias, x, y -> three hidden layers -> two outputs,
    /// with random weights and CPPN activations.
    fn layered(seed: u64) -> ChromosomeMaterial {
        let mut rng = seeded(seed);
        let mut material = ChromosomeMaterial::new();
        for (id, label) in ["bias", "x", "y"].iter().enumerate() {
            material.add_neuron(
                NeuronAllele::new(id as i64, NeuronType::Input, ActivationFunction::Linear).with_label(*label),
            );
        }
        material.add_neuron(NeuronAllele::new(3, NeuronType::Output, ActivationFunction::Sigmoid));
        material.add_neuron(NeuronAllele::new(4, NeuronType::Output, ActivationFunction::Tanh));
        let layers: [&[i64]; 5] = [&[0, 1, 2], &[5, 6], &[7], &[8, 9], &[3, 4]];
        for hidden in layers[1..4].iter().flat_map(|l| l.iter()) {
            material.add_neuron(NeuronAllele::new(
                *hidden,
                NeuronType::Hidden,
                ActivationFunction::random_cppn(&mut rng),
            ));
        }
        let mut id = 10;
        for pair in layers.windows(2) {
            for &src in pair[0] {
                for &dest in pair[1] {
                    material.add_connection(ConnectionAllele::new(id, src, dest, rng.gen_range(-2.0..2.0)));
                    id += 1;
                }
            }
        }
        // Skip connection across two layers.
        material.add_connection(ConnectionAllele::new(id, 1, 8, 0.75));
        material
    }

    #[test]
    fn matches_acyclic_evaluation() {
        for seed in 0..5 {
            let material = layered(seed);
            let mut acyclic = AcyclicCppn::new(&material, InputScaling::default()).unwrap();
            let mut iterative = IterativeCppn::new(&material, InputScaling::default());
            let mut long = IterativeCppn {
                height: material.neuron_count(),
                ..iterative.clone()
            };
            assert_eq!(iterative.height(), 5);
            for i in -4..=4 {
                let (x, y) = (i as f64 / 4.0, -i as f64 / 8.0);
                let expected = acyclic.evaluate_at(x, y);
                for (a, b) in expected.iter().zip(iterative.evaluate_at(x, y)) {
                    assert_approx_eq!(a, b);
                }
                for (a, b) in expected.iter().zip(long.evaluate_at(x, y)) {
                    assert_approx_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn sourceless_neurons_match_acyclic_evaluation() {
        let x = || NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear).with_label("x");

        // An output nothing connects to.
        let mut unconnected = ChromosomeMaterial::new();
        unconnected.add_neuron(x());
        unconnected.add_neuron(NeuronAllele::new(1, NeuronType::Output, ActivationFunction::Sigmoid));

        // A hidden neuron whose only input link is gone.
        let mut orphaned = ChromosomeMaterial::new();
        orphaned.add_neuron(x());
        orphaned.add_neuron(NeuronAllele::new(1, NeuronType::Output, ActivationFunction::Linear));
        orphaned.add_neuron(NeuronAllele::new(2, NeuronType::Hidden, ActivationFunction::Gaussian));
        orphaned.add_connection(ConnectionAllele::new(3, 0, 1, 1.0));
        orphaned.add_connection(ConnectionAllele::new(4, 2, 1, 0.5));

        for (material, expected) in [(unconnected, 0.5), (orphaned, 1.5)] {
            let mut acyclic = AcyclicCppn::new(&material, InputScaling::default()).unwrap();
            let mut iterative = IterativeCppn::new(&material, InputScaling::default());
            let mut long = IterativeCppn {
                height: material.neuron_count(),
                ..iterative.clone()
            };
            assert_approx_eq!(acyclic.evaluate_at(1.0, 0.0)[0], expected);
            assert_approx_eq!(iterative.evaluate_at(1.0, 0.0)[0], expected);
            assert_approx_eq!(long.evaluate_at(1.0, 0.0)[0], expected);
        }
    }

    #[test]
    fn two_cycle_is_evaluated() {
        let mut material = ChromosomeMaterial::new();
        material.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear).with_label("x"));
        material.add_neuron(NeuronAllele::new(1, NeuronType::Output, ActivationFunction::Linear));
        material.add_neuron(NeuronAllele::new(2, NeuronType::Hidden, ActivationFunction::Linear));
        material.add_neuron(NeuronAllele::new(3, NeuronType::Hidden, ActivationFunction::Linear));
        material.add_connection(ConnectionAllele::new(4, 0, 2, 1.0));
        material.add_connection(ConnectionAllele::new(5, 2, 3, 1.0));
        material.add_connection(ConnectionAllele::new(6, 3, 2, 0.5));
        material.add_connection(ConnectionAllele::new(7, 3, 1, 1.0));

        let mut network = IterativeCppn::new(&material, InputScaling::default());
        assert_eq!(network.height(), 4);
        // Step 1 activates the input, steps 2 and 3 carry it
        // through the hidden pair, and step 4 reaches the output.
        assert_approx_eq!(network.evaluate_at(1.0, 0.0)[0], 1.0);
        let again = network.evaluate_at(1.0, 0.0)[0];
        assert_eq!(again, network.evaluate_at(1.0, 0.0)[0]);
    }
}
