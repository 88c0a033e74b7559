use super::graph::Graph;
use super::layers::InputScaling;
use super::CycleError;

use cppneat::genomics::ChromosomeMaterial;

/// A CPPN without cycles, activated in a single
/// pass over its topologically sorted links.
#[derive(Clone, Debug)]
pub struct AcyclicCppn {
    graph: Graph,
}

impl AcyclicCppn {
    /// Builds the network for `material`.
    ///
    /// # Errors
    /// Returns an error if the genome has a cycle or
    /// a self-loop.
    pub fn new(material: &ChromosomeMaterial, scaling: InputScaling) -> Result<AcyclicCppn, CycleError> {
        AcyclicCppn::from_graph(Graph::new(material, scaling)).map_err(|_| CycleError)
    }

    /// Sorts the links of `graph`, handing the graph
    /// back if it has a cycle.
    pub(super) fn from_graph(mut graph: Graph) -> Result<AcyclicCppn, Graph> {
        match graph.topological_order() {
            Some(order) => {
                graph.links = order.into_iter().map(|i| graph.links[i]).collect();
                Ok(AcyclicCppn { graph })
            }
            None => Err(graph),
        }
    }

    /// Returns the output channel values at a point.
    ///
    /// Every neuron fires exactly once: the first time it
    /// is the source of a processed link, or after all links
    /// if it never is.
    pub fn evaluate_at(&mut self, x: f64, y: f64) -> Vec<f64> {
        let graph = &mut self.graph;
        graph.prepare(x, y);
        for neuron in &mut graph.neurons {
            neuron.active = false;
        }
        for l in 0..graph.links.len() {
            let link = graph.links[l];
            let src = &mut graph.neurons[link.src];
            if !src.active {
                src.active = true;
                src.activate();
            }
            let signal = link.weight * src.output;
            graph.neurons[link.dest].add_input(signal);
        }
        for neuron in &mut graph.neurons {
            if !neuron.active {
                neuron.active = true;
                neuron.activate();
            }
        }
        graph.read_outputs()
    }

    pub fn output_labels(&self) -> &[Option<String>] {
        self.graph.output_labels()
    }
}
