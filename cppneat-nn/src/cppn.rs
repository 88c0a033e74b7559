//! Compositional Pattern-Producing Networks.
//!
//! A CPPN maps a point `(x, y)` to one value per output neuron.
//! Inputs are found by label: `x`, `y`, `d` (distance from the
//! origin) and `bias`. Unlabelled inputs are assigned by their
//! position among inputs, in the order `bias`, `d`, `x`, `y`.
mod acyclic;
mod graph;
mod iterative;
mod layers;

pub use acyclic::AcyclicCppn;
pub use iterative::IterativeCppn;
pub use layers::{InputScaling, OutputLayer};

use graph::Graph;

use cppneat::genomics::ChromosomeMaterial;
use thiserror::Error;
use tracing::debug;

/// The genome has a cycle, so its network
/// can not be activated in a single pass.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("network contains a cycle")]
pub struct CycleError;

/// A CPPN built from a genome, acyclic whenever possible.
///
/// # Examples
/// ```
/// use cppneat::genomics::{ActivationFunction, ChromosomeMaterial, ConnectionAllele, NeuronAllele, NeuronType};
/// use cppneat_nn::cppn::{Cppn, InputScaling};
///
/// let mut material = ChromosomeMaterial::new();
/// material.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear).with_label("x"));
/// material.add_neuron(NeuronAllele::new(1, NeuronType::Output, ActivationFunction::Linear));
/// material.add_neuron(NeuronAllele::new(2, NeuronType::Hidden, ActivationFunction::Linear));
/// material.add_connection(ConnectionAllele::new(3, 0, 2, 1.0));
/// material.add_connection(ConnectionAllele::new(4, 2, 1, 2.0));
/// material.add_connection(ConnectionAllele::new(5, 1, 2, 0.5));
///
/// // The loop through neurons 1 and 2 forces iterative evaluation.
/// let mut cppn = Cppn::from_material(&material, InputScaling::default());
///
/// assert!(!cppn.is_acyclic());
/// assert!(cppn.evaluate_at(1.0, 0.0)[0] > 0.0);
/// ```
#[derive(Clone, Debug)]
pub enum Cppn {
    Acyclic(AcyclicCppn),
    Iterative(IterativeCppn),
}

impl Cppn {
    /// Builds an [`AcyclicCppn`], falling back to an
    /// [`IterativeCppn`] if the genome has a cycle.
    ///
    /// # Panics
    /// Panics if a connection references a neuron
    /// missing from `material`.
    pub fn from_material(material: &ChromosomeMaterial, scaling: InputScaling) -> Cppn {
        match AcyclicCppn::from_graph(Graph::new(material, scaling)) {
            Ok(acyclic) => Cppn::Acyclic(acyclic),
            Err(graph) => {
                debug!(
                    neurons = material.neuron_count(),
                    connections = material.connection_count(),
                    "cyclic genome, evaluating iteratively"
                );
                Cppn::Iterative(IterativeCppn::from_graph(graph))
            }
        }
    }

    pub fn is_acyclic(&self) -> bool {
        matches!(self, Cppn::Acyclic(_))
    }

    /// Returns the value of each output neuron at
    /// `(x, y)`, in output id order. Nothing carries
    /// over from previous queries.
    pub fn evaluate_at(&mut self, x: f64, y: f64) -> Vec<f64> {
        match self {
            Cppn::Acyclic(cppn) => cppn.evaluate_at(x, y),
            Cppn::Iterative(cppn) => cppn.evaluate_at(x, y),
        }
    }

    /// Returns the labels of the output neurons, in id order.
    pub fn output_labels(&self) -> &[Option<String>] {
        match self {
            Cppn::Acyclic(cppn) => cppn.output_labels(),
            Cppn::Iterative(cppn) => cppn.output_labels(),
        }
    }

    /// Returns the RGB colour at `(x, y)`.
    pub fn render_pixel(&mut self, x: f64, y: f64, layer: &OutputLayer) -> [f64; 3] {
        let values = self.evaluate_at(x, y);
        layer.render(self.output_labels(), &values)
    }
}
