use crate::genomics::ActivationFunction;
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A NeuronType indicates the role of the
/// neuron in the genome's phenotype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NeuronType {
    /// Input neurons, clamped to the network stimulus.
    Input,
    /// Hidden neurons, created by mutation or the initial topology.
    Hidden,
    /// Output neurons, read as the network response.
    Output,
}

/// Neuron alleles are the structural elements of
/// genomes between which connections are created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuronAllele {
    id: Innovation,
    neuron_type: NeuronType,
    activation: ActivationFunction,
    label: Option<String>,
}

impl NeuronAllele {
    /// Returns a new unlabelled neuron allele.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ActivationFunction, NeuronAllele, NeuronType};
    ///
    /// let neuron = NeuronAllele::new(5, NeuronType::Hidden, ActivationFunction::Sine);
    /// ```
    pub fn new(id: Innovation, neuron_type: NeuronType, activation: ActivationFunction) -> NeuronAllele {
        NeuronAllele {
            id,
            neuron_type,
            activation,
            label: None,
        }
    }

    /// Attaches a label to the neuron. Labels are
    /// used by phenotypes to locate particular inputs
    /// and outputs (e.g. `"x"` or `"ink"`).
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ActivationFunction, NeuronAllele, NeuronType};
    ///
    /// let neuron = NeuronAllele::new(2, NeuronType::Input, ActivationFunction::Linear)
    ///     .with_label("x");
    ///
    /// assert_eq!(neuron.label(), Some("x"));
    /// ```
    pub fn with_label(mut self, label: impl Into<String>) -> NeuronAllele {
        self.label = Some(label.into());
        self
    }

    /// Returns the neuron's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns the neuron's role.
    pub fn neuron_type(&self) -> NeuronType {
        self.neuron_type
    }

    /// Returns the neuron's activation function.
    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    /// Returns the neuron's label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl fmt::Display for NeuronAllele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{:?}, {}", self.id, self.neuron_type, self.activation)?;
        if let Some(label) = &self.label {
            write!(f, ", {:?}", label)?;
        }
        write!(f, "]")
    }
}
