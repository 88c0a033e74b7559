//! # cppneat-nn
//! Runnable networks built from [`cppneat`] genomes.
//!
//! Two kinds of phenotype are provided:
//! - [`RealTimeNetwork`]: produced by a [`Transcriber`], best suited for
//! control tasks with new inputs set for each activation and state carried
//! between time-steps through cached (recurrent) connections.
//! - [`Cppn`]: a Compositional Pattern-Producing Network mapping 2-D
//! coordinates to pixel values. Acyclic genomes are evaluated in a single
//! pass over a topologically sorted connection list; cyclic ones fall back
//! to bounded iterative relaxation.
//!
//! [`RealTimeNetwork`]: crate::networks::RealTimeNetwork
//! [`Cppn`]: crate::cppn::Cppn
//!
//! # Example usage: Rendering a genome
//! ```
//! use cppneat::genomics::{ActivationFunction, ChromosomeMaterial, ConnectionAllele, NeuronAllele, NeuronType};
//! use cppneat_nn::cppn::{Cppn, InputScaling, OutputLayer};
//!
//! let mut material = ChromosomeMaterial::new();
//! material.add_neuron(NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear).with_label("d"));
//! material.add_neuron(NeuronAllele::new(1, NeuronType::Output, ActivationFunction::Gaussian).with_label("ink"));
//! material.add_connection(ConnectionAllele::new(2, 0, 1, 2.0));
//!
//! let mut cppn = Cppn::from_material(&material, InputScaling::default());
//! assert!(cppn.is_acyclic());
//!
//! // Bright in the middle, dark towards the corners.
//! let center = cppn.render_pixel(0.0, 0.0, &OutputLayer::Grey);
//! let corner = cppn.render_pixel(1.0, 1.0, &OutputLayer::Grey);
//! assert_eq!(center, [1.0; 3]);
//! assert!(corner[0] < 0.01);
//! ```

pub mod cppn;
pub mod networks;
mod transcriber;

pub use cppneat::genomics::RecurrencyPolicy;
pub use transcriber::{Transcriber, TranscriberError};
