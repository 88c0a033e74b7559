use crate::genomics::ActivationFunction;

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// How connections that may close a loop are treated,
/// both when adding connections by mutation and when
/// transcribing a genome into a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrencyPolicy {
    /// No loops may be created. Every connection is
    /// transcribed as feed-forward.
    Disallowed,
    /// Loops are allowed. A connection is transcribed
    /// as recurrent iff its source sits at the same or
    /// a nearer distance to the outputs than its destination.
    BestGuess,
    /// Loops are allowed, and every connection is
    /// transcribed as recurrent.
    Lazy,
}

impl RecurrencyPolicy {
    /// Returns whether connections closing a loop may be created.
    pub fn allows_loops(&self) -> bool {
        !matches!(self, RecurrencyPolicy::Disallowed)
    }
}

impl FromStr for RecurrencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disallowed" => Ok(RecurrencyPolicy::Disallowed),
            "best_guess" | "best-guess" | "bestguess" => Ok(RecurrencyPolicy::BestGuess),
            "lazy" => Ok(RecurrencyPolicy::Lazy),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for RecurrencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrencyPolicy::Disallowed => write!(f, "disallowed"),
            RecurrencyPolicy::BestGuess => write!(f, "best_guess"),
            RecurrencyPolicy::Lazy => write!(f, "lazy"),
        }
    }
}

/// Distribution used for weight perturbation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightDistribution {
    Gaussian,
    Uniform,
}

impl FromStr for WeightDistribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gaussian" | "normal" => Ok(WeightDistribution::Gaussian),
            "uniform" => Ok(WeightDistribution::Uniform),
            _ => Err(s.to_string()),
        }
    }
}

/// Activation assigned to newly created hidden neurons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HiddenActivation {
    /// Every hidden neuron uses the same function.
    Fixed(ActivationFunction),
    /// Each hidden neuron draws one from [`ActivationFunction::CPPN`].
    RandomCppn,
}

impl HiddenActivation {
    /// Returns the activation for a new hidden neuron.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> ActivationFunction {
        match self {
            HiddenActivation::Fixed(f) => *f,
            HiddenActivation::RandomCppn => ActivationFunction::random_cppn(rng),
        }
    }
}

/// Configuration data for genome generation
/// and inter-genome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of input neurons in a genome.
    pub input_count: usize,
    /// Number of output neurons in a genome.
    pub output_count: usize,
    /// Labels of the input neurons, in creation order.
    /// Inputs beyond the end of this list stay unlabelled.
    pub input_labels: Vec<String>,
    /// Labels of the output neurons, in creation order.
    pub output_labels: Vec<String>,
    /// Number of hidden neurons in the initial topology.
    pub initial_hidden_count: usize,
    /// Whether the initial topology is fully connected.
    pub initial_fully_connected: bool,
    /// Activation function of input neurons.
    pub input_activation: ActivationFunction,
    /// Activation function of output neurons.
    pub output_activation: ActivationFunction,
    /// Activation of hidden neurons, either initial or
    /// created by neuron addition.
    pub hidden_activation: HiddenActivation,
    /// Upper bound on connection weights.
    pub weight_max: f64,
    /// Lower bound on connection weights.
    pub weight_min: f64,
    /// Weight of excess alleles in genetic distance.
    pub excess_coefficient: f64,
    /// Weight of disjoint alleles in genetic distance.
    pub disjoint_coefficient: f64,
    /// Weight of the average common connection weight
    /// difference in genetic distance.
    pub common_coefficient: f64,
    /// Whether at most one topological mutation (connection
    /// or neuron addition) may apply per genome per generation.
    pub topology_mutation_classic: bool,
    /// Chance per neuron of attempting a connection addition.
    /// In classic mode, chance per genome.
    pub add_connection_rate: f64,
    /// Chance per connection of being split by a new neuron.
    /// In classic mode, chance per genome.
    pub add_neuron_rate: f64,
    /// Chance per weak connection of being removed.
    pub remove_connection_rate: f64,
    /// Connections with a weight magnitude below this
    /// are eligible for removal.
    pub remove_connection_max_weight: f64,
    /// Chance per connection of its weight being perturbed.
    pub weight_mutation_rate: f64,
    /// Scale of weight perturbations.
    pub weight_mutation_std_dev: f64,
    /// Distribution of weight perturbations.
    pub weight_mutation_distribution: WeightDistribution,
    /// Chance per genome of unreachable structure being pruned.
    pub prune_rate: f64,
    /// Chance per hidden neuron of its activation function
    /// being replaced.
    pub activation_mutation_rate: f64,
    /// Loop handling during mutation and transcription.
    pub recurrency: RecurrencyPolicy,
    /// Number of full activations per step of a
    /// transcribed network.
    pub recurrent_cycles: usize,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, false, empty, or the first
    /// variant of their enum, with linear activations.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::GeneticConfig;
    ///
    /// let cfg = GeneticConfig {
    ///     // Specify some values here...
    ///     input_count: 3,
    ///     output_count: 1,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: 0,
            output_count: 0,
            input_labels: vec![],
            output_labels: vec![],
            initial_hidden_count: 0,
            initial_fully_connected: false,
            input_activation: ActivationFunction::Linear,
            output_activation: ActivationFunction::Linear,
            hidden_activation: HiddenActivation::Fixed(ActivationFunction::Linear),
            weight_max: 0.0,
            weight_min: 0.0,
            excess_coefficient: 0.0,
            disjoint_coefficient: 0.0,
            common_coefficient: 0.0,
            topology_mutation_classic: false,
            add_connection_rate: 0.0,
            add_neuron_rate: 0.0,
            remove_connection_rate: 0.0,
            remove_connection_max_weight: 0.0,
            weight_mutation_rate: 0.0,
            weight_mutation_std_dev: 0.0,
            weight_mutation_distribution: WeightDistribution::Gaussian,
            prune_rate: 0.0,
            activation_mutation_rate: 0.0,
            recurrency: RecurrencyPolicy::Disallowed,
            recurrent_cycles: 1,
        }
    }
}

impl Default for GeneticConfig {
    /// The defaults used when a property is absent:
    /// a 4-input (`bias`, `d`, `x`, `y`) single-output
    /// (`ink`) fully connected CPPN.
    fn default() -> GeneticConfig {
        GeneticConfig {
            input_count: 4,
            output_count: 1,
            input_labels: ["bias", "d", "x", "y"].iter().map(|s| s.to_string()).collect(),
            output_labels: vec!["ink".to_string()],
            initial_hidden_count: 0,
            initial_fully_connected: true,
            input_activation: ActivationFunction::Linear,
            output_activation: ActivationFunction::Sigmoid,
            hidden_activation: HiddenActivation::RandomCppn,
            weight_max: 500.0,
            weight_min: -500.0,
            excess_coefficient: 1.0,
            disjoint_coefficient: 1.0,
            common_coefficient: 0.04,
            topology_mutation_classic: false,
            add_connection_rate: 0.01,
            add_neuron_rate: 0.01,
            remove_connection_rate: 0.01,
            remove_connection_max_weight: 0.01,
            weight_mutation_rate: 0.75,
            weight_mutation_std_dev: 1.5,
            weight_mutation_distribution: WeightDistribution::Gaussian,
            prune_rate: 1.0,
            activation_mutation_rate: 0.025,
            recurrency: RecurrencyPolicy::Disallowed,
            recurrent_cycles: 1,
        }
    }
}
