//! Startup configuration: typed configs built
//! from a [`Properties`] source and validated.
use crate::genomics::{
    ActivationFunction, GeneticConfig, HiddenActivation, RecurrencyPolicy, UnknownActivationError,
    WeightDistribution,
};
use crate::persistence::PersistenceError;
use crate::populations::PopulationConfig;
use crate::Properties;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors preventing an evolution run from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required property is absent.
    #[error("missing required property {0:?}")]
    MissingProperty(String),
    /// A property's value could not be interpreted.
    #[error("invalid value {value:?} for property {key:?}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    /// An activation function name is not registered.
    #[error(transparent)]
    UnknownActivation(#[from] UnknownActivationError),
    /// Survival rates of one half or more leave
    /// no room for crossover offspring.
    #[error("survival rate {0} must be in [0, 0.5)")]
    SurvivalRate(f64),
    /// More labels than neurons of that kind were given.
    #[error("{labels} {kind} labels given for {count} {kind} neurons")]
    LabelCount {
        kind: &'static str,
        labels: usize,
        count: usize,
    },
    /// The weight range is empty or not a number.
    #[error("weight.min {min} must not exceed weight.max {max}")]
    InvertedWeightBounds { min: f64, max: f64 },
    /// The innovation id source could not be loaded.
    #[error("failed to load innovation ids")]
    IdFactory(#[source] PersistenceError),
}

/// The complete configuration of an evolution run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NeatConfig {
    pub genetic: GeneticConfig,
    pub population: PopulationConfig,
}

impl NeatConfig {
    /// Builds and validates a configuration. Absent keys take
    /// their defaults, except `initial.topology.activation`,
    /// which is required.
    ///
    /// # Errors
    /// Fails on a missing required property, an unparseable value,
    /// an unknown activation name, an invalid survival rate or
    /// an inverted weight range.
    ///
    /// # Examples
    /// ```
    /// use cppneat::{NeatConfig, Properties};
    ///
    /// let props: Properties = [
    ///     ("initial.topology.activation", "cppn"),
    ///     ("popul.size", "40"),
    ///     ("recurrent", "best_guess"),
    /// ]
    /// .into_iter()
    /// .collect();
    ///
    /// let config = NeatConfig::from_properties(&props).unwrap();
    ///
    /// assert_eq!(config.population.size, 40);
    /// assert_eq!(config.genetic.input_labels, ["bias", "d", "x", "y"]);
    /// ```
    pub fn from_properties(props: &Properties) -> Result<NeatConfig, ConfigError> {
        let genetic_defaults = GeneticConfig::default();
        let population_defaults = PopulationConfig::default();

        let hidden_activation = match props.get_str("initial.topology.activation")? {
            name if name.eq_ignore_ascii_case("cppn") => HiddenActivation::RandomCppn,
            name => HiddenActivation::Fixed(ActivationFunction::from_name(name)?),
        };
        let activation_or = |key: &str, default: ActivationFunction| -> Result<_, ConfigError> {
            match props.get_str(key) {
                Ok(name) => Ok(ActivationFunction::from_name(name)?),
                Err(_) => Ok(default),
            }
        };

        let genetic = GeneticConfig {
            input_count: props.get_usize_or("stimulus.size", genetic_defaults.input_count)?,
            output_count: props.get_usize_or("response.size", genetic_defaults.output_count)?,
            input_labels: props.get_list_or("input.labels", &["bias", "d", "x", "y"]),
            output_labels: props.get_list_or("output.labels", &["ink"]),
            initial_hidden_count: props.get_usize_or(
                "initial.topology.num.hidden.neurons",
                genetic_defaults.initial_hidden_count,
            )?,
            initial_fully_connected: props.get_bool_or(
                "initial.topology.fully.connected",
                genetic_defaults.initial_fully_connected,
            )?,
            input_activation: activation_or(
                "initial.topology.activation.input",
                genetic_defaults.input_activation,
            )?,
            output_activation: activation_or(
                "initial.topology.activation.output",
                genetic_defaults.output_activation,
            )?,
            hidden_activation,
            weight_max: props.get_f64_or("weight.max", genetic_defaults.weight_max)?,
            weight_min: props.get_f64_or("weight.min", genetic_defaults.weight_min)?,
            excess_coefficient: props
                .get_f64_or("chrom.compat.excess.coeff", genetic_defaults.excess_coefficient)?,
            disjoint_coefficient: props.get_f64_or(
                "chrom.compat.disjoint.coeff",
                genetic_defaults.disjoint_coefficient,
            )?,
            common_coefficient: props
                .get_f64_or("chrom.compat.common.coeff", genetic_defaults.common_coefficient)?,
            topology_mutation_classic: props.get_bool_or(
                "topology.mutation.classic",
                genetic_defaults.topology_mutation_classic,
            )?,
            add_connection_rate: props.get_f64_or(
                "add.connection.mutation.rate",
                genetic_defaults.add_connection_rate,
            )?,
            add_neuron_rate: props
                .get_f64_or("add.neuron.mutation.rate", genetic_defaults.add_neuron_rate)?,
            remove_connection_rate: props.get_f64_or(
                "remove.connection.mutation.rate",
                genetic_defaults.remove_connection_rate,
            )?,
            remove_connection_max_weight: props.get_f64_or(
                "remove.connection.max.weight",
                genetic_defaults.remove_connection_max_weight,
            )?,
            weight_mutation_rate: props
                .get_f64_or("weight.mutation.rate", genetic_defaults.weight_mutation_rate)?,
            weight_mutation_std_dev: props.get_f64_or(
                "weight.mutation.std.dev",
                genetic_defaults.weight_mutation_std_dev,
            )?,
            weight_mutation_distribution: props.get_enum_or::<WeightDistribution>(
                "weight.mutation.distribution",
                genetic_defaults.weight_mutation_distribution,
            )?,
            prune_rate: props.get_f64_or("prune.mutation.rate", genetic_defaults.prune_rate)?,
            activation_mutation_rate: props.get_f64_or(
                "activation.mutation.rate",
                genetic_defaults.activation_mutation_rate,
            )?,
            recurrency: props
                .get_enum_or::<RecurrencyPolicy>("recurrent", genetic_defaults.recurrency)?,
            recurrent_cycles: props
                .get_usize_or("recurrent.cycles", genetic_defaults.recurrent_cycles)?,
        };

        let population = PopulationConfig {
            size: props.get_usize_or("popul.size", population_defaults.size)?,
            survival_rate: props.get_f64_or("survival.rate", population_defaults.survival_rate)?,
            elitism: props.get_bool_or("selector.elitism", population_defaults.elitism)?,
            elitism_min_specie_size: props.get_usize_or(
                "selector.elitism.min.specie.size",
                population_defaults.elitism_min_specie_size,
            )?,
            roulette: props.get_bool_or("selector.roulette", population_defaults.roulette)?,
            speciation_threshold: props
                .get_f64_or("speciation.threshold", population_defaults.speciation_threshold)?,
            innovation_persist: props
                .get_bool_or("innovation.persist", population_defaults.innovation_persist)?,
            random_seed: props.get_u64_or("random.seed", population_defaults.random_seed)?,
        };

        let config = NeatConfig {
            genetic,
            population,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the cross-field constraints of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.population.survival_rate;
        if !(0.0..0.5).contains(&rate) {
            return Err(ConfigError::SurvivalRate(rate));
        }
        let genetic = &self.genetic;
        let (min, max) = (genetic.weight_min, genetic.weight_max);
        if min.partial_cmp(&max).map_or(true, |order| order.is_gt()) {
            return Err(ConfigError::InvertedWeightBounds { min, max });
        }
        if genetic.input_labels.len() > genetic.input_count {
            return Err(ConfigError::LabelCount {
                kind: "input",
                labels: genetic.input_labels.len(),
                count: genetic.input_count,
            });
        }
        if genetic.output_labels.len() > genetic.output_count {
            return Err(ConfigError::LabelCount {
                kind: "output",
                labels: genetic.output_labels.len(),
                count: genetic.output_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs.iter().copied().collect()
    }

    #[test]
    fn defaults_apply() {
        let config = NeatConfig::from_properties(&props(&[("initial.topology.activation", "cppn")]))
            .unwrap();
        assert_eq!(config.population, PopulationConfig::default());
        assert_eq!(config.genetic, GeneticConfig::default());
    }

    #[test]
    fn activation_is_required() {
        assert!(matches!(
            NeatConfig::from_properties(&Properties::new()),
            Err(ConfigError::MissingProperty(key)) if key == "initial.topology.activation"
        ));
    }

    #[test]
    fn unknown_activation_is_fatal() {
        let result = NeatConfig::from_properties(&props(&[
            ("initial.topology.activation", "cppn"),
            ("initial.topology.activation.output", "softplus"),
        ]));
        assert!(matches!(result, Err(ConfigError::UnknownActivation(_))));
    }

    #[test]
    fn survival_rate_of_one_half_is_rejected() {
        let result = NeatConfig::from_properties(&props(&[
            ("initial.topology.activation", "tanh"),
            ("survival.rate", "0.5"),
        ]));
        assert!(matches!(result, Err(ConfigError::SurvivalRate(rate)) if rate == 0.5));
    }

    #[test]
    fn inverted_weight_bounds_are_rejected() {
        let result = NeatConfig::from_properties(&props(&[
            ("initial.topology.activation", "cppn"),
            ("weight.min", "5"),
            ("weight.max", "-5"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvertedWeightBounds { min, max }) if min == 5.0 && max == -5.0
        ));

        let result = NeatConfig::from_properties(&props(&[
            ("initial.topology.activation", "cppn"),
            ("weight.min", "NaN"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvertedWeightBounds { .. })));
    }

    #[test]
    fn degenerate_weight_range_is_accepted() {
        let config = NeatConfig::from_properties(&props(&[
            ("initial.topology.activation", "cppn"),
            ("weight.min", "1.5"),
            ("weight.max", "1.5"),
        ]))
        .unwrap();
        assert_eq!(config.genetic.weight_min, config.genetic.weight_max);
    }

    #[test]
    fn fixed_hidden_activation_and_labels() {
        let config = NeatConfig::from_properties(&props(&[
            ("initial.topology.activation", "signed.gaussian"),
            ("stimulus.size", "2"),
            ("input.labels", "x,y"),
            ("response.size", "3"),
            ("output.labels", "red,green,blue"),
        ]))
        .unwrap();
        assert_eq!(
            config.genetic.hidden_activation,
            HiddenActivation::Fixed(ActivationFunction::SignedGaussian)
        );
        assert_eq!(config.genetic.output_labels, ["red", "green", "blue"]);
    }

    #[test]
    fn too_many_labels() {
        let result = NeatConfig::from_properties(&props(&[
            ("initial.topology.activation", "cppn"),
            ("stimulus.size", "2"),
        ]));
        assert!(matches!(result, Err(ConfigError::LabelCount { kind: "input", .. })));
    }
}
