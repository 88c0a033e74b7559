use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

/// Separation of the two parabolic halves of [`ActivationFunction::EvSailSigmoid`].
const EV_SAIL_SEPARATION: f64 = 0.3;
/// Slope softening of [`ActivationFunction::InverseAbs`].
const INVERSE_ABS_SLOPE: f64 = 0.3;

/// Error returned when looking up an activation
/// function by a name that is not registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a registered activation function")]
pub struct UnknownActivationError(pub String);

/// An ActivationFunction represents the scalar
/// function a neuron applies to its summed input.
///
/// Every variant is stateless and carries a fixed
/// resource cost and output range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationFunction {
    // x
    Linear,
    // 1 / (1 + exp(-x))
    Sigmoid,
    // 2 / (1 + exp(-x)) - 1
    SignedSigmoid,
    // tanh(x)
    Tanh,
    // -1 + 2 / (1 + exp(-x³))
    TanhCubic,
    // piecewise quadratic sigmoid approximation
    EvSailSigmoid,
    // x / (0.3 + |x|)
    InverseAbs,
    // clamp(x, 0, 1)
    ClampedLinear,
    // clamp(x, -1, 1)
    SignedClampedLinear,
    // 1 if x > 0, else 0
    Step,
    // 1 if x > 0, else -1
    SignedStep,
    // exp(-x²)
    Gaussian,
    // 2exp(-x²) - 1
    SignedGaussian,
    // sin(x)
    Sine,
    // cos(x)
    Cosine,
    // |x|
    Absolute,
}

impl ActivationFunction {
    /// Every registered activation function.
    pub const ALL: [ActivationFunction; 16] = [
        ActivationFunction::Linear,
        ActivationFunction::Sigmoid,
        ActivationFunction::SignedSigmoid,
        ActivationFunction::Tanh,
        ActivationFunction::TanhCubic,
        ActivationFunction::EvSailSigmoid,
        ActivationFunction::InverseAbs,
        ActivationFunction::ClampedLinear,
        ActivationFunction::SignedClampedLinear,
        ActivationFunction::Step,
        ActivationFunction::SignedStep,
        ActivationFunction::Gaussian,
        ActivationFunction::SignedGaussian,
        ActivationFunction::Sine,
        ActivationFunction::Cosine,
        ActivationFunction::Absolute,
    ];

    /// Activation functions eligible for random
    /// assignment to CPPN hidden neurons.
    pub const CPPN: [ActivationFunction; 4] = [
        ActivationFunction::SignedGaussian,
        ActivationFunction::Linear,
        ActivationFunction::Sine,
        ActivationFunction::SignedSigmoid,
    ];

    /// Returns a uniformly chosen member of [`CPPN`].
    ///
    /// [`CPPN`]: ActivationFunction::CPPN
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::ActivationFunction;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
    /// let f = ActivationFunction::random_cppn(&mut rng);
    ///
    /// assert!(ActivationFunction::CPPN.contains(&f));
    /// ```
    pub fn random_cppn<R: Rng + ?Sized>(rng: &mut R) -> ActivationFunction {
        Self::CPPN[rng.gen_range(0..Self::CPPN.len())]
    }

    /// Looks up an activation function by its registered name,
    /// ignoring case. Some historical aliases are accepted.
    ///
    /// # Errors
    /// Returns an error if the name is not registered.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::ActivationFunction;
    ///
    /// assert_eq!(ActivationFunction::from_name("Sigmoid"), Ok(ActivationFunction::Sigmoid));
    /// assert_eq!(ActivationFunction::from_name("identity"), Ok(ActivationFunction::Linear));
    /// assert!(ActivationFunction::from_name("softmax").is_err());
    /// ```
    pub fn from_name(name: &str) -> Result<ActivationFunction, UnknownActivationError> {
        let lowered = name.trim().to_ascii_lowercase();
        let function = match lowered.as_str() {
            "linear" | "identity" | "identity(x)" => Self::Linear,
            "sigmoid" | "unsigned.sigmoid" => Self::Sigmoid,
            "signed.sigmoid" => Self::SignedSigmoid,
            "tanh" => Self::Tanh,
            "tanh.cubic" | "tanh-cubic" => Self::TanhCubic,
            "evsail.sigmoid" | "evsailsigmoid" => Self::EvSailSigmoid,
            "inverse.abs" | "inverseabs" => Self::InverseAbs,
            "clamped.linear" | "clamped-linear" => Self::ClampedLinear,
            "signed.clamped.linear" | "signed-clamped-linear" => Self::SignedClampedLinear,
            "step" => Self::Step,
            "signed.step" | "step.signed" => Self::SignedStep,
            "gaussian" | "unsigned.gaussian" => Self::Gaussian,
            "signed.gaussian" => Self::SignedGaussian,
            "sine" | "signed.sine" | "signed.sinusoid" | "sin(x)" => Self::Sine,
            "cosine" | "cos(x)" => Self::Cosine,
            "absolute" | "abs" => Self::Absolute,
            _ => return Err(UnknownActivationError(name.to_string())),
        };
        Ok(function)
    }

    /// Returns the canonical registered name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Sigmoid => "sigmoid",
            Self::SignedSigmoid => "signed.sigmoid",
            Self::Tanh => "tanh",
            Self::TanhCubic => "tanh.cubic",
            Self::EvSailSigmoid => "evsail.sigmoid",
            Self::InverseAbs => "inverse.abs",
            Self::ClampedLinear => "clamped.linear",
            Self::SignedClampedLinear => "signed.clamped.linear",
            Self::Step => "step",
            Self::SignedStep => "signed.step",
            Self::Gaussian => "gaussian",
            Self::SignedGaussian => "signed.gaussian",
            Self::Sine => "sine",
            Self::Cosine => "cosine",
            Self::Absolute => "absolute",
        }
    }

    /// Relative resource cost of evaluating the function once.
    pub fn cost(&self) -> u64 {
        match self {
            Self::Sigmoid | Self::SignedSigmoid => 497,
            Self::Tanh => 385,
            Self::TanhCubic => 1231,
            Self::EvSailSigmoid => 166,
            Self::InverseAbs | Self::Sine | Self::Cosine => 75,
            Self::Linear
            | Self::ClampedLinear
            | Self::SignedClampedLinear
            | Self::Step
            | Self::SignedStep
            | Self::Gaussian
            | Self::SignedGaussian
            | Self::Absolute => 42,
        }
    }

    /// Lowest value the function can produce.
    pub fn min_value(&self) -> f64 {
        match self {
            Self::Linear => -f64::MAX,
            Self::Sigmoid
            | Self::EvSailSigmoid
            | Self::ClampedLinear
            | Self::Step
            | Self::Gaussian
            | Self::Absolute => 0.0,
            _ => -1.0,
        }
    }

    /// Highest value the function can produce.
    pub fn max_value(&self) -> f64 {
        match self {
            Self::Linear | Self::Absolute => f64::MAX,
            _ => 1.0,
        }
    }

    /// Evaluates the function at `x`.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::ActivationFunction;
    ///
    /// assert!((ActivationFunction::Sigmoid.apply(1.0) - 0.731).abs() < 1e-3);
    /// assert_eq!(ActivationFunction::SignedStep.apply(-0.5), -1.0);
    /// ```
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::Sigmoid => sigmoid(x),
            Self::SignedSigmoid => sigmoid(x) * 2.0 - 1.0,
            Self::Tanh => x.tanh(),
            Self::TanhCubic => -1.0 + 2.0 / (1.0 + (-x).powi(3).exp()),
            Self::EvSailSigmoid => ev_sail_sigmoid(x),
            Self::InverseAbs => x / (INVERSE_ABS_SLOPE + x.abs()),
            Self::ClampedLinear => x.clamp(0.0, 1.0),
            Self::SignedClampedLinear => x.clamp(-1.0, 1.0),
            Self::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::SignedStep => {
                if x > 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::Gaussian => (-x * x).exp(),
            Self::SignedGaussian => (-x * x).exp() * 2.0 - 1.0,
            Self::Sine => x.sin(),
            Self::Cosine => x.cos(),
            Self::Absolute => x.abs(),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn ev_sail_sigmoid(x: f64) -> f64 {
    let denominator = 2.0 * EV_SAIL_SEPARATION * EV_SAIL_SEPARATION;
    if x <= -EV_SAIL_SEPARATION {
        0.0
    } else if x <= 0.0 {
        let t = x + EV_SAIL_SEPARATION;
        t * t / denominator
    } else if x < EV_SAIL_SEPARATION {
        let t = x - EV_SAIL_SEPARATION;
        1.0 - t * t / denominator
    } else {
        1.0
    }
}

impl FromStr for ActivationFunction {
    type Err = UnknownActivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn names_resolve_to_themselves() {
        for f in ActivationFunction::ALL {
            assert_eq!(ActivationFunction::from_name(f.name()), Ok(f));
            assert_eq!(f.to_string().parse::<ActivationFunction>(), Ok(f));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(
            ActivationFunction::from_name("relu"),
            Err(UnknownActivationError("relu".into()))
        );
    }

    #[test]
    fn outputs_stay_within_declared_range() {
        let samples = [-50.0, -3.0, -1.0, -0.3, -0.1, 0.0, 0.1, 0.3, 1.0, 3.0, 50.0];
        for f in ActivationFunction::ALL {
            for x in samples {
                let y = f.apply(x);
                assert!(
                    y >= f.min_value() && y <= f.max_value(),
                    "{} produced {} at {}",
                    f,
                    y,
                    x
                );
            }
        }
    }

    #[test]
    fn known_values() {
        assert_approx_eq!(ActivationFunction::Sigmoid.apply(1.0), 0.7310585786, 1e-9);
        assert_approx_eq!(ActivationFunction::SignedSigmoid.apply(0.0), 0.0);
        assert_approx_eq!(ActivationFunction::Gaussian.apply(0.0), 1.0);
        assert_approx_eq!(ActivationFunction::SignedGaussian.apply(0.0), 1.0);
        assert_approx_eq!(ActivationFunction::EvSailSigmoid.apply(0.0), 0.5);
        assert_approx_eq!(ActivationFunction::InverseAbs.apply(0.3), 0.5);
        assert_approx_eq!(ActivationFunction::TanhCubic.apply(0.0), 0.0);
        assert_eq!(ActivationFunction::SignedClampedLinear.apply(4.0), 1.0);
    }

    #[test]
    fn random_cppn_covers_the_whole_set() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut seen = vec![];
        for _ in 0..200 {
            let f = ActivationFunction::random_cppn(&mut rng);
            if !seen.contains(&f) {
                seen.push(f);
            }
        }
        assert_eq!(seen.len(), ActivationFunction::CPPN.len());
    }
}
