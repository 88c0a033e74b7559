use super::graph::CppnNeuron;

use cppneat::genomics::NeuronAllele;

use serde::{Deserialize, Serialize};

/// Scaling applied to a query point before
/// it is written to the input neurons.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputScaling {
    /// Factor applied to `x`.
    pub x: f64,
    /// Factor applied to `y`.
    pub y: f64,
    /// Factor applied to the distance of the
    /// scaled point from the origin.
    pub distance: f64,
    /// Value of the bias input.
    pub bias: f64,
}

impl Default for InputScaling {
    fn default() -> InputScaling {
        InputScaling {
            x: 1.0,
            y: 1.0,
            distance: 1.0,
            bias: 1.0,
        }
    }
}

/// Input neurons fed by a query point.
#[derive(Clone, Debug)]
pub(super) struct InputLayer {
    scaling: InputScaling,
    bias: Option<usize>,
    distance: Option<usize>,
    x: Option<usize>,
    y: Option<usize>,
}

impl InputLayer {
    /// Finds each input by label. An input without a labelled
    /// neuron falls back to the unlabelled input neuron at its
    /// position (bias, d, x, y) among inputs, if any.
    ///
    /// `inputs` are (neuron index, allele) pairs in id order.
    pub fn new(inputs: &[(usize, &NeuronAllele)], scaling: InputScaling) -> InputLayer {
        let find = |label: &str, position: usize| {
            inputs
                .iter()
                .find(|(_, n)| n.label() == Some(label))
                .or_else(|| inputs.get(position).filter(|(_, n)| n.label().is_none()))
                .map(|(i, _)| *i)
        };
        InputLayer {
            scaling,
            bias: find("bias", 0),
            distance: find("d", 1),
            x: find("x", 2),
            y: find("y", 3),
        }
    }

    pub fn write(&self, neurons: &mut [CppnNeuron], x: f64, y: f64) {
        let x = x * self.scaling.x;
        let y = y * self.scaling.y;
        let values = [
            (self.x, x),
            (self.y, y),
            (self.distance, x.hypot(y) * self.scaling.distance),
            (self.bias, self.scaling.bias),
        ];
        for (index, value) in values {
            if let Some(index) = index {
                neurons[index].set_input(value);
            }
        }
    }
}

/// Converts output channel values into an RGB colour
/// with components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputLayer {
    /// A single `ink` channel (or the first output),
    /// as the magnitude of its value.
    Grey,
    /// `red`, `green` and `blue` channels.
    Rgb,
    /// `hue`, `saturation` and `brightness` channels.
    Hsb,
}

impl OutputLayer {
    /// Returns the colour for the channel `values`,
    /// labelled by `labels`. Missing channels read as 0.
    ///
    /// # Examples
    /// ```
    /// use cppneat_nn::cppn::OutputLayer;
    ///
    /// let labels = [Some("hue".to_string()), Some("saturation".to_string()), Some("brightness".to_string())];
    ///
    /// assert_eq!(OutputLayer::Hsb.render(&labels, &[0.0, 1.0, 1.0]), [1.0, 0.0, 0.0]);
    /// assert_eq!(OutputLayer::Hsb.render(&labels, &[0.5, 0.0, -0.5]), [0.5, 0.5, 0.5]);
    /// ```
    pub fn render(&self, labels: &[Option<String>], values: &[f64]) -> [f64; 3] {
        let channel = |name: &str| {
            labels
                .iter()
                .position(|l| l.as_deref() == Some(name))
                .and_then(|i| values.get(i).copied())
        };
        match self {
            OutputLayer::Grey => {
                let ink = channel("ink").or_else(|| values.first().copied()).unwrap_or(0.0);
                [ink.abs().min(1.0); 3]
            }
            OutputLayer::Rgb => ["red", "green", "blue"].map(|c| clamp(channel(c).unwrap_or(0.0))),
            OutputLayer::Hsb => hsb_to_rgb(
                channel("hue").unwrap_or(0.0),
                clamp(channel("saturation").unwrap_or(0.0)),
                clamp(channel("brightness").unwrap_or(0.0).abs()),
            ),
        }
    }
}

fn clamp(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Hue wraps around every unit.
fn hsb_to_rgb(hue: f64, saturation: f64, brightness: f64) -> [f64; 3] {
    let h = (hue * 6.0).rem_euclid(6.0);
    // rem_euclid may round up to 6 for tiny negative hues.
    let h = if h >= 6.0 { 0.0 } else { h };
    let sector = h.floor();
    let f = h - sector;
    let v = brightness;
    let p = v * (1.0 - saturation);
    let q = v * (1.0 - saturation * f);
    let t = v * (1.0 - saturation * (1.0 - f));
    match sector as u8 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cppneat::genomics::{ActivationFunction, NeuronType};

    use assert_approx_eq::assert_approx_eq;

    fn labels(names: &[&str]) -> Vec<Option<String>> {
        names.iter().map(|n| Some(n.to_string())).collect()
    }

    #[test]
    fn inputs_by_label_then_position() {
        let alleles = [
            NeuronAllele::new(0, NeuronType::Input, ActivationFunction::Linear).with_label("y"),
            NeuronAllele::new(1, NeuronType::Input, ActivationFunction::Linear),
            NeuronAllele::new(2, NeuronType::Input, ActivationFunction::Linear).with_label("x"),
        ];
        let inputs: Vec<(usize, &NeuronAllele)> = alleles.iter().enumerate().collect();
        let layer = InputLayer::new(&inputs, InputScaling::default());
        assert_eq!(layer.y, Some(0));
        assert_eq!(layer.x, Some(2));
        // Position 1 is unlabelled, so it is the distance input.
        assert_eq!(layer.distance, Some(1));
        // Position 0 is labelled "y".
        assert_eq!(layer.bias, None);
    }

    #[test]
    fn grey_is_ink_magnitude() {
        let layer = OutputLayer::Grey;
        assert_eq!(layer.render(&labels(&["other", "ink"]), &[0.2, -0.4]), [0.4; 3]);
        assert_eq!(layer.render(&[None], &[3.0]), [1.0; 3]);
        assert_eq!(layer.render(&[], &[]), [0.0; 3]);
    }

    #[test]
    fn rgb_channels_are_clamped() {
        let rgb = OutputLayer::Rgb.render(&labels(&["blue", "red", "green"]), &[2.0, 0.25, -1.0]);
        assert_eq!(rgb, [0.25, 0.0, 1.0]);
    }

    #[test]
    fn hsb_sectors() {
        let labels = labels(&["hue", "saturation", "brightness"]);
        let green = OutputLayer::Hsb.render(&labels, &[1.0 / 3.0, 1.0, 1.0]);
        assert_approx_eq!(green[0], 0.0);
        assert_approx_eq!(green[1], 1.0);
        assert_approx_eq!(green[2], 0.0);
        // Negative hues wrap around.
        let wrapped = OutputLayer::Hsb.render(&labels, &[-2.0 / 3.0, 1.0, 1.0]);
        for (a, b) in wrapped.iter().zip(green.iter()) {
            assert_approx_eq!(a, b);
        }
    }
}
