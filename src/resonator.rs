//! Body-resonance convolution with a tunable wet/dry blend.

use crate::dsp::convolver::Convolver;

/// Blend factor between the dry input and the convolved ("wet") body
/// resonance. At `1.0` the authoritative behavior is pure convolution.
pub const RESONANCE_BODY: f64 = 1.0;

// -------------------------------------------------------------------------------------------------

/// Wraps a [`Convolver`] and blends wet body resonance with the dry input.
#[derive(Debug, Clone)]
pub struct Resonator {
    convolver: Convolver,
    body: f64,
}

impl Resonator {
    pub fn new(impulse_response: Vec<f64>) -> Self {
        Self {
            convolver: Convolver::new(impulse_response),
            body: RESONANCE_BODY,
        }
    }

    /// Set the wet/dry blend. `1.0` is fully wet (convolved), `0.0` fully dry.
    pub fn set_body(&mut self, body: f64) {
        self.body = body.clamp(0.0, 1.0);
    }

    /// `process(x) = lerp(body, x, convolver.process(x))`.
    pub fn process(&mut self, input: f64) -> f64 {
        let wet = self.convolver.process(input);
        input + self.body * (wet - input)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_wet_is_pure_convolution() {
        let mut resonator = Resonator::new(vec![0.0, 1.0]);
        assert_eq!(resonator.process(1.0), 0.0);
        assert_eq!(resonator.process(0.0), 1.0);
    }

    #[test]
    fn test_fully_dry_passes_input_through() {
        let mut resonator = Resonator::new(vec![0.0, 1.0]);
        resonator.set_body(0.0);
        assert_eq!(resonator.process(1.0), 1.0);
        assert_eq!(resonator.process(0.5), 0.5);
    }
}
