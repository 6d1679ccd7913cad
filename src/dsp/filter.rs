//! One-pole IIR low-pass filter, with a high-pass derived by subtraction.

use std::f64::consts::TAU;

// -------------------------------------------------------------------------------------------------

/// A one-pole low-pass filter `state += coefficient * (input - state)`.
///
/// The same instance derives a high-pass output via [`Filter::process_high_pass`],
/// which advances the filter once and returns `input - lowpass(input)`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Filter {
    state: f64,
    coefficient: f64,
}

impl Filter {
    /// Create a new, zero-initialized filter with the given cutoff at the given sample rate.
    pub fn new(cutoff: f64, rate: f64) -> Self {
        let mut filter = Self {
            state: 0.0,
            coefficient: 0.0,
        };
        filter.set_cutoff(cutoff, rate);
        filter
    }

    /// Re-derive the filter coefficient for a new cutoff/rate. Idempotent, does not alter state.
    ///
    /// `cutoff` is not required to be below Nyquist: the transition smoothers
    /// reuse this same formula with coefficients well past it (e.g.
    /// `COEFFICIENT_TRANSITION_FINGER_MAX = 100000`) purely to get a fast
    /// exponential approach to 1, not a frequency-selective response.
    pub fn set_cutoff(&mut self, cutoff: f64, rate: f64) {
        debug_assert!(cutoff > 0.0, "cutoff must be positive");
        self.coefficient = (1.0 - (-TAU * cutoff / rate).exp()).clamp(0.0, 1.0);
    }

    /// Current low-pass state.
    #[inline]
    pub fn state(&self) -> f64 {
        self.state
    }

    /// Force the filter's internal state, without touching the coefficient.
    #[inline]
    pub fn set_state(&mut self, state: f64) {
        self.state = state;
    }

    /// Advance the filter by one sample and return the low-pass output.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.state += self.coefficient * (input - self.state);
        self.state
    }

    /// Advance the filter by one sample and return the high-pass output.
    #[inline]
    pub fn process_high_pass(&mut self, input: f64) -> f64 {
        input - self.process(input)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_response_at_time_constant() {
        let rate = 48_000.0;
        let cutoff = 500.0;
        let mut filter = Filter::new(cutoff, rate);

        let time_constant_samples = (rate / (2.0 * std::f64::consts::PI * cutoff)).round() as usize;
        let mut output = 0.0;
        for _ in 0..time_constant_samples {
            output = filter.process(1.0);
        }
        // After one time constant, a one-pole step response reaches 1 - e^-1 ~= 0.632.
        assert!((output - 0.632).abs() < 0.02, "output was {output}");
    }

    #[test]
    fn test_high_pass_of_dc_converges_to_zero() {
        let mut filter = Filter::new(20.0, 48_000.0);
        let mut output = 1.0;
        for _ in 0..48_000 {
            output = filter.process_high_pass(1.0);
        }
        assert!(output.abs() < 1e-3, "output was {output}");
    }

    #[test]
    fn test_super_nyquist_cutoff_does_not_panic_and_clamps_near_one() {
        // COEFFICIENT_TRANSITION_FINGER_MAX = 100000 is far past Nyquist at
        // any realistic rate; it's used to get a fast exponential approach
        // to 1, not a frequency-selective response, and must not panic.
        let mut filter = Filter::new(100_000.0, 48_000.0);
        let output = filter.process(1.0);
        assert!((0.0..=1.0).contains(&output));
        assert!(output > 0.999, "output was {output}");
    }

    #[test]
    fn test_set_cutoff_is_idempotent() {
        let mut filter = Filter::new(500.0, 48_000.0);
        filter.process(0.5);
        let state_before = filter.state();
        filter.set_cutoff(500.0, 48_000.0);
        assert_eq!(filter.state(), state_before);
    }
}
