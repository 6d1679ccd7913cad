//! The host-adapter contract and optional reference implementations of it
//! against real audio/MIDI backends.
//!
//! The core engine ([`crate::synth::Synth`]) implements [`HostAdapter`]
//! directly — a host only ever needs to own a `Synth` and forward its three
//! callbacks. Everything else in this module is glue for actually running
//! against a device, which is out of the core's scope.

#[cfg(feature = "cpal-output")]
pub mod cpal;

use crate::midi::MidiEvent;

// -------------------------------------------------------------------------------------------------

/// The three callbacks any host audio framework needs to drive the core.
pub trait HostAdapter {
    /// Invoked before any audio callback, and whenever the sample rate changes.
    fn on_rate_change(&mut self, rate_hz: u32);

    /// Produce `frames` samples into `out`, interleaving MIDI event
    /// application at the frame offsets the events carry.
    fn on_audio(&mut self, frames: usize, midi_events: &[MidiEvent], out: &mut [f32]);

    /// Release all resources. Called once, on host shutdown.
    fn on_shutdown(&mut self);
}

// -------------------------------------------------------------------------------------------------

/// Selects which native audio host API a [`cpal`] based adapter should open.
#[cfg(feature = "cpal-output")]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum AudioHostId {
    #[default]
    Default,
    #[cfg(target_os = "linux")]
    Jack,
}
