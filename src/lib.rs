//! A realtime polyphonic physical-model piano synthesizer.
//!
//! Each piano key is modeled as an excited, damped, terminated waveguide — a
//! [`dsp::delay::Delay`] line closed by frequency-dependent filters
//! representing string damper, finger, and bridge — and all keys are coupled
//! through a shared bridge bus producing sympathetic resonance. The summed
//! result optionally passes through a body-resonance convolution
//! ([`resonator::Resonator`]).
//!
//! [`synth::Synth`] is the entry point: it owns all 128 voices and routes
//! MIDI to them. It implements [`output::HostAdapter`], the three-callback
//! contract ([`output::HostAdapter::on_rate_change`],
//! [`output::HostAdapter::on_audio`], [`output::HostAdapter::on_shutdown`])
//! any host audio framework needs to drive it. The `cpal-output` and
//! `midi-input` features add a small reference host adapter
//! ([`output::cpal`]) that actually opens a device and a MIDI port.

// private mods (will be partly re-exported)
mod error;
mod ir;
mod midi;
mod music;
mod resonator;
mod synth;
mod voice;

pub mod dsp;
pub mod output;

// public, flat re-exports
pub use error::Error;
pub use ir::load_impulse_response;
pub use midi::{decode_event, decode_message, MidiEvent, MidiMessage};
pub use music::note_frequency;
pub use output::HostAdapter;
pub use resonator::Resonator;
pub use synth::{Synth, SynthConfig, BEND_RANGE, N_VOICES, SYMPATHETIC_RESONANCE, VOICE_MAX, VOICE_MIN, VOLUME};
pub use voice::Voice;
