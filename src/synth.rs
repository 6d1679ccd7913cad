//! Owns the 128 voices and the shared bridge bus that binds them into one
//! physical system, plus the body resonator and MIDI routing.

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    midi::{MidiEvent, MidiMessage},
    output::HostAdapter,
    resonator::Resonator,
    voice::{Voice, HAMMER_STRIKE_POSITION_CENTER, HAMMER_STRIKE_POSITION_VARIATION},
};

// -------------------------------------------------------------------------------------------------

/// Total number of voices: one per MIDI note.
pub const N_VOICES: usize = 128;
/// Only voices in `[VOICE_MIN, VOICE_MAX)` participate in the summing/
/// distribution bus each sample.
pub const VOICE_MIN: usize = 36;
pub const VOICE_MAX: usize = 97;
/// Scales the bridge bus sum before it is divided and redistributed.
pub const SYMPATHETIC_RESONANCE: f64 = 5.0;
/// Pitch wheel range, in semitones.
pub const BEND_RANGE: f64 = 2.0;
/// Output gain applied after the body resonator.
pub const VOLUME: f64 = 2.0;

// -------------------------------------------------------------------------------------------------

/// Construction-time tunables a host may reasonably want to override.
/// Sample rate is not here: it is supplied through the `HostAdapter`
/// callback contract itself, not fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    pub sympathetic_resonance: f64,
    pub volume: f64,
    pub bend_range: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sympathetic_resonance: SYMPATHETIC_RESONANCE,
            volume: VOLUME,
            bend_range: BEND_RANGE,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// The synthesizer: 128 waveguide voices coupled through a shared bridge bus,
/// followed by a body-resonance convolution.
pub struct Synth {
    voices: Vec<Voice>,
    resonator: Resonator,
    rate: f64,
    delta_time: f64,
    bend: f64,
    rng: SmallRng,
    config: SynthConfig,
}

impl Synth {
    /// Create a synth at the given sample rate with the given (already loaded)
    /// body impulse response and default tunables. Allocates all 128 voices
    /// up front; they are never destroyed until the synth itself is dropped.
    pub fn new(rate: f64, impulse_response: Vec<f64>) -> Self {
        Self::with_config(rate, impulse_response, SynthConfig::default())
    }

    /// Like [`Self::new`], but with explicit tunables.
    pub fn with_config(rate: f64, impulse_response: Vec<f64>, config: SynthConfig) -> Self {
        let voices = (0..N_VOICES as u8).map(|note| Voice::new(note, rate)).collect();
        Self {
            voices,
            resonator: Resonator::new(impulse_response),
            rate,
            delta_time: 1.0 / rate,
            bend: 0.0,
            rng: SmallRng::from_os_rng(),
            config,
        }
    }

    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[inline]
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Pitch wheel position in semitones. Tracked but not currently wired
    /// into voice frequency.
    #[inline]
    pub fn bend(&self) -> f64 {
        self.bend
    }

    #[inline]
    pub fn voice(&self, note: u8) -> &Voice {
        &self.voices[note as usize]
    }

    /// One iteration of the coupled voice network: sum the active voices'
    /// outputs, scale and redistribute the result as bridge-coupling feedback,
    /// and run the sum through the body resonator.
    fn step(&mut self) -> f64 {
        let sum: f64 = self.voices[VOICE_MIN..VOICE_MAX].iter().map(Voice::output).sum();
        let reflection = self.config.sympathetic_resonance * sum;
        let distributed = reflection / N_VOICES as f64;
        for voice in &mut self.voices[VOICE_MIN..VOICE_MAX] {
            voice.process(distributed);
        }
        self.config.volume * self.resonator.process(sum)
    }

    fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.step() as f32;
        }
    }

    fn note_on(&mut self, note: u8, velocity: u8) {
        let Some(voice) = self.voices.get_mut(note as usize) else {
            log::warn!("Dropping note-on for out-of-range note {note}");
            return;
        };
        let strike_position =
            HAMMER_STRIKE_POSITION_CENTER + HAMMER_STRIKE_POSITION_VARIATION * self.rng.random_range(-1.0..1.0);
        voice.note_on(velocity, strike_position);
    }

    fn note_off(&mut self, note: u8, velocity: u8) {
        let Some(voice) = self.voices.get_mut(note as usize) else {
            log::warn!("Dropping note-off for out-of-range note {note}");
            return;
        };
        voice.note_off(velocity);
    }

    fn apply_midi_message(&mut self, message: MidiMessage) {
        match message {
            MidiMessage::NoteOff { note, velocity, .. } => self.note_off(note, velocity),
            // velocity=0 note-on is *not* special-cased: honored as-is.
            MidiMessage::NoteOn { note, velocity, .. } => self.note_on(note, velocity),
            MidiMessage::ControlChange { controller, value, .. } => match controller {
                1 => {
                    let amount = value as f64 / 127.0;
                    for voice in &mut self.voices {
                        voice.damper_set(amount);
                    }
                }
                64 => {
                    // CC 64 follows MIDI convention: 127 = pedal fully down
                    // (dampers lifted, strings ring free). Voice::sustain_set
                    // uses the opposite sense (0 = free), so invert here.
                    let amount = value as f64 / 127.0;
                    for voice in &mut self.voices {
                        voice.sustain_set(1.0 - amount);
                    }
                }
                11 => { /* expression: reserved, no-op */ }
                _ => {}
            },
            MidiMessage::PitchBend { lsb, msb, .. } => {
                let value = ((msb as i32) << 7) | lsb as i32;
                self.bend = (value as f64 / 0x2000_i32 as f64 - 1.0) * self.config.bend_range;
            }
            MidiMessage::PolyphonicKeyPressure { .. }
            | MidiMessage::ProgramChange { .. }
            | MidiMessage::ChannelPressure { .. }
            | MidiMessage::Unknown => {}
        }
    }
}

impl HostAdapter for Synth {
    fn on_rate_change(&mut self, rate_hz: u32) {
        self.rate = rate_hz as f64;
        self.delta_time = 1.0 / self.rate;
        for voice in &mut self.voices {
            voice.set_rate(self.rate);
        }
    }

    fn on_audio(&mut self, frames: usize, midi_events: &[MidiEvent], out: &mut [f32]) {
        debug_assert_eq!(out.len(), frames);
        let mut i_frame = 0usize;
        for event in midi_events {
            let event_time = event.time.min(frames);
            if event_time > i_frame {
                self.render(&mut out[i_frame..event_time]);
            }
            i_frame = event_time.max(i_frame);
            self.apply_midi_message(event.message);
        }
        if i_frame < frames {
            self.render(&mut out[i_frame..frames]);
        }
    }

    fn on_shutdown(&mut self) {
        log::info!("Synth shutting down");
    }
}

// -------------------------------------------------------------------------------------------------
