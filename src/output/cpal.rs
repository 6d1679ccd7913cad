//! Reference host adapter: wires a [`Synth`] up to a real output device via
//! [cpal](https://github.com/RustAudio/cpal) and, with the `midi-input`
//! feature, a real MIDI input port via [midir](https://github.com/Boddlnagg/midir).
//!
//! This module is glue, not core: the host audio/MIDI transport (callback
//! invocation, buffer acquisition, port registration, event timestamps) is
//! out of scope for the synthesizer itself. It exists so the crate can
//! actually be run end to end: register one MIDI input port and one audio
//! output port, and run until terminated.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::{midi::decode_event, output::AudioHostId, output::HostAdapter, synth::Synth, Error};

// -------------------------------------------------------------------------------------------------

const PREFERRED_SAMPLE_FORMAT: cpal::SampleFormat = cpal::SampleFormat::F32;
const PREFERRED_BUFFER_SIZE: cpal::BufferSize = if cfg!(debug_assertions) {
    cpal::BufferSize::Default
} else {
    cpal::BufferSize::Fixed(1024)
};

/// Raw 3-byte MIDI message queued from the input port to the audio callback.
///
/// `midir` does not expose sample-accurate offsets relative to the audio
/// callback (a frame-relative `time` is an audio-host concept the MIDI port
/// has no notion of), so every queued message is applied at `time = 0` of the
/// callback it is drained in. A host that shares one realtime clock across
/// both ports could recover true per-sample offsets; that is out of scope
/// for this reference adapter.
type QueuedMidiMessage = [u8; 3];

// -------------------------------------------------------------------------------------------------

/// Runs a [`Synth`] against the default `cpal` output device, optionally
/// driven by a `midir` MIDI input port (`midi-input` feature).
pub struct CpalPianoHost {
    stream: cpal::Stream,
    #[cfg(feature = "midi-input")]
    _midi_connection: Option<midir::MidiInputConnection<()>>,
}

impl CpalPianoHost {
    /// Open the requested audio host's default output device and, if
    /// `midi-input` is enabled, the first available MIDI input port, then
    /// start driving `synth`.
    pub fn open(mut synth: Synth, host_id: AudioHostId) -> Result<Self, Error> {
        let host = match host_id {
            AudioHostId::Default => cpal::default_host(),
            #[cfg(target_os = "linux")]
            AudioHostId::Jack => cpal::host_from_id(cpal::HostId::Jack)
                .map_err(|err| Error::OutputDeviceError(Box::new(err)))?,
        };
        let device = host.default_output_device().ok_or_else(|| {
            Error::OutputDeviceError(Box::new(std::io::Error::other("no default output device")))
        })?;

        if let Ok(name) = device.name() {
            log::info!("Using audio output device: {name}");
        }

        let supported = device
            .supported_output_configs()
            .map_err(|err| Error::OutputDeviceError(Box::new(err)))?
            .find(|c| c.sample_format() == PREFERRED_SAMPLE_FORMAT)
            .map(|c| c.with_max_sample_rate())
            .ok_or_else(|| {
                Error::OutputDeviceError(Box::new(std::io::Error::other("no matching output config")))
            })?;

        let config = cpal::StreamConfig {
            buffer_size: PREFERRED_BUFFER_SIZE,
            ..supported.config()
        };
        let channel_count = config.channels as usize;

        let (midi_sender, midi_receiver) = crossbeam_channel::bounded::<QueuedMidiMessage>(256);

        synth.on_rate_change(config.sample_rate.0);

        let mut frame_buffer = Vec::<f32>::new();
        let mut event_buffer = Vec::new();
        let mut promoted_to_real_time = false;
        let sample_rate = config.sample_rate.0;

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    if !promoted_to_real_time {
                        if let Err(err) = audio_thread_priority::promote_current_thread_to_real_time(
                            data.len() as u32,
                            sample_rate,
                        ) {
                            log::warn!("Failed to promote audio callback thread to real-time priority: {err}");
                        }
                        promoted_to_real_time = true;
                    }

                    let frames = data.len() / channel_count;
                    frame_buffer.clear();
                    frame_buffer.resize(frames, 0.0);

                    event_buffer.clear();
                    while let Ok(message) = midi_receiver.try_recv() {
                        event_buffer.push(decode_event(0, message));
                    }

                    synth.on_audio(frames, &event_buffer, &mut frame_buffer);

                    for (frame, sample) in data.chunks_mut(channel_count).zip(frame_buffer.iter()) {
                        for channel_sample in frame.iter_mut() {
                            *channel_sample = *sample;
                        }
                    }
                },
                |err| log::error!("Output stream error: {err}"),
                None,
            )
            .map_err(|err| Error::OutputDeviceError(Box::new(err)))?;

        stream.play().map_err(|err| Error::OutputDeviceError(Box::new(err)))?;

        #[cfg(feature = "midi-input")]
        let _midi_connection = open_midi_input(midi_sender)?;
        #[cfg(not(feature = "midi-input"))]
        drop(midi_sender);

        Ok(Self {
            stream,
            #[cfg(feature = "midi-input")]
            _midi_connection,
        })
    }

    /// Stop the stream and release the device and, if open, the MIDI port.
    pub fn close(self) {
        if let Err(err) = self.stream.pause() {
            log::warn!("Failed to pause output stream on close: {err}");
        }
    }
}

#[cfg(feature = "midi-input")]
fn open_midi_input(
    sender: crossbeam_channel::Sender<QueuedMidiMessage>,
) -> Result<Option<midir::MidiInputConnection<()>>, Error> {
    let input = midir::MidiInput::new("waveguide-piano").map_err(|err| Error::MidiPortError(Box::new(err)))?;
    let ports = input.ports();
    let Some(port) = ports.first() else {
        log::warn!("No MIDI input ports available, running without MIDI input");
        return Ok(None);
    };

    if let Ok(name) = input.port_name(port) {
        log::info!("Using MIDI input port: {name}");
    }

    let connection = input
        .connect(
            port,
            "waveguide-piano-in",
            move |_stamp_us, data, _| {
                if data.len() >= 3 {
                    let _ = sender.try_send([data[0], data[1], data[2]]);
                }
            },
            (),
        )
        .map_err(|err| Error::MidiPortError(Box::new(std::io::Error::other(err.to_string()))))?;

    Ok(Some(connection))
}
