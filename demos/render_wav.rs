//! Non-realtime render of a short fixed note sequence to a `.wav` file.
//!
//! Takes no arguments. Useful for smoke-testing the engine without an audio
//! device present, and for giving the `wav-demo` feature something to do.
//! The impulse response is resolved the same way as `demos/piano.rs` — see
//! DESIGN.md.

use waveguide_piano::{decode_event, load_impulse_response, Error, HostAdapter, MidiEvent, Synth};

// -------------------------------------------------------------------------------------------------

const RENDER_RATE: u32 = 48_000;
const RENDER_SECONDS: f64 = 3.0;
const OUTPUT_PATH: &str = "waveguide-piano-render.wav";
const IDENTITY_IMPULSE_RESPONSE: [f64; 1] = [1.0];

fn load_body_impulse_response() -> Result<Vec<f64>, Error> {
    match std::env::var_os("WAVEGUIDE_PIANO_IR") {
        Some(path) => load_impulse_response(path),
        None => {
            log::info!("WAVEGUIDE_PIANO_IR not set, using an identity impulse response");
            Ok(IDENTITY_IMPULSE_RESPONSE.to_vec())
        }
    }
}

/// A short C-major triad struck in sequence, with the sustain pedal held
/// down throughout — enough to exercise note-on/off, sympathetic coupling,
/// and the sustain path in one render.
fn demo_script(rate: u32) -> Vec<MidiEvent> {
    let ms = |t: f64| (rate as f64 * t / 1000.0).round() as usize;
    vec![
        decode_event(0, [0xb0, 64, 127]), // sustain pedal down
        decode_event(ms(0.0), [0x90, 60, 100]),
        decode_event(ms(300.0), [0x90, 64, 90]),
        decode_event(ms(600.0), [0x90, 67, 100]),
        decode_event(ms(1_200.0), [0x80, 60, 0]),
        decode_event(ms(1_200.0), [0x80, 64, 0]),
        decode_event(ms(1_200.0), [0x80, 67, 0]),
    ]
}

fn main() -> Result<(), Error> {
    simple_logger::SimpleLogger::new().init().ok();

    let impulse_response = load_body_impulse_response()?;
    let mut synth = Synth::new(RENDER_RATE as f64, impulse_response);
    synth.on_rate_change(RENDER_RATE);

    let events = demo_script(RENDER_RATE);
    let frames = (RENDER_RATE as f64 * RENDER_SECONDS) as usize;
    let mut buffer = vec![0.0f32; frames];
    synth.on_audio(frames, &events, &mut buffer);
    synth.on_shutdown();

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RENDER_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(OUTPUT_PATH, spec).map_err(|err| Error::IoError(std::io::Error::other(err)))?;
    for sample in buffer {
        writer
            .write_sample(sample)
            .map_err(|err| Error::IoError(std::io::Error::other(err)))?;
    }
    writer.finalize().map_err(|err| Error::IoError(std::io::Error::other(err)))?;

    log::info!("Wrote {RENDER_SECONDS}s render to {OUTPUT_PATH}");
    Ok(())
}
