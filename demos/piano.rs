//! Reference host binary: opens the default audio output device and a MIDI
//! input port, then blocks until terminated.
//!
//! Takes no arguments. The impulse response used by the body resonator is
//! read from the `WAVEGUIDE_PIANO_IR` environment variable if set (a raw
//! little-endian `f64` file); otherwise a minimal identity response is used,
//! so the binary remains runnable with no external assets — see DESIGN.md.

use waveguide_piano::{
    output::{cpal::CpalPianoHost, AudioHostId},
    load_impulse_response, Error, Synth,
};

// -------------------------------------------------------------------------------------------------

#[cfg(all(debug_assertions, feature = "assert-allocs"))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

// -------------------------------------------------------------------------------------------------

/// Identity impulse response: a single unit tap, i.e. the resonator passes
/// its input through unchanged. Used when no `WAVEGUIDE_PIANO_IR` file is
/// configured.
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

fn main() -> Result<(), Error> {
    simple_logger::SimpleLogger::new().init().ok();

    // A placeholder sample rate; `CpalPianoHost::open` re-derives it from the
    // actually-opened device's config and calls `on_rate_change` before any
    // audio callback fires.
    let placeholder_rate = 48_000.0;
    let impulse_response = load_body_impulse_response()?;
    let synth = Synth::new(placeholder_rate, impulse_response);

    log::info!("Opening default audio output device and MIDI input port...");
    // Held for its lifetime only: dropping it would stop the stream. Torn
    // down when the process exits.
    let _host = CpalPianoHost::open(synth, AudioHostId::default())?;

    log::info!("waveguide-piano running. Press Ctrl+C to stop.");
    loop {
        std::thread::park();
    }
}
