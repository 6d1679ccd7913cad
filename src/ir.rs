//! Loads the body-resonance impulse response: a raw little-endian stream of
//! IEEE-754 double-precision samples, with no header. Length is inferred from
//! file size / 8.

use std::{fs::File, io::BufReader, path::Path};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::Error;

// -------------------------------------------------------------------------------------------------

/// Load an impulse response from a raw `f64` little-endian file. A missing or
/// unreadable file is a fatal error; this is only ever called once, at
/// initialization.
pub fn load_impulse_response<P: AsRef<Path>>(path: P) -> Result<Vec<f64>, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::ImpulseResponseFileNotFound
        } else {
            Error::ImpulseResponseReadError(err)
        }
    })?;

    let len = file
        .metadata()
        .map_err(Error::ImpulseResponseReadError)?
        .len() as usize;
    let sample_count = len / std::mem::size_of::<f64>();

    let mut reader = BufReader::new(file);
    let mut samples = Vec::with_capacity(sample_count);
    for _ in 0..sample_count {
        samples.push(
            reader
                .read_f64::<LittleEndian>()
                .map_err(Error::ImpulseResponseReadError)?,
        );
    }

    log::info!(
        "Loaded impulse response '{}' ({} samples)",
        path.display(),
        samples.len()
    );
    Ok(samples)
}

// -------------------------------------------------------------------------------------------------
