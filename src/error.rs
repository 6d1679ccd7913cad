use std::{error, fmt, io};

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by waveguide-piano.
#[derive(Debug)]
pub enum Error {
    ImpulseResponseFileNotFound,
    ImpulseResponseReadError(io::Error),
    OutputDeviceError(Box<dyn error::Error + Send + Sync>),
    MidiPortError(Box<dyn error::Error + Send + Sync>),
    IoError(io::Error),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImpulseResponseFileNotFound => write!(f, "Impulse response file not found"),
            Self::ImpulseResponseReadError(err) => {
                write!(f, "Failed to read impulse response file: {err}")
            }
            Self::OutputDeviceError(err) => err.fmt(f),
            Self::MidiPortError(err) => err.fmt(f),
            Self::IoError(err) => err.fmt(f),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

#[cfg(feature = "cpal-output")]
impl<T> From<crossbeam_channel::SendError<T>> for Error {
    fn from(_: crossbeam_channel::SendError<T>) -> Self {
        Error::MidiPortError(Box::new(io::Error::other("channel closed")))
    }
}
