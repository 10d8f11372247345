use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Negotiation failure from open(). The rendered message is the diagnostic
/// shown to the user; the device stays closed and the caller may retry with
/// different parameters.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum OpenError {
    #[error("{direction} channel {index} out of range: device has {available} {direction} channels")]
    ChannelOutOfRange {
        direction: Direction,
        index: usize,
        available: usize,
    },

    #[error("unsupported sample rate: {requested} Hz")]
    UnsupportedSampleRate { requested: u32 },

    #[error("unsupported buffer size: {requested} samples")]
    UnsupportedBufferSize { requested: usize },

    #[error("{message}")]
    Backend { message: String },
}

impl OpenError {
    #[cold]
    pub fn backend<E: Display>(error: E) -> OpenError {
        OpenError::Backend {
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("device is not open")]
    NotOpen,

    #[error("device is already playing")]
    AlreadyPlaying,

    #[error("unknown backend type: {name}")]
    UnknownBackend { name: String },

    #[error(transparent)]
    Open(#[from] OpenError),

    #[error("backend error: {message}")]
    Backend { message: String },
}

impl Error {
    #[cold]
    pub fn backend<E: Display>(error: E) -> Error {
        Error::Backend {
            message: error.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
