#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid offload parameters: {0}")]
    InvalidOffloadParameters(String),

    #[error("buffer {index} too small: need {needed} bytes, capacity {capacity}")]
    BufferTooSmall {
        index: usize,
        needed: usize,
        capacity: usize,
    },

    #[error("{sizes} size slots for {bufs} output buffers")]
    MismatchedBuffers { bufs: usize, sizes: usize },

    #[error("aggregation session closed")]
    SessionClosed,

    #[error("transport write failed: {0}")]
    TransportWrite(#[source] std::io::Error),

    #[error("packet cannot be classified: {0}")]
    Unclassified(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Io(err) | Error::TransportWrite(err) => err,
            _ => std::io::Error::new(std::io::ErrorKind::Other, value),
        }
    }
}

pub type Result<T, E = Error> = ::std::result::Result<T, E>;
