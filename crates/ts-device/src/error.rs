use thiserror::Error;

use crate::stream::Stream;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing build constant: {0}")]
    MissingKey(String),
    #[error("invalid value for build constant '{key}': {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("invalid device configuration: {0}")]
    InvalidConfig(String),
    #[error("stream {stream} cannot be used as an {expected} stream")]
    WrongDirection {
        stream: Stream,
        expected: &'static str,
    },
    #[error("input streams queued without a declared run length")]
    MissingRunLength,
    #[error("run length of {ticks} ticks is not a whole number of {tile_len}-element tiles")]
    RaggedRunLength { ticks: u64, tile_len: usize },
    #[error("stream {stream} starved: kernel needs {needed} elements, {available} queued")]
    StreamStarved {
        stream: Stream,
        needed: usize,
        available: usize,
    },
    #[error("stream {stream} has {remaining} queued elements the kernel never consumed")]
    UnconsumedInput { stream: Stream, remaining: usize },
    #[error("transfer of {bytes} bytes on stream {stream} is not a multiple of {alignment} bytes")]
    MisalignedTransfer {
        stream: Stream,
        bytes: usize,
        alignment: usize,
    },
    #[error("engine stalled: synchronized input stream {stream} waits on output nobody reads")]
    Stalled { stream: Stream },
    #[error("output stream {stream} is not synchronized; the run could complete before data lands")]
    UnsyncedOutput { stream: Stream },
    #[error("output run wants {requested} elements on stream {stream}, engine produced {available}")]
    OutputUnderflow {
        stream: Stream,
        requested: usize,
        available: usize,
    },
    #[error("run {run} was issued by a different device")]
    ForeignHandle { run: u64 },
    #[error("unknown run {0}")]
    UnknownRun(u64),
    #[error("device fault: {0}")]
    Fault(String),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
