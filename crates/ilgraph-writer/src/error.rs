//! Error types for graph exporting

use std::io;
use thiserror::Error;

/// Failures that end a graph export session.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot open graph destination '{name}': {source}")]
    DestinationOpen {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("short write while flushing graph buffer: {written} of {expected} bytes accepted")]
    ShortWrite { written: usize, expected: usize },

    #[error("I/O error while writing graph data: {0}")]
    Io(#[from] io::Error),

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("constant pool exhausted: a session holds at most 65536 entries")]
    PoolExhausted,

    #[error("{what} count {count} does not fit its {bits}-bit field")]
    CountOverflow {
        what: &'static str,
        count: usize,
        bits: u32,
    },

    #[error("graph session is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Convert a length to a 16-bit wire count.
pub(crate) fn count_u16(what: &'static str, count: usize) -> Result<u16> {
    u16::try_from(count).map_err(|_| ExportError::CountOverflow { what, count, bits: 16 })
}

/// Convert a length or index to a 32-bit wire count.
pub(crate) fn count_u32(what: &'static str, count: usize) -> Result<u32> {
    u32::try_from(count)
        .ok()
        .filter(|n| *n <= i32::MAX as u32)
        .ok_or(ExportError::CountOverflow { what, count, bits: 32 })
}
