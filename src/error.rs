//! Crate-wide error taxonomy.
//!
//! Five kinds, plus `Success` as an implicit zero exit code (there is no
//! `SqshError::Success` variant — absence of an error *is* success). Every
//! fallible operation in the crate returns `Result<T, SqshError>`; the CLI
//! is the only place that turns a variant into a process exit code.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqshError {
    /// Invalid invocation: unknown flag, bad codec name, malformed
    /// blocksize, `AUTO` used as a non-first pipeline element.
    #[error("usage error: {0}")]
    Usage(String),

    /// External I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// On-wire data violates a format invariant.
    #[error("corrupt stream: {0}")]
    Corrupt(String),

    /// Well-formed but unknown: unknown codec ID, future flag bit.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Programmer/integrity error: a codec invariant broke, or a frame
    /// reader contract was violated (advancing without draining the
    /// current block's payload view).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Process exit codes: `0=Success, 1=Usage, 2=IO, 3=Corrupt,
/// 4=Unsupported, 5=Internal`.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_USAGE: i32 = 1;
pub const EXIT_IO: i32 = 2;
pub const EXIT_CORRUPT: i32 = 3;
pub const EXIT_UNSUPPORTED: i32 = 4;
pub const EXIT_INTERNAL: i32 = 5;

impl SqshError {
    pub fn exit_code(&self) -> i32 {
        match self {
            SqshError::Usage(_) => EXIT_USAGE,
            SqshError::Io(_) => EXIT_IO,
            SqshError::Corrupt(_) => EXIT_CORRUPT,
            SqshError::Unsupported(_) => EXIT_UNSUPPORTED,
            SqshError::Internal(_) => EXIT_INTERNAL,
        }
    }
}

/// Maps an I/O error arising from bit-stream or frame reads to its proper
/// kind: `UnexpectedEof`/short-read shapes are corruption signals, anything
/// else is a genuine I/O failure.
pub fn read_error_to_corrupt(err: io::Error, context: &str) -> SqshError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => {
            SqshError::Corrupt(format!("{context}: unexpected end of stream"))
        }
        _ => SqshError::Io(err),
    }
}

pub type Result<T> = std::result::Result<T, SqshError>;
