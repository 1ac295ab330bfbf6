//! # sqsh — a lossless byte-stream compressor/decompressor
//!
//! Format guarantees:
//! - A self-describing container: fixed header (magic, flags, checksum
//!   mode, default codec chain) followed by repeated self-describing
//!   blocks, terminated by an EOS sentinel.
//! - Every multi-byte on-wire field is big-endian; `USize`/`CSize` are
//!   unsigned varints.
//! - Checksums are CRC-32/IEEE, independently togglable over the
//!   uncompressed and/or compressed bytes of each block.
//! - Codec identity is a single byte, stable within a major version;
//!   unknown IDs are rejected as `Unsupported`.
//! - `AUTO` is a meta-codec: it probes a sample of each block, picks a
//!   concrete codec chain, and records that chain as a per-block override
//!   rather than a fixed identity of its own.

pub mod bitio;
pub mod codec;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod varint;

pub use codec::{get_codec, Codec, CodecId};
pub use error::{SqshError, Result};
pub use frame::ChecksumMode;
