//! Container frame I/O: header, self-describing blocks, and EOS sentinel.
//!
//! Grounded on `superblock.rs` (header read/write shape) and `block.rs`
//! (block header layout), adapted to a flat varint block stream instead
//! of fixed-size block headers.

use crate::codec::CodecId;
use crate::error::{read_error_to_corrupt, Result, SqshError};
use crate::varint::{read_uvarint_from, write_uvarint};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

pub const MAGIC: &[u8; 4] = b"SQSH";
pub const MAX_BLOCK: u64 = u32::MAX as u64;

/// Bit0 = verify CRC over the uncompressed block, bit1 = verify CRC over
/// the compressed (on-wire) block. Both bits may be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumMode {
    pub uncomp: bool,
    pub comp: bool,
}

impl ChecksumMode {
    pub const NONE: ChecksumMode = ChecksumMode {
        uncomp: false,
        comp: false,
    };

    pub fn from_bits(bits: u8) -> Result<Self> {
        if bits > 0b11 {
            return Err(SqshError::Corrupt(format!(
                "checksum-mode byte {bits:#x} has bits outside 0..=3"
            )));
        }
        Ok(ChecksumMode {
            uncomp: bits & 0b01 != 0,
            comp: bits & 0b10 != 0,
        })
    }

    pub fn to_bits(self) -> u8 {
        (self.uncomp as u8) | ((self.comp as u8) << 1)
    }

    /// Checksum field width on the wire: 0, 4, or 8 bytes.
    pub fn field_width(self) -> usize {
        match (self.uncomp, self.comp) {
            (false, false) => 0,
            (true, false) | (false, true) => 4,
            (true, true) => 8,
        }
    }

    pub fn from_flag_str(s: &str) -> Result<Self> {
        match s {
            "" => Ok(ChecksumMode::NONE),
            "u" => Ok(ChecksumMode {
                uncomp: true,
                comp: false,
            }),
            "c" => Ok(ChecksumMode {
                uncomp: false,
                comp: true,
            }),
            "uc" | "cu" => Ok(ChecksumMode {
                uncomp: true,
                comp: true,
            }),
            other => Err(SqshError::Usage(format!(
                "invalid -checksum value {other:?}: expected \"\", \"u\", \"c\", or \"uc\""
            ))),
        }
    }
}

pub struct Header {
    pub checksum_mode: ChecksumMode,
    pub codecs: Vec<CodecId>,
}

impl Header {
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(MAGIC)?;
        w.write_u8(0)?; // flags, reserved
        w.write_u8(self.checksum_mode.to_bits())?;
        if self.codecs.is_empty() {
            return Err(SqshError::Internal("header codec list must not be empty".into()));
        }
        w.write_u8(self.codecs.len() as u8)?;
        for &c in &self.codecs {
            w.write_u8(c as u8)?;
        }
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)
            .map_err(|e| read_error_to_corrupt(e, "reading header magic"))?;
        if &magic != MAGIC {
            return Err(SqshError::Corrupt(format!(
                "bad magic: expected {MAGIC:?}, got {magic:?}"
            )));
        }
        let flags = r.read_u8().map_err(|e| read_error_to_corrupt(e, "reading flags"))?;
        if flags != 0 {
            return Err(SqshError::Unsupported(format!("unknown flags byte {flags:#x}")));
        }
        let cksum_byte = r
            .read_u8()
            .map_err(|e| read_error_to_corrupt(e, "reading checksum mode"))?;
        let checksum_mode = ChecksumMode::from_bits(cksum_byte)?;
        let codec_count = r
            .read_u8()
            .map_err(|e| read_error_to_corrupt(e, "reading codec count"))?;
        if codec_count == 0 {
            return Err(SqshError::Corrupt("codec-count must be >= 1".into()));
        }
        let mut codecs = Vec::with_capacity(codec_count as usize);
        for _ in 0..codec_count {
            let id = r
                .read_u8()
                .map_err(|e| read_error_to_corrupt(e, "reading codec id"))?;
            codecs.push(CodecId::from_u8(id)?);
        }
        Ok(Header {
            checksum_mode,
            codecs,
        })
    }
}

pub const BLOCK_TYPE_EOS: u8 = 0;
pub const BLOCK_TYPE_DEFAULT: u8 = 1;
pub const BLOCK_TYPE_PER_BLOCK: u8 = 2;

/// A block header as read off the wire. `Eos` carries no further fields.
#[derive(Debug)]
pub enum BlockHeader {
    Eos,
    Data {
        /// `None` means "use the frame-default codec chain from the header".
        codecs: Option<Vec<CodecId>>,
        usize: u64,
        checksum: u64,
        csize: u64,
    },
}

pub fn write_eos<W: Write>(w: &mut W) -> Result<()> {
    w.write_u8(BLOCK_TYPE_EOS)?;
    Ok(())
}

/// Write one data block. `checksum` must already be packed into the right
/// width for `checksum_mode`; `payload.len()` becomes `CSize`.
pub fn write_block<W: Write>(
    w: &mut W,
    codecs_override: Option<&[CodecId]>,
    usize_: u64,
    checksum_mode: ChecksumMode,
    checksum: u64,
    payload: &[u8],
) -> Result<()> {
    if payload.len() as u64 > MAX_BLOCK {
        return Err(SqshError::Internal("block payload exceeds MAX_BLOCK".into()));
    }
    match codecs_override {
        None => w.write_u8(BLOCK_TYPE_DEFAULT)?,
        Some(ids) => {
            w.write_u8(BLOCK_TYPE_PER_BLOCK)?;
            if ids.is_empty() || ids.len() > u8::MAX as usize {
                return Err(SqshError::Internal("per-block codec list has invalid length".into()));
            }
            w.write_u8(ids.len() as u8)?;
            for &id in ids {
                w.write_u8(id as u8)?;
            }
        }
    }
    let mut usize_buf = Vec::new();
    write_uvarint(&mut usize_buf, usize_);
    w.write_all(&usize_buf)?;
    let mut csize_buf = Vec::new();
    write_uvarint(&mut csize_buf, payload.len() as u64);
    w.write_all(&csize_buf)?;

    match checksum_mode.field_width() {
        0 => {}
        4 => w.write_u32::<BigEndian>(checksum as u32)?,
        8 => w.write_u64::<BigEndian>(checksum)?,
        other => return Err(SqshError::Internal(format!("unexpected checksum width {other}"))),
    }

    w.write_all(payload)?;
    Ok(())
}

/// A frame reader owns `src` for the scope of one stream. Per §4.K/§9, a
/// block's payload is exposed as a length-limited view over the source
/// rather than read eagerly; `next_block` refuses to advance until that
/// view has been fully consumed or explicitly [`discard`](Self::discard)ed,
/// which prevents frame desynchronisation.
pub struct FrameReader<'a, R> {
    src: &'a mut R,
    checksum_mode: ChecksumMode,
    /// Bytes of the current block's payload not yet read through the view.
    /// `None` means there is no open view (either no block has been read
    /// yet, or the previous one was fully drained).
    remaining: Option<u64>,
}

impl<'a, R: Read> FrameReader<'a, R> {
    pub fn new(src: &'a mut R, checksum_mode: ChecksumMode) -> Self {
        FrameReader {
            src,
            checksum_mode,
            remaining: None,
        }
    }

    /// Read the next block's header. Returns `Internal` if the previous
    /// block's payload view is still open (not fully consumed or discarded).
    pub fn next_block(&mut self) -> Result<BlockHeader> {
        if self.remaining.is_some() {
            return Err(SqshError::Internal(
                "next_block called before the previous payload view was drained".into(),
            ));
        }

        let block_type = self
            .src
            .read_u8()
            .map_err(|e| read_error_to_corrupt(e, "reading block type"))?;
        if block_type == BLOCK_TYPE_EOS {
            return Ok(BlockHeader::Eos);
        }

        let codecs = if block_type == BLOCK_TYPE_PER_BLOCK {
            let cnt = self
                .src
                .read_u8()
                .map_err(|e| read_error_to_corrupt(e, "reading per-block codec count"))?;
            if cnt == 0 {
                return Err(SqshError::Corrupt("per-block codec count must be >= 1".into()));
            }
            let mut ids = Vec::with_capacity(cnt as usize);
            for _ in 0..cnt {
                let id = self
                    .src
                    .read_u8()
                    .map_err(|e| read_error_to_corrupt(e, "reading per-block codec id"))?;
                ids.push(CodecId::from_u8(id)?);
            }
            Some(ids)
        } else if block_type == BLOCK_TYPE_DEFAULT {
            None
        } else {
            return Err(SqshError::Unsupported(format!("unknown block type {block_type}")));
        };

        let usize_ = read_uvarint_from(self.src)?;
        let csize = read_uvarint_from(self.src)?;
        if csize > MAX_BLOCK {
            return Err(SqshError::Corrupt(format!("CSize {csize} exceeds MAX_BLOCK")));
        }
        if usize_ > MAX_BLOCK {
            return Err(SqshError::Corrupt(format!("USize {usize_} exceeds MAX_BLOCK")));
        }

        let checksum = match self.checksum_mode.field_width() {
            0 => 0,
            4 => self
                .src
                .read_u32::<BigEndian>()
                .map_err(|e| read_error_to_corrupt(e, "reading checksum"))? as u64,
            8 => self
                .src
                .read_u64::<BigEndian>()
                .map_err(|e| read_error_to_corrupt(e, "reading checksum"))?,
            other => return Err(SqshError::Internal(format!("unexpected checksum width {other}"))),
        };

        self.remaining = Some(csize);
        Ok(BlockHeader::Data {
            codecs,
            usize: usize_,
            checksum,
            csize,
        })
    }

    /// A length-limited view over the current block's payload bytes. Empty
    /// once there is no open block (no block read yet, or the previous one
    /// was already drained).
    pub fn payload_view(&mut self) -> PayloadView<'_, 'a, R> {
        PayloadView { reader: self }
    }

    /// Explicitly drop the remainder of the current payload view without
    /// reading it, satisfying the anti-desync contract ahead of the next
    /// `next_block` call.
    pub fn discard(&mut self) -> Result<()> {
        if let Some(remaining) = self.remaining.take() {
            std::io::copy(&mut (&mut self.src).take(remaining), &mut std::io::sink())
                .map_err(|e| read_error_to_corrupt(e, "discarding block payload"))?;
        }
        Ok(())
    }
}

/// The exclusive, length-limited borrow over one block's payload bytes.
/// Reading past the recorded `CSize` yields EOF; reading exactly `CSize`
/// bytes closes the view so the owning [`FrameReader`] can advance.
pub struct PayloadView<'r, 'a, R> {
    reader: &'r mut FrameReader<'a, R>,
}

impl<'r, 'a, R: Read> Read for PayloadView<'r, 'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = match self.reader.remaining {
            None | Some(0) => return Ok(0),
            Some(remaining) => remaining,
        };
        let want = remaining.min(buf.len() as u64) as usize;
        let n = self.reader.src.read(&mut buf[..want])?;
        let remaining = remaining - n as u64;
        self.reader.remaining = if remaining == 0 { None } else { Some(remaining) };
        Ok(n)
    }
}
