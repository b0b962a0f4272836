//! Streaming container engine: writer and reader.
//!
//! # Writer
//! [`ContainerWriter`] validates the metadata, reserves the header region
//! with zeros, copies the payload behind it in fixed-size chunks while
//! feeding each chunk to a [`ChecksumEngine`], then seeks back to offset 0
//! and writes the finished header.  The payload is never held in memory as
//! a whole.
//!
//! # Reader
//! [`ContainerReader`] decodes the header by seeking to each field, then
//! streams everything after offset [`HEADER_SIZE`] into a sink through a
//! fresh [`ChecksumEngine`].  The returned [`Extraction`] carries both the
//! stored and the recomputed digest; deciding what to do with a mismatch is
//! left to the caller (see `archive::unpack`).

use std::io::{self, Read, Seek, SeekFrom, Write};

use tracing::debug;

use crate::checksum::ChecksumEngine;
use crate::error::Result;
use crate::header::{ContainerHeader, Metadata};
use crate::layout::{Variant, HEADER_SIZE};

/// Default copy chunk: 4 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Copy `src` into `dst` chunk by chunk, hashing every chunk on the way.
fn copy_hashed<R: Read, W: Write>(mut src: R, dst: &mut W, chunk_size: usize) -> io::Result<ChecksumEngine> {
    let mut engine = ChecksumEngine::new();
    let mut buf    = vec![0u8; chunk_size.max(1)];
    loop {
        let n = match src.read(&mut buf) {
            Ok(0)  => break,
            Ok(n)  => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        dst.write_all(&buf[..n])?;
        engine.update(&buf[..n]);
    }
    Ok(engine)
}

// ── Writer ───────────────────────────────────────────────────────────────────

/// Result of a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSummary {
    /// Lowercase hex MD5 written into the header.
    pub checksum:    String,
    pub payload_len: u64,
}

pub struct ContainerWriter<W: Write + Seek> {
    writer:         W,
    pub chunk_size: usize,
}

impl<W: Write + Seek> ContainerWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_chunk_size(writer, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(writer: W, chunk_size: usize) -> Self {
        Self { writer, chunk_size: chunk_size.max(1) }
    }

    /// Write one complete container: header placeholder, payload, header.
    ///
    /// The sink should be empty; bytes beyond the new container are not
    /// truncated.
    pub fn write<R: Read>(&mut self, payload: R, metadata: &Metadata) -> Result<PackSummary> {
        metadata.validate()?;
        let layout = metadata.variant().layout();
        let values = metadata.field_values();

        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.write_all(&[0u8; HEADER_SIZE])?; // reserved; overwritten below

        let engine      = copy_hashed(payload, &mut self.writer, self.chunk_size)?;
        let payload_len = engine.consumed();
        let checksum    = engine.finalize().to_hex();
        debug!(payload_len, %checksum, "payload copied");

        let header = layout.compose(&values, &checksum)?;
        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.write_all(&header)?;
        self.writer.flush()?;

        Ok(PackSummary { checksum, payload_len })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

// ── Reader ───────────────────────────────────────────────────────────────────

/// Outcome of streaming a payload out of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub bytes_written: u64,
    /// Checksum stored in the header.
    pub expected:      String,
    /// Checksum of the bytes actually copied.
    pub actual:        String,
}

impl Extraction {
    pub fn verified(&self) -> bool {
        self.expected.as_bytes() == self.actual.as_bytes()
    }
}

pub struct ContainerReader<R: Read + Seek> {
    reader:         R,
    pub header:     ContainerHeader,
    pub chunk_size: usize,
}

impl<R: Read + Seek> ContainerReader<R> {
    /// Decode the header of a `variant` container.
    pub fn open(reader: R, variant: Variant) -> Result<Self> {
        Self::with_chunk_size(reader, variant, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(mut reader: R, variant: Variant, chunk_size: usize) -> Result<Self> {
        let header = ContainerHeader::read(&mut reader, variant)?;
        debug!(%variant, model = %header.model, checksum = %header.checksum, "header decoded");
        Ok(Self { reader, header, chunk_size: chunk_size.max(1) })
    }

    /// Stream the payload into `out`, hashing as it goes.
    pub fn extract_to<W: Write>(&mut self, mut out: W) -> Result<Extraction> {
        self.reader.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        let engine = copy_hashed(&mut self.reader, &mut out, self.chunk_size)?;
        out.flush()?;

        let bytes_written = engine.consumed();
        let extraction = Extraction {
            bytes_written,
            expected: self.header.checksum.clone(),
            actual:   engine.finalize().to_hex(),
        };
        debug!(bytes_written, verified = extraction.verified(), "payload extracted");
        Ok(extraction)
    }

    /// Hash the payload without writing it anywhere.
    pub fn verify(&mut self) -> Result<Extraction> {
        self.extract_to(io::sink())
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
