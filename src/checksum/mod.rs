//! Streaming MD5 accumulator for container payloads.
//!
//! The digest covers the payload bytes only, never the header.  It is stored
//! in the header as 32 lowercase hex characters.

use std::fmt;

/// Length of the hex-encoded digest stored in the header.
pub const CHECKSUM_HEX_LEN: usize = 32;

/// Incremental MD5 fed chunk by chunk while payload bytes are copied.
pub struct ChecksumEngine {
    context:  md5::Context,
    consumed: u64,
}

impl ChecksumEngine {
    pub fn new() -> Self {
        Self { context: md5::Context::new(), consumed: 0 }
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.context.consume(chunk);
        self.consumed += chunk.len() as u64;
    }

    /// Number of bytes fed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn finalize(self) -> Checksum {
        Checksum(self.context.compute().0)
    }
}

impl Default for ChecksumEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A finished 16-byte MD5 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksum(pub [u8; 16]);

impl Checksum {
    /// One-shot digest of an in-memory buffer.
    pub fn of(data: &[u8]) -> Self {
        Checksum(md5::compute(data).0)
    }

    /// Lowercase hex form, always [`CHECKSUM_HEX_LEN`] characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_digest_matches_one_shot() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut engine = ChecksumEngine::new();
        for chunk in data.chunks(4096) {
            engine.update(chunk);
        }
        assert_eq!(engine.consumed(), data.len() as u64);
        assert_eq!(engine.finalize(), Checksum::of(&data));
    }

    #[test]
    fn empty_payload_digest() {
        let hex = ChecksumEngine::new().finalize().to_hex();
        assert_eq!(hex, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(hex.len(), CHECKSUM_HEX_LEN);
    }
}
