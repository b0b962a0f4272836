//! Header field tables for the two container variants.
//!
//! # Layout
//! Every container starts with a [`HEADER_SIZE`]-byte header.  Fields sit at
//! fixed offsets; text fields are raw bytes padded with NUL, the third-party
//! flag is a single `0x00`/`0x01` byte.  Bytes not covered by a field are
//! zero.
//!
//! | Field        | Package        | Firmware       |
//! |--------------|----------------|----------------|
//! | model name   | `0x00`, 10 B   | `0x00`, 76 B   |
//! | package name | `0x0A`, 66 B   | —              |
//! | version      | `0x4C`, 10 B   | `0x4C`, 92 B   |
//! | third party  | `0x80`, 1 B    | —              |
//! | checksum     | `0xA8`, 32 B   | `0xA8`, 32 B   |
//!
//! A field's `limit` bounds the value the caller supplies; its `len` is the
//! width of the slot in the header.  They differ only for the firmware
//! version: an 82-byte version plus the 10-byte `.MMdd.yyyy` build suffix
//! fills the 92-byte slot up to the checksum.
//!
//! The header carries no magic or version number, so the variant must be
//! known by the caller.

use std::fmt;

use serde::Serialize;

use crate::checksum::CHECKSUM_HEX_LEN;
use crate::error::{ContainerError, Result};

/// Size of the header in both variants.
pub const HEADER_SIZE: usize = 200;

// ── Field identities ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ModelName,
    PackageName,
    Version,
    ThirdParty,
    Checksum,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::ModelName   => "model name",
            Field::PackageName => "package name",
            Field::Version     => "version",
            Field::ThirdParty  => "third-party flag",
            Field::Checksum    => "checksum",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the bytes of a field are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// NUL-padded text.
    Text,
    /// One byte, `0x00` or `0x01`.
    Flag,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field:  Field,
    pub offset: usize,
    /// Slot width in the header.
    pub len:    usize,
    /// Maximum length of the caller-supplied value.
    pub limit:  usize,
    pub kind:   FieldKind,
}

impl FieldSpec {
    const fn text(field: Field, offset: usize, len: usize) -> Self {
        Self { field, offset, len, limit: len, kind: FieldKind::Text }
    }

    const fn with_limit(self, limit: usize) -> Self {
        Self { limit, ..self }
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

// ── Variants ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Add-on application package; payload is a directory archive.
    Package,
    /// Firmware image; payload is the firmware binary.
    Firmware,
}

impl Variant {
    pub fn layout(self) -> &'static HeaderLayout {
        match self {
            Variant::Package  => &PACKAGE_LAYOUT,
            Variant::Firmware => &FIRMWARE_LAYOUT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Variant::Package  => "package",
            Variant::Firmware => "firmware",
        }
    }

    /// File name used for the recovered payload when the caller gives none.
    pub fn default_payload_name(self) -> &'static str {
        match self {
            Variant::Package  => "apkg.tgz",
            Variant::Firmware => "fw.bin",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const CHECKSUM_OFFSET: usize = 0xA8;

static PACKAGE_LAYOUT: HeaderLayout = HeaderLayout {
    variant: Variant::Package,
    fields: &[
        FieldSpec::text(Field::ModelName, 0x00, 10),
        FieldSpec::text(Field::PackageName, 0x0A, 66),
        FieldSpec::text(Field::Version, 0x4C, 10),
        FieldSpec { field: Field::ThirdParty, offset: 0x80, len: 1, limit: 1, kind: FieldKind::Flag },
        FieldSpec::text(Field::Checksum, CHECKSUM_OFFSET, CHECKSUM_HEX_LEN),
    ],
};

static FIRMWARE_LAYOUT: HeaderLayout = HeaderLayout {
    variant: Variant::Firmware,
    fields: &[
        FieldSpec::text(Field::ModelName, 0x00, 76),
        FieldSpec::text(Field::Version, 0x4C, CHECKSUM_OFFSET - 0x4C).with_limit(82),
        FieldSpec::text(Field::Checksum, CHECKSUM_OFFSET, CHECKSUM_HEX_LEN),
    ],
};

// ── HeaderLayout ─────────────────────────────────────────────────────────────

/// Encoded values keyed by field, checksum excluded.
pub type FieldValues = Vec<(Field, Vec<u8>)>;

#[derive(Debug)]
pub struct HeaderLayout {
    pub variant: Variant,
    pub fields:  &'static [FieldSpec],
}

impl HeaderLayout {
    pub fn spec(&self, field: Field) -> Option<&FieldSpec> {
        self.fields.iter().find(|s| s.field == field)
    }

    fn require(&self, field: Field) -> Result<&FieldSpec> {
        self.spec(field).ok_or(ContainerError::FieldNotInLayout {
            field,
            variant: self.variant,
        })
    }

    /// Check caller-supplied values against each field's `limit`.  Pure;
    /// performs no I/O.
    pub fn validate(&self, values: &[(Field, Vec<u8>)]) -> Result<()> {
        self.check(values, |spec| spec.limit)
    }

    /// Build the full header from values as they are stored: each at its
    /// offset, checksum in its slot, every other byte zero.  A value wider
    /// than its slot is rejected.
    pub fn compose(&self, values: &[(Field, Vec<u8>)], checksum_hex: &str) -> Result<[u8; HEADER_SIZE]> {
        let checksum = (Field::Checksum, checksum_hex.as_bytes().to_vec());
        self.check(values, |spec| spec.len)?;
        self.check(std::slice::from_ref(&checksum), |spec| spec.len)?;

        let mut header = [0u8; HEADER_SIZE];
        for (field, bytes) in values.iter().chain(std::iter::once(&checksum)) {
            let spec = self.require(*field)?;
            header[spec.offset..spec.offset + bytes.len()].copy_from_slice(bytes);
        }
        Ok(header)
    }

    fn check(&self, values: &[(Field, Vec<u8>)], bound: impl Fn(&FieldSpec) -> usize) -> Result<()> {
        for (field, bytes) in values {
            let spec  = self.require(*field)?;
            let limit = bound(spec);
            if bytes.len() > limit {
                return Err(ContainerError::Validation {
                    field:  *field,
                    limit,
                    actual: bytes.len(),
                });
            }
        }
        Ok(())
    }
}
