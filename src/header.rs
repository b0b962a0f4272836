//! Header contents: [`Metadata`] going in, [`ContainerHeader`] coming out.

use std::io::{Read, Seek, SeekFrom};

use chrono::NaiveDate;

use crate::error::{ContainerError, Result};
use crate::layout::{Field, FieldKind, FieldSpec, FieldValues, Variant, HEADER_SIZE};

/// `strftime` pattern of the build-date suffix appended to firmware versions.
pub const BUILD_DATE_FORMAT: &str = "%m%d.%Y";

// ── Metadata (write side) ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub model:       String,
    pub package:     String,
    pub version:     String,
    pub third_party: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareMetadata {
    pub model:      String,
    pub version:    String,
    /// Appended to the version as `.MMdd.yyyy` when the header is written.
    pub build_date: NaiveDate,
}

impl FirmwareMetadata {
    /// The string stored in the version field: `{version}.MMdd.yyyy`.
    pub fn build_string(&self) -> String {
        format!("{}.{}", self.version, self.build_date.format(BUILD_DATE_FORMAT))
    }
}

/// Everything the caller supplies for a header.  The enum arm selects the
/// variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    Package(PackageMetadata),
    Firmware(FirmwareMetadata),
}

impl Metadata {
    pub fn variant(&self) -> Variant {
        match self {
            Metadata::Package(_)  => Variant::Package,
            Metadata::Firmware(_) => Variant::Firmware,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Metadata::Package(m)  => &m.model,
            Metadata::Firmware(m) => &m.model,
        }
    }

    /// Header values exactly as they will be written, checksum excluded.
    pub fn field_values(&self) -> FieldValues {
        match self {
            Metadata::Package(m) => vec![
                (Field::ModelName, m.model.as_bytes().to_vec()),
                (Field::PackageName, m.package.as_bytes().to_vec()),
                (Field::Version, m.version.as_bytes().to_vec()),
                (Field::ThirdParty, vec![m.third_party as u8]),
            ],
            Metadata::Firmware(m) => vec![
                (Field::ModelName, m.model.as_bytes().to_vec()),
                (Field::Version, m.build_string().into_bytes()),
            ],
        }
    }

    /// Values as the caller supplied them.  Differs from
    /// [`field_values`](Self::field_values) only for firmware, whose version
    /// is checked without the build suffix.
    pub fn input_values(&self) -> FieldValues {
        match self {
            Metadata::Package(_) => self.field_values(),
            Metadata::Firmware(m) => vec![
                (Field::ModelName, m.model.as_bytes().to_vec()),
                (Field::Version, m.version.as_bytes().to_vec()),
            ],
        }
    }

    /// Length-check the supplied fields against the variant's limits.
    pub fn validate(&self) -> Result<()> {
        self.variant().layout().validate(&self.input_values())
    }
}

// ── ContainerHeader (read side) ──────────────────────────────────────────────

/// Header fields decoded from an existing container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub variant:       Variant,
    pub model:         String,
    pub package:       Option<String>,
    pub version:       String,
    pub third_party:   Option<bool>,
    pub checksum:      String,
    /// Total size of the container file, header included.
    pub container_len: u64,
}

impl ContainerHeader {
    /// Seek to each field of `variant`'s layout and decode it.
    ///
    /// Fails with [`ContainerError::Format`] when the source is shorter than
    /// the header or the model name or checksum field is empty.
    pub fn read<R: Read + Seek>(mut reader: R, variant: Variant) -> Result<Self> {
        let container_len = reader.seek(SeekFrom::End(0))?;
        if container_len < HEADER_SIZE as u64 {
            return Err(ContainerError::Format(format!(
                "{container_len} bytes is shorter than the {HEADER_SIZE}-byte header"
            )));
        }

        let mut header = ContainerHeader {
            variant,
            model:       String::new(),
            package:     None,
            version:     String::new(),
            third_party: None,
            checksum:    String::new(),
            container_len,
        };

        for spec in variant.layout().fields {
            let raw = read_field(&mut reader, spec)?;
            match (spec.field, spec.kind) {
                (_, FieldKind::Flag)      => header.third_party = Some(raw.first().is_some_and(|&b| b != 0)),
                (Field::ModelName, _)     => header.model = decode_text(&raw),
                (Field::PackageName, _)   => header.package = Some(decode_text(&raw)),
                (Field::Version, _)       => header.version = decode_text(&raw),
                (Field::Checksum, _)      => header.checksum = decode_text(&raw),
                (Field::ThirdParty, _)    => {}
            }
        }

        if header.model.is_empty() {
            return Err(ContainerError::Format("model name field is empty".into()));
        }
        if header.checksum.is_empty() {
            return Err(ContainerError::Format("checksum field is empty".into()));
        }
        Ok(header)
    }

    /// Payload length implied by the file size.
    pub fn payload_len(&self) -> u64 {
        self.container_len - HEADER_SIZE as u64
    }
}

fn read_field<R: Read + Seek>(reader: &mut R, spec: &FieldSpec) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(spec.offset as u64))?;
    let mut buf = vec![0u8; spec.len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Text up to the first NUL.  Non-UTF-8 bytes are replaced, not rejected.
pub fn decode_text(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
