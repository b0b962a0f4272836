//! File-level API: the primary embedding surface.
//!
//! ```no_run
//! use std::path::Path;
//! use nasimg::archive::{pack_file, unpack, PackOptions, UnpackOptions};
//! use nasimg::header::{FirmwareMetadata, Metadata};
//! use nasimg::layout::Variant;
//!
//! let opts = PackOptions::default();
//! let meta = Metadata::Firmware(FirmwareMetadata {
//!     model:      "DNS-327L".into(),
//!     version:    "1.02".into(),
//!     build_date: opts.stamp,
//! });
//! let packed = pack_file(Path::new("image.bin"), &meta, Path::new("image.fw"), &opts)?;
//! println!("checksum {}", packed.checksum);
//!
//! let out = unpack(Path::new("image.fw"), Variant::Firmware, Path::new("fw.bin"), &UnpackOptions::default())?;
//! assert!(out.verified);
//! # Ok::<(), nasimg::ContainerError>(())
//! ```
//!
//! # Atomic output
//! Neither a container nor a recovered payload is ever visible under its
//! final name until it is complete.  Both are streamed into a temporary file
//! in the destination directory and renamed into place: the container once
//! its header is written, the payload once its checksum matches.  Any
//! failure drops the temporary file, which deletes it.  On Unix the
//! temporary file is created with mode `0666` less the umask, so the final
//! file gets the same permissions a plain `File::create` would give it.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::archiver::PayloadArchiver;
use crate::config::{AppManifest, ModelList, MANIFEST_FILE};
use crate::error::{ContainerError, Result};
use crate::header::{FirmwareMetadata, Metadata, PackageMetadata};
use crate::io_stream::{ContainerReader, ContainerWriter, DEFAULT_CHUNK_SIZE};
use crate::layout::Variant;
use crate::naming::{firmware_file_name, package_file_name};

// ── Options ───────────────────────────────────────────────────────────────────

/// Configuration for the `pack*` functions.
#[derive(Debug, Clone)]
pub struct PackOptions {
    pub chunk_size: usize,
    /// Date used for the firmware build suffix and for output file names.
    pub stamp:      NaiveDate,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            stamp:      Local::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnpackOptions {
    pub chunk_size: usize,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

// ── Outcomes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOutcome {
    pub path:        PathBuf,
    pub checksum:    String,
    pub payload_len: u64,
    /// `Packager` from the add-on manifest; `None` for other containers.
    pub packager:    Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackOutcome {
    pub path:          PathBuf,
    pub bytes_written: u64,
    pub checksum:      String,
    pub verified:      bool,
}

// ── Pack ──────────────────────────────────────────────────────────────────────

/// Write a container holding `payload` to `dest`.
///
/// Metadata is validated before anything is created; an oversized field
/// leaves the filesystem untouched.
pub fn pack<R: Read>(payload: R, metadata: &Metadata, dest: &Path, opts: &PackOptions) -> Result<PackOutcome> {
    metadata.validate()?;
    pack_staged(payload, metadata, dest, opts)
}

/// [`pack`] with the payload read from `source`.
pub fn pack_file(source: &Path, metadata: &Metadata, dest: &Path, opts: &PackOptions) -> Result<PackOutcome> {
    metadata.validate()?;
    let payload = File::open(source)?;
    pack_staged(payload, metadata, dest, opts)
}

/// Stage and persist a container.  `metadata` must already be validated.
fn pack_staged<R: Read>(payload: R, metadata: &Metadata, dest: &Path, opts: &PackOptions) -> Result<PackOutcome> {
    let mut tmp = staging_file(parent_dir(dest))?;
    let summary = ContainerWriter::with_chunk_size(tmp.as_file_mut(), opts.chunk_size)
        .write(payload, metadata)?;
    tmp.persist(dest).map_err(|e| e.error)?;

    info!(
        variant = %metadata.variant(),
        dest = %dest.display(),
        checksum = %summary.checksum,
        payload_len = summary.payload_len,
        "container written"
    );
    Ok(PackOutcome {
        path:        dest.to_path_buf(),
        checksum:    summary.checksum,
        payload_len: summary.payload_len,
        packager:    None,
    })
}

/// Pack a firmware binary.  The container is named after the model,
/// version and `opts.stamp` and placed in `dest_dir`, or next to `source`
/// when no directory is given.
pub fn pack_firmware(
    source:   &Path,
    dest_dir: Option<&Path>,
    model:    &str,
    version:  &str,
    opts:     &PackOptions,
) -> Result<PackOutcome> {
    let meta = FirmwareMetadata {
        model:      model.to_owned(),
        version:    version.to_owned(),
        build_date: opts.stamp,
    };
    let metadata = Metadata::Firmware(meta.clone());

    let dest_dir = match dest_dir {
        Some(dir) => dir.to_path_buf(),
        None      => parent_dir(source).to_path_buf(),
    };
    if !dest_dir.is_dir() {
        return Err(invalid_input(format!("destination {} is not a directory", dest_dir.display())));
    }

    pack_file(source, &metadata, &dest_dir.join(firmware_file_name(&meta)), opts)
}

/// Pack an add-on source folder.
///
/// Reads `apkg.rc` from `source_dir`, checks `model` against `models`,
/// archives the folder with `archiver` into an intermediate file, and writes
/// the container into the folder's parent.  The intermediate archive is
/// removed on every exit path.
pub fn pack_app(
    source_dir:  &Path,
    model:       &str,
    third_party: bool,
    models:      &ModelList,
    archiver:    &dyn PayloadArchiver,
    opts:        &PackOptions,
) -> Result<PackOutcome> {
    models.ensure_supported(model)?;

    let source_dir = fs::canonicalize(source_dir)?;
    let manifest = AppManifest::load(source_dir.join(MANIFEST_FILE))?;
    let meta = PackageMetadata {
        model:       model.to_owned(),
        package:     manifest.package.clone(),
        version:     manifest.version.clone(),
        third_party,
    };
    let metadata = Metadata::Package(meta.clone());
    metadata.validate()?;

    let dest_dir = source_dir
        .parent()
        .ok_or_else(|| invalid_input(format!("{} has no parent to write into", source_dir.display())))?;

    let intermediate = tempfile::Builder::new()
        .prefix("pkg")
        .suffix(".tgz")
        .tempfile_in(dest_dir)?;
    archiver.archive(&source_dir, intermediate.path())?;
    debug!(archive = %intermediate.path().display(), "intermediate archive ready");

    let payload = File::open(intermediate.path())?;
    let dest = dest_dir.join(package_file_name(&meta, opts.stamp));
    let outcome = pack_staged(payload, &metadata, &dest, opts)?;
    Ok(PackOutcome { packager: manifest.packager, ..outcome })
}

// ── Unpack ────────────────────────────────────────────────────────────────────

/// Recover the payload of `source` into `dest` and verify its checksum.
///
/// On a mismatch nothing is written to `dest` and
/// [`ContainerError::ChecksumMismatch`] is returned.
pub fn unpack(source: &Path, variant: Variant, dest: &Path, opts: &UnpackOptions) -> Result<UnpackOutcome> {
    let mut reader = ContainerReader::with_chunk_size(File::open(source)?, variant, opts.chunk_size)?;

    let mut tmp = staging_file(parent_dir(dest))?;
    let extraction = reader.extract_to(tmp.as_file_mut())?;

    if !extraction.verified() {
        warn!(
            source = %source.display(),
            expected = %extraction.expected,
            actual = %extraction.actual,
            "checksum mismatch; discarding output"
        );
        discard_staged(tmp);
        return Err(ContainerError::ChecksumMismatch {
            expected: extraction.expected,
            actual:   extraction.actual,
        });
    }

    tmp.persist(dest).map_err(|e| e.error)?;
    info!(dest = %dest.display(), bytes = extraction.bytes_written, "payload recovered");
    Ok(UnpackOutcome {
        path:          dest.to_path_buf(),
        bytes_written: extraction.bytes_written,
        checksum:      extraction.actual,
        verified:      true,
    })
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn invalid_input(msg: String) -> ContainerError {
    ContainerError::Io(io::Error::new(io::ErrorKind::InvalidInput, msg))
}

/// Temporary file in `dir` that will be renamed over the final output.
fn staging_file(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".nasimg");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Remove a staged file that must not be persisted.  A failed removal is
/// logged; the caller's error is the one that matters.
fn discard_staged(tmp: NamedTempFile) {
    let path = tmp.path().to_path_buf();
    if let Err(e) = tmp.close() {
        warn!(path = %path.display(), error = %e, "could not remove staged file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discard_tolerates_already_removed_file() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = staging_file(dir.path()).unwrap();
        fs::remove_file(tmp.path()).unwrap();
        discard_staged(tmp);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn staging_file_lives_in_destination_dir() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = staging_file(dir.path()).unwrap();
        assert_eq!(tmp.path().parent(), Some(dir.path()));
    }
}
