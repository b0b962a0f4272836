//! Producing the package-variant payload from a source folder.
//!
//! The container core treats the archive as opaque bytes; this module only
//! has to leave a readable file at the requested path.  [`TarArchiver`]
//! shells out to `tar`, which is standard on the NAS build hosts.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{ContainerError, Result};

/// Turns a directory into a single payload file.
pub trait PayloadArchiver {
    fn archive(&self, source_dir: &Path, archive_path: &Path) -> Result<()>;
}

/// `tar -czf <archive> -C <parent> <dirname>`: the folder itself becomes the
/// archive root.
#[derive(Debug, Clone, Default)]
pub struct TarArchiver;

impl TarArchiver {
    /// Check that `tar` can be run at all.
    pub fn check_available() -> Result<()> {
        match Command::new("tar").arg("--version").output() {
            Ok(output) if output.status.success() => Ok(()),
            Ok(_) => Err(ContainerError::Archiver(
                "'tar --version' failed; is tar properly installed?".into(),
            )),
            Err(e) => Err(ContainerError::Archiver(format!("'tar' command not found: {e}"))),
        }
    }
}

impl PayloadArchiver for TarArchiver {
    fn archive(&self, source_dir: &Path, archive_path: &Path) -> Result<()> {
        let dir_name = source_dir
            .file_name()
            .ok_or_else(|| ContainerError::Archiver(format!(
                "{} has no directory name",
                source_dir.display()
            )))?;
        let parent = source_dir
            .parent()
            .ok_or_else(|| ContainerError::Archiver(format!(
                "{} has no parent directory",
                source_dir.display()
            )))?;

        debug!(source = %source_dir.display(), archive = %archive_path.display(), "running tar");
        let output = Command::new("tar")
            .arg("-czf")
            .arg(archive_path)
            .arg("-C")
            .arg(parent)
            .arg(dir_name)
            .output()
            .map_err(|e| ContainerError::Archiver(format!("failed to run tar: {e}")))?;

        if !output.status.success() {
            return Err(ContainerError::Archiver(format!(
                "tar failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}
