//! Packer configuration: the supported-model list and the `apkg.rc`
//! manifest found at the root of an add-on source folder.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{ContainerError, Result};

/// Default location of the model list, relative to the working directory.
pub const MODEL_LIST_FILE: &str = "mkapkg.conf";
/// Manifest file every add-on source folder must contain.
pub const MANIFEST_FILE: &str = "apkg.rc";

const BUILTIN_MODELS: &[&str] = &["DNS-320L-B", "DNS-327L-B"];

// ── ModelList ────────────────────────────────────────────────────────────────

/// Models an add-on package may target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelList {
    models: Vec<String>,
}

impl ModelList {
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { models: models.into_iter().map(Into::into).collect() }
    }

    /// The list shipped with the tool, used when no list file exists.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_MODELS.iter().copied())
    }

    /// One model per line; surrounding whitespace and blank lines ignored.
    pub fn parse(text: &str) -> Self {
        Self::new(text.lines().map(str::trim).filter(|l| !l.is_empty()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            ContainerError::Config(format!("cannot read model list {}: {e}", path.display()))
        })?;
        Ok(Self::parse(&text))
    }

    /// [`load`](Self::load) if `path` exists, otherwise [`builtin`](Self::builtin).
    pub fn load_or_builtin<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::builtin())
        }
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    pub fn ensure_supported(&self, model: &str) -> Result<()> {
        if self.contains(model) {
            Ok(())
        } else {
            Err(ContainerError::UnsupportedModel { model: model.to_owned() })
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }
}

// ── AppManifest ──────────────────────────────────────────────────────────────

/// Contents of `apkg.rc`: `Key: Value` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppManifest {
    pub package:  String,
    pub version:  String,
    /// Reported after packing; not stored in the header.
    pub packager: Option<String>,
}

impl AppManifest {
    /// Lines that do not split into exactly two `:`-separated parts are
    /// skipped.  `Package` and `Version` are required.
    pub fn parse(text: &str) -> Result<Self> {
        let entries: HashMap<String, String> = text
            .lines()
            .filter_map(|line| {
                let parts: Vec<&str> = line.split(':').collect();
                match parts.as_slice() {
                    [key, value] => Some((key.trim().to_owned(), value.trim().to_owned())),
                    _ => None,
                }
            })
            .collect();

        let required = |key: &str| {
            entries
                .get(key)
                .cloned()
                .ok_or_else(|| ContainerError::Config(format!("{MANIFEST_FILE} has no '{key}' entry")))
        };

        Ok(Self {
            package:  required("Package")?,
            version:  required("Version")?,
            packager: entries.get("Packager").cloned(),
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            ContainerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_list_skips_blank_lines_and_trims() {
        let list = ModelList::parse("DNS-320L-B\n\n  DNS-340L \n");
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["DNS-320L-B", "DNS-340L"]);
        assert!(list.ensure_supported("DNS-340L").is_ok());
        assert!(matches!(
            list.ensure_supported("DNS-327L-B"),
            Err(ContainerError::UnsupportedModel { .. })
        ));
    }

    #[test]
    fn missing_list_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let list = ModelList::load_or_builtin(dir.path().join(MODEL_LIST_FILE)).unwrap();
        assert_eq!(list, ModelList::builtin());
        assert!(list.contains("DNS-320L-B"));
    }

    #[test]
    fn manifest_reads_required_and_optional_keys() {
        let rc = "Package: myapp\nVersion: 1.0\nPackager: someone\nHomepage: http://example.com\n";
        let manifest = AppManifest::parse(rc).unwrap();
        assert_eq!(manifest.package, "myapp");
        assert_eq!(manifest.version, "1.0");
        assert_eq!(manifest.packager.as_deref(), Some("someone"));
    }

    #[test]
    fn manifest_line_with_extra_colon_is_skipped() {
        let rc = "Package: myapp\nVersion: 1.0\nPackager: mailto:someone@example.com\n";
        let manifest = AppManifest::parse(rc).unwrap();
        assert_eq!(manifest.packager, None);
    }

    #[test]
    fn manifest_without_version_is_rejected() {
        let err = AppManifest::parse("Package: myapp\n").unwrap_err();
        assert!(matches!(err, ContainerError::Config(_)));
    }
}
