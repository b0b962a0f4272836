//! Output file names for packed containers.
//!
//! Names are presentation only; nothing reads them back.
//!
//! - package:  `{model} {package} Package v{version}_{MMddyyyy}`
//! - firmware: `DLINK_{model}_{version}({major.minor}.{MMdd.yyyy})`

use chrono::NaiveDate;

use crate::header::{FirmwareMetadata, PackageMetadata, BUILD_DATE_FORMAT};

/// The first two dot-separated segments of a version (`"1.02.b3"` → `"1.02"`).
pub fn short_version(version: &str) -> String {
    version.split('.').take(2).collect::<Vec<_>>().join(".")
}

pub fn package_file_name(meta: &PackageMetadata, stamp: NaiveDate) -> String {
    format!(
        "{} {} Package v{}_{}",
        meta.model,
        meta.package,
        meta.version,
        stamp.format("%m%d%Y")
    )
}

pub fn firmware_file_name(meta: &FirmwareMetadata) -> String {
    format!(
        "DLINK_{}_{}({}.{})",
        meta.model,
        meta.version,
        short_version(&meta.version),
        meta.build_date.format(BUILD_DATE_FORMAT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 12).unwrap()
    }

    #[test]
    fn package_name_embeds_model_package_version_and_date() {
        let meta = PackageMetadata {
            model:       "DNS-320L-B".into(),
            package:     "myapp".into(),
            version:     "1.0".into(),
            third_party: false,
        };
        assert_eq!(package_file_name(&meta, date()), "DNS-320L-B myapp Package v1.0_04122024");
    }

    #[test]
    fn firmware_name_uses_short_version_and_build_date() {
        let meta = FirmwareMetadata {
            model:      "DNS-327L".into(),
            version:    "1.02.b03".into(),
            build_date: date(),
        };
        assert_eq!(firmware_file_name(&meta), "DLINK_DNS-327L_1.02.b03(1.02.0412.2024)");
    }

    #[test]
    fn short_version_keeps_at_most_two_segments() {
        assert_eq!(short_version("1"), "1");
        assert_eq!(short_version("1.0"), "1.0");
        assert_eq!(short_version("2.10.7.1"), "2.10");
    }
}
