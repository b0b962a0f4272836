//! Read-only header inspection.  Never touches the payload.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::header::ContainerHeader;
use crate::layout::Variant;
use crate::naming::short_version;

/// Header fields plus the values derived from them for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderInfo {
    pub variant:         Variant,
    pub model:           String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package:         Option<String>,
    /// The version field exactly as stored.
    pub version:         String,
    /// Version with the firmware build-date suffix removed, when it parsed.
    pub release_version: String,
    /// First two dot-separated segments of the version.
    pub short_version:   String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub third_party:     Option<bool>,
    /// Firmware only; `None` when the suffix is missing or malformed.
    pub build_date:      Option<NaiveDate>,
    pub checksum:        String,
    pub payload_len:     u64,
}

impl From<ContainerHeader> for HeaderInfo {
    fn from(h: ContainerHeader) -> Self {
        let payload_len = h.payload_len();
        let dated = match h.variant {
            Variant::Firmware => split_build_date(&h.version),
            Variant::Package  => None,
        };
        let (release_version, build_date) = match dated {
            Some((release, date)) => (release.to_owned(), Some(date)),
            None                  => (h.version.clone(), None),
        };
        HeaderInfo {
            variant: h.variant,
            short_version: short_version(&h.version),
            model: h.model,
            package: h.package,
            release_version,
            version: h.version,
            third_party: h.third_party,
            build_date,
            checksum: h.checksum,
            payload_len,
        }
    }
}

/// Decode the header of `source` as a `variant` container.
pub fn inspect(source: &Path, variant: Variant) -> Result<HeaderInfo> {
    let header = ContainerHeader::read(File::open(source)?, variant)?;
    Ok(header.into())
}

/// Split `"{release}.MMdd.yyyy"` into the release part and the date.
///
/// The date is always taken from the last two dot-separated segments, so a
/// version that itself contains dots is never misread as part of it.
/// Returns `None` if there are fewer than two segments or they do not form a
/// valid calendar date.
pub fn split_build_date(version: &str) -> Option<(&str, NaiveDate)> {
    let mut segments = version.rsplitn(3, '.');
    let year      = segments.next()?;
    let month_day = segments.next()?;
    let release   = segments.next().unwrap_or("");

    if month_day.len() != 4 || !month_day.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month: u32 = month_day[..2].parse().ok()?;
    let day: u32   = month_day[2..].parse().ok()?;
    let year: i32  = year.parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day).map(|date| (release, date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_date_from_last_two_segments() {
        let (release, date) = split_build_date("1.02.0412.2024").unwrap();
        assert_eq!(release, "1.02");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 4, 12).unwrap());
    }

    #[test]
    fn extra_dots_stay_in_release() {
        let (release, date) = split_build_date("2.1.0.b7.1231.2023").unwrap();
        assert_eq!(release, "2.1.0.b7");
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn suffix_without_release_part_still_parses() {
        let (release, _) = split_build_date("0101.2020").unwrap();
        assert_eq!(release, "");
    }

    #[test]
    fn malformed_suffix_is_absent_not_an_error() {
        assert_eq!(split_build_date("1.02"), None);
        assert_eq!(split_build_date("1.0.1340.2024"), None); // month 13
        assert_eq!(split_build_date("1.0.0230.2024"), None); // Feb 30
        assert_eq!(split_build_date("1.0.04x2.2024"), None);
        assert_eq!(split_build_date("nodots"), None);
        assert_eq!(split_build_date(""), None);
    }

    #[test]
    fn year_must_have_four_digits() {
        assert_eq!(split_build_date("1.0.0412.24"), None);
        assert_eq!(split_build_date("1.0.0412.02024"), None);
        assert!(split_build_date("1.0.0412.0024").is_some());
    }
}
