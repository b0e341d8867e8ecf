//! Renderers for aggregated release timelines.

pub mod markdown;
pub mod svg;

pub use markdown::render_markdown;
pub use svg::{render_svg, SvgLayout};

use chrono::{DateTime, Utc};

use crate::timeline::ReleaseTag;

/// Placeholder for a date that could not be determined
pub const MISSING_DATE: &str = "—";

pub(crate) fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| MISSING_DATE.to_string())
}

/// `YYYY-MM-DD (tag)` per release, `<br>`-separated
pub(crate) fn format_releases(releases: &[ReleaseTag]) -> String {
    releases
        .iter()
        .map(|r| format!("{} ({})", r.created_at.format("%Y-%m-%d"), r.tag_name))
        .collect::<Vec<_>>()
        .join("<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_date() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 17, 30, 0).unwrap();
        assert_eq!(format_date(Some(at)), "2024-03-09");
        assert_eq!(format_date(None), MISSING_DATE);
    }

    #[test]
    fn test_format_releases() {
        let releases = vec![
            ReleaseTag::new("v2.1.0", Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap()),
            ReleaseTag::new("v2.1.1", Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
        ];
        assert_eq!(
            format_releases(&releases),
            "2024-01-11 (v2.1.0)<br>2024-02-01 (v2.1.1)"
        );
        assert_eq!(format_releases(&[]), "");
    }
}
