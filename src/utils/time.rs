use chrono::{Local, NaiveDate};

use crate::vault_api::VaultError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate a `YYYY-MM-DD` date argument.
pub fn validate_date(date_str: &str) -> Result<NaiveDate, VaultError> {
    NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|_| {
        VaultError::Config(format!(
            "invalid date format '{date_str}', expected YYYY-MM-DD"
        ))
    })
}

/// RFC 3339 bounds for the activity endpoint: both ends at midnight UTC.
pub fn activity_window(start_date: &str, end_date: &str) -> (String, String) {
    (
        format!("{start_date}T00:00:00Z"),
        format!("{end_date}T00:00:00Z"),
    )
}

/// RFC 3339 bounds for the entity export: the end date is inclusive.
pub fn entity_export_window(start_date: &str, end_date: &str) -> (String, String) {
    (
        format!("{start_date}T00:00:00Z"),
        format!("{end_date}T23:59:59Z"),
    )
}

/// Local run date used in report filenames.
pub fn date_stamp() -> String {
    Local::now().format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_validate_date() {
        let date = validate_date("2025-06-01").unwrap();
        assert_eq!(date.year(), 2025);
        assert_eq!(date.month(), 6);
        assert_eq!(date.day(), 1);
    }

    #[test]
    fn test_validate_date_rejects_bad_input() {
        assert!(validate_date("2025-13-01").is_err());
        assert!(validate_date("01-06-2025").is_err());
        assert!(validate_date("2025/06/01").is_err());
        assert!(validate_date("yesterday").is_err());
    }

    #[test]
    fn test_activity_window() {
        let (start, end) = activity_window("2025-06-01", "2025-07-01");
        assert_eq!(start, "2025-06-01T00:00:00Z");
        assert_eq!(end, "2025-07-01T00:00:00Z");
    }

    #[test]
    fn test_entity_export_window_is_end_inclusive() {
        let (start, end) = entity_export_window("2025-06-01", "2025-06-30");
        assert_eq!(start, "2025-06-01T00:00:00Z");
        assert_eq!(end, "2025-06-30T23:59:59Z");
    }

    #[test]
    fn test_date_stamp_shape() {
        let stamp = date_stamp();
        assert_eq!(stamp.len(), 8);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }
}
