use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Format used by the add form's date field.
pub const INPUT_FORMAT: &str = "%Y-%m-%d";

/// Parse a user-entered estimate: `YYYY-MM-DD` (local midnight) or RFC 3339.
pub fn parse_estimate(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Some(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, INPUT_FORMAT).ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
}

/// Prefill for the date field.
pub fn today_input() -> String {
    Local::now().format(INPUT_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_date_as_local_day() {
        let at = parse_estimate("2024-05-04").expect("date");
        assert_eq!(
            at.with_timezone(&Local).date_naive(),
            NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()
        );
    }

    #[test]
    fn parses_rfc3339() {
        let at = parse_estimate(" 2024-05-04T12:30:00Z ").expect("timestamp");
        assert_eq!(at.to_rfc3339(), "2024-05-04T12:30:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_estimate("tomorrow").is_none());
        assert!(parse_estimate("2024-13-01").is_none());
        assert!(parse_estimate("").is_none());
    }

    #[test]
    fn prefill_round_trips() {
        assert!(parse_estimate(&today_input()).is_some());
    }
}
