use chrono::NaiveDate;

/// Parse a `week_ending` value into a date.
///
/// Accepts `YYYY-MM-DD`, optionally followed by a `T…` time (the Socrata
/// floating timestamp), and `MM/DD/YYYY`, optionally followed by a time.
pub fn parse_week_ending(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // ISO: minimal length + separator check, ignore anything after the day
    let b = s.as_bytes();
    if b.len() >= 10 && b[4] == b'-' && b[7] == b'-' && s.is_char_boundary(10) {
        let rest = &s[10..];
        if rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ') {
            return NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d").ok();
        }
        return None;
    }
    // US style, as some CSV exports render it
    let date_part = s.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%m/%d/%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_plain_and_floating_timestamp() {
        assert_eq!(parse_week_ending("2024-05-11"), Some(ymd(2024, 5, 11)));
        assert_eq!(
            parse_week_ending("2024-05-11T00:00:00.000"),
            Some(ymd(2024, 5, 11))
        );
        assert_eq!(
            parse_week_ending(" 2024-05-11 00:00:00 "),
            Some(ymd(2024, 5, 11))
        );
    }

    #[test]
    fn parses_us_style() {
        assert_eq!(
            parse_week_ending("05/11/2024 12:00:00 AM"),
            Some(ymd(2024, 5, 11))
        );
        assert_eq!(parse_week_ending("5/11/2024"), Some(ymd(2024, 5, 11)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_week_ending(""), None);
        assert_eq!(parse_week_ending("2024-13-01"), None);
        assert_eq!(parse_week_ending("2024-05-11X"), None);
        assert_eq!(parse_week_ending("last week"), None);
    }
}
