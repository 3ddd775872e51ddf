use crate::error::DashboardError;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate};

/// Number of week columns in the watermark heatmap.
pub const HEATMAP_WEEKS: usize = 52;
/// Days between "today" and the first heatmap week.
pub const HEATMAP_LOOKBACK_DAYS: i64 = 365;

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar-day range. Empty when `start > end`.
pub fn generate_date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    start.iter_days().take_while(|date| *date <= end).collect()
}

/// Parses a date as sent by the dashboard endpoints. Accepts plain ISO dates
/// and RFC 3339 timestamps (the calendar date part is kept).
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, ISO_FORMAT) {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|timestamp| timestamp.date_naive())
}

/// Strict `YYYY-MM-DD` parsing for user supplied ranges.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, DashboardError> {
    NaiveDate::parse_from_str(raw.trim(), ISO_FORMAT)
        .map_err(|_| DashboardError::InvalidDate(raw.to_string()))
}

/// `1970-01-01` stands for "no valid exit".
pub fn is_sentinel(date: NaiveDate) -> bool {
    date.year() == 1970 && date.ordinal() == 1
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Week labels for the heatmap x-axis, oldest first, e.g. `W01-10/19`.
pub fn week_labels(today: NaiveDate) -> Vec<String> {
    let year_ago = today - Duration::days(HEATMAP_LOOKBACK_DAYS);
    (0..HEATMAP_WEEKS)
        .map(|week| {
            let week_start = year_ago + Duration::days(week as i64 * 7);
            format!(
                "W{:02}-{:02}/{:02}",
                week + 1,
                week_start.month(),
                week_start.day()
            )
        })
        .collect()
}

pub fn default_lookback(
    today: NaiveDate,
    days: u32,
) -> Result<(NaiveDate, NaiveDate), DashboardError> {
    let from = today.checked_sub_days(Days::new(u64::from(days))).ok_or_else(|| {
        DashboardError::Config(format!(
            "lookback of {} days from {} is out of range",
            days, today
        ))
    })?;
    Ok((from, today))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_is_inclusive_and_gapless() {
        let start = date(2024, 2, 27);
        let end = date(2024, 3, 2);
        let range = generate_date_range(start, end);

        assert_eq!(range.len() as i64, (end - start).num_days() + 1);
        assert_eq!(range.first(), Some(&start));
        assert_eq!(range.last(), Some(&end));
        assert!(range.contains(&date(2024, 2, 29)));
        for pair in range.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
    }

    #[test]
    fn range_crosses_dst_changes_without_gaps() {
        let start = date(2024, 3, 9);
        let end = date(2024, 11, 4);
        let range = generate_date_range(start, end);
        assert_eq!(range.len() as i64, (end - start).num_days() + 1);
        assert!(range.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn single_day_and_inverted_ranges() {
        let day = date(2024, 1, 1);
        assert_eq!(generate_date_range(day, day), vec![day]);
        assert!(generate_date_range(date(2024, 1, 3), day).is_empty());
    }

    #[test]
    fn wire_dates_accept_iso_and_timestamps() {
        assert_eq!(parse_wire_date("2024-01-03"), Some(date(2024, 1, 3)));
        assert_eq!(
            parse_wire_date("2024-01-03T21:15:00Z"),
            Some(date(2024, 1, 3))
        );
        assert_eq!(parse_wire_date("  "), None);
        assert_eq!(parse_wire_date("not a date"), None);
        assert!(is_sentinel(parse_wire_date("1970-01-01").unwrap()));
    }

    #[test]
    fn strict_parse_rejects_timestamps() {
        assert!(parse_iso_date("2024-01-03").is_ok());
        assert!(matches!(
            parse_iso_date("2024-01-03T00:00:00Z"),
            Err(DashboardError::InvalidDate(_))
        ));
    }

    #[test]
    fn week_labels_start_a_year_back() {
        let labels = week_labels(date(2024, 12, 31));
        assert_eq!(labels.len(), HEATMAP_WEEKS);
        // 2024 is a leap year: 365 days before Dec 31 is Jan 1.
        assert_eq!(labels[0], "W01-01/01");
        assert_eq!(labels[1], "W02-01/08");
        assert_eq!(labels[51], "W52-12/23");
    }

    #[test]
    fn lookback_window_ends_today() {
        let (from, to) = default_lookback(date(2024, 4, 1), 90).unwrap();
        assert_eq!(to, date(2024, 4, 1));
        assert_eq!(from, date(2024, 1, 2));
    }

    #[test]
    fn lookback_past_the_calendar_is_an_error() {
        assert!(matches!(
            default_lookback(date(2026, 10, 19), 100_000_000),
            Err(DashboardError::Config(_))
        ));
        assert!(default_lookback(date(2026, 10, 19), u32::MAX).is_err());
    }
}
