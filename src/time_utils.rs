// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and the report window.

use crate::models::ReportWindow;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

/// Format a zoned timestamp as RFC3339 with its numeric offset.
pub fn format_rfc3339_offset<T: TimeZone>(date: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    date.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Current unix time in seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// The calendar day before `now` in `tz`.
pub fn yesterday_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    let today = now.with_timezone(&tz).date_naive();
    today - Duration::days(1)
}

/// Build the window covering `date` from local 00:00:00 to 23:59:59 in `tz`.
pub fn report_window(date: NaiveDate, tz: Tz) -> anyhow::Result<ReportWindow> {
    let local = |time: NaiveTime| {
        tz.from_local_datetime(&date.and_time(time))
            .earliest()
            .ok_or_else(|| anyhow::anyhow!("{} {} does not exist in {}", date, time, tz))
    };

    let start = local(NaiveTime::MIN)?;
    let end = local(
        NaiveTime::from_hms_opt(23, 59, 59)
            .ok_or_else(|| anyhow::anyhow!("invalid end-of-day time"))?,
    )?;

    Ok(ReportWindow {
        date,
        start: format_rfc3339_offset(&start),
        end: format_rfc3339_offset(&end),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Amsterdam;

    #[test]
    fn test_winter_window_uses_cet_offset() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let window = report_window(date, Amsterdam).unwrap();
        assert_eq!(window.start, "2025-01-15T00:00:00+01:00");
        assert_eq!(window.end, "2025-01-15T23:59:59+01:00");
    }

    #[test]
    fn test_summer_window_uses_cest_offset() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let window = report_window(date, Amsterdam).unwrap();
        assert_eq!(window.start, "2025-07-01T00:00:00+02:00");
    }

    #[test]
    fn test_yesterday_follows_local_midnight() {
        // 23:30 UTC on Jan 15 is already Jan 16 in Amsterdam.
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 23, 30, 0).unwrap();
        assert_eq!(
            yesterday_in(Amsterdam, now),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }
}
