//! Retail-calendar helpers: Sunday-start week numbers and Pacific time.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::US::Pacific;

/// Week number for weeks starting on Sunday.
///
/// A Sunday already belongs to the following week, so it gets the next ISO
/// week's number.
pub fn week_number(date: NaiveDate) -> u32 {
    let n_week = date.iso_week().week();
    if date.weekday() == Weekday::Sun {
        n_week + 1
    } else {
        n_week
    }
}

/// [`week_number`] for a `%Y-%m-%d` date string.
pub fn week_number_from_str(text: &str) -> Result<u32, String> {
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|err| format!("Date format not recognized: {text:?} ({err})"))?;
    Ok(week_number(date))
}

/// Convert a zone-less UTC timestamp to zone-less US/Pacific wall time.
pub fn convert_to_pacific(datetime_utc: NaiveDateTime) -> NaiveDateTime {
    Utc.from_utc_datetime(&datetime_utc)
        .with_timezone(&Pacific)
        .naive_local()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};

    use super::*;

    #[test]
    fn sundays_roll_into_the_next_week() {
        // 2024-01-07 is a Sunday in ISO week 1.
        let date_sunday = NaiveDate::from_ymd_opt(2024, 1, 7).expect("date");
        assert_eq!(week_number(date_sunday), 2);

        // 2024-01-06 is the Saturday before it.
        let date_saturday = NaiveDate::from_ymd_opt(2024, 1, 6).expect("date");
        assert_eq!(week_number(date_saturday), 1);
    }

    #[test]
    fn week_number_parses_iso_date_strings() {
        assert_eq!(week_number_from_str("2024-01-06"), Ok(1));
        assert_eq!(week_number_from_str(" 2024-01-07 "), Ok(2));
        assert!(week_number_from_str("01/06/2024").is_err());
    }

    #[test]
    fn pacific_conversion_tracks_daylight_saving() {
        // PST is UTC-8.
        let dt_winter = NaiveDate::from_ymd_opt(2024, 1, 15)
            .expect("date")
            .and_hms_opt(12, 0, 0)
            .expect("time");
        assert_eq!(convert_to_pacific(dt_winter).hour(), 4);

        // PDT is UTC-7.
        let dt_summer = NaiveDate::from_ymd_opt(2024, 7, 15)
            .expect("date")
            .and_hms_opt(12, 0, 0)
            .expect("time");
        assert_eq!(convert_to_pacific(dt_summer).hour(), 5);
    }
}
