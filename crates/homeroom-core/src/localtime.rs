//! UTC ↔ local wall-clock conversion.
//!
//! Deadlines are stored as UTC instants; anything shown to a person goes
//! through the owning group's IANA timezone. Conversion relies on the zone
//! database (chrono-tz), never on manual offset arithmetic, so daylight
//! saving transitions come out right.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::error::{HomeroomError, Result};

/// Deadline input format, interpreted as UTC.
const DEADLINE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Validate an IANA zone identifier.
///
/// This is the single place identifiers are checked; it runs when a group's
/// timezone is set. Conversion itself assumes a valid identifier.
pub fn parse_zone(id: &str) -> Result<Tz> {
    id.parse::<Tz>()
        .map_err(|_| HomeroomError::InvalidTimezone(id.to_string()))
}

/// Format a UTC instant as local wall-clock time in `tz`, minute precision.
pub fn fmt_local(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format(DEADLINE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD HH:MM` string as a UTC instant.
pub fn parse_utc_minutes(s: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), DEADLINE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| HomeroomError::InvalidDeadline(format!("{s:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn valid_zone_parses() {
        assert!(parse_zone("Europe/Moscow").is_ok());
        assert!(parse_zone("America/New_York").is_ok());
        assert!(parse_zone("UTC").is_ok());
    }

    #[test]
    fn garbage_zone_is_rejected() {
        assert!(parse_zone("Mars/Olympus_Mons").is_err());
        assert!(parse_zone("").is_err());
        assert!(parse_zone("+03:00").is_err());
    }

    #[test]
    fn moscow_is_utc_plus_three() {
        let tz = parse_zone("Europe/Moscow").unwrap();
        let at = Utc.with_ymd_and_hms(2025, 9, 25, 18, 0, 0).unwrap();
        assert_eq!(fmt_local(at, tz), "2025-09-25 21:00");
    }

    #[test]
    fn dst_transition_shifts_wall_clock_by_one_hour() {
        // Berlin switches CET→CEST on 2025-03-30. The same UTC wall time
        // lands an hour later locally after the transition.
        let tz = parse_zone("Europe/Berlin").unwrap();
        let before = Utc.with_ymd_and_hms(2025, 3, 29, 12, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(fmt_local(before, tz), "2025-03-29 13:00");
        assert_eq!(fmt_local(after, tz), "2025-03-31 14:00");
    }

    #[test]
    fn deadline_parses_as_utc() {
        let due = parse_utc_minutes("2025-09-25 18:00").unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2025, 9, 25, 18, 0, 0).unwrap());
        // surrounding whitespace is tolerated
        assert_eq!(parse_utc_minutes(" 2025-09-25 18:00 ").unwrap(), due);
    }

    #[test]
    fn bad_deadline_is_rejected() {
        assert!(parse_utc_minutes("tomorrow").is_err());
        assert!(parse_utc_minutes("2025-09-25").is_err());
        assert!(parse_utc_minutes("2025-13-40 25:99").is_err());
    }
}
