//! crates/duotrack_core/src/calendar.rs
//!
//! Local-day arithmetic. Every "calendar day" in the tracker is a day in one
//! configured UTC offset; instants are always stored as UTC.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};

/// Converts between UTC instants and local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Parses an offset such as `+05:30`, `-08:00` or `Z`.
    pub fn parse_offset(value: &str) -> Option<FixedOffset> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
            return FixedOffset::east_opt(0);
        }
        let (sign, rest) = match value.chars().next()? {
            '+' => (1, &value[1..]),
            '-' => (-1, &value[1..]),
            _ => return None,
        };
        let (hours, minutes) = match rest.split_once(':') {
            Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
            None => (rest.parse::<i32>().ok()?, 0),
        };
        if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
            return None;
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The local calendar day containing `instant`.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Local midnight at the start of `day`, as a UTC instant.
    pub fn start_of_day(&self, day: NaiveDate) -> DateTime<Utc> {
        let local_midnight = day.and_time(NaiveTime::MIN);
        let utc = local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }

    /// Local midnight at the start of the day after `day`.
    pub fn next_midnight(&self, day: NaiveDate) -> DateTime<Utc> {
        self.start_of_day(day + Duration::days(1))
    }

    /// 23:59:59.999 local on `day`, the inclusive upper bound of day queries.
    pub fn end_of_day(&self, day: NaiveDate) -> DateTime<Utc> {
        self.next_midnight(day) - Duration::milliseconds(1)
    }

    /// Signed number of calendar days from `from` to `to`.
    pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
        (to - from).num_days()
    }

    /// Weekday index with 0 = Sunday .. 6 = Saturday.
    pub fn weekday_index(day: NaiveDate) -> u8 {
        day.weekday().num_days_from_sunday() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_boundaries_follow_the_offset() {
        let offset = Calendar::parse_offset("+05:30").unwrap();
        let calendar = Calendar::new(offset);
        let day = ymd(2024, 3, 10);

        let start = calendar.start_of_day(day);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap());
        assert_eq!(calendar.day_of(start), day);
        assert_eq!(calendar.day_of(start - Duration::milliseconds(1)), ymd(2024, 3, 9));
        assert_eq!(calendar.day_of(calendar.end_of_day(day)), day);
        assert_eq!(calendar.next_midnight(day) - calendar.end_of_day(day), Duration::milliseconds(1));
    }

    #[test]
    fn parses_common_offset_spellings() {
        assert_eq!(Calendar::parse_offset("Z"), FixedOffset::east_opt(0));
        assert_eq!(Calendar::parse_offset("-08:00"), FixedOffset::west_opt(8 * 3600));
        assert_eq!(Calendar::parse_offset("+2"), FixedOffset::east_opt(7200));
        assert_eq!(Calendar::parse_offset("05:00"), None);
        assert_eq!(Calendar::parse_offset("+25:00"), None);
    }

    #[test]
    fn weekday_index_starts_on_sunday() {
        assert_eq!(Calendar::weekday_index(ymd(2024, 3, 10)), 0);
        assert_eq!(Calendar::weekday_index(ymd(2024, 3, 11)), 1);
        assert_eq!(Calendar::weekday_index(ymd(2024, 3, 16)), 6);
    }
}
