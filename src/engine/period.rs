use std::fmt::{Display, Formatter};

use chrono::{
    DateTime,
    Datelike,
    NaiveDate,
    NaiveDateTime,
    NaiveTime,
    TimeDelta,
    TimeZone,
    Timelike,
};

/// Rolling accounting period.
#[derive(Debug, enumset::EnumSetType)]
pub enum PeriodKind {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Display for PeriodKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hour => write!(f, "hour"),
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::Year => write!(f, "year"),
        }
    }
}

impl PeriodKind {
    pub const ALL: [Self; 5] = [Self::Hour, Self::Day, Self::Week, Self::Month, Self::Year];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Persistence key prefix.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Hour => "hourly",
            Self::Day => "daily",
            Self::Week => "weekly",
            Self::Month => "monthly",
            Self::Year => "yearly",
        }
    }

    /// Start of the day, week, month, or year containing the local wall-clock time.
    fn naive_anchor(self, at: NaiveDateTime) -> NaiveDateTime {
        let date = at.date();
        match self {
            Self::Hour | Self::Day => date.and_time(NaiveTime::MIN),
            Self::Week => {
                let days_since_monday = i64::from(date.weekday().num_days_from_monday());
                (date - TimeDelta::days(days_since_monday)).and_time(NaiveTime::MIN)
            }
            Self::Month => date.with_day(1).unwrap_or(date).and_time(NaiveTime::MIN),
            Self::Year => {
                NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date).and_time(NaiveTime::MIN)
            }
        }
    }

    /// Start of the period containing `now`, as an instant in the same time zone.
    ///
    /// The hour is floored on the instant itself, so that the repeated hour
    /// of a DST fall-back is a separate period.
    pub fn anchor<Tz: TimeZone>(self, now: &DateTime<Tz>) -> DateTime<Tz> {
        match self {
            Self::Hour => {
                now.clone()
                    - TimeDelta::minutes(i64::from(now.minute()))
                    - TimeDelta::seconds(i64::from(now.second()))
                    - TimeDelta::nanoseconds(i64::from(now.nanosecond()))
            }
            _ => localize(&now.timezone(), self.naive_anchor(now.naive_local())),
        }
    }
}

/// Map the local wall-clock time onto an instant.
///
/// Ambiguous times resolve to the earliest instant. Times inside a DST gap
/// resolve to the first instant after the gap.
fn localize<Tz: TimeZone>(timezone: &Tz, local: NaiveDateTime) -> DateTime<Tz> {
    let mut probe = local;
    for _ in 0..4 {
        if let Some(instant) = timezone.from_local_datetime(&probe).earliest() {
            return instant;
        }
        probe += TimeDelta::minutes(30);
    }
    timezone.from_utc_datetime(&local)
}
