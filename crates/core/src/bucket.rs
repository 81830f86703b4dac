//! Time bucketing: retention cutoffs and calendar-aligned bucket labels.
//!
//! Everything here is pure. Callers inject the reference instant and the
//! calendar time zone; the engine uses the server's local zone, tests pin `Utc`
//! or a `FixedOffset`.
//!
//! ## Cutoffs
//!
//! For a reference instant `now` and a lookback of `n` days:
//!
//! - daily cutoff: `now - n` calendar days
//! - weekly cutoff: `now - 7n` calendar days
//! - monthly cutoff: `now - n` calendar months, keeping the day-of-month and
//!   rolling a day past the end of the target month forward into the next one
//!   (Mar 31 - 1 month = "Feb 31" = Mar 2 in a leap year)
//!
//! Arithmetic runs on the local wall clock, so a DST change inside the window
//! does not shift the cutoff's time of day. The result is always ordered
//! `monthly <= weekly <= daily <= now`.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Weekday};

/// First day of a calendar week for weekly labels.
pub const WEEK_START: Weekday = Weekday::Sun;

/// Bucket granularities, in increasing window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Daily, Granularity::Weekly, Granularity::Monthly];

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }
}

impl core::fmt::Display for Granularity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positive lookback horizon, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lookback(u32);

impl Lookback {
    pub const DEFAULT: Lookback = Lookback(7);

    /// `None` for zero.
    pub fn new(days: u32) -> Option<Self> {
        (days > 0).then_some(Self(days))
    }

    /// Parse a raw request parameter.
    ///
    /// Absent, unparsable and non-positive values fall back to [`Lookback::DEFAULT`]
    /// instead of failing the query. So do integers above `u32::MAX`: no window
    /// that wide is representable, and the default keeps the query cheap.
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse::<i64>().ok())
            .and_then(|days| u32::try_from(days).ok())
            .and_then(Self::new)
            .unwrap_or(Self::DEFAULT)
    }

    pub fn days(self) -> u32 {
        self.0
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Oldest `createdAt` (epoch ms) still counted, per granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoffs {
    pub daily: i64,
    pub weekly: i64,
    pub monthly: i64,
}

impl Cutoffs {
    pub fn compute<Tz: TimeZone>(now: &DateTime<Tz>, lookback: Lookback) -> Self {
        let tz = now.timezone();
        let local = now.naive_local();
        let now_ms = now.timestamp_millis();
        let days = u64::from(lookback.days());

        let daily = resolve(&tz, local.checked_sub_days(Days::new(days))).min(now_ms);
        let weekly = resolve(&tz, local.checked_sub_days(Days::new(days * 7))).min(daily);
        let monthly = resolve(&tz, sub_months_rolling(local, lookback.days())).min(weekly);

        Self {
            daily,
            weekly,
            monthly,
        }
    }

    pub fn get(&self, granularity: Granularity) -> i64 {
        match granularity {
            Granularity::Daily => self.daily,
            Granularity::Weekly => self.weekly,
            Granularity::Monthly => self.monthly,
        }
    }

    /// The broadest cutoff: the single range-fetch anchor for a query.
    pub fn oldest(&self) -> i64 {
        self.monthly
    }
}

/// Step back `months` calendar months, keeping the day-of-month and wall time.
///
/// A day that does not exist in the target month overflows into the following
/// month, so Mar 31 minus one month lands on Mar 2 (or Mar 3 outside leap years).
fn sub_months_rolling(local: NaiveDateTime, months: u32) -> Option<NaiveDateTime> {
    let date = local.date();
    let target = i64::from(date.year()) * 12 + i64::from(date.month0()) - i64::from(months);
    let year = i32::try_from(target.div_euclid(12)).ok()?;
    let month = u32::try_from(target.rem_euclid(12)).ok()? + 1;

    let day = NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(u64::from(date.day0())))?;
    Some(day.and_time(local.time()))
}

/// Map a local wall-clock time back to an instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// spring-forward gap move to the first valid instant after it. Times that do
/// not exist in the calendar at all mean "everything qualifies".
fn resolve<Tz: TimeZone>(tz: &Tz, local: Option<NaiveDateTime>) -> i64 {
    let Some(local) = local else {
        return i64::MIN;
    };

    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            let shifted = local.checked_add_signed(TimeDelta::hours(1))?;
            tz.from_local_datetime(&shifted).earliest()
        })
        .map(|t| t.timestamp_millis())
        .unwrap_or(i64::MIN)
}

/// Bucket labels of one event, computed once per event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketKeys {
    /// `YYYY-MM-DD`
    pub daily: String,
    /// `YYYY-MM-DD` of the week start (see [`WEEK_START`])
    pub weekly: String,
    /// `YYYY-MM`
    pub monthly: String,
}

impl BucketKeys {
    /// Labels for an epoch-millisecond timestamp in `tz`.
    ///
    /// `None` when the timestamp is outside the representable calendar.
    pub fn for_timestamp<Tz: TimeZone>(created_at_ms: i64, tz: &Tz) -> Option<Self> {
        let local = tz.timestamp_millis_opt(created_at_ms).single()?;
        let date = local.date_naive();
        let week_start = week_start(date)?;

        Some(Self {
            daily: date.format("%Y-%m-%d").to_string(),
            weekly: week_start.format("%Y-%m-%d").to_string(),
            monthly: date.format("%Y-%m").to_string(),
        })
    }

    pub fn get(&self, granularity: Granularity) -> &str {
        match granularity {
            Granularity::Daily => &self.daily,
            Granularity::Weekly => &self.weekly,
            Granularity::Monthly => &self.monthly,
        }
    }
}

/// Days elapsed since the most recent [`WEEK_START`] (0..=6).
pub fn days_since_week_start(day: Weekday) -> u32 {
    (day.num_days_from_monday() + 7 - WEEK_START.num_days_from_monday()) % 7
}

fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(days_since_week_start(date.weekday()))))
}
