//! Sync window.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::constants::{DEFAULT_SYNC_DAYS_FUTURE, DEFAULT_SYNC_DAYS_PAST};
use crate::error::{CalSyncError, CalSyncResult};

/// Date range for filtering events.
/// None values mean unbounded in that direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl Default for DateRange {
    fn default() -> Self {
        Self::around(Utc::now(), DEFAULT_SYNC_DAYS_PAST, DEFAULT_SYNC_DAYS_FUTURE)
    }
}

impl DateRange {
    /// Whole days from `days_past` before `now` through `days_future` after it.
    /// Spans beyond chrono's range clamp to its earliest and latest dates.
    pub fn around(now: DateTime<Utc>, days_past: i64, days_future: i64) -> Self {
        let from = Duration::try_days(days_past)
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
            .date_naive();
        let to = Duration::try_days(days_future)
            .and_then(|span| now.checked_add_signed(span))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .date_naive();
        DateRange {
            from: Some(start_of_day(from)),
            to: Some(end_of_day(to)),
        }
    }

    /// Parse command-line bounds.
    /// - `from`: "start" for unbounded, or YYYY-MM-DD; defaults to the window start
    /// - `to`: "end" for unbounded, or YYYY-MM-DD; defaults to the window end
    pub fn from_args(
        from: Option<&str>,
        to: Option<&str>,
        days_past: i64,
        days_future: i64,
    ) -> CalSyncResult<Self> {
        let window = Self::around(Utc::now(), days_past, days_future);

        let from_dt = match from {
            Some("start") => None,
            Some(s) => Some(start_of_day(parse_date(s)?)),
            None => window.from,
        };

        let to_dt = match to {
            Some("end") => None,
            Some(s) => Some(end_of_day(parse_date(s)?)),
            None => window.to,
        };

        if let (Some(from), Some(to)) = (from_dt, to_dt) {
            if from > to {
                return Err(CalSyncError::InvalidDateRange(format!(
                    "{} is after {}",
                    from.date_naive(),
                    to.date_naive()
                )));
            }
        }

        Ok(DateRange {
            from: from_dt,
            to: to_dt,
        })
    }

    /// Whether `instant` falls on a day inside the range (bounds inclusive).
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let day = instant.date_naive();
        self.from.is_none_or(|from| day >= from.date_naive())
            && self.to.is_none_or(|to| day <= to.date_naive())
    }

    /// Get `from` as RFC3339 string, using a very old date if unbounded.
    pub fn from_rfc3339(&self) -> String {
        self.from
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
            .to_rfc3339()
    }

    /// Get `to` as RFC3339 string, using a far future date if unbounded.
    pub fn to_rfc3339(&self) -> String {
        self.to.unwrap_or_else(far_future).to_rfc3339()
    }
}

fn parse_date(s: &str) -> CalSyncResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        CalSyncError::InvalidDateRange(format!("Invalid date '{}'. Expected YYYY-MM-DD", s))
    })
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    date.and_time(last_second).and_utc()
}

fn far_future() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2100, 1, 1)
        .map(start_of_day)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
