use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(LedgerError::InvalidPeriod(format!(
                "window end {} must be after start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Window covering whole days `first..=last`.
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        let next = last
            .checked_add_signed(Duration::days(1))
            .ok_or_else(|| out_of_range(last))?;
        Self::new(start_of_day(first), start_of_day(next))
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }
}

/// Cadence over which a budget limit applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
    AllTime,
}

impl BudgetPeriod {
    pub fn label(self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "Weekly",
            BudgetPeriod::Monthly => "Monthly",
            BudgetPeriod::Quarterly => "Quarterly",
            BudgetPeriod::Yearly => "Yearly",
            BudgetPeriod::AllTime => "All time",
        }
    }

    /// Calendar window that contains `reference`. `Ok(None)` means unbounded.
    pub fn window_containing(self, reference: NaiveDate) -> Result<Option<DateWindow>> {
        let (first, next) = match self {
            BudgetPeriod::AllTime => return Ok(None),
            BudgetPeriod::Weekly => {
                let delta = reference.weekday().num_days_from_monday() as i64;
                let monday = reference.checked_sub_signed(Duration::days(delta));
                let next = monday.and_then(|m| m.checked_add_signed(Duration::weeks(1)));
                (monday, next)
            }
            BudgetPeriod::Monthly => {
                let first = reference.with_day(1);
                (first, first.and_then(|f| shift_month(f, 1)))
            }
            BudgetPeriod::Quarterly => {
                let quarter_month = (reference.month0() / 3) * 3 + 1;
                let first = NaiveDate::from_ymd_opt(reference.year(), quarter_month, 1);
                (first, first.and_then(|f| shift_month(f, 3)))
            }
            BudgetPeriod::Yearly => (
                NaiveDate::from_ymd_opt(reference.year(), 1, 1),
                NaiveDate::from_ymd_opt(reference.year() + 1, 1, 1),
            ),
        };
        match (first, next) {
            (Some(first), Some(next)) => Ok(Some(DateWindow {
                start: start_of_day(first),
                end: start_of_day(next),
            })),
            _ => Err(out_of_range(reference)),
        }
    }
}

fn out_of_range(date: NaiveDate) -> LedgerError {
    LedgerError::InvalidPeriod(format!("no calendar window around {}", date))
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn shift_month(first: NaiveDate, months: i32) -> Option<NaiveDate> {
    let index = first.year() * 12 + first.month0() as i32 + months;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
}
