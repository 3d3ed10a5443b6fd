//! Holiday lookup for the demand adjustment.
//!
//! The calculator only asks "is this date a holiday, and how busy does it
//! run?". Calendars answering that question are swappable so a site can
//! plug in its own regional dates without touching the calculator.

use crate::config::{DemandFactorConfig, FixedHoliday, FloatingHoliday};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holiday {
    pub name:   String,
    pub factor: f64,
}

pub trait HolidayCalendar: Send {
    /// The holiday falling on `date`, if any.
    fn holiday_on(&self, date: NaiveDate) -> Option<Holiday>;
}

/// Calendar with no holidays at all.
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn holiday_on(&self, _date: NaiveDate) -> Option<Holiday> {
        None
    }
}

/// Fixed month-day entries plus floating "nth weekday of month" rules.
/// Fixed entries win when both match the same date.
pub struct RuleHolidayCalendar {
    fixed:    Vec<FixedHoliday>,
    floating: Vec<FloatingHoliday>,
}

impl RuleHolidayCalendar {
    pub fn new(fixed: Vec<FixedHoliday>, floating: Vec<FloatingHoliday>) -> Self {
        Self { fixed, floating }
    }

    pub fn from_config(config: &DemandFactorConfig) -> Self {
        Self::new(config.fixed_holidays.clone(), config.floating_holidays.clone())
    }
}

impl HolidayCalendar for RuleHolidayCalendar {
    fn holiday_on(&self, date: NaiveDate) -> Option<Holiday> {
        let fixed = self
            .fixed
            .iter()
            .find(|h| h.month == date.month() && h.day == date.day())
            .map(|h| Holiday { name: h.name.clone(), factor: h.factor });

        fixed.or_else(|| {
            self.floating
                .iter()
                .find(|h| floating_date(h, date.year()) == Some(date))
                .map(|h| Holiday { name: h.name.clone(), factor: h.factor })
        })
    }
}

/// Resolve a floating rule to its concrete date in `year`.
/// Returns None for rules that do not exist that year (a fifth Monday
/// in a month that has four).
pub fn floating_date(rule: &FloatingHoliday, year: i32) -> Option<NaiveDate> {
    match rule.occurrence {
        n if n > 0 => NaiveDate::from_weekday_of_month_opt(year, rule.month, rule.weekday, n as u8),
        -1 => last_weekday_of_month(year, rule.month, rule.weekday),
        _ => None,
    }
}

fn last_weekday_of_month(year: i32, month: u32, weekday: chrono::Weekday) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let last_day = NaiveDate::from_ymd_opt(next_year, next_month, 1)? - Duration::days(1);
    let back = (7 + last_day.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    Some(last_day - Duration::days(back as i64))
}
