//! Labor cost evaluation against a sales-based target.
//!
//! Only assigned slots cost money. A slot whose end time is earlier than
//! its start crosses midnight and gets 24h added to the end. Slots with
//! unparsable times are excluded and reported; the rest still count.

use crate::{
    config::LaborPolicy,
    error::{StaffError, StaffResult},
    roster::{Employee, ShiftSlot},
    types::SlotId,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExcludedSlot {
    pub slot_id: SlotId,
    pub reason:  String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyLaborSummary {
    pub date:                 NaiveDate,
    pub projected_sales:      f64,
    pub total_hours:          f64,
    pub total_cost:           f64,
    pub percentage_of_sales:  f64,
    pub target_percentage:    f64,
    pub over_target:          bool,
    pub assigned_shift_count: usize,
    pub excluded:             Vec<ExcludedSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LaborPeriodSummary {
    pub start:               NaiveDate,
    pub end:                 NaiveDate,
    pub days:                Vec<DailyLaborSummary>,
    pub total_hours:         f64,
    pub total_cost:          f64,
    pub total_sales:         f64,
    pub percentage_of_sales: f64,
    pub over_target_days:    usize,
}

/// Accepts "HH:MM" and "HH:MM:SS".
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Hours between two times of day; an end before the start is read as
/// the next day.
pub fn shift_hours(start: NaiveTime, end: NaiveTime) -> f64 {
    let mut seconds = (end - start).num_seconds();
    if end < start {
        seconds += 24 * 60 * 60;
    }
    seconds as f64 / 3600.0
}

pub fn slot_hours(slot: &ShiftSlot) -> StaffResult<f64> {
    let parse = |value: &str| {
        parse_time_of_day(value).ok_or_else(|| StaffError::MalformedTime {
            slot_id: slot.slot_id.clone(),
            value:   value.to_string(),
        })
    };
    Ok(shift_hours(parse(&slot.start_time)?, parse(&slot.end_time)?))
}

/// cost / sales × 100, or 0 when there are no sales to measure against.
pub fn labor_cost_percentage(total_cost: f64, projected_sales: f64) -> f64 {
    if projected_sales > 0.0 {
        total_cost / projected_sales * 100.0
    } else {
        0.0
    }
}

pub struct LaborCostEvaluator {
    target_percentage:    f64,
    fallback_hourly_rate: f64,
}

impl LaborCostEvaluator {
    pub fn new(target_percentage: f64, fallback_hourly_rate: f64) -> Self {
        Self { target_percentage, fallback_hourly_rate }
    }

    pub fn from_policy(policy: &LaborPolicy) -> Self {
        Self::new(policy.target_percentage, policy.fallback_hourly_rate)
    }

    pub fn evaluate(
        &self,
        date:            NaiveDate,
        projected_sales: f64,
        slots:           &[ShiftSlot],
        employees:       &[Employee],
    ) -> DailyLaborSummary {
        let rates: HashMap<&str, Option<f64>> = employees
            .iter()
            .map(|e| (e.employee_id.as_str(), e.hourly_rate))
            .collect();

        let mut total_hours = 0.0;
        let mut total_cost = 0.0;
        let mut assigned = 0usize;
        let mut excluded = Vec::new();

        for slot in slots.iter().filter(|s| s.date == date) {
            let Some(employee_id) = slot.employee_id.as_deref() else {
                continue;
            };

            let hours = match slot_hours(slot) {
                Ok(h) => h,
                Err(e) => {
                    log::warn!("date={date} excluding slot from labor cost: {e}");
                    excluded.push(ExcludedSlot { slot_id: slot.slot_id.clone(), reason: e.to_string() });
                    continue;
                }
            };
            if hours <= 0.0 {
                log::debug!("date={date} slot {} has zero duration", slot.slot_id);
                continue;
            }

            let rate = rates
                .get(employee_id)
                .copied()
                .flatten()
                .unwrap_or(self.fallback_hourly_rate);

            total_hours += hours;
            total_cost += hours * rate;
            assigned += 1;
        }

        let percentage_of_sales = labor_cost_percentage(total_cost, projected_sales);
        let over_target = percentage_of_sales > self.target_percentage;

        if over_target {
            log::warn!(
                "date={date} labor {percentage_of_sales:.1}% of sales exceeds target {:.1}%",
                self.target_percentage
            );
        }

        DailyLaborSummary {
            date,
            projected_sales,
            total_hours,
            total_cost,
            percentage_of_sales,
            target_percentage: self.target_percentage,
            over_target,
            assigned_shift_count: assigned,
            excluded,
        }
    }

    /// Roll daily summaries up into one period.
    pub fn summarize_period(
        &self,
        start: NaiveDate,
        end:   NaiveDate,
        days:  Vec<DailyLaborSummary>,
    ) -> LaborPeriodSummary {
        let total_hours = days.iter().map(|d| d.total_hours).sum();
        let total_cost: f64 = days.iter().map(|d| d.total_cost).sum();
        let total_sales: f64 = days.iter().map(|d| d.projected_sales.max(0.0)).sum();
        let over_target_days = days.iter().filter(|d| d.over_target).count();

        LaborPeriodSummary {
            start,
            end,
            total_hours,
            total_cost,
            total_sales,
            percentage_of_sales: labor_cost_percentage(total_cost, total_sales),
            over_target_days,
            days,
        }
    }
}
