//! Records exchanged with the forecast, employee and shift collaborators.
//!
//! These are plain data carriers. Nothing here talks to storage; the
//! repository traits in repository.rs move them in and out of a store.

use crate::{
    config::ShiftWindow,
    types::{EmployeeId, RoleName, SlotId, WindowKey},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Projected guest traffic and sales for one business day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastDay {
    pub date:             NaiveDate,
    pub projected_guests: u32,
    pub projected_sales:  f64,
}

impl ForecastDay {
    /// Neutral stand-in used when no forecast exists for a date.
    pub fn empty(date: NaiveDate) -> Self {
        Self { date, projected_guests: 0, projected_sales: 0.0 }
    }
}

/// One day of realised sales against what was forecast for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalesHistoryPoint {
    pub date:           NaiveDate,
    pub actual_sales:   f64,
    pub forecast_sales: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub employee_id: EmployeeId,
    pub name:        String,
    pub role:        RoleName,
    /// None when payroll has not recorded a rate; costing falls back
    /// to the configured fallback rate.
    pub hourly_rate: Option<f64>,
    pub active:      bool,
}

/// A single seat on the schedule: one role, one window, one index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShiftSlot {
    pub slot_id:      SlotId,
    pub date:         NaiveDate,
    pub role:         RoleName,
    pub shift_window: WindowKey,
    pub slot_index:   u32,
    pub employee_id:  Option<EmployeeId>,
    /// Free-form "HH:MM" text. Kept as text because slots may carry
    /// hand-edited times that fail to parse.
    pub start_time:   String,
    pub end_time:     String,
    /// Bumped on every successful write.
    pub version:      i64,
}

impl ShiftSlot {
    /// A fresh open slot carrying the window's default times.
    pub fn open(date: NaiveDate, role: &str, window: &ShiftWindow, slot_index: u32) -> Self {
        Self {
            slot_id:      uuid::Uuid::new_v4().to_string(),
            date,
            role:         role.to_string(),
            shift_window: window.key.clone(),
            slot_index,
            employee_id:  None,
            start_time:   window.start_time.clone(),
            end_time:     window.end_time.clone(),
            version:      0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.employee_id.is_none()
    }

    pub fn is_for(&self, role: &str, window: &str) -> bool {
        self.role == role && self.shift_window == window
    }
}
