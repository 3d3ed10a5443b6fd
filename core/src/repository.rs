//! Collaborator contracts the engine runs against.
//!
//! RULE: The engine and the resolver only see these traits.
//! StaffStore (store/) is the SQLite implementation; tests may supply
//! their own to inject failures.

use crate::{
    error::StaffResult,
    event::EventLogEntry,
    roster::{Employee, ForecastDay, SalesHistoryPoint, ShiftSlot},
    types::EmployeeId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a shift write protects against concurrent writers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WriteGuard {
    /// Last writer wins. Two resolvers racing on one date can book the
    /// same employee twice.
    Unguarded,
    /// The write only lands if the stored version still matches the
    /// caller's copy and the employee holds no other slot that date.
    #[default]
    OptimisticVersion,
}

pub trait ForecastStore {
    /// Forecast days in [start, end], ordered by date.
    fn fetch(&self, start: NaiveDate, end: NaiveDate) -> StaffResult<Vec<ForecastDay>>;

    /// Realised sales in [start, end], ordered by date.
    fn sales_history(&self, start: NaiveDate, end: NaiveDate)
        -> StaffResult<Vec<SalesHistoryPoint>>;

    fn forecast_for(&self, date: NaiveDate) -> StaffResult<Option<ForecastDay>> {
        Ok(self.fetch(date, date)?.into_iter().next())
    }
}

pub trait EmployeeDirectory {
    /// Active employees in directory order.
    fn list_active(&self) -> StaffResult<Vec<Employee>>;
}

pub trait ShiftStore {
    /// All slots for `date`, ordered by role, window, slot index.
    fn list(&self, date: NaiveDate) -> StaffResult<Vec<ShiftSlot>>;

    /// Insert or update `slot`. Returns the slot as stored, with its new
    /// version.
    fn upsert(&self, slot: &ShiftSlot, guard: WriteGuard) -> StaffResult<ShiftSlot>;

    /// Insert `slot` unless a slot with the same id or the same
    /// date/role/window/index already exists. Returns whether it was inserted.
    fn insert_if_absent(&self, slot: &ShiftSlot) -> StaffResult<bool>;

    /// Delete every slot for `date`. Returns the number removed.
    fn reset(&self, date: NaiveDate) -> StaffResult<usize>;

    /// Employees already holding a slot on `date`.
    fn booked_employee_ids(&self, date: NaiveDate) -> StaffResult<HashSet<EmployeeId>> {
        Ok(self
            .list(date)?
            .into_iter()
            .filter_map(|s| s.employee_id)
            .collect())
    }
}

pub trait EventSink {
    fn append_event(&self, entry: &EventLogEntry) -> StaffResult<()>;
}
