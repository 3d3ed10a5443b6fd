//! Audit log of everything the engine decided and wrote.
//!
//! Every pipeline step records a StaffingEvent; the store persists it as
//! tagged JSON so a day's plan can be reconstructed after the fact.

use crate::{
    assignment_resolver::{AssignmentStrategy, SkipReason},
    demand_adjustment::FactorBreakdown,
    error::StaffResult,
    types::{EmployeeId, RoleName, SlotId, WindowKey},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StaffingEvent {
    DemandAdjusted {
        date:      NaiveDate,
        factor:    f64,
        breakdown: FactorBreakdown,
        holiday:   Option<String>,
    },
    ScheduleInitialized {
        date:          NaiveDate,
        slots_created: u32,
    },
    ShiftAssigned {
        date:         NaiveDate,
        slot_id:      SlotId,
        employee_id:  EmployeeId,
        role:         RoleName,
        shift_window: WindowKey,
        strategy:     AssignmentStrategy,
    },
    AssignmentSkipped {
        date:        NaiveDate,
        slot_id:     SlotId,
        employee_id: EmployeeId,
        reason:      SkipReason,
    },
    DemandUnfilled {
        date:         NaiveDate,
        role:         RoleName,
        shift_window: WindowKey,
        missing:      u32,
    },
    SlotReleased {
        date:        NaiveDate,
        slot_id:     SlotId,
        employee_id: EmployeeId,
    },
    LaborEvaluated {
        date:                NaiveDate,
        total_hours:         f64,
        total_cost:          f64,
        percentage_of_sales: f64,
        over_target:         bool,
    },
    ScheduleReset {
        date:          NaiveDate,
        slots_removed: usize,
    },
}

impl StaffingEvent {
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DemandAdjusted { date, .. }
            | Self::ScheduleInitialized { date, .. }
            | Self::ShiftAssigned { date, .. }
            | Self::AssignmentSkipped { date, .. }
            | Self::DemandUnfilled { date, .. }
            | Self::SlotReleased { date, .. }
            | Self::LaborEvaluated { date, .. }
            | Self::ScheduleReset { date, .. } => *date,
        }
    }

    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::DemandAdjusted { .. }      => "demand_adjusted",
            Self::ScheduleInitialized { .. } => "schedule_initialized",
            Self::ShiftAssigned { .. }       => "shift_assigned",
            Self::AssignmentSkipped { .. }   => "assignment_skipped",
            Self::DemandUnfilled { .. }      => "demand_unfilled",
            Self::SlotReleased { .. }        => "slot_released",
            Self::LaborEvaluated { .. }      => "labor_evaluated",
            Self::ScheduleReset { .. }       => "schedule_reset",
        }
    }

    pub fn to_entry(&self) -> StaffResult<EventLogEntry> {
        Ok(EventLogEntry {
            id:         None,
            date:       self.date(),
            event_type: self.type_name().to_string(),
            payload:    serde_json::to_string(self)?,
        })
    }
}

/// A persisted event as stored in event_log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub date:       NaiveDate,
    pub event_type: String,
    pub payload:    String,
}

impl EventLogEntry {
    pub fn decode(&self) -> StaffResult<StaffingEvent> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}
