//! Assignment resolver: pairs available employees with shift slots.
//!
//! Single greedy pass, no backtracking:
//!   1. Index active employees by role, in directory order.
//!   2. Exclude everyone already holding a slot that date.
//!   3. For each (role, window) requirement, take the deficit
//!      (required − already filled), that many open slots in slot-index
//!      order and that many eligible employees, and pair them positionally.
//!   4. Each pairing takes the window's default start/end times.
//!
//! Strategies differ only in what happens when there are fewer open
//! slots than the deficit: FillOpenSlotsOnly leaves the gap reported as
//! unfilled, CreateSlotIfAbsent inserts the missing slots first.
//!
//! Writes are attempted one pairing at a time. A failed write becomes a
//! Skipped outcome and the pass carries on; nothing is rolled back.

use crate::{
    config::ShiftWindow,
    error::{StaffError, StaffResult},
    repository::{ShiftStore, WriteGuard},
    roster::{Employee, ShiftSlot},
    staffing_requirement::StaffingRequirements,
    types::{EmployeeId, RoleName, SlotId, WindowKey},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategy {
    /// Batch auto-assign: only existing open slots are filled.
    #[default]
    FillOpenSlotsOnly,
    /// Interactive assign: a missing slot is inserted on demand.
    CreateSlotIfAbsent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pairing {
    pub slot_id:      SlotId,
    pub employee_id:  EmployeeId,
    pub role:         RoleName,
    pub shift_window: WindowKey,
    pub slot_index:   u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The target slot does not exist and the strategy may not create it.
    SlotMissing,
    /// The employee already holds another slot that date.
    AlreadyBooked,
    /// Someone else wrote the slot between read and write.
    VersionConflict,
    Persistence { message: String },
}

impl SkipReason {
    fn from_error(err: &StaffError) -> Self {
        match err {
            StaffError::VersionConflict { .. } => Self::VersionConflict,
            StaffError::AlreadyBooked { .. }   => Self::AlreadyBooked,
            other => Self::Persistence { message: other.to_string() },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairingOutcome {
    Assigned,
    Skipped { reason: SkipReason },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairingResult {
    pub pairing: Pairing,
    pub outcome: PairingOutcome,
}

impl PairingResult {
    pub fn is_assigned(&self) -> bool {
        self.outcome == PairingOutcome::Assigned
    }
}

/// Demand this pass could not cover.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnfilledDemand {
    pub role:               RoleName,
    pub shift_window:       WindowKey,
    pub missing:            u32,
    pub open_slots:         usize,
    pub eligible_employees: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignmentReport {
    pub date:          NaiveDate,
    pub strategy:      AssignmentStrategy,
    /// Seats this pass set out to fill (sum of per-window deficits).
    pub requested:     u32,
    pub slots_created: u32,
    pub outcomes:      Vec<PairingResult>,
    pub unfilled:      Vec<UnfilledDemand>,
}

impl AssignmentReport {
    pub fn assigned_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_assigned()).count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &PairingResult> {
        self.outcomes.iter().filter(|o| !o.is_assigned())
    }

    /// "N of M shifts assigned".
    pub fn summary_line(&self) -> String {
        format!("{} of {} shifts assigned", self.assigned_count(), self.requested)
    }
}

/// One pairing waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPairing {
    /// The slot as it should be stored: employee and window times set.
    pub slot:   ShiftSlot,
    /// The slot does not exist yet and must be inserted first.
    pub create: bool,
}

impl PlannedPairing {
    fn pairing(&self) -> Pairing {
        Pairing {
            slot_id:      self.slot.slot_id.clone(),
            employee_id:  self.slot.employee_id.clone().unwrap_or_default(),
            role:         self.slot.role.clone(),
            shift_window: self.slot.shift_window.clone(),
            slot_index:   self.slot.slot_index,
        }
    }
}

/// The pure half of a resolver pass, computed from a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentPlan {
    pub date:      NaiveDate,
    pub strategy:  AssignmentStrategy,
    pub requested: u32,
    pub pairings:  Vec<PlannedPairing>,
    pub unfilled:  Vec<UnfilledDemand>,
}

/// Interactive request: put this employee on this exact seat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignmentRequest {
    pub date:         NaiveDate,
    pub role:         RoleName,
    pub shift_window: WindowKey,
    pub slot_index:   u32,
    pub employee_id:  EmployeeId,
}

pub struct AssignmentResolver {
    windows: Vec<ShiftWindow>,
    guard:   WriteGuard,
}

impl AssignmentResolver {
    pub fn new(windows: Vec<ShiftWindow>, guard: WriteGuard) -> Self {
        Self { windows, guard }
    }

    fn window(&self, key: &str) -> Option<&ShiftWindow> {
        self.windows.iter().find(|w| w.key == key)
    }

    /// Compute pairings from a snapshot of employees and slots.
    /// Never touches storage.
    pub fn plan(
        &self,
        date:         NaiveDate,
        requirements: &StaffingRequirements,
        employees:    &[Employee],
        slots:        &[ShiftSlot],
        strategy:     AssignmentStrategy,
    ) -> AssignmentPlan {
        let day_slots: Vec<&ShiftSlot> = slots.iter().filter(|s| s.date == date).collect();

        // 1. Active employees by role, directory order preserved.
        let mut by_role: HashMap<&str, Vec<&Employee>> = HashMap::new();
        for e in employees.iter().filter(|e| e.active) {
            by_role.entry(e.role.as_str()).or_default().push(e);
        }

        // 2. Exclusion set.
        let mut booked: HashSet<EmployeeId> = day_slots
            .iter()
            .filter_map(|s| s.employee_id.clone())
            .collect();

        let mut requested = 0u32;
        let mut pairings = Vec::new();
        let mut unfilled = Vec::new();

        // 3. Requirements in catalog order.
        for req in &requirements.windows {
            let mut matching: Vec<&ShiftSlot> = day_slots
                .iter()
                .copied()
                .filter(|s| s.is_for(&req.role, &req.shift_window))
                .collect();
            matching.sort_by_key(|s| s.slot_index);

            let filled = matching.iter().filter(|s| !s.is_open()).count() as u32;
            let deficit = req.required.saturating_sub(filled);
            if deficit == 0 {
                continue;
            }
            requested += deficit;

            let window = match self.window(&req.shift_window) {
                Some(w) => w,
                None => {
                    log::warn!(
                        "date={date} {}/{}: unknown shift window, {deficit} seat(s) left open",
                        req.role,
                        req.shift_window
                    );
                    unfilled.push(UnfilledDemand {
                        role:               req.role.clone(),
                        shift_window:       req.shift_window.clone(),
                        missing:            deficit,
                        open_slots:         0,
                        eligible_employees: 0,
                    });
                    continue;
                }
            };

            let mut targets: Vec<(ShiftSlot, bool)> = matching
                .iter()
                .filter(|s| s.is_open())
                .take(deficit as usize)
                .map(|s| ((*s).clone(), false))
                .collect();
            let open_slots = targets.len();

            if strategy == AssignmentStrategy::CreateSlotIfAbsent {
                let mut next_index = matching.iter().map(|s| s.slot_index + 1).max().unwrap_or(0);
                while targets.len() < deficit as usize {
                    targets.push((ShiftSlot::open(date, &req.role, window, next_index), true));
                    next_index += 1;
                }
            }

            let candidates: Vec<&Employee> = by_role
                .get(req.role.as_str())
                .map(|list| {
                    list.iter()
                        .copied()
                        .filter(|e| !booked.contains(&e.employee_id))
                        .take(deficit as usize)
                        .collect()
                })
                .unwrap_or_default();
            let eligible = candidates.len();

            // 4. Positional pairing.
            let mut paired = 0u32;
            for ((mut slot, create), employee) in targets.into_iter().zip(candidates) {
                booked.insert(employee.employee_id.clone());
                slot.employee_id = Some(employee.employee_id.clone());
                slot.start_time = window.start_time.clone();
                slot.end_time = window.end_time.clone();
                pairings.push(PlannedPairing { slot, create });
                paired += 1;
            }

            if paired < deficit {
                log::debug!(
                    "date={date} {}/{}: {} of {deficit} seat(s) unresolved (open={open_slots}, eligible={eligible})",
                    req.role,
                    req.shift_window,
                    deficit - paired
                );
                unfilled.push(UnfilledDemand {
                    role:               req.role.clone(),
                    shift_window:       req.shift_window.clone(),
                    missing:            deficit - paired,
                    open_slots,
                    eligible_employees: eligible,
                });
            }
        }

        AssignmentPlan { date, strategy, requested, pairings, unfilled }
    }

    /// Write a plan, one pairing at a time.
    pub fn apply<S: ShiftStore + ?Sized>(&self, plan: AssignmentPlan, store: &S) -> AssignmentReport {
        let mut outcomes = Vec::with_capacity(plan.pairings.len());
        let mut slots_created = 0u32;

        for planned in plan.pairings {
            let pairing = planned.pairing();
            let outcome = match self.write(&planned, store) {
                Ok(created) => {
                    if created {
                        slots_created += 1;
                    }
                    log::debug!(
                        "date={} assigned {} to {}/{}#{}",
                        plan.date,
                        pairing.employee_id,
                        pairing.role,
                        pairing.shift_window,
                        pairing.slot_index
                    );
                    PairingOutcome::Assigned
                }
                Err(reason) => {
                    log::warn!(
                        "date={} skipped {} on slot {}: {reason:?}",
                        plan.date,
                        pairing.employee_id,
                        pairing.slot_id
                    );
                    PairingOutcome::Skipped { reason }
                }
            };
            outcomes.push(PairingResult { pairing, outcome });
        }

        AssignmentReport {
            date: plan.date,
            strategy: plan.strategy,
            requested: plan.requested,
            slots_created,
            outcomes,
            unfilled: plan.unfilled,
        }
    }

    /// Returns whether a slot had to be inserted first.
    fn write<S: ShiftStore + ?Sized>(
        &self,
        planned: &PlannedPairing,
        store:   &S,
    ) -> Result<bool, SkipReason> {
        if planned.create {
            let mut open = planned.slot.clone();
            open.employee_id = None;
            match store.insert_if_absent(&open) {
                Ok(true) => {}
                // Another writer took this index first.
                Ok(false) => return Err(SkipReason::VersionConflict),
                Err(e) => return Err(SkipReason::from_error(&e)),
            }
        }
        store
            .upsert(&planned.slot, self.guard)
            .map(|_| planned.create)
            .map_err(|e| SkipReason::from_error(&e))
    }

    /// Snapshot the store, plan, and write.
    pub fn resolve<S: ShiftStore + ?Sized>(
        &self,
        date:         NaiveDate,
        requirements: &StaffingRequirements,
        employees:    &[Employee],
        store:        &S,
        strategy:     AssignmentStrategy,
    ) -> StaffResult<AssignmentReport> {
        let slots = store.list(date)?;
        let plan = self.plan(date, requirements, employees, &slots, strategy);
        let report = self.apply(plan, store);
        log::info!(
            "date={date} {:?}: {} ({} slot(s) created, {} unfilled window(s))",
            strategy,
            report.summary_line(),
            report.slots_created,
            report.unfilled.len()
        );
        Ok(report)
    }

    /// Interactive single assignment. Replaces whoever held the seat.
    ///
    /// Fails fast only on a request that cannot be interpreted: an unknown
    /// window or an employee missing from the directory. Everything else
    /// comes back as an outcome.
    pub fn assign_one<S: ShiftStore + ?Sized>(
        &self,
        request:   &AssignmentRequest,
        employees: &[Employee],
        store:     &S,
        strategy:  AssignmentStrategy,
    ) -> StaffResult<PairingResult> {
        let date = request.date;
        let window = self.window(&request.shift_window).ok_or_else(|| StaffError::InvalidInput {
            reason: format!("unknown shift window '{}'", request.shift_window),
        })?;
        let employee = employees
            .iter()
            .find(|e| e.employee_id == request.employee_id)
            .ok_or_else(|| StaffError::InvalidInput {
                reason: format!("employee '{}' is not in the directory", request.employee_id),
            })?;
        if employee.role != request.role {
            log::warn!(
                "date={date} {} ({}) placed on a {} slot",
                employee.employee_id,
                employee.role,
                request.role
            );
        }

        let slots = store.list(date)?;
        let existing = slots.iter().find(|s| {
            s.is_for(&request.role, &request.shift_window) && s.slot_index == request.slot_index
        });

        let mut pairing = Pairing {
            slot_id:      existing.map(|s| s.slot_id.clone()).unwrap_or_default(),
            employee_id:  request.employee_id.clone(),
            role:         request.role.clone(),
            shift_window: request.shift_window.clone(),
            slot_index:   request.slot_index,
        };

        if let Some(slot) = existing {
            if slot.employee_id.as_deref() == Some(request.employee_id.as_str()) {
                return Ok(PairingResult { pairing, outcome: PairingOutcome::Assigned });
            }
        }

        // The employee is not on the target seat, so any booking is elsewhere.
        if store.booked_employee_ids(date)?.contains(&request.employee_id) {
            log::warn!("date={date} {} already holds a slot", request.employee_id);
            return Ok(PairingResult {
                pairing,
                outcome: PairingOutcome::Skipped { reason: SkipReason::AlreadyBooked },
            });
        }

        let (mut slot, create) = match (existing, strategy) {
            (Some(s), _) => (s.clone(), false),
            (None, AssignmentStrategy::FillOpenSlotsOnly) => {
                return Ok(PairingResult {
                    pairing,
                    outcome: PairingOutcome::Skipped { reason: SkipReason::SlotMissing },
                });
            }
            (None, AssignmentStrategy::CreateSlotIfAbsent) => {
                (ShiftSlot::open(date, &request.role, window, request.slot_index), true)
            }
        };
        slot.employee_id = Some(request.employee_id.clone());
        slot.start_time = window.start_time.clone();
        slot.end_time = window.end_time.clone();
        pairing.slot_id = slot.slot_id.clone();

        let outcome = match self.write(&PlannedPairing { slot, create }, store) {
            Ok(_) => PairingOutcome::Assigned,
            Err(reason) => {
                log::warn!("date={date} interactive assignment skipped: {reason:?}");
                PairingOutcome::Skipped { reason }
            }
        };
        Ok(PairingResult { pairing, outcome })
    }

    /// Clear the employee from a slot. Returns the employee released, if any.
    pub fn release<S: ShiftStore + ?Sized>(
        &self,
        date:    NaiveDate,
        slot_id: &str,
        store:   &S,
    ) -> StaffResult<Option<EmployeeId>> {
        let slot = store
            .list(date)?
            .into_iter()
            .find(|s| s.slot_id == slot_id)
            .ok_or_else(|| StaffError::InvalidInput {
                reason: format!("slot '{slot_id}' not found on {date}"),
            })?;
        let Some(employee_id) = slot.employee_id.clone() else {
            return Ok(None);
        };
        let cleared = ShiftSlot { employee_id: None, ..slot };
        store.upsert(&cleared, self.guard)?;
        Ok(Some(employee_id))
    }
}
