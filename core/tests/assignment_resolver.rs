//! Assignment against a real in-memory store.
//!
//! Covers the properties the schedule depends on: nobody holds two slots
//! on one date, a rerun adds nothing, and a failed write only costs the
//! one pairing it belonged to.

use chrono::NaiveDate;
use staffing_core::{
    assignment_resolver::{
        AssignmentRequest, AssignmentResolver, AssignmentStrategy, PairingOutcome, SkipReason,
    },
    config::EngineConfig,
    error::{StaffError, StaffResult},
    repository::{EmployeeDirectory, ShiftStore, WriteGuard},
    roster::{Employee, ShiftSlot},
    staffing_requirement::{StaffingRequirementDeriver, StaffingRequirements},
    store::StaffStore,
};
use std::collections::HashSet;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 12).expect("valid date")
}

fn store() -> StaffStore {
    let store = StaffStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn hire(store: &StaffStore, id: &str, role: &str) {
    store
        .insert_employee(&Employee {
            employee_id: id.into(),
            name: format!("Test {id}"),
            role: role.into(),
            hourly_rate: Some(15.0),
            active: true,
        })
        .expect("insert employee");
}

fn resolver(config: &EngineConfig, guard: WriteGuard) -> AssignmentResolver {
    AssignmentResolver::new(config.shift_windows.clone(), guard)
}

fn requirements(config: &EngineConfig, guests: u32) -> StaffingRequirements {
    StaffingRequirementDeriver::from_config(config).derive(date(), guests)
}

/// One open slot per required seat.
fn open_slots(store: &StaffStore, config: &EngineConfig, reqs: &StaffingRequirements) {
    for req in &reqs.windows {
        let window = config.shift_window(&req.shift_window).expect("window");
        for i in 0..req.required {
            store
                .insert_if_absent(&ShiftSlot::open(date(), &req.role, window, i))
                .expect("insert slot");
        }
    }
}

fn assert_no_double_booking(slots: &[ShiftSlot]) {
    let mut seen = HashSet::new();
    for slot in slots {
        if let Some(id) = &slot.employee_id {
            assert!(seen.insert(id.clone()), "{id} holds more than one slot");
        }
    }
}

#[test]
fn batch_fill_never_double_books() {
    init_logging();
    let config = EngineConfig::default_test();
    let store = store();
    // 200 guests → server AM 6 + PM 4, cook AM 3 + PM 2, dishwasher 1
    for n in 0..7 {
        hire(&store, &format!("s{n}"), "server");
    }
    for n in 0..5 {
        hire(&store, &format!("c{n}"), "cook");
    }
    hire(&store, "d0", "dishwasher");

    let reqs = requirements(&config, 200);
    open_slots(&store, &config, &reqs);
    let employees = store.list_active().expect("directory");

    let report = resolver(&config, WriteGuard::OptimisticVersion)
        .resolve(date(), &reqs, &employees, &store, AssignmentStrategy::FillOpenSlotsOnly)
        .expect("resolve");

    // Servers: 6 on AM, the 7th on PM, 3 PM seats uncovered.
    assert_eq!(report.requested, 16);
    assert_eq!(report.assigned_count(), 13);
    assert_eq!(report.summary_line(), "13 of 16 shifts assigned");
    assert_eq!(report.unfilled.len(), 1);
    let gap = &report.unfilled[0];
    assert_eq!((gap.role.as_str(), gap.shift_window.as_str()), ("server", "PM"));
    assert_eq!(gap.missing, 3);
    assert_eq!(gap.eligible_employees, 1);

    let slots = store.list(date()).expect("list");
    assert_no_double_booking(&slots);
    assert_eq!(store.assigned_slot_count(date()).expect("count"), 13);
}

#[test]
fn second_run_assigns_nothing_new() {
    init_logging();
    let config = EngineConfig::default_test();
    let store = store();
    for n in 0..12 {
        hire(&store, &format!("s{n}"), "server");
    }
    for n in 0..6 {
        hire(&store, &format!("c{n}"), "cook");
    }
    hire(&store, "d0", "dishwasher");

    let reqs = requirements(&config, 200);
    open_slots(&store, &config, &reqs);
    let employees = store.list_active().expect("directory");
    let r = resolver(&config, WriteGuard::OptimisticVersion);

    let first = r
        .resolve(date(), &reqs, &employees, &store, AssignmentStrategy::FillOpenSlotsOnly)
        .expect("first run");
    assert_eq!(first.assigned_count(), 16);
    assert!(first.unfilled.is_empty());
    let after_first = store.list(date()).expect("list");

    let second = r
        .resolve(date(), &reqs, &employees, &store, AssignmentStrategy::FillOpenSlotsOnly)
        .expect("second run");
    assert_eq!(second.requested, 0);
    assert_eq!(second.assigned_count(), 0);
    assert!(second.outcomes.is_empty());
    assert_eq!(store.list(date()).expect("list"), after_first);
}

#[test]
fn fill_only_reports_missing_slots_instead_of_creating() {
    init_logging();
    let config = EngineConfig::default_test();
    let store = store();
    for n in 0..4 {
        hire(&store, &format!("s{n}"), "server");
    }
    // Only two server AM slots exist; 200 guests want six.
    let am = config.shift_window("AM").expect("AM");
    for i in 0..2 {
        store.insert_if_absent(&ShiftSlot::open(date(), "server", am, i)).expect("slot");
    }

    let mut reqs = requirements(&config, 200);
    reqs.windows.retain(|w| w.role == "server" && w.shift_window == "AM");
    let employees = store.list_active().expect("directory");

    let report = resolver(&config, WriteGuard::OptimisticVersion)
        .resolve(date(), &reqs, &employees, &store, AssignmentStrategy::FillOpenSlotsOnly)
        .expect("resolve");

    assert_eq!(report.assigned_count(), 2);
    assert_eq!(report.slots_created, 0);
    assert_eq!(report.unfilled[0].missing, 4);
    assert_eq!(report.unfilled[0].open_slots, 2);
    assert_eq!(store.list(date()).expect("list").len(), 2);
}

#[test]
fn create_if_absent_adds_slots_after_the_highest_index() {
    init_logging();
    let config = EngineConfig::default_test();
    let store = store();
    for n in 0..6 {
        hire(&store, &format!("s{n}"), "server");
    }
    let am = config.shift_window("AM").expect("AM");
    for i in 0..2 {
        store.insert_if_absent(&ShiftSlot::open(date(), "server", am, i)).expect("slot");
    }

    let mut reqs = requirements(&config, 200);
    reqs.windows.retain(|w| w.role == "server" && w.shift_window == "AM");
    let employees = store.list_active().expect("directory");

    let report = resolver(&config, WriteGuard::OptimisticVersion)
        .resolve(date(), &reqs, &employees, &store, AssignmentStrategy::CreateSlotIfAbsent)
        .expect("resolve");

    assert_eq!(report.assigned_count(), 6);
    assert_eq!(report.slots_created, 4);
    assert!(report.unfilled.is_empty());

    let slots = store.list(date()).expect("list");
    let indexes: Vec<u32> = slots.iter().map(|s| s.slot_index).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3, 4, 5]);
    assert!(slots.iter().all(|s| !s.is_open()));
    assert_no_double_booking(&slots);
}

#[test]
fn employees_are_taken_in_directory_order() {
    let config = EngineConfig::default_test();
    let store = store();
    for id in ["s-zed", "s-amy", "s-mo"] {
        hire(&store, id, "server");
    }
    store.set_employee_active("s-amy", false).expect("deactivate");
    let am = config.shift_window("AM").expect("AM");
    for i in 0..2 {
        store.insert_if_absent(&ShiftSlot::open(date(), "server", am, i)).expect("slot");
    }

    let mut reqs = requirements(&config, 40);
    reqs.windows.retain(|w| w.role == "server" && w.shift_window == "AM");
    // ceil(40 / 20) = 2, round(2 × 0.6) = 1 → force two seats
    reqs.windows[0].required = 2;
    let employees = store.list_active().expect("directory");

    let report = resolver(&config, WriteGuard::OptimisticVersion)
        .resolve(date(), &reqs, &employees, &store, AssignmentStrategy::FillOpenSlotsOnly)
        .expect("resolve");

    let order: Vec<(&str, u32)> = report
        .outcomes
        .iter()
        .map(|o| (o.pairing.employee_id.as_str(), o.pairing.slot_index))
        .collect();
    assert_eq!(order, vec![("s-zed", 0), ("s-mo", 1)]);
}

#[test]
fn assigned_slot_takes_window_default_times() {
    let config = EngineConfig::default_test();
    let store = store();
    hire(&store, "s0", "server");
    let am = config.shift_window("AM").expect("AM");
    let slot = ShiftSlot::open(date(), "server", am, 0);
    store.insert_if_absent(&slot).expect("slot");
    store.set_slot_times(&slot.slot_id, "10:30", "13:00").expect("edit times");

    let mut reqs = requirements(&config, 20);
    reqs.windows.retain(|w| w.role == "server" && w.shift_window == "AM");
    let employees = store.list_active().expect("directory");
    resolver(&config, WriteGuard::OptimisticVersion)
        .resolve(date(), &reqs, &employees, &store, AssignmentStrategy::FillOpenSlotsOnly)
        .expect("resolve");

    let stored = store.slot_by_id(&slot.slot_id).expect("query").expect("slot exists");
    assert_eq!(stored.employee_id.as_deref(), Some("s0"));
    assert_eq!(stored.start_time, "09:00");
    assert_eq!(stored.end_time, "15:00");
}

#[test]
fn stale_plan_is_rejected_by_version_guard() {
    init_logging();
    let config = EngineConfig::default_test();
    let store = store();
    for n in 0..3 {
        hire(&store, &format!("s{n}"), "server");
    }
    let am = config.shift_window("AM").expect("AM");
    for i in 0..3 {
        store.insert_if_absent(&ShiftSlot::open(date(), "server", am, i)).expect("slot");
    }
    let mut reqs = requirements(&config, 200);
    reqs.windows.retain(|w| w.role == "server" && w.shift_window == "AM");
    reqs.windows[0].required = 3;
    let employees = store.list_active().expect("directory");

    let r = resolver(&config, WriteGuard::OptimisticVersion);
    let snapshot = store.list(date()).expect("list");
    let stale = r.plan(date(), &reqs, &employees, &snapshot, AssignmentStrategy::FillOpenSlotsOnly);

    // Another writer fills the same seats first.
    let winner = r
        .resolve(date(), &reqs, &employees, &store, AssignmentStrategy::FillOpenSlotsOnly)
        .expect("concurrent run");
    assert_eq!(winner.assigned_count(), 3);

    let loser = r.apply(stale, &store);
    assert_eq!(loser.assigned_count(), 0);
    assert!(loser
        .outcomes
        .iter()
        .all(|o| o.outcome == PairingOutcome::Skipped { reason: SkipReason::VersionConflict }));
    assert_no_double_booking(&store.list(date()).expect("list"));
}

#[test]
fn unguarded_writes_overwrite_stale_versions() {
    let config = EngineConfig::default_test();
    let store = store();
    hire(&store, "s0", "server");
    let am = config.shift_window("AM").expect("AM");
    let slot = ShiftSlot::open(date(), "server", am, 0);
    store.insert_if_absent(&slot).expect("slot");
    store.set_slot_times(&slot.slot_id, "09:30", "15:00").expect("bump version");

    let mut reqs = requirements(&config, 20);
    reqs.windows.retain(|w| w.role == "server" && w.shift_window == "AM");
    let employees = store.list_active().expect("directory");

    // The plan is built from the pre-edit slot; version 0 is stale.
    let r = resolver(&config, WriteGuard::Unguarded);
    let plan = r.plan(date(), &reqs, &employees, &[slot.clone()], AssignmentStrategy::FillOpenSlotsOnly);
    let report = r.apply(plan, &store);

    assert_eq!(report.assigned_count(), 1);
    let stored = store.slot_by_id(&slot.slot_id).expect("query").expect("slot exists");
    assert_eq!(stored.employee_id.as_deref(), Some("s0"));
    assert_eq!(stored.version, 2);
}

#[test]
fn guard_refuses_booking_made_elsewhere_after_planning() {
    let config = EngineConfig::default_test();
    let store = store();
    hire(&store, "s0", "server");
    let am = config.shift_window("AM").expect("AM");
    let pm = config.shift_window("PM").expect("PM");
    store.insert_if_absent(&ShiftSlot::open(date(), "server", am, 0)).expect("slot");

    let mut reqs = requirements(&config, 20);
    reqs.windows.retain(|w| w.role == "server" && w.shift_window == "AM");
    let employees = store.list_active().expect("directory");
    let r = resolver(&config, WriteGuard::OptimisticVersion);
    let plan = r.plan(
        date(),
        &reqs,
        &employees,
        &store.list(date()).expect("list"),
        AssignmentStrategy::FillOpenSlotsOnly,
    );

    // s0 is booked onto PM by someone else before the plan lands.
    let mut elsewhere = ShiftSlot::open(date(), "server", pm, 0);
    elsewhere.employee_id = Some("s0".into());
    store.upsert(&elsewhere, WriteGuard::Unguarded).expect("external booking");

    let report = r.apply(plan, &store);
    assert_eq!(
        report.outcomes[0].outcome,
        PairingOutcome::Skipped { reason: SkipReason::AlreadyBooked }
    );
    assert_no_double_booking(&store.list(date()).expect("list"));
}

/// Fails every write that would put an employee on a given slot index.
struct FlakyStore {
    inner:      StaffStore,
    fail_index: u32,
}

impl ShiftStore for FlakyStore {
    fn list(&self, date: NaiveDate) -> StaffResult<Vec<ShiftSlot>> {
        self.inner.list(date)
    }

    fn upsert(&self, slot: &ShiftSlot, guard: WriteGuard) -> StaffResult<ShiftSlot> {
        if slot.slot_index == self.fail_index && slot.employee_id.is_some() {
            return Err(StaffError::Other(anyhow::anyhow!("disk I/O error")));
        }
        self.inner.upsert(slot, guard)
    }

    fn insert_if_absent(&self, slot: &ShiftSlot) -> StaffResult<bool> {
        self.inner.insert_if_absent(slot)
    }

    fn reset(&self, date: NaiveDate) -> StaffResult<usize> {
        self.inner.reset(date)
    }
}

#[test]
fn failed_write_skips_one_pairing_and_continues() {
    init_logging();
    let config = EngineConfig::default_test();
    let inner = store();
    for n in 0..4 {
        hire(&inner, &format!("s{n}"), "server");
    }
    let am = config.shift_window("AM").expect("AM");
    for i in 0..4 {
        inner.insert_if_absent(&ShiftSlot::open(date(), "server", am, i)).expect("slot");
    }
    let employees = inner.list_active().expect("directory");
    let flaky = FlakyStore { inner, fail_index: 1 };

    let mut reqs = requirements(&config, 200);
    reqs.windows.retain(|w| w.role == "server" && w.shift_window == "AM");
    reqs.windows[0].required = 4;

    let report = resolver(&config, WriteGuard::OptimisticVersion)
        .resolve(date(), &reqs, &employees, &flaky, AssignmentStrategy::FillOpenSlotsOnly)
        .expect("partial failure is not an error");

    assert_eq!(report.assigned_count(), 3);
    let skipped: Vec<_> = report.skipped().collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].pairing.slot_index, 1);
    assert!(matches!(
        &skipped[0].outcome,
        PairingOutcome::Skipped { reason: SkipReason::Persistence { message } } if message.contains("disk")
    ));
    assert_eq!(flaky.inner.assigned_slot_count(date()).expect("count"), 3);
}

// ── Interactive assignment ─────────────────────────────────────────

fn request(role: &str, window: &str, index: u32, employee_id: &str) -> AssignmentRequest {
    AssignmentRequest {
        date: date(),
        role: role.into(),
        shift_window: window.into(),
        slot_index: index,
        employee_id: employee_id.into(),
    }
}

#[test]
fn assign_one_respects_strategy_for_missing_slot() {
    let config = EngineConfig::default_test();
    let store = store();
    hire(&store, "s0", "server");
    let employees = store.list_active().expect("directory");
    let r = resolver(&config, WriteGuard::OptimisticVersion);

    let fill = r
        .assign_one(&request("server", "PM", 0, "s0"), &employees, &store, AssignmentStrategy::FillOpenSlotsOnly)
        .expect("assign");
    assert_eq!(fill.outcome, PairingOutcome::Skipped { reason: SkipReason::SlotMissing });
    assert!(store.list(date()).expect("list").is_empty());

    let create = r
        .assign_one(&request("server", "PM", 0, "s0"), &employees, &store, AssignmentStrategy::CreateSlotIfAbsent)
        .expect("assign");
    assert!(create.is_assigned());
    let slots = store.list(date()).expect("list");
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].employee_id.as_deref(), Some("s0"));
    assert_eq!((slots[0].start_time.as_str(), slots[0].end_time.as_str()), ("15:00", "23:00"));
}

#[test]
fn assign_one_replaces_holder_and_refuses_double_booking() {
    let config = EngineConfig::default_test();
    let store = store();
    for id in ["s0", "s1"] {
        hire(&store, id, "server");
    }
    let employees = store.list_active().expect("directory");
    let r = resolver(&config, WriteGuard::OptimisticVersion);
    let create = AssignmentStrategy::CreateSlotIfAbsent;

    assert!(r.assign_one(&request("server", "AM", 0, "s0"), &employees, &store, create).expect("assign").is_assigned());
    // Same request again is a no-op success.
    assert!(r.assign_one(&request("server", "AM", 0, "s0"), &employees, &store, create).expect("assign").is_assigned());

    // s0 cannot also take PM.
    let clash = r
        .assign_one(&request("server", "PM", 0, "s0"), &employees, &store, create)
        .expect("assign");
    assert_eq!(clash.outcome, PairingOutcome::Skipped { reason: SkipReason::AlreadyBooked });

    // s1 replaces s0 on AM#0.
    assert!(r.assign_one(&request("server", "AM", 0, "s1"), &employees, &store, create).expect("assign").is_assigned());
    let slots = store.list(date()).expect("list");
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].employee_id.as_deref(), Some("s1"));
}

#[test]
fn assign_one_rejects_uninterpretable_requests() {
    let config = EngineConfig::default_test();
    let store = store();
    hire(&store, "s0", "server");
    let employees = store.list_active().expect("directory");
    let r = resolver(&config, WriteGuard::OptimisticVersion);

    let unknown_window = r.assign_one(
        &request("server", "BRUNCH", 0, "s0"),
        &employees,
        &store,
        AssignmentStrategy::CreateSlotIfAbsent,
    );
    assert!(matches!(unknown_window, Err(StaffError::InvalidInput { .. })));

    let unknown_employee = r.assign_one(
        &request("server", "AM", 0, "ghost"),
        &employees,
        &store,
        AssignmentStrategy::CreateSlotIfAbsent,
    );
    assert!(matches!(unknown_employee, Err(StaffError::InvalidInput { .. })));
}

#[test]
fn release_clears_the_slot_once() {
    let config = EngineConfig::default_test();
    let store = store();
    hire(&store, "s0", "server");
    let employees = store.list_active().expect("directory");
    let r = resolver(&config, WriteGuard::OptimisticVersion);
    r.assign_one(&request("server", "AM", 0, "s0"), &employees, &store, AssignmentStrategy::CreateSlotIfAbsent)
        .expect("assign");
    let slot_id = store.list(date()).expect("list")[0].slot_id.clone();

    assert_eq!(r.release(date(), &slot_id, &store).expect("release"), Some("s0".to_string()));
    assert_eq!(r.release(date(), &slot_id, &store).expect("release"), None);
    assert!(store.list(date()).expect("list")[0].is_open());

    let missing = r.release(date(), "no-such-slot", &store);
    assert!(matches!(missing, Err(StaffError::InvalidInput { .. })));
}
