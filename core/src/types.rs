//! Shared primitive types used across the staffing engine.

/// A stable, unique identifier for an employee.
pub type EmployeeId = String;

/// A stable, unique identifier for a shift slot.
pub type SlotId = String;

/// Role name as configured in the role catalog ("server", "cook", ...).
pub type RoleName = String;

/// Shift window key as configured in the window catalog ("AM", "PM", ...).
pub type WindowKey = String;

/// ISO date format used for every persisted date column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
