//! Demand-adjusted staffing and assignment engine.
//!
//! Forecast → demand factor → headcount per role and shift window →
//! greedy assignment of staff to slots → labor cost against a sales target.

pub mod assignment_resolver;
pub mod config;
pub mod demand_adjustment;
pub mod engine;
pub mod error;
pub mod event;
pub mod holiday_calendar;
pub mod labor_cost;
pub mod repository;
pub mod rng;
pub mod roster;
pub mod roster_generator;
pub mod staffing_requirement;
pub mod store;
pub mod types;
