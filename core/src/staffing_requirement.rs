//! Staffing requirement derivation.
//!
//! required_for_day    = ceil(guests / guest_to_staff_ratio)
//! required_for_window = max(minimum_count, round(required_for_day × split))
//!
//! The guest count handed in is whatever the caller decided to plan
//! against; whether it was scaled by the demand factor first is decided
//! once, in the engine pipeline.

use crate::{
    config::{EngineConfig, RoleDefinition, ShiftWindow},
    types::{RoleName, WindowKey},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowRequirement {
    pub role:         RoleName,
    pub shift_window: WindowKey,
    pub required:     u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleDemand {
    pub role:             RoleName,
    pub required_for_day: u32,
}

/// Required headcount for one date, in catalog order (role, then window).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffingRequirements {
    pub date:    NaiveDate,
    pub guests:  u32,
    pub roles:   Vec<RoleDemand>,
    pub windows: Vec<WindowRequirement>,
}

impl StaffingRequirements {
    pub fn required(&self, role: &str, window: &str) -> Option<u32> {
        self.windows
            .iter()
            .find(|w| w.role == role && w.shift_window == window)
            .map(|w| w.required)
    }

    pub fn total(&self) -> u32 {
        self.windows.iter().map(|w| w.required).sum()
    }
}

/// ceil(guests / ratio); zero for a non-positive ratio.
pub fn required_staff_for_day(guests: u32, ratio: f64) -> u32 {
    if ratio <= 0.0 {
        return 0;
    }
    (guests as f64 / ratio).ceil() as u32
}

pub struct StaffingRequirementDeriver {
    roles:   Vec<RoleDefinition>,
    windows: Vec<ShiftWindow>,
}

impl StaffingRequirementDeriver {
    pub fn new(roles: Vec<RoleDefinition>, windows: Vec<ShiftWindow>) -> Self {
        Self { roles, windows }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.roles.clone(), config.shift_windows.clone())
    }

    pub fn derive(&self, date: NaiveDate, guests: u32) -> StaffingRequirements {
        let mut roles = Vec::with_capacity(self.roles.len());
        let mut windows = Vec::new();

        for role in &self.roles {
            if role.guest_to_staff_ratio <= 0.0 {
                log::warn!(
                    "date={date} role '{}' has ratio {}; staffing minimum only",
                    role.name,
                    role.guest_to_staff_ratio
                );
            }
            let for_day = required_staff_for_day(guests, role.guest_to_staff_ratio);
            roles.push(RoleDemand { role: role.name.clone(), required_for_day: for_day });

            for key in &role.shift_windows {
                let split = match self.windows.iter().find(|w| &w.key == key) {
                    Some(w) => w.demand_split_percentage,
                    None => {
                        log::warn!(
                            "date={date} role '{}' lists unknown window '{key}'; staffing minimum only",
                            role.name
                        );
                        0.0
                    }
                };
                let derived = (for_day as f64 * split).round() as u32;
                let required = derived.max(role.minimum_count);
                if derived < role.minimum_count {
                    log::debug!(
                        "date={date} {}/{key}: derived {derived} raised to minimum {}",
                        role.name,
                        role.minimum_count
                    );
                }
                windows.push(WindowRequirement {
                    role:         role.name.clone(),
                    shift_window: key.clone(),
                    required,
                });
            }
        }

        StaffingRequirements { date, guests, roles, windows }
    }
}
