use crate::{
    engine::DemandApplication,
    repository::WriteGuard,
    types::{RoleName, WindowKey},
};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper limit on `history_lookback_days` accepted at load time.
pub const MAX_HISTORY_LOOKBACK_DAYS: i64 = 3650;

// ── Role and shift catalog ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleDefinition {
    pub name: RoleName,
    /// Guests one employee in this role can serve over a day.
    pub guest_to_staff_ratio: f64,
    pub minimum_count: u32,
    /// Windows this role works, in scheduling order.
    pub shift_windows: Vec<WindowKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShiftWindow {
    pub key: WindowKey,
    pub start_time: String,
    pub end_time: String,
    /// Fraction (0.0–1.0) of the day's demand this window serves.
    pub demand_split_percentage: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct RoleCatalogFile {
    roles: Vec<RoleDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
struct ShiftWindowsFile {
    shift_windows: Vec<ShiftWindow>,
}

// ── Demand factors ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FactorBounds {
    pub min: f64,
    pub max: f64,
}

impl FactorBounds {
    /// NaN is read as neutral (1.0) before clamping.
    pub fn clamp(&self, value: f64) -> f64 {
        let value = if value.is_nan() { 1.0 } else { value };
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedHoliday {
    pub name: String,
    pub month: u32,
    pub day: u32,
    pub factor: f64,
}

/// A holiday that moves every year, e.g. "second Sunday of May".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FloatingHoliday {
    pub name: String,
    pub month: u32,
    pub weekday: Weekday,
    /// 1-based occurrence within the month; -1 means the last one.
    pub occurrence: i8,
    pub factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandFactorConfig {
    /// Keyed by full English day name ("Saturday").
    pub weekday: HashMap<String, f64>,
    /// Keyed by full English month name ("July").
    pub seasonal: HashMap<String, f64>,
    /// Keyed by lowercase condition ("rain").
    pub weather: HashMap<String, f64>,
    #[serde(default)]
    pub fixed_holidays: Vec<FixedHoliday>,
    #[serde(default)]
    pub floating_holidays: Vec<FloatingHoliday>,
    pub combined_bounds: FactorBounds,
    pub trend_bounds: FactorBounds,
    /// Days of sales history read before the target date.
    pub history_lookback_days: i64,
}

// ── Labor policy ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaborPolicy {
    /// Labor cost as a percentage of sales above which a day is flagged.
    pub target_percentage: f64,
    /// Hourly rate charged for employees with no recorded rate.
    pub fallback_hourly_rate: f64,
    #[serde(default)]
    pub write_guard: WriteGuard,
    #[serde(default)]
    pub demand_application: DemandApplication,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub roles: Vec<RoleDefinition>,
    pub shift_windows: Vec<ShiftWindow>,
    pub demand: DemandFactorConfig,
    pub labor: LaborPolicy,
}

impl EngineConfig {
    /// Load from the data/ directory.
    /// In tests, use EngineConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let role_path = format!("{data_dir}/roles/role_catalog.json");
        let role_content = std::fs::read_to_string(&role_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {role_path}: {e}"))?;
        let role_file: RoleCatalogFile = serde_json::from_str(&role_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {role_path}: {e}"))?;

        let window_path = format!("{data_dir}/shifts/shift_windows.json");
        let window_content = std::fs::read_to_string(&window_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {window_path}: {e}"))?;
        let window_file: ShiftWindowsFile = serde_json::from_str(&window_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {window_path}: {e}"))?;

        let demand_path = format!("{data_dir}/demand/demand_factors.json");
        let demand_content = std::fs::read_to_string(&demand_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {demand_path}: {e}"))?;
        let demand: DemandFactorConfig = serde_json::from_str(&demand_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {demand_path}: {e}"))?;

        let labor_path = format!("{data_dir}/labor/labor_policy.json");
        let labor_content = std::fs::read_to_string(&labor_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {labor_path}: {e}"))?;
        let labor: LaborPolicy = serde_json::from_str(&labor_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {labor_path}: {e}"))?;

        let config = Self {
            roles: role_file.roles,
            shift_windows: window_file.shift_windows,
            demand,
            labor,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject catalogs the deriver cannot make sense of.
    fn validate(&self) -> anyhow::Result<()> {
        for role in &self.roles {
            if role.guest_to_staff_ratio <= 0.0 {
                anyhow::bail!(
                    "role '{}' has non-positive guest_to_staff_ratio {}",
                    role.name,
                    role.guest_to_staff_ratio
                );
            }
            for key in &role.shift_windows {
                if self.shift_window(key).is_none() {
                    anyhow::bail!("role '{}' references unknown shift window '{key}'", role.name);
                }
            }
        }
        let lookback = self.demand.history_lookback_days;
        if !(0..=MAX_HISTORY_LOOKBACK_DAYS).contains(&lookback) {
            anyhow::bail!(
                "history_lookback_days {lookback} is outside [0, {MAX_HISTORY_LOOKBACK_DAYS}]"
            );
        }
        for window in &self.shift_windows {
            if !(0.0..=1.0).contains(&window.demand_split_percentage) {
                anyhow::bail!(
                    "shift window '{}' split {} is outside [0, 1]",
                    window.key,
                    window.demand_split_percentage
                );
            }
        }
        Ok(())
    }

    pub fn shift_window(&self, key: &str) -> Option<&ShiftWindow> {
        self.shift_windows.iter().find(|w| w.key == key)
    }

    pub fn role(&self, name: &str) -> Option<&RoleDefinition> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let roles = vec![
            RoleDefinition {
                name: "server".into(),
                guest_to_staff_ratio: 20.0,
                minimum_count: 1,
                shift_windows: vec!["AM".into(), "PM".into()],
            },
            RoleDefinition {
                name: "cook".into(),
                guest_to_staff_ratio: 40.0,
                minimum_count: 1,
                shift_windows: vec!["AM".into(), "PM".into()],
            },
            RoleDefinition {
                name: "dishwasher".into(),
                guest_to_staff_ratio: 100.0,
                minimum_count: 1,
                shift_windows: vec!["LATE".into()],
            },
        ];

        let shift_windows = vec![
            ShiftWindow {
                key: "AM".into(),
                start_time: "09:00".into(),
                end_time: "15:00".into(),
                demand_split_percentage: 0.6,
            },
            ShiftWindow {
                key: "PM".into(),
                start_time: "15:00".into(),
                end_time: "23:00".into(),
                demand_split_percentage: 0.4,
            },
            ShiftWindow {
                key: "LATE".into(),
                start_time: "22:00".into(),
                end_time: "02:00".into(),
                demand_split_percentage: 0.2,
            },
        ];

        Self {
            roles,
            shift_windows,
            demand: DemandFactorConfig::standard(),
            labor: LaborPolicy {
                target_percentage: 18.0,
                fallback_hourly_rate: 15.0,
                write_guard: WriteGuard::OptimisticVersion,
                demand_application: DemandApplication::AdjustBeforeDerivation,
            },
        }
    }
}

impl DemandFactorConfig {
    /// The built-in factor tables shipped with data/demand/demand_factors.json.
    pub fn standard() -> Self {
        let weekday = [
            ("Monday", 0.8),
            ("Tuesday", 0.85),
            ("Wednesday", 0.9),
            ("Thursday", 1.0),
            ("Friday", 1.3),
            ("Saturday", 1.4),
            ("Sunday", 1.1),
        ];
        let seasonal = [
            ("January", 0.85),
            ("February", 0.9),
            ("March", 0.95),
            ("April", 1.0),
            ("May", 1.1),
            ("June", 1.3),
            ("July", 1.4),
            ("August", 1.35),
            ("September", 1.1),
            ("October", 1.0),
            ("November", 0.95),
            ("December", 1.2),
        ];
        let weather = [
            ("sunny", 1.0),
            ("clear", 1.0),
            ("cloudy", 0.95),
            ("rain", 0.85),
            ("snow", 0.7),
            ("storm", 0.6),
            ("heatwave", 0.9),
        ];

        Self {
            weekday: weekday.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            seasonal: seasonal.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            weather: weather.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            fixed_holidays: vec![
                FixedHoliday { name: "New Year's Day".into(), month: 1, day: 1, factor: 1.3 },
                FixedHoliday { name: "Valentine's Day".into(), month: 2, day: 14, factor: 1.5 },
                FixedHoliday { name: "Independence Day".into(), month: 7, day: 4, factor: 1.6 },
                FixedHoliday { name: "Halloween".into(), month: 10, day: 31, factor: 1.2 },
                FixedHoliday { name: "Christmas Eve".into(), month: 12, day: 24, factor: 0.8 },
                FixedHoliday { name: "Christmas Day".into(), month: 12, day: 25, factor: 0.3 },
                FixedHoliday { name: "New Year's Eve".into(), month: 12, day: 31, factor: 1.5 },
            ],
            floating_holidays: vec![
                FloatingHoliday {
                    name: "Mother's Day".into(),
                    month: 5,
                    weekday: Weekday::Sun,
                    occurrence: 2,
                    factor: 1.5,
                },
                FloatingHoliday {
                    name: "Memorial Day".into(),
                    month: 5,
                    weekday: Weekday::Mon,
                    occurrence: -1,
                    factor: 1.2,
                },
                FloatingHoliday {
                    name: "Thanksgiving".into(),
                    month: 11,
                    weekday: Weekday::Thu,
                    occurrence: 4,
                    factor: 0.6,
                },
            ],
            combined_bounds: FactorBounds { min: 0.3, max: 2.5 },
            trend_bounds: FactorBounds { min: 0.5, max: 1.5 },
            history_lookback_days: 28,
        }
    }
}
