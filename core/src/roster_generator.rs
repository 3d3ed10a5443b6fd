//! Deterministic demo roster and forecast generation.
//!
//! Lets the runner exercise the full pipeline without a real directory
//! or forecast feed. Same seed = same employees, same forecasts.

use crate::{
    config::RoleDefinition,
    rng::SeededRng,
    roster::{Employee, ForecastDay, SalesHistoryPoint},
};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

const ROSTER_STREAM: u64 = 1;
const FORECAST_STREAM: u64 = 2;
const HISTORY_STREAM: u64 = 3;

/// Share of generated employees with no payroll rate on file.
const MISSING_RATE_CHANCE: f64 = 0.1;

const FIRST_NAMES: &[&str] = &[
    "Alex", "Bea", "Carlos", "Dana", "Eli", "Fatima", "Gus", "Hana", "Ivan", "Jo",
    "Kemal", "Lena", "Marco", "Nia", "Omar", "Priya", "Quinn", "Rosa", "Sam", "Tariq",
    "Uma", "Vic", "Wen", "Yusuf", "Zoe",
];

const LAST_NAMES: &[&str] = &[
    "Abbott", "Baptiste", "Chen", "Diaz", "Eriksen", "Fontaine", "Gupta", "Hale",
    "Ibarra", "Jensen", "Kowalski", "Lopez", "Mbeki", "Nakamura", "Okafor", "Park",
    "Quintero", "Rossi", "Silva", "Tanaka", "Varga", "Walsh", "Yilmaz", "Zhou",
];

pub struct RosterGenerator {
    seed: u64,
}

impl RosterGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn base_rate(role: &str) -> f64 {
        match role {
            "manager"    => 28.0,
            "line_cook"  => 19.0,
            "cook"       => 19.0,
            "bartender"  => 14.0,
            "server"     => 11.0,
            "host"       => 13.0,
            "dishwasher" => 15.0,
            _            => 16.0,
        }
    }

    /// `per_role` employees for every role, in catalog order.
    pub fn employees(&self, roles: &[RoleDefinition], per_role: usize) -> Vec<Employee> {
        let mut rng = SeededRng::stream(self.seed, ROSTER_STREAM);
        let mut out = Vec::with_capacity(roles.len() * per_role);

        for role in roles {
            for n in 0..per_role {
                let hourly_rate = if rng.chance(MISSING_RATE_CHANCE) {
                    None
                } else {
                    let rate = rng.jitter(Self::base_rate(&role.name), 0.12);
                    Some((rate * 4.0).round() / 4.0)
                };
                out.push(Employee {
                    employee_id: format!("emp-{}-{:03}", role.name, n + 1),
                    name: format!("{} {}", rng.pick(FIRST_NAMES), rng.pick(LAST_NAMES)),
                    role: role.name.clone(),
                    hourly_rate,
                    active: true,
                });
            }
        }
        out
    }

    /// Forecasts for `days` consecutive dates starting at `start`.
    /// Fridays and Saturdays run heavier.
    pub fn forecast(
        &self,
        start:        NaiveDate,
        days:         u32,
        base_guests:  u32,
        avg_check:    f64,
    ) -> Vec<ForecastDay> {
        let mut rng = SeededRng::stream(self.seed, FORECAST_STREAM);
        (0..days as i64)
            .map(|offset| {
                let date = start + Duration::days(offset);
                let weekend = matches!(date.weekday(), Weekday::Fri | Weekday::Sat);
                let base = base_guests as f64 * if weekend { 1.3 } else { 1.0 };
                let guests = rng.jitter(base, 0.15).round().max(0.0) as u32;
                let sales = (guests as f64 * rng.jitter(avg_check, 0.08) * 100.0).round() / 100.0;
                ForecastDay { date, projected_guests: guests, projected_sales: sales }
            })
            .collect()
    }

    /// Realised sales for the `days` days before `before`, running a
    /// little above or below forecast.
    pub fn sales_history(&self, before: NaiveDate, days: u32, forecast_sales: f64) -> Vec<SalesHistoryPoint> {
        let mut rng = SeededRng::stream(self.seed, HISTORY_STREAM);
        (1..=days as i64)
            .rev()
            .map(|back| {
                let forecast = rng.jitter(forecast_sales, 0.2);
                SalesHistoryPoint {
                    date: before - Duration::days(back),
                    actual_sales: (forecast * rng.jitter(1.02, 0.1) * 100.0).round() / 100.0,
                    forecast_sales: (forecast * 100.0).round() / 100.0,
                }
            })
            .collect()
    }
}
