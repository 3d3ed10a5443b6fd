//! Demand adjustment turns calendar, weather and recent sales trend into
//! one multiplier applied to the raw guest forecast.
//!
//! Combined factor = historical × weekday × seasonal × holiday × weather,
//! clamped to the configured combined bounds (default [0.3, 2.5]).
//! The historical sub-factor alone is clamped to the trend bounds
//! (default [0.5, 1.5]) and doubles as the simple trend-only factor.
//!
//! Never fails: every unmatched lookup falls back to a neutral 1.0.

use crate::{
    config::{DemandFactorConfig, FactorBounds},
    holiday_calendar::{HolidayCalendar, RuleHolidayCalendar},
    roster::SalesHistoryPoint,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    Historical,
    Weekday,
    Seasonal,
    Holiday,
    Weather,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FactorBreakdown {
    pub historical: f64,
    pub weekday:    f64,
    pub seasonal:   f64,
    pub holiday:    f64,
    pub weather:    f64,
}

impl FactorBreakdown {
    pub fn product(&self) -> f64 {
        self.historical * self.weekday * self.seasonal * self.holiday * self.weather
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Insight {
    pub category: FactorCategory,
    pub message:  String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemandAdjustment {
    pub date:      NaiveDate,
    /// Clamped combined factor.
    pub factor:    f64,
    /// Product before clamping; equal to `factor` unless a bound was hit.
    pub raw_factor: f64,
    pub breakdown: FactorBreakdown,
    pub holiday:   Option<String>,
    pub insights:  Vec<Insight>,
}

impl DemandAdjustment {
    /// Scale a raw guest count, rounded to whole guests.
    pub fn apply(&self, guests: u32) -> u32 {
        (guests as f64 * self.factor).round().max(0.0) as u32
    }

    pub fn was_clamped(&self) -> bool {
        self.factor != self.raw_factor
    }

    pub fn insight(&self, category: FactorCategory) -> Option<&str> {
        self.insights
            .iter()
            .find(|i| i.category == category)
            .map(|i| i.message.as_str())
    }
}

/// Actual-over-forecast ratio across days where both figures are strictly
/// positive, with the number of days that qualified. None when no day does
/// or when the sums overflow.
pub fn historical_ratio(history: &[SalesHistoryPoint]) -> Option<(f64, usize)> {
    let valid = history
        .iter()
        .filter(|p| p.actual_sales > 0.0 && p.forecast_sales > 0.0);

    let (actual, forecast, days) = valid.fold((0.0, 0.0, 0usize), |(a, f, n), p| {
        (a + p.actual_sales, f + p.forecast_sales, n + 1)
    });

    let ratio = actual / forecast;
    if days == 0 || !ratio.is_finite() {
        None
    } else {
        Some((ratio, days))
    }
}

/// The simple trend-only factor: historical ratio clamped to `bounds`,
/// exactly 1.0 with no usable history.
pub fn trend_factor(history: &[SalesHistoryPoint], bounds: FactorBounds) -> f64 {
    historical_ratio(history)
        .map(|(ratio, _)| bounds.clamp(ratio))
        .unwrap_or(1.0)
}

pub struct DemandAdjustmentCalculator {
    config:   DemandFactorConfig,
    calendar: Box<dyn HolidayCalendar>,
}

impl DemandAdjustmentCalculator {
    /// Calculator using the holiday rules from `config`.
    pub fn new(config: DemandFactorConfig) -> Self {
        let calendar = Box::new(RuleHolidayCalendar::from_config(&config));
        Self { config, calendar }
    }

    pub fn with_calendar(config: DemandFactorConfig, calendar: Box<dyn HolidayCalendar>) -> Self {
        Self { config, calendar }
    }

    pub fn set_calendar(&mut self, calendar: Box<dyn HolidayCalendar>) {
        self.calendar = calendar;
    }

    pub fn calculate(
        &self,
        date:    NaiveDate,
        history: &[SalesHistoryPoint],
        weather: &str,
    ) -> DemandAdjustment {
        let mut insights = Vec::with_capacity(5);

        // Historical trend
        let historical = match historical_ratio(history) {
            Some((ratio, days)) => {
                let clamped = self.config.trend_bounds.clamp(ratio);
                insights.push(Insight {
                    category: FactorCategory::Historical,
                    message:  format!(
                        "Sales ran {:+.0}% against forecast over {days} day(s); trend factor {clamped:.2}",
                        (ratio - 1.0) * 100.0
                    ),
                });
                clamped
            }
            None => {
                insights.push(Insight {
                    category: FactorCategory::Historical,
                    message:  "No usable sales history; trend held neutral".into(),
                });
                1.0
            }
        };

        // Weekday
        let day_name = date.format("%A").to_string();
        let weekday = self.config.weekday.get(&day_name).copied().unwrap_or(1.0);
        insights.push(Insight {
            category: FactorCategory::Weekday,
            message:  format!("{day_name} traffic {}", describe(weekday)),
        });

        // Season
        let month_name = date.format("%B").to_string();
        let seasonal = self.config.seasonal.get(&month_name).copied().unwrap_or(1.0);
        insights.push(Insight {
            category: FactorCategory::Seasonal,
            message:  format!("{month_name} seasonality {}", describe(seasonal)),
        });

        // Holiday
        let holiday_match = self.calendar.holiday_on(date);
        let holiday = holiday_match.as_ref().map(|h| h.factor).unwrap_or(1.0);
        insights.push(Insight {
            category: FactorCategory::Holiday,
            message:  match &holiday_match {
                Some(h) => format!("{} {}", h.name, describe(h.factor)),
                None => "No holiday".into(),
            },
        });

        // Weather
        let condition = weather.trim().to_lowercase();
        let weather_factor = self.config.weather.get(&condition).copied();
        insights.push(Insight {
            category: FactorCategory::Weather,
            message:  match weather_factor {
                Some(f) => format!("Weather '{condition}' {}", describe(f)),
                None => format!("Weather '{condition}' not recognised; held neutral"),
            },
        });

        let breakdown = FactorBreakdown {
            historical,
            weekday,
            seasonal,
            holiday,
            weather: weather_factor.unwrap_or(1.0),
        };
        let raw_factor = breakdown.product();
        let factor = self.config.combined_bounds.clamp(raw_factor);

        if factor != raw_factor {
            log::debug!("date={date} demand factor {raw_factor:.3} clamped to {factor:.3}");
        }

        DemandAdjustment {
            date,
            factor,
            raw_factor,
            breakdown,
            holiday: holiday_match.map(|h| h.name),
            insights,
        }
    }
}

fn describe(factor: f64) -> String {
    if (factor - 1.0).abs() < f64::EPSILON {
        "at baseline (1.00)".into()
    } else {
        format!("{:+.0}% vs baseline ({factor:.2})", (factor - 1.0) * 100.0)
    }
}
