//! The staffing engine: one pipeline from forecast to labor summary.
//!
//! PIPELINE ORDER (fixed):
//!   1. Forecast lookup        (missing day → zero guests, zero sales)
//!   2. Demand adjustment      (history lookback, calendar, weather)
//!   3. Demand application     (the single place the factor touches guests)
//!   4. Requirement derivation
//!   5. Schedule initialization (insert-if-absent, one slot per seat)
//!   6. Assignment             (strategy chosen by the caller)
//!   7. Labor evaluation
//!
//! RULES:
//!   - The engine only reaches storage through the repository traits.
//!   - Every step records a StaffingEvent.
//!   - Partial failures come back in the summary; only unusable caller
//!     input is returned as an error.

use crate::{
    assignment_resolver::{
        AssignmentReport, AssignmentRequest, AssignmentResolver, AssignmentStrategy,
        PairingOutcome, PairingResult,
    },
    config::EngineConfig,
    demand_adjustment::{DemandAdjustment, DemandAdjustmentCalculator},
    error::{StaffError, StaffResult},
    event::StaffingEvent,
    holiday_calendar::HolidayCalendar,
    labor_cost::{DailyLaborSummary, LaborCostEvaluator, LaborPeriodSummary},
    repository::{EmployeeDirectory, EventSink, ForecastStore, ShiftStore},
    roster::{ForecastDay, ShiftSlot},
    staffing_requirement::{StaffingRequirementDeriver, StaffingRequirements},
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Where the demand factor enters the pipeline.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DemandApplication {
    /// Scale forecast guests by the factor before deriving headcount.
    #[default]
    AdjustBeforeDerivation,
    /// Derive headcount from raw forecast guests; the factor is reported
    /// but not applied.
    RawGuests,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanRequest {
    pub date:     NaiveDate,
    pub weather:  String,
    pub strategy: AssignmentStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyPlanSummary {
    pub forecast:        ForecastDay,
    pub adjustment:      DemandAdjustment,
    /// Guest count headcount was derived from.
    pub planning_guests: u32,
    pub requirements:    StaffingRequirements,
    pub slots_created:   u32,
    pub assignment:      AssignmentReport,
    pub labor:           DailyLaborSummary,
}

pub struct StaffingEngine<S> {
    config:    EngineConfig,
    store:     S,
    demand:    DemandAdjustmentCalculator,
    deriver:   StaffingRequirementDeriver,
    resolver:  AssignmentResolver,
    evaluator: LaborCostEvaluator,
}

impl<S> StaffingEngine<S>
where
    S: ForecastStore + EmployeeDirectory + ShiftStore + EventSink,
{
    pub fn new(config: EngineConfig, store: S) -> Self {
        Self {
            demand:    DemandAdjustmentCalculator::new(config.demand.clone()),
            deriver:   StaffingRequirementDeriver::from_config(&config),
            resolver:  AssignmentResolver::new(config.shift_windows.clone(), config.labor.write_guard),
            evaluator: LaborCostEvaluator::from_policy(&config.labor),
            config,
            store,
        }
    }

    /// Swap the holiday calendar built from config for another one.
    pub fn with_holiday_calendar(mut self, calendar: Box<dyn HolidayCalendar>) -> Self {
        self.demand.set_calendar(calendar);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn record(&self, event: StaffingEvent) -> StaffResult<()> {
        self.store.append_event(&event.to_entry()?)
    }

    /// Forecast for a date; a neutral empty day when none exists.
    pub fn forecast_for(&self, date: NaiveDate) -> StaffResult<ForecastDay> {
        match self.store.forecast_for(date)? {
            Some(f) => Ok(f),
            None => {
                log::warn!("date={date} no forecast on file; planning against zero guests");
                Ok(ForecastDay::empty(date))
            }
        }
    }

    /// Demand factor for `date` using the configured history lookback.
    pub fn adjust_demand(&self, date: NaiveDate, weather: &str) -> StaffResult<DemandAdjustment> {
        let lookback = self.config.demand.history_lookback_days.max(0);
        let history = if lookback == 0 {
            Vec::new()
        } else {
            let start = Duration::try_days(lookback)
                .and_then(|span| date.checked_sub_signed(span))
                .ok_or_else(|| StaffError::InvalidInput {
                    reason: format!("history lookback of {lookback} day(s) before {date} is out of range"),
                })?;
            self.store.sales_history(start, date - Duration::days(1))?
        };
        if history.is_empty() {
            log::debug!("date={date} no sales history in the last {lookback} day(s)");
        }

        let adjustment = self.demand.calculate(date, &history, weather);
        log::info!(
            "date={date} demand factor {:.2} (hist {:.2} × wd {:.2} × season {:.2} × hol {:.2} × wx {:.2})",
            adjustment.factor,
            adjustment.breakdown.historical,
            adjustment.breakdown.weekday,
            adjustment.breakdown.seasonal,
            adjustment.breakdown.holiday,
            adjustment.breakdown.weather
        );
        self.record(StaffingEvent::DemandAdjusted {
            date,
            factor:    adjustment.factor,
            breakdown: adjustment.breakdown,
            holiday:   adjustment.holiday.clone(),
        })?;
        Ok(adjustment)
    }

    /// The one place the factor is applied to guests.
    pub fn planning_guests(&self, forecast: &ForecastDay, adjustment: &DemandAdjustment) -> u32 {
        match self.config.labor.demand_application {
            DemandApplication::AdjustBeforeDerivation => adjustment.apply(forecast.projected_guests),
            DemandApplication::RawGuests => forecast.projected_guests,
        }
    }

    pub fn derive_requirements(&self, date: NaiveDate, guests: u32) -> StaffingRequirements {
        self.deriver.derive(date, guests)
    }

    /// Create one open slot per required seat that does not exist yet.
    /// Returns the number of slots created.
    pub fn initialize_schedule(&self, requirements: &StaffingRequirements) -> StaffResult<u32> {
        let date = requirements.date;
        let mut created = 0u32;

        for req in &requirements.windows {
            let Some(window) = self.config.shift_window(&req.shift_window) else {
                log::warn!("date={date} cannot initialize unknown window '{}'", req.shift_window);
                continue;
            };
            for slot_index in 0..req.required {
                let slot = ShiftSlot::open(date, &req.role, window, slot_index);
                if self.store.insert_if_absent(&slot)? {
                    created += 1;
                }
            }
        }

        if created > 0 {
            log::debug!("date={date} initialized {created} slot(s)");
            self.record(StaffingEvent::ScheduleInitialized { date, slots_created: created })?;
        }
        Ok(created)
    }

    /// Batch assignment against the current shift store state.
    pub fn resolve(
        &self,
        requirements: &StaffingRequirements,
        strategy:     AssignmentStrategy,
    ) -> StaffResult<AssignmentReport> {
        let date = requirements.date;
        let employees = self.store.list_active()?;
        if employees.is_empty() {
            log::warn!("date={date} employee directory is empty");
        }

        let report = self.resolver.resolve(date, requirements, &employees, &self.store, strategy)?;
        self.record_assignment(date, strategy, &report.outcomes)?;
        for gap in &report.unfilled {
            self.record(StaffingEvent::DemandUnfilled {
                date,
                role:         gap.role.clone(),
                shift_window: gap.shift_window.clone(),
                missing:      gap.missing,
            })?;
        }
        Ok(report)
    }

    fn record_assignment(
        &self,
        date:     NaiveDate,
        strategy: AssignmentStrategy,
        outcomes: &[PairingResult],
    ) -> StaffResult<()> {
        for result in outcomes {
            let p = &result.pairing;
            let event = match &result.outcome {
                PairingOutcome::Assigned => StaffingEvent::ShiftAssigned {
                    date,
                    slot_id:      p.slot_id.clone(),
                    employee_id:  p.employee_id.clone(),
                    role:         p.role.clone(),
                    shift_window: p.shift_window.clone(),
                    strategy,
                },
                PairingOutcome::Skipped { reason } => StaffingEvent::AssignmentSkipped {
                    date,
                    slot_id:     p.slot_id.clone(),
                    employee_id: p.employee_id.clone(),
                    reason:      reason.clone(),
                },
            };
            self.record(event)?;
        }
        Ok(())
    }

    /// Interactive assignment of one employee to one seat.
    pub fn assign_one(
        &self,
        request:  &AssignmentRequest,
        strategy: AssignmentStrategy,
    ) -> StaffResult<PairingResult> {
        let employees = self.store.list_active()?;
        let result = self.resolver.assign_one(request, &employees, &self.store, strategy)?;
        self.record_assignment(request.date, strategy, std::slice::from_ref(&result))?;
        Ok(result)
    }

    /// Clear a slot's employee. Returns whether anyone was released.
    pub fn release_slot(&self, date: NaiveDate, slot_id: &str) -> StaffResult<bool> {
        match self.resolver.release(date, slot_id, &self.store)? {
            Some(employee_id) => {
                self.record(StaffingEvent::SlotReleased {
                    date,
                    slot_id: slot_id.to_string(),
                    employee_id,
                })?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn evaluate_day(&self, date: NaiveDate) -> StaffResult<DailyLaborSummary> {
        let forecast = self.forecast_for(date)?;
        self.evaluate_forecast(&forecast)
    }

    fn evaluate_forecast(&self, forecast: &ForecastDay) -> StaffResult<DailyLaborSummary> {
        let date = forecast.date;
        let slots = self.store.list(date)?;
        let employees = self.store.list_active()?;
        let summary = self
            .evaluator
            .evaluate(date, forecast.projected_sales, &slots, &employees);

        log::info!(
            "date={date} labor {:.1}h ${:.2} = {:.1}% of sales{}",
            summary.total_hours,
            summary.total_cost,
            summary.percentage_of_sales,
            if summary.over_target { " (over target)" } else { "" }
        );
        self.record(StaffingEvent::LaborEvaluated {
            date,
            total_hours:         summary.total_hours,
            total_cost:          summary.total_cost,
            percentage_of_sales: summary.percentage_of_sales,
            over_target:         summary.over_target,
        })?;
        Ok(summary)
    }

    /// Daily summaries for every date in [start, end], plus period totals.
    pub fn evaluate_range(&self, start: NaiveDate, end: NaiveDate) -> StaffResult<LaborPeriodSummary> {
        if end < start {
            return Err(StaffError::InvalidInput {
                reason: format!("range end {end} is before start {start}"),
            });
        }
        let forecasts = self.store.fetch(start, end)?;
        let mut days = Vec::new();
        for date in start.iter_days().take_while(|d| *d <= end) {
            let forecast = forecasts
                .iter()
                .find(|f| f.date == date)
                .cloned()
                .unwrap_or_else(|| ForecastDay::empty(date));
            days.push(self.evaluate_forecast(&forecast)?);
        }
        Ok(self.evaluator.summarize_period(start, end, days))
    }

    /// Run the whole pipeline for one date.
    pub fn plan_day(&self, request: &PlanRequest) -> StaffResult<DailyPlanSummary> {
        let date = request.date;
        let forecast = self.forecast_for(date)?;
        let adjustment = self.adjust_demand(date, &request.weather)?;
        let planning_guests = self.planning_guests(&forecast, &adjustment);
        let requirements = self.derive_requirements(date, planning_guests);
        let slots_created = self.initialize_schedule(&requirements)?;
        let assignment = self.resolve(&requirements, request.strategy)?;
        let labor = self.evaluate_forecast(&forecast)?;

        Ok(DailyPlanSummary {
            forecast,
            adjustment,
            planning_guests,
            requirements,
            slots_created,
            assignment,
            labor,
        })
    }

    /// Remove every slot for a date.
    pub fn reset_day(&self, date: NaiveDate) -> StaffResult<usize> {
        let slots_removed = self.store.reset(date)?;
        log::info!("date={date} schedule reset, {slots_removed} slot(s) removed");
        self.record(StaffingEvent::ScheduleReset { date, slots_removed })?;
        Ok(slots_removed)
    }
}
