//! staffing-runner: headless staffing planner.
//!
//! Usage:
//!   staffing-runner --date 2026-07-11 --weather sunny --db plan.db
//!   staffing-runner --date 2026-07-06 --days 7 --demo-seed 42 --strategy create
//!   staffing-runner --date 2026-07-11 --demo-seed 42 --json

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use staffing_core::{
    assignment_resolver::{AssignmentStrategy, PairingOutcome},
    config::EngineConfig,
    engine::{DailyPlanSummary, PlanRequest, StaffingEngine},
    roster_generator::RosterGenerator,
    store::StaffStore,
    types::DATE_FORMAT,
};
use std::env;

const DEMO_STAFF_PER_ROLE: usize = 6;
const DEMO_BASE_GUESTS: u32 = 180;
const DEMO_AVG_CHECK: f64 = 24.0;
const DEMO_HISTORY_DAYS: u32 = 28;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let days = parse_arg(&args, "--days", 1u32).max(1);
    let demo_seed = args
        .windows(2)
        .find(|w| w[0] == "--demo-seed")
        .map(|w| w[1].parse::<u64>())
        .transpose()
        .context("--demo-seed must be an integer")?;
    let date = match str_arg(&args, "--date") {
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .with_context(|| format!("--date '{s}' is not YYYY-MM-DD"))?,
        None => chrono::Local::now().date_naive(),
    };
    let end = last_day(date, days)?;
    let weather = str_arg(&args, "--weather").unwrap_or("sunny");
    let strategy = match str_arg(&args, "--strategy").unwrap_or("fill") {
        "fill" => AssignmentStrategy::FillOpenSlotsOnly,
        "create" => AssignmentStrategy::CreateSlotIfAbsent,
        other => anyhow::bail!("unknown --strategy '{other}' (expected fill|create)"),
    };
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");
    let json_mode = args.iter().any(|a| a == "--json");

    if !json_mode {
        println!("Staffing planner: staffing-runner");
        println!("  date:      {date}");
        println!("  days:      {days}");
        println!("  weather:   {weather}");
        println!("  strategy:  {strategy:?}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = EngineConfig::load(data_dir)?;
    let store = StaffStore::open(db)?;
    store.migrate()?;

    if let Some(seed) = demo_seed {
        seed_demo_data(&store, &config, seed, date, days)?;
    }

    let engine = StaffingEngine::new(config, store);
    for offset in 0..days as i64 {
        let request = PlanRequest {
            date: date + Duration::days(offset),
            weather: weather.to_string(),
            strategy,
        };
        let plan = engine.plan_day(&request)?;
        if json_mode {
            println!("{}", serde_json::to_string(&plan)?);
        } else {
            print_plan(&plan);
        }
    }

    let period = engine.evaluate_range(date, end)?;
    if json_mode {
        println!("{}", serde_json::to_string(&period)?);
        return Ok(());
    }
    println!("=== LABOR SUMMARY {} .. {} ===", period.start, period.end);
    println!("  hours:        {:.1}", period.total_hours);
    println!("  cost:         ${:.2}", period.total_cost);
    println!("  sales:        ${:.2}", period.total_sales);
    println!("  labor %:      {:.1}%", period.percentage_of_sales);
    println!("  target:       {:.1}%", engine.config().labor.target_percentage);
    println!("  days over:    {}", period.over_target_days);
    Ok(())
}

fn seed_demo_data(
    store:  &StaffStore,
    config: &EngineConfig,
    seed:   u64,
    start:  NaiveDate,
    days:   u32,
) -> Result<()> {
    let generator = RosterGenerator::new(seed);

    if store.employee_count()? == 0 {
        for employee in generator.employees(&config.roles, DEMO_STAFF_PER_ROLE) {
            store.insert_employee(&employee)?;
        }
    }
    for forecast in generator.forecast(start, days, DEMO_BASE_GUESTS, DEMO_AVG_CHECK) {
        store.save_forecast(&forecast)?;
    }
    let typical_sales = DEMO_BASE_GUESTS as f64 * DEMO_AVG_CHECK;
    for point in generator.sales_history(start, DEMO_HISTORY_DAYS, typical_sales) {
        store.save_sales_history(&point)?;
    }
    log::info!("seeded demo data (seed={seed})");
    Ok(())
}

fn print_plan(plan: &DailyPlanSummary) {
    let date = plan.forecast.date;
    println!("=== {date} ({}) ===", date.format("%A"));
    println!(
        "  forecast:     {} guests, ${:.2} sales",
        plan.forecast.projected_guests, plan.forecast.projected_sales
    );
    println!(
        "  demand:       ×{:.2}{} → planning for {} guests",
        plan.adjustment.factor,
        if plan.adjustment.was_clamped() { " (clamped)" } else { "" },
        plan.planning_guests
    );
    for insight in &plan.adjustment.insights {
        println!("    · {}", insight.message);
    }
    println!("  headcount:");
    for req in &plan.requirements.windows {
        println!("    {:<12} {:<6} {}", req.role, req.shift_window, req.required);
    }
    println!("  slots created: {}", plan.slots_created);
    println!("  assignment:   {}", plan.assignment.summary_line());
    for result in &plan.assignment.outcomes {
        if let PairingOutcome::Skipped { reason } = &result.outcome {
            println!("    skipped {} → {:?}", result.pairing.employee_id, reason);
        }
    }
    for gap in &plan.assignment.unfilled {
        println!(
            "    unfilled {}/{}: {} (open slots {}, eligible staff {})",
            gap.role, gap.shift_window, gap.missing, gap.open_slots, gap.eligible_employees
        );
    }
    println!(
        "  labor:        {:.1}h, ${:.2}, {:.1}% of sales{}",
        plan.labor.total_hours,
        plan.labor.total_cost,
        plan.labor.percentage_of_sales,
        if plan.labor.over_target { "  OVER TARGET" } else { "" }
    );
    println!();
}

/// Last date of a `days`-long run starting at `start`.
fn last_day(start: NaiveDate, days: u32) -> Result<NaiveDate> {
    start
        .checked_add_signed(Duration::days(i64::from(days) - 1))
        .with_context(|| format!("--days {days} from {start} runs past the last representable date"))
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn last_day_spans_the_run() {
        assert_eq!(last_day(ymd(2026, 7, 6), 1).expect("one day"), ymd(2026, 7, 6));
        assert_eq!(last_day(ymd(2026, 7, 6), 7).expect("one week"), ymd(2026, 7, 12));
    }

    #[test]
    fn huge_day_count_is_an_error() {
        let err = last_day(ymd(2026, 7, 6), u32::MAX).expect_err("out of range");
        assert!(err.to_string().contains("--days"));
    }
}
