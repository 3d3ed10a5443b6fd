use chrono::NaiveDate;
use staffing_core::{
    config::{EngineConfig, RoleDefinition, ShiftWindow},
    staffing_requirement::{required_staff_for_day, StaffingRequirementDeriver},
};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 12).expect("valid date")
}

fn deriver() -> StaffingRequirementDeriver {
    StaffingRequirementDeriver::from_config(&EngineConfig::default_test())
}

#[test]
fn two_hundred_guests_split_across_windows() {
    let reqs = deriver().derive(date(), 200);

    // server: ceil(200 / 20) = 10 → AM 60%, PM 40%
    assert_eq!(reqs.required("server", "AM"), Some(6));
    assert_eq!(reqs.required("server", "PM"), Some(4));
    // cook: ceil(200 / 40) = 5 → round(3.0), round(2.0)
    assert_eq!(reqs.required("cook", "AM"), Some(3));
    assert_eq!(reqs.required("cook", "PM"), Some(2));
    // dishwasher: ceil(200 / 100) = 2 → round(0.4) = 0, raised to minimum 1
    assert_eq!(reqs.required("dishwasher", "LATE"), Some(1));

    let server_day = reqs.roles.iter().find(|r| r.role == "server").expect("server demand");
    assert_eq!(server_day.required_for_day, 10);
    assert_eq!(reqs.total(), 16);
    assert_eq!(reqs.guests, 200);
}

#[test]
fn zero_guests_still_staffs_the_minimum() {
    let reqs = deriver().derive(date(), 0);
    assert!(reqs.windows.iter().all(|w| w.required == 1));
    assert!(reqs.roles.iter().all(|r| r.required_for_day == 0));
    assert_eq!(reqs.total(), 5);
}

#[test]
fn every_window_meets_the_role_minimum() {
    let config = EngineConfig::default_test();
    let deriver = StaffingRequirementDeriver::from_config(&config);

    for guests in [0, 1, 7, 19, 20, 21, 55, 199, 480, 1_000] {
        let reqs = deriver.derive(date(), guests);
        for w in &reqs.windows {
            let role = config.role(&w.role).expect("catalog role");
            assert!(
                w.required >= role.minimum_count,
                "{guests} guests: {}/{} got {}",
                w.role,
                w.shift_window,
                w.required
            );
        }
    }
}

#[test]
fn day_count_rounds_up() {
    assert_eq!(required_staff_for_day(21, 20.0), 2);
    assert_eq!(required_staff_for_day(20, 20.0), 1);
    assert_eq!(required_staff_for_day(0, 20.0), 0);
    assert_eq!(required_staff_for_day(100, 0.0), 0);
}

#[test]
fn requirements_follow_catalog_order() {
    let reqs = deriver().derive(date(), 120);
    let keys: Vec<(&str, &str)> = reqs
        .windows
        .iter()
        .map(|w| (w.role.as_str(), w.shift_window.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("server", "AM"),
            ("server", "PM"),
            ("cook", "AM"),
            ("cook", "PM"),
            ("dishwasher", "LATE"),
        ]
    );
}

#[test]
fn unknown_window_falls_back_to_minimum() {
    let roles = vec![RoleDefinition {
        name: "barista".into(),
        guest_to_staff_ratio: 10.0,
        minimum_count: 2,
        shift_windows: vec!["DAWN".into(), "AM".into()],
    }];
    let windows = vec![ShiftWindow {
        key: "AM".into(),
        start_time: "06:00".into(),
        end_time: "12:00".into(),
        demand_split_percentage: 0.5,
    }];
    let reqs = StaffingRequirementDeriver::new(roles, windows).derive(date(), 100);

    assert_eq!(reqs.required("barista", "DAWN"), Some(2));
    assert_eq!(reqs.required("barista", "AM"), Some(5));
}
