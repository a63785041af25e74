//! Tests for configuration parsing and normalization.

use slot_engine::config::{
    parse_blacklist, BlacklistInput, LenientBool, LenientInt, SlotConfig, SlotConfigInput, TimeOfDay,
    DEFAULT_ZONE,
};
use slot_engine::config::parse_zone;
use slot_engine::dst::DstPolicy;
use slot_engine::error::SlotError;

#[test]
fn empty_input_uses_defaults() {
    let config = SlotConfigInput::default().normalize();

    assert_eq!(config.count, 6);
    assert_eq!(config.max_days_ahead, 21);
    assert_eq!(config.window_start, TimeOfDay { hour: 9, minute: 30 });
    assert_eq!(config.window_end, TimeOfDay { hour: 17, minute: 30 });
    assert_eq!(config.interval, 30);
    assert_eq!(config.per_day, 0);
    assert!(!config.weekdays_only);
    assert!(!config.biz_friendly_padding);
    assert!(!config.morning_bias && !config.afternoon_bias);
    assert!(config.blacklist.is_empty());
    assert_eq!(config.zone, DEFAULT_ZONE);
    assert_eq!(config.dst_policy, DstPolicy::ShiftForward);
    assert_eq!(config, SlotConfig::default());
}

#[test]
fn numeric_fields_are_clamped() {
    let input = SlotConfigInput {
        count: Some(LenientInt::Int(99)),
        max_days_ahead: Some(LenientInt::Int(0)),
        interval: Some(LenientInt::Int(1000)),
        per_day: Some(LenientInt::Int(-4)),
        ..SlotConfigInput::default()
    };
    let config = input.normalize();

    assert_eq!(config.count, 24);
    assert_eq!(config.max_days_ahead, 1);
    assert_eq!(config.interval, 180);
    assert_eq!(config.per_day, 0);
}

#[test]
fn lower_bounds_are_clamped() {
    let config = SlotConfigInput {
        count: Some(LenientInt::Int(-3)),
        max_days_ahead: Some(LenientInt::Int(500)),
        interval: Some(LenientInt::Int(2)),
        ..SlotConfigInput::default()
    }
    .normalize();

    assert_eq!(config.count, 1);
    assert_eq!(config.max_days_ahead, 120);
    assert_eq!(config.interval, 5);
}

#[test]
fn form_style_json_is_accepted() {
    let json = r#"{
        "count": "8",
        "daysAhead": 10,
        "start": "08:00",
        "end": "12:15",
        "interval": "15 minutes",
        "perDay": 2,
        "weekdaysOnly": true,
        "bizFriendly": true,
        "morningBias": true,
        "afternoonBias": false,
        "blacklist": "2026-10-20, 2026-10-21,,",
        "timeZone": "America/Vancouver"
    }"#;
    let input: SlotConfigInput = serde_json::from_str(json).unwrap();
    let config = input.normalize();

    assert_eq!(config.count, 8);
    assert_eq!(config.max_days_ahead, 10);
    assert_eq!(config.window_start, TimeOfDay { hour: 8, minute: 0 });
    assert_eq!(config.window_end, TimeOfDay { hour: 12, minute: 15 });
    assert_eq!(config.interval, 15);
    assert_eq!(config.per_day, 2);
    assert!(config.weekdays_only);
    assert!(config.biz_friendly_padding);
    assert!(config.morning_bias);
    assert!(!config.afternoon_bias);
    assert_eq!(
        config.blacklist.iter().cloned().collect::<Vec<_>>(),
        vec!["2026-10-20".to_string(), "2026-10-21".to_string()]
    );
    assert_eq!(config.zone, chrono_tz::America::Vancouver);
}

#[test]
fn snake_case_json_with_list_blacklist() {
    let json = r#"{
        "max_days_ahead": 5,
        "window_start": "10:00",
        "window_end": "11:00",
        "blacklist": [" 2026-11-02 ", ""],
        "dst_policy": "skip"
    }"#;
    let config = serde_json::from_str::<SlotConfigInput>(json)
        .unwrap()
        .normalize();

    assert_eq!(config.max_days_ahead, 5);
    assert_eq!(config.open_minute(), 600);
    assert_eq!(config.close_minute(), 660);
    assert_eq!(config.blacklist.len(), 1);
    assert!(config.blacklist.contains("2026-11-02"));
    assert_eq!(config.dst_policy, DstPolicy::Skip);
}

#[test]
fn unreadable_values_fall_back_to_defaults() {
    let json = r#"{ "count": "lots", "start": "nine", "end": "17", "timeZone": "Mars/Olympus" }"#;
    let config = serde_json::from_str::<SlotConfigInput>(json)
        .unwrap()
        .normalize();

    assert_eq!(config.count, 6);
    assert_eq!(config.window_start, TimeOfDay { hour: 9, minute: 30 });
    assert_eq!(config.window_end, TimeOfDay { hour: 17, minute: 30 });
    assert_eq!(config.zone, DEFAULT_ZONE);
}

#[test]
fn out_of_range_time_components_are_clamped() {
    let config = SlotConfigInput {
        window_start: Some("-2:30".to_string()),
        window_end: Some("24:99".to_string()),
        ..SlotConfigInput::default()
    }
    .normalize();

    assert_eq!(config.window_start, TimeOfDay { hour: 0, minute: 30 });
    assert_eq!(config.window_end, TimeOfDay { hour: 23, minute: 59 });
}

#[test]
fn window_order_does_not_matter() {
    let config = SlotConfigInput {
        window_start: Some("17:00".to_string()),
        window_end: Some("09:00".to_string()),
        ..SlotConfigInput::default()
    }
    .normalize();

    assert_eq!(config.open_minute(), 540);
    assert_eq!(config.close_minute(), 1020);
}

#[test]
fn merge_prefers_overrides() {
    let file = SlotConfigInput {
        count: Some(LenientInt::Int(10)),
        interval: Some(LenientInt::Int(15)),
        blacklist: Some(BlacklistInput::Csv("2026-10-20".to_string())),
        ..SlotConfigInput::default()
    };
    let flags = SlotConfigInput {
        count: Some(LenientInt::Int(3)),
        weekdays_only: Some(LenientBool::Bool(true)),
        ..SlotConfigInput::default()
    };
    let config = file.merge(flags).normalize();

    assert_eq!(config.count, 3);
    assert_eq!(config.interval, 15);
    assert!(config.weekdays_only);
    assert!(config.blacklist.contains("2026-10-20"));
}

#[test]
fn normalized_repairs_hand_built_config() {
    let config = SlotConfig {
        count: 0,
        interval: 0,
        max_days_ahead: 1000,
        window_start: TimeOfDay { hour: 30, minute: 90 },
        ..SlotConfig::default()
    }
    .normalized();

    assert_eq!(config.count, 1);
    assert_eq!(config.interval, 5);
    assert_eq!(config.max_days_ahead, 120);
    assert_eq!(config.window_start, TimeOfDay { hour: 23, minute: 59 });
}

#[test]
fn blacklist_csv_parsing() {
    let days = parse_blacklist(" 2026-10-20 ,2026-10-20,, 2026-12-25");
    assert_eq!(days.len(), 2);
    assert!(days.contains("2026-12-25"));
}

#[test]
fn checkbox_text_and_numbers_are_read_as_flags() {
    let json = r#"{
        "weekdaysOnly": "true",
        "bizFriendly": "on",
        "morningBias": 1,
        "afternoonBias": "no"
    }"#;
    let config = serde_json::from_str::<SlotConfigInput>(json)
        .unwrap()
        .normalize();

    assert!(config.weekdays_only);
    assert!(config.biz_friendly_padding);
    assert!(config.morning_bias);
    assert!(!config.afternoon_bias);
}

#[test]
fn unrecognized_flag_text_is_off() {
    let config = serde_json::from_str::<SlotConfigInput>(r#"{ "weekdaysOnly": "maybe" }"#)
        .unwrap()
        .normalize();
    assert!(!config.weekdays_only);
}

#[test]
fn wrong_json_types_fall_back_to_defaults() {
    let json = r#"{
        "count": 4,
        "start": 9,
        "end": ["17:00"],
        "timeZone": 5,
        "weekdaysOnly": { "checked": true },
        "blacklist": 20261020,
        "interval": null,
        "dstPolicy": "sometimes"
    }"#;
    let config = serde_json::from_str::<SlotConfigInput>(json)
        .unwrap()
        .normalize();

    assert_eq!(config.count, 4);
    assert_eq!(config.window_start, TimeOfDay { hour: 9, minute: 30 });
    assert_eq!(config.window_end, TimeOfDay { hour: 17, minute: 30 });
    assert_eq!(config.zone, DEFAULT_ZONE);
    assert!(!config.weekdays_only);
    assert!(config.blacklist.is_empty());
    assert_eq!(config.interval, 30);
    assert_eq!(config.dst_policy, DstPolicy::ShiftForward);
}

#[test]
fn explicit_zone_names_are_checked() {
    assert_eq!(parse_zone(" Europe/London ").unwrap(), chrono_tz::Europe::London);
    assert_eq!(parse_zone("").unwrap(), DEFAULT_ZONE);
    match parse_zone("Mars/Olympus_Mons") {
        Err(SlotError::InvalidTimezone(name)) => assert_eq!(name, "Mars/Olympus_Mons"),
        other => panic!("expected InvalidTimezone, got {other:?}"),
    }
}
