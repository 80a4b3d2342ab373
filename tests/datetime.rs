use workshop_sync::utils::datetime::*;

#[test]
fn test_timestamp_is_in_seconds() {
    let now = timestamp();
    // Between 2020 and 2100
    assert!(now > 1_577_836_800);
    assert!(now < 4_102_444_800);
}

#[test]
fn test_seconds_since_never_negative() {
    assert_eq!(seconds_since(timestamp() + 3600), 0);
    assert!(seconds_since(timestamp() - 600) >= 600);
    assert!(seconds_since(0) > 0);
}

#[test]
fn test_format_timestamp() {
    assert_eq!(format_timestamp(0), "never");
    assert_eq!(format_timestamp(-5), "never");

    let formatted = format_timestamp(1_700_000_000);
    // 2023-11-14 or 2023-11-15 depending on the local zone
    assert!(formatted.starts_with("2023-11-1"));
    assert_eq!(formatted.len(), "2023-11-14 22:13".len());
}
