use super::*;

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[test]
fn test_running_side_loses_time() {
    let t0 = Instant::now();
    let mut clock = ChessClock::default();
    clock.start(Color::White, t0);
    assert_eq!(clock.remaining(Color::White, t0 + secs(30)), secs(570));
    assert_eq!(clock.remaining(Color::Black, t0 + secs(30)), secs(600));

    clock.press(Color::Black, t0 + secs(30));
    assert_eq!(clock.remaining(Color::White, t0 + secs(100)), secs(570));
    assert_eq!(clock.remaining(Color::Black, t0 + secs(100)), secs(530));
}

#[test]
fn test_increment_is_added_on_stop() {
    let t0 = Instant::now();
    let mut clock = ChessClock::new(TimeControl::from_secs(60, 5));
    clock.start(Color::White, t0);
    clock.stop(t0 + secs(10));
    assert_eq!(clock.remaining(Color::White, t0 + secs(10)), secs(55));
    assert!(!clock.is_running());
}

#[test]
fn test_flag_fall() {
    let t0 = Instant::now();
    let mut clock = ChessClock::new(TimeControl::from_secs(60, 5));
    clock.start(Color::Black, t0);
    assert_eq!(clock.flagged(t0 + secs(59)), None);
    assert_eq!(clock.flagged(t0 + secs(61)), Some(Color::Black));

    // No increment once flagged
    clock.stop(t0 + secs(61));
    assert_eq!(clock.remaining(Color::Black, t0 + secs(61)), Duration::ZERO);
}

#[test]
fn test_unlimited_clock_never_runs() {
    let t0 = Instant::now();
    let mut clock = ChessClock::new(TimeControl::unlimited());
    clock.start(Color::White, t0);
    assert!(!clock.is_running());
    assert_eq!(clock.flagged(t0 + secs(10_000)), None);
    assert!(!clock.time_pressure(t0));
    assert_eq!(TimeControl::unlimited().to_string(), "Unlimited");
}

#[test]
fn test_time_pressure_and_reset() {
    let t0 = Instant::now();
    let mut clock = ChessClock::new(TimeControl::from_secs(90, 0));
    assert!(!clock.time_pressure(t0));
    clock.start(Color::White, t0);
    assert!(clock.time_pressure(t0 + secs(31)));

    clock.reset();
    assert!(!clock.is_running());
    assert_eq!(clock.remaining(Color::White, t0 + secs(31)), secs(90));
}

#[test]
fn test_format() {
    assert_eq!(ChessClock::format(secs(600)), "10:00");
    assert_eq!(ChessClock::format(secs(65)), "1:05");
    assert_eq!(ChessClock::format(Duration::from_millis(9_450)), "0:09.4");
    assert_eq!(TimeControl::from_secs(300, 2).to_string(), "5+2");
}
