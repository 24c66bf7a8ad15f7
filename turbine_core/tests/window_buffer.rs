use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rstest::rstest;
use turbine_core::{Reading, WindowBuffer, WindowResult};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

fn reading_at(ms: i64) -> Reading {
    Reading {
        timestamp: base() + TimeDelta::milliseconds(ms),
        accel_x: 0.1,
        accel_y: -0.2,
        accel_z: 9.81,
        gyro_x: 0.0,
        gyro_y: 0.0,
        gyro_z: 0.95,
        temperature: 18.5,
    }
}

/// Feed readings every `step_ms` and collect the sizes of closed windows.
fn closed_sizes(window: Duration, step_ms: i64, count: i64) -> Vec<usize> {
    let mut buf = WindowBuffer::new(window).unwrap();
    (0..count)
        .filter_map(|i| match buf.accumulate(reading_at(i * step_ms)) {
            WindowResult::Closed(w) => Some(w.len()),
            WindowResult::Open => None,
        })
        .collect()
}

#[test]
fn rotation_window_at_5hz() {
    // 6.6 s at 200 ms: readings 0..=6400 ms form the window, the one at
    // 6600 ms closes it.
    let buf = WindowBuffer::from_secs_f64(6.6).unwrap();
    assert_eq!(buf.window_size(), Duration::from_millis(6600));
    assert_eq!(closed_sizes(buf.window_size(), 200, 34), vec![33]);
    assert!(closed_sizes(buf.window_size(), 200, 33).is_empty());
}

#[rstest]
#[case::exact_boundary(1000, 250, 9, vec![4, 3])]
#[case::coarse_polls(1000, 400, 7, vec![3, 2])]
#[case::closing_reading_is_not_carried(100, 100, 4, vec![1, 0, 0])]
fn windows_close_on_elapsed_time(
    #[case] window_ms: u64,
    #[case] step_ms: i64,
    #[case] count: i64,
    #[case] expected: Vec<usize>,
) {
    assert_eq!(
        closed_sizes(Duration::from_millis(window_ms), step_ms, count),
        expected
    );
}

#[test]
fn closed_window_is_half_open() {
    let size = Duration::from_secs(2);
    let mut buf = WindowBuffer::new(size).unwrap();
    let mut closed = 0;
    for i in 0..50 {
        if let WindowResult::Closed(w) = buf.accumulate(reading_at(i * 130)) {
            closed += 1;
            let start = w.start().unwrap();
            let end = start + TimeDelta::from_std(size).unwrap();
            assert!(w.span() < size);
            assert!(
                w.readings()
                    .iter()
                    .all(|r| r.timestamp >= start && r.timestamp < end)
            );
        }
    }
    assert!(closed > 0);
}

#[test]
fn full_rotation_of_readings_closes_with_33() {
    let mut buf = WindowBuffer::from_secs_f64(6.6).unwrap();
    for i in 0..33 {
        assert_eq!(buf.accumulate(reading_at(i * 200)), WindowResult::Open);
    }
    let WindowResult::Closed(w) = buf.accumulate(reading_at(6600)) else {
        panic!("reading at 6.6 s should close the window");
    };
    assert_eq!(w.len(), 33);
    assert_eq!(w.readings().last().unwrap().timestamp, reading_at(6400).timestamp);
}

#[test]
fn next_window_starts_at_closing_reading() {
    let mut buf = WindowBuffer::new(Duration::from_millis(500)).unwrap();
    buf.accumulate(reading_at(0));
    let closing = reading_at(600);
    assert!(matches!(buf.accumulate(closing), WindowResult::Closed(_)));
    assert_eq!(buf.window_start(), Some(closing.timestamp));
    assert_eq!(buf.len(), 0);

    // Elapsed time for the second window is measured from the closing reading.
    assert_eq!(buf.accumulate(reading_at(1000)), WindowResult::Open);
    let WindowResult::Closed(w) = buf.accumulate(reading_at(1100)) else {
        panic!("second window should close 500 ms after the first closed");
    };
    assert_eq!(w.start(), Some(closing.timestamp));
    assert_eq!(w.len(), 1);
}

#[test]
fn only_closing_readings_are_left_out() {
    let mut buf = WindowBuffer::new(Duration::from_millis(700)).unwrap();
    let mut seen = 0;
    let mut closes = 0;
    for i in 0..97 {
        if let WindowResult::Closed(w) = buf.accumulate(reading_at(i * 90)) {
            seen += w.len();
            closes += 1;
        }
    }
    seen += buf.flush().map_or(0, |w| w.len());
    assert!(closes > 0);
    assert_eq!(seen + closes, 97);
}

#[test]
fn flush_hands_over_partial_window_once() {
    let mut buf = WindowBuffer::new(Duration::from_secs(10)).unwrap();
    for i in 0..5 {
        buf.accumulate(reading_at(i * 200));
    }
    let w = buf.flush().unwrap();
    assert_eq!(w.len(), 5);
    assert_eq!(w.start(), Some(reading_at(0).timestamp));
    assert!(buf.flush().is_none());
    assert!(buf.is_empty());
}
