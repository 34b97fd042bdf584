// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use super::*;

#[tokio::test(start_paused = true)]
async fn test_system_clock_sleeps_on_tokio_timer() {
    let clock = SystemClock::new();
    clock.sleep(Duration::from_secs(3)).await;
    assert!(clock.elapsed() >= Duration::from_secs(3));
}

#[tokio::test]
async fn test_fake_clock_sleep_advances_and_records() {
    let clock = FakeClock::new();
    clock.sleep(Duration::from_millis(500)).await;
    clock.sleep(Duration::from_millis(250)).await;

    assert_eq!(clock.elapsed(), Duration::from_millis(750));
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_millis(500), Duration::from_millis(250)]
    );
    assert_eq!(clock.total_slept(), Duration::from_millis(750));
}

#[test]
fn test_fake_clock_advance_is_not_a_sleep() {
    let clock = FakeClock::new();
    clock.advance(Duration::from_secs(2));
    assert_eq!(clock.elapsed(), Duration::from_secs(2));
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_fake_clock_clones_share_state() {
    let clock = FakeClock::new();
    let other = clock.clone();
    other.sleep(Duration::from_millis(10)).await;
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(10)]);
}

#[tokio::test]
async fn test_clock_handle_dispatch() {
    let handle = ClockHandle::fake();
    assert!(handle.is_fake());
    handle.sleep(Duration::from_millis(40)).await;
    assert_eq!(handle.as_fake().unwrap().total_slept(), Duration::from_millis(40));

    let system = ClockHandle::default();
    assert!(!system.is_fake());
    assert!(system.as_fake().is_none());
}
