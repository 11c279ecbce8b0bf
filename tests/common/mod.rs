//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::time::Duration;
use visgui_data::EventLoop;

/// Upper bound for loops that should settle almost immediately
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Run loop turns until nothing is left to do
pub fn pump(ev: &EventLoop) {
    for _ in 0..64 {
        if !ev.has_pending() {
            break;
        }
        ev.process_events();
    }
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
