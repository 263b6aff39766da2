// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Ferrum Trading Systems. All rights reserved.
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Real-time and settable `Clock` implementations.
//!
//! The backtest driver (§4.F) needs a clock it can advance bar-by-bar while live components read
//! the wall clock; both are expressed behind the same [`Clock`] trait.

use std::sync::{
    Mutex,
    atomic::{AtomicI64, Ordering},
};

use chrono::{DateTime, Utc};
use ferrum_core::UnixNanos;

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current date and time as a timezone-aware `DateTime<Utc>`.
    fn utc_now(&self) -> DateTime<Utc>;

    /// Returns the current UNIX timestamp in nanoseconds.
    fn timestamp_ns(&self) -> UnixNanos {
        UnixNanos::from_datetime(self.utc_now())
    }
}

/// Reads the OS wall clock on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveClock;

impl Clock for LiveClock {
    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock whose value is set explicitly, advanced by the backtest driver loop as bars are
/// processed (§4.F: "the driver advances `current_datetime` to each bar's close before
/// publishing it").
#[derive(Debug)]
pub struct TestClock {
    nanos: AtomicI64,
    // `AtomicI64` alone can't represent "unset"; a lock-guarded `Option` tracks whether the
    // clock has been advanced at least once so `utc_now` before the first `advance` can panic
    // with a clear message instead of silently returning the epoch.
    initialized: Mutex<bool>,
}

impl TestClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            nanos: AtomicI64::new(start.timestamp_nanos_opt().unwrap_or_default()),
            initialized: Mutex::new(true),
        }
    }

    /// Moves the clock forward to `to`. Panics if `to` is before the current value: the driver
    /// loop only ever advances.
    pub fn advance(&self, to: DateTime<Utc>) {
        let nanos = to.timestamp_nanos_opt().unwrap_or_default();
        let previous = self.nanos.swap(nanos, Ordering::SeqCst);
        assert!(
            nanos >= previous,
            "TestClock can only advance forward: {previous} -> {nanos}"
        );
    }
}

impl Clock for TestClock {
    fn utc_now(&self) -> DateTime<Utc> {
        assert!(*self.initialized.lock().expect(ferrum_core::correctness::FAILED), "TestClock read before initialization");
        DateTime::from_timestamp_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn live_clock_moves_forward() {
        let clock = LiveClock;
        let first = clock.timestamp_ns();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let second = clock.timestamp_ns();
        assert!(second.as_u64() >= first.as_u64());
    }

    #[test]
    fn test_clock_advances_to_requested_instant() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = TestClock::new(start);
        let next = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        clock.advance(next);
        assert_eq!(clock.utc_now(), next);
    }

    #[test]
    #[should_panic(expected = "can only advance forward")]
    fn test_clock_rejects_going_backwards() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        let clock = TestClock::new(start);
        clock.advance(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
    }
}
