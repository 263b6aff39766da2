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

//! Nanosecond-precision timestamp helpers used throughout the runtime.

use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A UNIX timestamp expressed in nanoseconds since the epoch.
///
/// Bars, ticks, orders and trades all stamp their `datetime` with this type so that ordering
/// across series (the backtest driver's bar merge) is a plain integer comparison.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnixNanos(pub u64);

impl UnixNanos {
    /// The Unix epoch, `0` nanoseconds.
    pub const EPOCH: Self = Self(0);

    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn as_secs(self) -> i64 {
        (self.0 / 1_000_000_000) as i64
    }

    /// Converts to a [`chrono::DateTime<Utc>`] for display/formatting and log filtering.
    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.as_secs(), (self.0 % 1_000_000_000) as u32)
            .unwrap_or_else(|| DateTime::from_timestamp(0, 0).expect(crate::correctness::FAILED))
    }

    /// Builds a [`UnixNanos`] from a [`chrono::DateTime<Utc>`].
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let secs = dt.timestamp();
        let nanos = dt.timestamp_subsec_nanos();
        Self((secs.max(0) as u64) * 1_000_000_000 + u64::from(nanos))
    }
}

impl Display for UnixNanos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().to_rfc3339())
    }
}

impl From<DateTime<Utc>> for UnixNanos {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_datetime() {
        let dt = Utc::now();
        let nanos = UnixNanos::from_datetime(dt);
        let back = nanos.to_datetime();
        assert_eq!(dt.timestamp(), back.timestamp());
    }

    #[test]
    fn orders_by_value() {
        assert!(UnixNanos::new(1) < UnixNanos::new(2));
    }
}
