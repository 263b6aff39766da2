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

use std::{collections::BTreeMap, fmt::Debug};

use ferrum_core::UnixNanos;

use crate::Returns;

/// A statistic derived from a daily [`Returns`] series.
///
/// Every concrete statistic in `crate::statistics` implements just `calculate`; the default
/// helpers here (`check_valid_returns`, `downsample_to_daily_bins`, `calculate_std`) are shared
/// by more than one of them and mirror the portfolio-statistics framework this crate's helpers
/// were distilled from.
pub trait ReturnsStatistic: Debug {
    fn name(&self) -> String;

    fn calculate(&self, returns: &Returns) -> f64;

    fn check_valid_returns(&self, returns: &Returns) -> bool {
        !returns.is_empty()
    }

    fn downsample_to_daily_bins(&self, returns: &Returns) -> Returns {
        let nanos_per_day = 86_400_000_000_000u64;
        let mut daily_bins = BTreeMap::new();

        for (&timestamp, &value) in returns {
            let day_start = timestamp.as_u64() - (timestamp.as_u64() % nanos_per_day);
            *daily_bins.entry(UnixNanos::new(day_start)).or_insert(0.0) += value;
        }

        daily_bins
    }

    fn calculate_std(&self, returns: &Returns) -> f64 {
        let n = returns.len() as f64;
        if n < 2.0 {
            return f64::NAN;
        }

        let mean = returns.values().sum::<f64>() / n;
        let variance = returns.values().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);

        variance.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Noop;

    impl ReturnsStatistic for Noop {
        fn name(&self) -> String {
            "Noop".to_string()
        }

        fn calculate(&self, _returns: &Returns) -> f64 {
            0.0
        }
    }

    #[test]
    fn empty_returns_are_invalid() {
        let returns = Returns::new();
        assert!(!Noop.check_valid_returns(&returns));
    }

    #[test]
    fn downsample_sums_same_day_values() {
        let mut returns = Returns::new();
        returns.insert(UnixNanos::new(0), 0.01);
        returns.insert(UnixNanos::new(1_000_000_000), 0.02);
        let daily = Noop.downsample_to_daily_bins(&returns);
        assert_eq!(daily.len(), 1);
        assert!((daily[&UnixNanos::new(0)] - 0.03).abs() < f64::EPSILON);
    }

    #[test]
    fn std_of_single_point_is_nan() {
        let mut returns = Returns::new();
        returns.insert(UnixNanos::new(0), 0.01);
        assert!(Noop.calculate_std(&returns).is_nan());
    }
}
