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

//! Backtest performance statistics.
//!
//! The Backtest Engine (`ferrum-backtest`) accumulates a daily equity curve while it runs and
//! hands it to [`report::compute_report`] once at the end of the run. This crate does not see
//! bars, orders or trades directly; it is a pure function over the curve, which keeps it
//! independently testable against the worked examples in the runtime's design notes.

pub mod report;
pub mod statistic;
pub mod statistics;

use std::collections::BTreeMap;

use ferrum_core::UnixNanos;

/// Time-indexed daily return series: the fraction the portfolio gained or lost each day.
pub type Returns = BTreeMap<UnixNanos, f64>;

pub use report::{PerformanceReport, compute_report};
