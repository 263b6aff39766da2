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

//! Turns a daily equity curve into the headline and supplemental backtest statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ferrum_core::UnixNanos;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::{
    Returns,
    statistic::ReturnsStatistic,
    statistics::{MaxDrawdown, SharpeRatio},
};

/// Performance statistics computed once over a backtest run's daily equity curve.
///
/// The four required metrics (`total_return`, `sharpe_ratio`, `max_drawdown`, `annual_return`)
/// plus the supplemental ones carried alongside them: `start_date`/`end_date`/`total_days`,
/// `profit_days`/`loss_days`, `max_drawdown_duration`, `return_drawdown_ratio`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub total_days: usize,
    pub total_return: f64,
    pub annual_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub profit_days: usize,
    pub loss_days: usize,
    pub return_drawdown_ratio: f64,
}

impl Default for PerformanceReport {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            total_days: 0,
            total_return: 0.0,
            annual_return: 0.0,
            sharpe_ratio: f64::NAN,
            max_drawdown: 0.0,
            max_drawdown_duration: 0,
            profit_days: 0,
            loss_days: 0,
            return_drawdown_ratio: 0.0,
        }
    }
}

/// Builds daily fractional returns from a starting balance and a series of end-of-day equity
/// snapshots: `returns[t] = (equity[t] - equity[t-1]) / equity[t-1]`, with `equity[-1] =
/// starting_cash`.
fn daily_returns(starting_cash: Decimal, equity_curve: &BTreeMap<UnixNanos, Decimal>) -> Returns {
    let mut returns = Returns::new();
    let mut prev = starting_cash;

    for (&ts, &equity) in equity_curve {
        if !prev.is_zero() {
            let ret = ((equity - prev) / prev).to_f64().unwrap_or(0.0);
            returns.insert(ts, ret);
        }
        prev = equity;
    }

    returns
}

/// Longest run of consecutive entries where the cumulative-returns curve sits below its prior
/// running peak.
fn max_drawdown_duration(returns: &Returns) -> usize {
    let mut cumulative = 1.0;
    let mut running_max = 1.0;
    let mut current_run = 0usize;
    let mut longest_run = 0usize;

    for &ret in returns.values() {
        cumulative *= 1.0 + ret;
        if cumulative >= running_max {
            running_max = cumulative;
            current_run = 0;
        } else {
            current_run += 1;
            longest_run = longest_run.max(current_run);
        }
    }

    longest_run
}

/// Computes the full [`PerformanceReport`] for a backtest run.
///
/// `equity_curve` is the per-day end-of-window account equity, as flushed by the Backtest Engine
/// at each `daily_update_interval` window boundary; `starting_cash` is the account's equity
/// before the first bar. `annual_days` is the number of trading days used to annualize the Sharpe
/// ratio and the annual return (252 for daily equities, 365 for round-the-clock markets).
#[must_use]
pub fn compute_report(
    starting_cash: Decimal,
    equity_curve: &BTreeMap<UnixNanos, Decimal>,
    risk_free_rate: f64,
    annual_days: f64,
) -> PerformanceReport {
    if equity_curve.is_empty() {
        return PerformanceReport::default();
    }

    let returns = daily_returns(starting_cash, equity_curve);

    let final_equity = *equity_curve.values().next_back().expect("non-empty");
    let total_return = if starting_cash.is_zero() {
        0.0
    } else {
        ((final_equity - starting_cash) / starting_cash)
            .to_f64()
            .unwrap_or(0.0)
    };

    let daily_mean = if returns.is_empty() {
        0.0
    } else {
        returns.values().sum::<f64>() / returns.len() as f64
    };
    let annual_return = (1.0 + daily_mean).powf(annual_days) - 1.0;

    let sharpe = SharpeRatio::new(Some(annual_days as usize), Some(risk_free_rate)).calculate(&returns);
    let max_dd = MaxDrawdown.calculate(&returns);
    let dd_duration = max_drawdown_duration(&returns);

    let profit_days = returns.values().filter(|&&r| r > 0.0).count();
    let loss_days = returns.values().filter(|&&r| r < 0.0).count();

    let return_drawdown_ratio = if max_dd.abs() < f64::EPSILON {
        0.0
    } else {
        total_return / max_dd.abs()
    };

    let start_date = equity_curve.keys().next().map(|ts| ts.to_datetime());
    let end_date = equity_curve.keys().next_back().map(|ts| ts.to_datetime());

    PerformanceReport {
        start_date,
        end_date,
        total_days: equity_curve.len(),
        total_return,
        annual_return,
        sharpe_ratio: sharpe,
        max_drawdown: max_dd,
        max_drawdown_duration: dd_duration,
        profit_days,
        loss_days,
        return_drawdown_ratio,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn day(n: u64) -> UnixNanos {
        UnixNanos::new(n * 86_400_000_000_000)
    }

    #[test]
    fn empty_curve_yields_default_report() {
        let report = compute_report(dec!(1_000_000), &BTreeMap::new(), 0.0, 252.0);
        assert_eq!(report, PerformanceReport::default());
    }

    #[test]
    fn steady_gains_have_zero_drawdown_and_positive_return() {
        let mut curve = BTreeMap::new();
        curve.insert(day(0), dec!(1_010_000));
        curve.insert(day(1), dec!(1_020_100));
        curve.insert(day(2), dec!(1_030_301));

        let report = compute_report(dec!(1_000_000), &curve, 0.0, 252.0);

        assert!(report.total_return > 0.0);
        assert_eq!(report.max_drawdown, 0.0);
        assert_eq!(report.max_drawdown_duration, 0);
        assert_eq!(report.profit_days, 3);
        assert_eq!(report.loss_days, 0);
        assert_eq!(report.total_days, 3);
        assert_eq!(report.return_drawdown_ratio, 0.0);
    }

    #[test]
    fn drawdown_then_recovery_tracks_duration() {
        let mut curve = BTreeMap::new();
        curve.insert(day(0), dec!(1_100_000)); // +10%
        curve.insert(day(1), dec!(990_000)); // -10% from peak, in drawdown
        curve.insert(day(2), dec!(970_000)); // still under peak, duration extends
        curve.insert(day(3), dec!(1_200_000)); // new peak, drawdown resets

        let report = compute_report(dec!(1_000_000), &curve, 0.0, 252.0);

        assert!(report.max_drawdown < 0.0);
        assert_eq!(report.max_drawdown_duration, 2);
        assert!(report.return_drawdown_ratio != 0.0);
    }

    #[test]
    fn zero_starting_cash_does_not_divide_by_zero() {
        let mut curve = BTreeMap::new();
        curve.insert(day(0), dec!(100));
        let report = compute_report(Decimal::ZERO, &curve, 0.0, 252.0);
        assert_eq!(report.total_return, 0.0);
    }
}
