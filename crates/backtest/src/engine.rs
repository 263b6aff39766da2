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

//! The Backtest Engine (§4.F): a deterministic, single-threaded driver that replays a
//! chronologically merged bar series through [`crate::matching::MatchingGateway`] and
//! [`crate::accounting::BacktestAccounting`], pumping the bus in lockstep via `EventBus::drain`
//! after each bar so every downstream snapshot (`Order`, `Trade`, `Position`, `Account`) is settled
//! before the next bar is considered.
//!
//! `matched_interval` (the interval routed to the matching gateway) defaults to the smallest
//! interval present in the supplied series; `daily_update_interval` (the mark-to-market window)
//! defaults to the largest. Both follow directly from the series itself rather than requiring the
//! caller to know the data shape up front.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use ferrum_common::bus::{BusHandle, Event, EventBus};
use ferrum_core::UnixNanos;
use ferrum_model::{Account, Bar, Exchange, Symbol};
use rust_decimal::Decimal;
use ustr::Ustr;

use crate::accounting::{BacktestAccounting, ContractParams};
use crate::error::BacktestError;
use crate::loader::sort_by_end_timestamp;
use crate::matching::MatchingGateway;

/// Owns one backtest run end to end: the matching gateway, the accounting ledger, and the equity
/// curve accumulated while replaying bars. One instance backs exactly one `Account` (§4.E).
pub struct BacktestEngine {
    bus: Arc<EventBus>,
    handle: BusHandle,
    gateway_name: Ustr,
    accounting: Arc<BacktestAccounting>,
    starting_cash: Decimal,
}

impl BacktestEngine {
    #[must_use]
    pub fn new(gateway_name: impl Into<Ustr>, accountid: impl Into<Ustr>, starting_cash: Decimal, bus: Arc<EventBus>) -> Self {
        let gateway_name = gateway_name.into();
        let handle = bus.handle();
        let accounting = BacktestAccounting::new(gateway_name, accountid, starting_cash, &bus);
        Self { bus, handle, gateway_name, accounting, starting_cash }
    }

    /// Seeds the accounting engine's per-contract commission/margin parameters. Every `vt_symbol`
    /// that trades during `run` must be registered first (§4.E).
    pub fn set_contract_params(&self, vt_symbol: String, params: ContractParams) {
        self.accounting.set_contract_params(vt_symbol, params);
    }

    #[must_use]
    pub fn account_snapshot(&self) -> Account {
        self.accounting.account_snapshot()
    }

    /// Replays `bars` to completion and returns the resulting [`ferrum_analysis::PerformanceReport`].
    ///
    /// # Errors
    ///
    /// Returns [`BacktestError::EmptySeries`] if `bars` is empty.
    pub fn run(
        &mut self,
        mut bars: Vec<Bar>,
        risk_free_rate: f64,
        annual_days: f64,
    ) -> Result<ferrum_analysis::PerformanceReport, BacktestError> {
        if bars.is_empty() {
            return Err(BacktestError::EmptySeries);
        }
        sort_by_end_timestamp(&mut bars);

        let matched_interval = bars.iter().map(|bar| bar.interval).min().expect("checked non-empty above");
        let daily_update_interval = bars.iter().map(|bar| bar.interval).max().expect("checked non-empty above");

        let mut matching = MatchingGateway::new(self.gateway_name, self.handle.clone(), matched_interval);

        let mut equity_curve: BTreeMap<UnixNanos, Decimal> = BTreeMap::new();
        let mut window_prices: HashMap<String, Decimal> = HashMap::new();
        let mut window_time: Option<UnixNanos> = None;

        for bar in &bars {
            self.handle.put(Event::Bar(*bar));

            if bar.interval == matched_interval {
                matching.set_time(bar.datetime);
                matching.on_bar(bar);
            }
            self.bus.drain();

            if bar.interval == daily_update_interval {
                if let Some(previous) = window_time {
                    if previous != bar.datetime {
                        self.flush_window(previous, &window_prices, &mut equity_curve);
                        window_prices.clear();
                    }
                }
                window_time = Some(bar.datetime);
                window_prices.insert(bar.vt_symbol(), bar.close);
            }
        }

        if let Some(last) = window_time {
            self.flush_window(last, &window_prices, &mut equity_curve);
        }

        Ok(ferrum_analysis::compute_report(self.starting_cash, &equity_curve, risk_free_rate, annual_days))
    }

    #[must_use]
    pub fn position_snapshot(&self, symbol: Symbol, exchange: Exchange) -> Option<ferrum_model::Position> {
        self.accounting.position_snapshot(symbol, exchange)
    }

    /// Marks every open position to `prices`, snapshots the resulting equity into `equity_curve`
    /// at `window_time`, and logs the window for operator visibility (§4.F step 2).
    fn flush_window(&self, window_time: UnixNanos, prices: &HashMap<String, Decimal>, equity_curve: &mut BTreeMap<UnixNanos, Decimal>) {
        self.accounting.renew_unrealized_pnl(prices);
        let account = self.accounting.account_snapshot();
        log::info!(
            "window {window_time}: equity={} cash={} margin={} unrealized_pnl={}",
            account.equity,
            account.cash,
            account.margin,
            account.unrealized_pnl
        );
        equity_curve.insert(window_time, account.equity);
    }
}

#[cfg(test)]
mod tests {
    use ferrum_model::{Direction, Exchange, Interval, Offset, OrderRequest, OrderType, Symbol};
    use rust_decimal_macros::dec;

    use super::*;

    fn bar(symbol: &str, open: Decimal, high: Decimal, low: Decimal, close: Decimal, datetime: u64) -> Bar {
        Bar {
            gateway_name: Ustr::from("BACKTEST"),
            symbol: Symbol::new(symbol),
            exchange: Exchange::Hkfe,
            datetime: UnixNanos::new(datetime),
            interval: Interval::Minute1,
            open,
            high,
            low,
            close,
            volume: dec!(100),
        }
    }

    fn contract_params() -> ContractParams {
        ContractParams { size: dec!(10), long_rate: dec!(0.0002), short_rate: dec!(0.0002), margin_rate: dec!(0.1) }
    }

    #[test]
    fn empty_series_is_rejected() {
        let bus = Arc::new(EventBus::new());
        let mut engine = BacktestEngine::new("BACKTEST", "1", dec!(1_000_000), bus);
        let err = engine.run(Vec::new(), 0.0, 252.0).unwrap_err();
        assert!(matches!(err, BacktestError::EmptySeries));
    }

    #[test]
    fn single_interval_series_drives_fill_and_equity_curve() {
        let bus = Arc::new(EventBus::new());
        let mut engine = BacktestEngine::new("BACKTEST", "1", dec!(1_000_000), bus.clone());
        engine.set_contract_params("MHI2507.HKFE".into(), contract_params());

        // Prime the matching gateway with an order before the first bar by sending it directly
        // through a throwaway gateway sharing the same bus handle (mirrors how a strategy would
        // submit via the trade engine ahead of the replay).
        let handle = bus.handle();
        let mut warmup = MatchingGateway::new("BACKTEST", handle, Interval::Minute1);
        warmup.send_order(&OrderRequest {
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            direction: Direction::Long,
            order_type: OrderType::Market,
            volume: dec!(2),
            price: dec!(0),
            trigger_price: dec!(0),
            offset: Offset::None,
            reference: "strategy1".into(),
        });
        bus.drain();
        drop(warmup);

        let bars = vec![
            bar("MHI2507", dec!(3500), dec!(3520), dec!(3490), dec!(3510), 1),
            bar("MHI2507", dec!(3510), dec!(3530), dec!(3500), dec!(3520), 2),
        ];

        let report = engine.run(bars, 0.0, 252.0).expect("non-empty series");
        assert_eq!(report.total_days, 2);
        assert!(report.start_date.is_some());
        assert!(report.end_date.is_some());
    }

    #[test]
    fn mixed_interval_series_uses_smallest_for_matching_and_largest_for_marks() {
        let bus = Arc::new(EventBus::new());
        let mut engine = BacktestEngine::new("BACKTEST", "1", dec!(1_000_000), bus);
        engine.set_contract_params("MHI2507.HKFE".into(), contract_params());

        let mut minute_bar = bar("MHI2507", dec!(3500), dec!(3520), dec!(3490), dec!(3510), 1);
        minute_bar.interval = Interval::Minute1;
        let mut daily_bar = bar("MHI2507", dec!(3500), dec!(3520), dec!(3490), dec!(3510), 1);
        daily_bar.interval = Interval::Day1;

        let report = engine.run(vec![minute_bar, daily_bar], 0.0, 252.0).expect("non-empty series");
        // Only one daily-interval window exists in this series, flushed once after the loop.
        assert_eq!(report.total_days, 1);
    }

    #[test]
    fn daily_bar_publishes_after_its_own_days_minute_bars_not_before() {
        use std::sync::Mutex;

        use ferrum_common::bus::{handler_fn, topics};

        const SECOND: u64 = 1_000_000_000;
        const DAY: u64 = 86_400 * SECOND;

        let bus = Arc::new(EventBus::new());
        let mut engine = BacktestEngine::new("BACKTEST", "1", dec!(1_000_000), bus.clone());
        engine.set_contract_params("MHI2507.HKFE".into(), contract_params());

        let seen: Arc<Mutex<Vec<Interval>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        bus.register(topics::BAR, handler_fn(move |event| {
            if let ferrum_common::bus::Event::Bar(bar) = event {
                recorder.lock().expect("lock").push(bar.interval);
            }
        }));

        // A day's worth of 1m bars (only the first, second and last matter) plus the day bar
        // covering them, followed by a second day bar so the first day's end_timestamp is
        // derivable (next start - 1s) rather than falling back to its own start.
        let minute_at_0 = bar("MHI2507", dec!(3500), dec!(3520), dec!(3490), dec!(3510), 0);
        let mut minute_at_60s = minute_at_0;
        minute_at_60s.datetime = UnixNanos::new(60 * SECOND);
        let mut minute_at_120s = minute_at_0;
        minute_at_120s.datetime = UnixNanos::new(120 * SECOND);

        let mut day1 = minute_at_0;
        day1.interval = Interval::Day1;
        day1.datetime = UnixNanos::new(0);

        let mut day2 = day1;
        day2.datetime = UnixNanos::new(DAY);

        let bars = vec![minute_at_0, minute_at_60s, minute_at_120s, day1, day2];
        engine.run(bars, 0.0, 252.0).expect("non-empty series");

        let order = seen.lock().expect("lock");
        let day1_position = order.iter().position(|i| *i == Interval::Day1).expect("day bar published");
        let last_minute_position = order.iter().rposition(|i| *i == Interval::Minute1).expect("minute bar published");
        assert!(
            day1_position > last_minute_position,
            "day bar published at index {day1_position} before its own day's last minute bar at {last_minute_position}: {order:?}"
        );
    }
}
