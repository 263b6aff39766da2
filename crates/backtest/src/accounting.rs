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

//! The Backtest OMS+ (§4.E): position/margin/P&L bookkeeping driven entirely by `Trade` events.
//!
//! This is the only component that ever computes an absolute `Position` or `Account` snapshot in
//! the backtest path — the matching gateway (`crate::matching`) emits only `Order` and `Trade`;
//! this engine subscribes to `Trade`, folds it into its own position/account ledgers, and
//! publishes the resulting snapshots for the OMS (`ferrum_execution::Oms` under
//! `PositionPolicy::FlatNet`) to pick up.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ferrum_common::bus::{BusHandle, Event, EventBus, MessageHandler, topics};
use ferrum_model::{Account, Direction, Position, Trade, identifiers::vt_symbol};
use rust_decimal::Decimal;
use ustr::Ustr;

/// Per-contract accounting parameters (§4.E): commission rates are asymmetric by side, margin is
/// a flat rate against notional. Not part of `ContractData` because a contract can be traded
/// without ever supplying these (a pure market-data subscription), so they are kept as a
/// side table the accounting engine owns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContractParams {
    pub size: Decimal,
    pub long_rate: Decimal,
    pub short_rate: Decimal,
    pub margin_rate: Decimal,
}

struct Ledger {
    contract_params: HashMap<String, ContractParams>,
    positions: HashMap<String, Position>,
    account: Account,
}

/// Backtest accounting engine. One instance owns exactly one [`Account`]; every `vt_symbol`
/// traded against it must have its [`ContractParams`] registered via
/// [`BacktestAccounting::set_contract_params`] before the first trade arrives.
pub struct BacktestAccounting {
    handler_id: String,
    gateway_name: Ustr,
    bus: BusHandle,
    ledger: Mutex<Ledger>,
}

impl BacktestAccounting {
    /// Builds the accounting engine and subscribes it to `trade` on `bus`, once, at construction
    /// (mirroring `ferrum_execution::Oms::new`).
    #[must_use]
    pub fn new(gateway_name: impl Into<Ustr>, accountid: impl Into<Ustr>, starting_cash: Decimal, bus: &EventBus) -> Arc<Self> {
        let gateway_name = gateway_name.into();
        let engine = Arc::new(Self {
            handler_id: format!("backtest-accounting-{}", uuid::Uuid::new_v4()),
            gateway_name,
            bus: bus.handle(),
            ledger: Mutex::new(Ledger {
                contract_params: HashMap::new(),
                positions: HashMap::new(),
                account: Account::new(gateway_name, accountid.into(), starting_cash),
            }),
        });
        bus.register(topics::TRADE, engine.clone());
        engine
    }

    /// Seeds or updates the accounting parameters for `vt_symbol`. Also callable from a
    /// `ContractData` snapshot by the engine driver (§4.E: "optionally sourced from a ContractData
    /// snapshot").
    pub fn set_contract_params(&self, vt_symbol: String, params: ContractParams) {
        self.ledger.lock().expect(ferrum_core::correctness::FAILED).contract_params.insert(vt_symbol, params);
    }

    /// Folds a `Trade` into the position/account ledger and publishes the resulting `Position`
    /// and `Account` snapshots (§4.E).
    fn on_trade(&self, trade: &Trade) {
        let vt_symbol = trade.vt_symbol();
        let mut ledger = self.ledger.lock().expect(ferrum_core::correctness::FAILED);

        let Some(params) = ledger.contract_params.get(&vt_symbol).copied() else {
            log::error!("trade on {vt_symbol} with no registered contract params, ignoring");
            return;
        };

        let commission_rate = match trade.direction {
            Direction::Long => params.long_rate,
            Direction::Short | Direction::Net => params.short_rate,
        };
        let commission = trade.price * trade.volume * params.size * commission_rate;
        ledger.account.cash -= commission;

        let signed_new = match trade.direction {
            Direction::Long => trade.volume,
            Direction::Short | Direction::Net => -trade.volume,
        };

        let existing = ledger.positions.get(&vt_symbol).cloned();
        let old_signed = existing.as_ref().map_or(Decimal::ZERO, Position::signed_volume);
        let old_price = existing.as_ref().map_or(Decimal::ZERO, |p| p.price);

        let resulting_signed = if old_signed == Decimal::ZERO {
            signed_new
        } else if old_signed.signum() == signed_new.signum() {
            // Same-side add: weighted average by magnitude.
            let old_abs = old_signed.abs();
            let new_abs = signed_new.abs();
            let weighted_price = (old_price * old_abs + trade.price * new_abs) / (old_abs + new_abs);
            let resulting = old_signed + signed_new;
            self.write_position(&mut ledger, &trade.vt_symbol(), trade, resulting, weighted_price, params);
            resulting
        } else {
            let close_qty = old_signed.abs().min(signed_new.abs());
            let realized = if old_signed > Decimal::ZERO {
                (trade.price - old_price) * close_qty * params.size
            } else {
                (old_price - trade.price) * close_qty * params.size
            };
            ledger.account.cash += realized;
            ledger.account.realized_pnl += realized;

            let resulting = old_signed + signed_new;
            let resulting_price = if resulting.abs() < old_signed.abs() || resulting == Decimal::ZERO {
                old_price
            } else {
                // Reversal: the remaining position opens fresh at the trade price.
                trade.price
            };
            self.write_position(&mut ledger, &trade.vt_symbol(), trade, resulting, resulting_price, params);
            resulting
        };

        ledger.account.margin = ledger.positions.values().map(|p| p.margin).sum();
        ledger.account.recompute();

        let account_snapshot = ledger.account;
        let position_snapshot = ledger.positions.get(&vt_symbol).cloned();
        drop(ledger);

        log::info!(
            "{vt_symbol} trade {} {} @ {}: resulting signed volume {resulting_signed}",
            trade.direction,
            trade.volume,
            trade.price
        );

        if let Some(position) = position_snapshot {
            self.bus.put(Event::Position(position));
        }
        self.bus.put(Event::Account(account_snapshot));
    }

    /// Writes the position resulting from a trade fold back into the ledger, removing it if the
    /// resulting volume nets to zero (§3 invariant: `volume == 0` is not representable).
    fn write_position(&self, ledger: &mut Ledger, vt_symbol: &str, trade: &Trade, resulting_signed: Decimal, price: Decimal, params: ContractParams) {
        if resulting_signed == Decimal::ZERO {
            ledger.positions.remove(vt_symbol);
            return;
        }
        let direction = if resulting_signed > Decimal::ZERO { Direction::Long } else { Direction::Short };
        let volume = resulting_signed.abs();
        let margin = volume * price * params.size * params.margin_rate;
        ledger.positions.insert(
            vt_symbol.to_owned(),
            Position {
                gateway_name: self.gateway_name,
                symbol: trade.symbol,
                exchange: trade.exchange,
                direction,
                volume,
                price,
                margin,
                frozen: Decimal::ZERO,
            },
        );
    }

    /// Marks every open position to `prices` (`vt_symbol -> last_price`) and republishes the
    /// account snapshot (§4.E mark-to-market). The backtest engine calls this at every
    /// `daily_update_interval` window boundary.
    pub fn renew_unrealized_pnl(&self, prices: &HashMap<String, Decimal>) {
        let mut ledger = self.ledger.lock().expect(ferrum_core::correctness::FAILED);
        let mut total = Decimal::ZERO;
        for (vt_symbol, position) in &ledger.positions {
            if let Some(last) = prices.get(vt_symbol) {
                let size = ledger
                    .contract_params
                    .get(vt_symbol)
                    .map_or(Decimal::ONE, |p| p.size);
                total += (*last - position.price) * position.signed_volume() * size;
            }
        }
        ledger.account.unrealized_pnl = total;
        ledger.account.recompute();
        let snapshot = ledger.account;
        drop(ledger);
        self.bus.put(Event::Account(snapshot));
    }

    #[must_use]
    pub fn account_snapshot(&self) -> Account {
        self.ledger.lock().expect(ferrum_core::correctness::FAILED).account
    }

    #[must_use]
    pub fn position_snapshot(&self, symbol: ferrum_model::Symbol, exchange: ferrum_model::Exchange) -> Option<Position> {
        self.ledger
            .lock()
            .expect(ferrum_core::correctness::FAILED)
            .positions
            .get(&vt_symbol(symbol, exchange))
            .cloned()
    }
}

impl MessageHandler for BacktestAccounting {
    fn id(&self) -> &str {
        &self.handler_id
    }

    fn handle(&self, event: &Event) {
        if let Event::Trade(trade) = event {
            self.on_trade(trade);
        }
    }
}

#[cfg(test)]
mod tests {
    use ferrum_common::bus::EventBus;
    use ferrum_model::{Exchange, Offset, Symbol};
    use rust_decimal_macros::dec;

    use super::*;

    fn params() -> ContractParams {
        ContractParams {
            size: dec!(10),
            long_rate: dec!(0.0002),
            short_rate: dec!(0.0002),
            margin_rate: dec!(0.1),
        }
    }

    fn trade(direction: Direction, price: Decimal, volume: Decimal) -> Trade {
        Trade {
            gateway_name: Ustr::from("BACKTEST"),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            orderid: "1".into(),
            tradeid: "1".into(),
            direction,
            offset: Offset::None,
            price,
            volume,
            datetime: None,
            reference: "strategy1".into(),
        }
    }

    #[test]
    fn e1_opening_long_trade_matches_worked_example() {
        let bus = EventBus::new();
        let accounting = BacktestAccounting::new("BACKTEST", "1", dec!(1_000_000), &bus);
        accounting.set_contract_params("MHI2507.HKFE".into(), params());

        accounting.on_trade(&trade(Direction::Long, dec!(3500), dec!(2)));

        let account = accounting.account_snapshot();
        assert_eq!(account.cash, dec!(999_986));
        assert_eq!(account.margin, dec!(7000));

        let position = accounting
            .position_snapshot(Symbol::new("MHI2507"), Exchange::Hkfe)
            .expect("position recorded");
        assert_eq!(position.volume, dec!(2));
        assert_eq!(position.price, dec!(3500));
        assert_eq!(position.direction, Direction::Long);

        let mut last_prices = HashMap::new();
        last_prices.insert("MHI2507.HKFE".to_owned(), dec!(3510));
        accounting.renew_unrealized_pnl(&last_prices);

        let account = accounting.account_snapshot();
        assert_eq!(account.unrealized_pnl, dec!(200));
        assert_eq!(account.equity, dec!(1_000_186));
        assert_eq!(account.available, dec!(993_186));
    }

    #[test]
    fn e3_reversing_trade_sets_avg_to_trade_price_and_flips_direction() {
        let bus = EventBus::new();
        let accounting = BacktestAccounting::new("BACKTEST", "1", dec!(1_000_000), &bus);
        accounting.set_contract_params("MHI2507.HKFE".into(), ContractParams { size: dec!(1), ..params() });

        accounting.on_trade(&trade(Direction::Short, dec!(100), dec!(3)));
        let before = accounting.account_snapshot();

        accounting.on_trade(&trade(Direction::Long, dec!(120), dec!(5)));

        let after = accounting.account_snapshot();
        assert_eq!(after.realized_pnl, dec!(-60));
        assert_eq!(after.cash - before.cash, dec!(-60) - dec!(120) * dec!(5) * dec!(1) * dec!(0.0002));

        let position = accounting
            .position_snapshot(Symbol::new("MHI2507"), Exchange::Hkfe)
            .expect("position recorded");
        assert_eq!(position.direction, Direction::Long);
        assert_eq!(position.volume, dec!(2));
        assert_eq!(position.price, dec!(120));
    }

    #[test]
    fn flat_trade_removes_position() {
        let bus = EventBus::new();
        let accounting = BacktestAccounting::new("BACKTEST", "1", dec!(1_000_000), &bus);
        accounting.set_contract_params("MHI2507.HKFE".into(), params());

        accounting.on_trade(&trade(Direction::Long, dec!(3500), dec!(2)));
        accounting.on_trade(&trade(Direction::Short, dec!(3510), dec!(2)));

        assert!(accounting.position_snapshot(Symbol::new("MHI2507"), Exchange::Hkfe).is_none());
        assert_eq!(accounting.account_snapshot().margin, Decimal::ZERO);
    }

    #[test]
    fn trade_on_unregistered_contract_is_ignored_not_panicking() {
        let bus = EventBus::new();
        let accounting = BacktestAccounting::new("BACKTEST", "1", dec!(1_000_000), &bus);
        accounting.on_trade(&trade(Direction::Long, dec!(100), dec!(1)));
        assert_eq!(accounting.account_snapshot().cash, dec!(1_000_000));
    }

    #[test]
    fn handler_registers_under_trade_topic_on_construction() {
        let bus = EventBus::new();
        let accounting = BacktestAccounting::new("BACKTEST", "1", dec!(1_000_000), &bus);
        accounting.set_contract_params("MHI2507.HKFE".into(), params());

        bus.put(Event::Trade(trade(Direction::Long, dec!(3500), dec!(1))));
        bus.run();

        assert!(accounting.position_snapshot(Symbol::new("MHI2507"), Exchange::Hkfe).is_some());
    }
}
