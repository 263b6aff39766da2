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

//! The Order Management System (§4.C): a consistent, queryable snapshot of orders, trades,
//! positions, accounts, contracts and quotes, kept current by subscribing to the bus.
//!
//! Mutated only from the bus worker thread (§5); `DashMap` is used for the backing storage so
//! `Oms` itself is `Send + Sync` without a crate-wide lock, matching readers on other threads
//! (the Adapter) taking ordinary, per-map-shard-consistent reads between event boundaries.

use std::sync::Arc;

use dashmap::DashMap;
use ferrum_common::bus::{Event, EventBus, MessageHandler, topics};
use ferrum_model::{Account, ContractData, Order, Position, QuoteData, Tick, Trade};
use ferrum_model::{Direction, Exchange, Symbol};
use rust_decimal::Decimal;

/// How incoming [`Position`] events are folded into the OMS's position map (§4.C).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionPolicy {
    /// The incoming event is the full current position; it overwrites the map entry outright.
    /// This is what the Backtest OMS+ emits (it already computed the absolute position).
    FlatNet,
    /// The incoming event's signed volume is a *delta* contributed to the existing position;
    /// zero nets to removal, a sign flip flips `direction`. Used by venues that report
    /// incremental position updates rather than full snapshots.
    Netting,
}

/// Keys the netting map by symbol only (not direction), since direction is derived from the
/// running signed total rather than carried by the caller.
fn netting_key(gateway_name: &str, symbol: Symbol, exchange: Exchange) -> String {
    format!("{gateway_name}.{}", ferrum_model::identifiers::vt_symbol(symbol, exchange))
}

pub struct Oms {
    handler_id: String,
    position_policy: PositionPolicy,
    ticks: DashMap<String, Tick>,
    orders: DashMap<String, Order>,
    active_orders: DashMap<String, Order>,
    trades: DashMap<String, Trade>,
    positions: DashMap<String, Position>,
    accounts: DashMap<String, Account>,
    contracts: DashMap<String, ContractData>,
    quotes: DashMap<String, QuoteData>,
    active_quotes: DashMap<String, QuoteData>,
}

impl Oms {
    /// Builds an OMS and subscribes it to every topic it consumes (`tick`, `order`, `trade`,
    /// `position`, `account`, `contract`, `quote`) against `bus`, once, at construction — not
    /// re-wired per call (§4.C).
    #[must_use]
    pub fn new(bus: &EventBus, position_policy: PositionPolicy) -> Arc<Self> {
        let oms = Arc::new(Self {
            handler_id: format!("oms-{}", uuid::Uuid::new_v4()),
            position_policy,
            ticks: DashMap::new(),
            orders: DashMap::new(),
            active_orders: DashMap::new(),
            trades: DashMap::new(),
            positions: DashMap::new(),
            accounts: DashMap::new(),
            contracts: DashMap::new(),
            quotes: DashMap::new(),
            active_quotes: DashMap::new(),
        });
        for topic in [
            topics::TICK,
            topics::ORDER,
            topics::TRADE,
            topics::POSITION,
            topics::ACCOUNT,
            topics::CONTRACT,
            topics::QUOTE,
        ] {
            bus.register(topic, oms.clone());
        }
        oms
    }

    fn on_tick(&self, tick: Tick) {
        self.ticks.insert(tick.vt_symbol(), tick);
    }

    fn on_order(&self, order: Order) {
        let key = order.vt_orderid();
        if order.is_active() {
            self.active_orders.insert(key.clone(), order.clone());
        } else {
            self.active_orders.remove(&key);
        }
        self.orders.insert(key, order);
    }

    fn on_trade(&self, trade: Trade) {
        self.trades.insert(trade.vt_tradeid(), trade);
    }

    fn on_position(&self, position: Position) {
        match self.position_policy {
            PositionPolicy::FlatNet => {
                let key = position.vt_positionid();
                if position.volume.is_zero() {
                    self.positions.remove(&key);
                } else {
                    self.positions.insert(key, position);
                }
            }
            PositionPolicy::Netting => {
                let key = netting_key(position.gateway_name.as_str(), position.symbol, position.exchange);
                let delta = position.signed_volume();
                let existing_signed = self.positions.get(&key).map(|p| p.signed_volume()).unwrap_or(Decimal::ZERO);
                let new_signed = existing_signed + delta;
                if new_signed.is_zero() {
                    self.positions.remove(&key);
                } else {
                    let direction = if new_signed > Decimal::ZERO { Direction::Long } else { Direction::Short };
                    self.positions.insert(
                        key,
                        Position {
                            direction,
                            volume: new_signed.abs(),
                            ..position
                        },
                    );
                }
            }
        }
    }

    fn on_account(&self, account: Account) {
        self.accounts.insert(account.vt_accountid(), account);
    }

    fn on_contract(&self, contract: ContractData) {
        self.contracts.insert(contract.vt_symbol(), contract);
    }

    fn on_quote(&self, quote: QuoteData) {
        let key = quote.vt_quoteid();
        if quote.is_active() {
            self.active_quotes.insert(key.clone(), quote.clone());
        } else {
            self.active_quotes.remove(&key);
        }
        self.quotes.insert(key, quote);
    }

    // -- Accessors (§4.C `get_*` / `get_all_*` / `get_all_active_*`) -------------------------

    #[must_use]
    pub fn get_tick(&self, vt_symbol: &str) -> Option<Tick> {
        self.ticks.get(vt_symbol).map(|e| *e.value())
    }

    #[must_use]
    pub fn get_order(&self, vt_orderid: &str) -> Option<Order> {
        self.orders.get(vt_orderid).map(|e| e.value().clone())
    }

    #[must_use]
    pub fn get_trade(&self, vt_tradeid: &str) -> Option<Trade> {
        self.trades.get(vt_tradeid).map(|e| e.value().clone())
    }

    #[must_use]
    pub fn get_position(&self, vt_positionid: &str) -> Option<Position> {
        self.positions.get(vt_positionid).map(|e| e.value().clone())
    }

    #[must_use]
    pub fn get_account(&self, vt_accountid: &str) -> Option<Account> {
        self.accounts.get(vt_accountid).map(|e| e.value().clone())
    }

    #[must_use]
    pub fn get_contract(&self, vt_symbol: &str) -> Option<ContractData> {
        self.contracts.get(vt_symbol).map(|e| e.value().clone())
    }

    #[must_use]
    pub fn get_quote(&self, vt_quoteid: &str) -> Option<QuoteData> {
        self.quotes.get(vt_quoteid).map(|e| e.value().clone())
    }

    #[must_use]
    pub fn get_all_orders(&self) -> Vec<Order> {
        self.orders.iter().map(|e| e.value().clone()).collect()
    }

    #[must_use]
    pub fn get_all_active_orders(&self) -> Vec<Order> {
        self.active_orders.iter().map(|e| e.value().clone()).collect()
    }

    #[must_use]
    pub fn get_all_trades(&self) -> Vec<Trade> {
        self.trades.iter().map(|e| e.value().clone()).collect()
    }

    #[must_use]
    pub fn get_all_positions(&self) -> Vec<Position> {
        self.positions.iter().map(|e| e.value().clone()).collect()
    }

    #[must_use]
    pub fn get_all_accounts(&self) -> Vec<Account> {
        self.accounts.iter().map(|e| e.value().clone()).collect()
    }

    #[must_use]
    pub fn get_all_quotes(&self) -> Vec<QuoteData> {
        self.quotes.iter().map(|e| e.value().clone()).collect()
    }

    #[must_use]
    pub fn get_all_active_quotes(&self) -> Vec<QuoteData> {
        self.active_quotes.iter().map(|e| e.value().clone()).collect()
    }

    /// Orders sorted by `datetime` ascending, skipping those with a null `datetime`, restricted
    /// to the inclusive `[start, end]` range when given, keeping the *last* `limit` entries after
    /// range filtering (§4.C contract; E6).
    #[must_use]
    pub fn filter_orders(
        &self,
        limit: Option<usize>,
        start: Option<ferrum_core::UnixNanos>,
        end: Option<ferrum_core::UnixNanos>,
    ) -> Vec<Order> {
        let mut matched: Vec<Order> = self
            .orders
            .iter()
            .filter_map(|entry| {
                let order = entry.value().clone();
                let dt = order.datetime?;
                if let Some(start) = start {
                    if dt < start {
                        return None;
                    }
                }
                if let Some(end) = end {
                    if dt > end {
                        return None;
                    }
                }
                Some(order)
            })
            .collect();
        matched.sort_by_key(|o| o.datetime.expect("filtered to Some above"));
        if let Some(limit) = limit {
            let len = matched.len();
            if len > limit {
                matched.drain(0..len - limit);
            }
        }
        matched
    }
}

impl MessageHandler for Oms {
    fn id(&self) -> &str {
        &self.handler_id
    }

    fn handle(&self, event: &Event) {
        match event {
            Event::Tick(tick) => self.on_tick(*tick),
            Event::Order(order) => self.on_order(order.clone()),
            Event::Trade(trade) => self.on_trade(trade.clone()),
            Event::Position(position) => self.on_position(position.clone()),
            Event::Account(account) => self.on_account(*account),
            Event::Contract(contract) => self.on_contract(contract.clone()),
            Event::Quote(quote) => self.on_quote(quote.clone()),
            Event::Bar(_) | Event::Log(_) | Event::OrderRequest(_) | Event::CancelRequest(_) | Event::ModifyRequest(_)
            | Event::QuoteRequest(_) | Event::Reconcile | Event::Command(_) | Event::Timer(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use ferrum_core::UnixNanos;
    use ferrum_model::{Exchange, OrderStatus, OrderType};
    use rust_decimal_macros::dec;
    use ustr::Ustr;

    use super::*;

    fn sample_order(orderid: &str, datetime: Option<u64>, status: OrderStatus) -> Order {
        Order {
            gateway_name: Ustr::from("BACKTEST"),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            orderid: orderid.into(),
            broker_orderid: None,
            order_type: OrderType::Limit,
            direction: Direction::Long,
            offset: ferrum_model::Offset::None,
            price: dec!(3500),
            volume: dec!(1),
            traded: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            status,
            datetime: datetime.map(UnixNanos::new),
            reference: "strategy1".into(),
            trigger_price: Decimal::ZERO,
            triggered_bar: None,
        }
    }

    #[test]
    fn active_orders_tracked_separately_from_terminal() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);
        oms.on_order(sample_order("1", Some(1), OrderStatus::Submitting));
        assert_eq!(oms.get_all_active_orders().len(), 1);

        oms.on_order(sample_order("1", Some(2), OrderStatus::AllTraded));
        assert_eq!(oms.get_all_active_orders().len(), 0);
        assert_eq!(oms.get_all_orders().len(), 1);
    }

    #[test]
    fn filter_orders_returns_last_n_in_range() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);
        for (id, t) in [("1", 1), ("2", 2), ("3", 3), ("4", 4), ("5", 5)] {
            oms.on_order(sample_order(id, Some(t), OrderStatus::NotTraded));
        }
        // No datetime orders are skipped entirely.
        oms.on_order(sample_order("6", None, OrderStatus::NotTraded));

        let result = oms.filter_orders(Some(2), Some(UnixNanos::new(2)), Some(UnixNanos::new(4)));
        let ids: Vec<&str> = result.iter().map(|o| o.orderid.as_str()).collect();
        assert_eq!(ids, vec!["3", "4"]);
    }

    #[test]
    fn flat_net_overwrites_and_removes_on_zero() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);
        let pos = Position {
            gateway_name: Ustr::from("BACKTEST"),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            direction: Direction::Long,
            volume: dec!(2),
            price: dec!(3500),
            margin: dec!(7000),
            frozen: Decimal::ZERO,
        };
        oms.on_position(pos.clone());
        assert_eq!(oms.get_all_positions().len(), 1);

        oms.on_position(Position { volume: Decimal::ZERO, ..pos });
        assert_eq!(oms.get_all_positions().len(), 0);
    }

    #[test]
    fn netting_update_flips_direction_on_reversal() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::Netting);
        let short_delta = Position {
            gateway_name: Ustr::from("BACKTEST"),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            direction: Direction::Short,
            volume: dec!(3),
            price: dec!(100),
            margin: Decimal::ZERO,
            frozen: Decimal::ZERO,
        };
        oms.on_position(short_delta);

        let long_delta = Position {
            gateway_name: Ustr::from("BACKTEST"),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            direction: Direction::Long,
            volume: dec!(5),
            price: dec!(120),
            margin: Decimal::ZERO,
            frozen: Decimal::ZERO,
        };
        oms.on_position(long_delta);

        let positions = oms.get_all_positions();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].direction, Direction::Long);
        assert_eq!(positions[0].volume, dec!(2));
    }
}
