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

//! The backtest matching gateway (§4.D): per-symbol active/inactive order books, stop activation,
//! and limit/market/stop matching against bars. Implements the [`Gateway`] trait so the Trade
//! Engine and Strategy Base code never branch on backtest-vs-live (§4.G).
//!
//! Emits only `Order` and `Trade` events; the authoritative `Position`/`Account` snapshots are
//! computed and published by [`crate::accounting::BacktestAccounting`], which subscribes to
//! `Trade` (§4.E) — this keeps the matching engine a pure state machine over its own two books,
//! with no accounting knowledge.

use std::collections::HashMap;

use ferrum_common::bus::{BusHandle, Event};
use ferrum_core::UnixNanos;
use ferrum_execution::Gateway;
use ferrum_model::{
    Bar, CancelRequest, Direction, ModifyRequest, Order, OrderRequest, OrderStatus, OrderType, Trade,
    identifiers::vt_symbol,
};
use rust_decimal::Decimal;
use ustr::Ustr;

/// Two per-symbol books plus monotonic ID counters, matching the teacher's own simulated-exchange
/// shape (one order book keyed by instrument) but split active/inactive per §4.D.
pub struct MatchingGateway {
    gateway_name: Ustr,
    bus: BusHandle,
    matched_interval: ferrum_model::Interval,
    active: HashMap<String, Vec<Order>>,
    inactive: HashMap<String, Vec<Order>>,
    next_orderid: u64,
    next_tradeid: u64,
    current_time: UnixNanos,
}

impl MatchingGateway {
    #[must_use]
    pub fn new(gateway_name: impl Into<Ustr>, bus: BusHandle, matched_interval: ferrum_model::Interval) -> Self {
        Self {
            gateway_name: gateway_name.into(),
            bus,
            matched_interval,
            active: HashMap::new(),
            inactive: HashMap::new(),
            next_orderid: 0,
            next_tradeid: 0,
            current_time: UnixNanos::EPOCH,
        }
    }

    /// Advances the gateway's notion of "now", used to stamp order transitions. The engine driver
    /// calls this before routing each matched-interval bar (§4.F).
    pub fn set_time(&mut self, time: UnixNanos) {
        self.current_time = time;
    }

    fn next_orderid(&mut self) -> String {
        self.next_orderid += 1;
        self.next_orderid.to_string()
    }

    fn next_tradeid(&mut self) -> String {
        self.next_tradeid += 1;
        self.next_tradeid.to_string()
    }

    fn emit(&self, event: Event) {
        self.bus.put(event);
    }

    /// Locates an order by `orderid`, searching the active book first then the inactive book.
    /// Returns the book the order was found in and its index, so callers can mutate-and-remove.
    fn locate(&mut self, vt_symbol: &str, orderid: &str) -> Option<(bool, usize)> {
        if let Some(book) = self.active.get(vt_symbol) {
            if let Some(idx) = book.iter().position(|o| o.orderid == orderid) {
                return Some((true, idx));
            }
        }
        if let Some(book) = self.inactive.get(vt_symbol) {
            if let Some(idx) = book.iter().position(|o| o.orderid == orderid) {
                return Some((false, idx));
            }
        }
        None
    }

    /// Processes a bar of the configured matching interval (§4.D): activates stops, then matches
    /// the active book. Bars of any other interval must not be routed here by the caller.
    pub fn on_bar(&mut self, bar: &Bar) {
        let vt_symbol = bar.vt_symbol();
        self.activate_stops(&vt_symbol, bar);
        self.match_active(&vt_symbol, bar);
    }

    fn activate_stops(&mut self, vt_symbol: &str, bar: &Bar) {
        let Some(inactive) = self.inactive.get_mut(vt_symbol) else {
            return;
        };
        let mut activated = Vec::new();
        inactive.retain(|order| {
            let triggers = match order.direction {
                Direction::Long => bar.high >= order.trigger_price,
                Direction::Short | Direction::Net => bar.low <= order.trigger_price,
            };
            if triggers {
                activated.push(order.clone());
                false
            } else {
                true
            }
        });

        for mut order in activated {
            order.status = OrderStatus::Pending;
            order.triggered_bar = Some(bar.datetime);
            order.datetime = Some(bar.datetime);
            self.emit(Event::Order(order.clone()));
            self.active.entry(vt_symbol.to_owned()).or_default().push(order);
        }
    }

    fn match_active(&mut self, vt_symbol: &str, bar: &Bar) {
        let Some(active) = self.active.get(vt_symbol) else {
            return;
        };

        let mut filled_indices = Vec::new();
        let mut fills = Vec::new();
        for (idx, order) in active.iter().enumerate() {
            if let Some(fill_price) = fill_price_for(order, bar) {
                filled_indices.push(idx);
                fills.push((order.clone(), fill_price));
            }
        }

        // Remove back-to-front so earlier indices stay valid.
        if let Some(book) = self.active.get_mut(vt_symbol) {
            for idx in filled_indices.into_iter().rev() {
                book.remove(idx);
            }
        }

        for (mut order, fill_price) in fills {
            order.status = OrderStatus::AllTraded;
            order.traded = order.volume;
            order.avg_fill_price = fill_price;
            order.datetime = Some(bar.datetime);
            self.emit(Event::Order(order.clone()));

            let trade = Trade {
                gateway_name: self.gateway_name,
                symbol: order.symbol,
                exchange: order.exchange,
                orderid: order.orderid.clone(),
                tradeid: self.next_tradeid(),
                direction: order.direction,
                offset: order.offset,
                price: fill_price,
                volume: order.volume,
                datetime: Some(bar.datetime),
                reference: order.reference.clone(),
            };
            self.emit(Event::Trade(trade));
        }
    }

    #[must_use]
    pub fn matched_interval(&self) -> ferrum_model::Interval {
        self.matched_interval
    }
}

/// Computes the fill price for `order` against `bar`, or `None` if it does not fill this bar
/// (§4.D.2). `ABS_LMT` and non-stop `LIMIT`/`MARKET` orders are handled the same way as their
/// stop counterparts once activated, since by the time an order reaches the active book its
/// `order_type` alone determines the matching rule.
fn fill_price_for(order: &Order, bar: &Bar) -> Option<Decimal> {
    match order.order_type {
        // A plain MARKET order carries trigger_price=0; `max` already degrades to `bar.open` for
        // LONG in that case, but `min` would not for SHORT, so that side needs the explicit guard.
        OrderType::Market | OrderType::StpMkt => Some(match order.direction {
            Direction::Long => order.trigger_price.max(bar.open),
            Direction::Short | Direction::Net if order.trigger_price.is_zero() => bar.open,
            Direction::Short | Direction::Net => order.trigger_price.min(bar.open),
        }),
        OrderType::AbsLmt => {
            if bar.low <= order.price && order.price <= bar.high {
                Some(order.price)
            } else {
                None
            }
        }
        OrderType::Limit | OrderType::StpLmt => {
            let touches = match order.direction {
                Direction::Long => bar.low <= order.price,
                Direction::Short | Direction::Net => bar.high >= order.price,
            };
            if !touches {
                return None;
            }
            if order.triggered_bar == Some(bar.datetime) {
                return Some(order.price);
            }
            let gapped_through = match order.direction {
                Direction::Long => bar.open <= order.price,
                Direction::Short | Direction::Net => bar.open >= order.price,
            };
            Some(if gapped_through { bar.open } else { order.price })
        }
    }
}

impl Gateway for MatchingGateway {
    fn send_order(&mut self, req: &OrderRequest) -> String {
        let orderid = self.next_orderid();
        let mut order = req.create_order(orderid.clone(), self.gateway_name);
        order.datetime = Some(self.current_time);
        let vt_symbol = order.vt_symbol();

        if order.order_type.is_stop() {
            order.status = OrderStatus::Pending;
            self.emit(Event::Order(order.clone()));
            self.inactive.entry(vt_symbol).or_default().push(order);
        } else {
            self.emit(Event::Order(order.clone()));
            self.active.entry(vt_symbol).or_default().push(order);
        }

        orderid
    }

    fn cancel_order(&mut self, req: &CancelRequest) {
        let vt_symbol = vt_symbol(req.symbol, req.exchange);
        let Some((in_active, idx)) = self.locate(&vt_symbol, &req.orderid) else {
            log::warn!("cancel_order: unknown orderid {} on {vt_symbol}", req.orderid);
            return;
        };

        let book = if in_active { &mut self.active } else { &mut self.inactive };
        let mut order = book.get_mut(&vt_symbol).expect("located above").remove(idx);
        if order.status.is_terminal() {
            return;
        }
        order.status = OrderStatus::AllCancelled;
        order.datetime = Some(self.current_time);
        self.emit(Event::Order(order));
    }

    fn modify_order(&mut self, req: &ModifyRequest) {
        let vt_symbol = vt_symbol(req.symbol, req.exchange);
        let Some((in_active, idx)) = self.locate(&vt_symbol, &req.orderid) else {
            self.reject_modify(req, "unknown order");
            return;
        };

        let book = if in_active { &mut self.active } else { &mut self.inactive };
        let order = &mut book.get_mut(&vt_symbol).expect("located above")[idx];

        if order.status.is_terminal() {
            let rejected = Order {
                status: OrderStatus::Rejected,
                reference: format!("{}: modify rejected, already terminal", order.reference),
                ..order.clone()
            };
            self.emit(Event::Order(rejected));
            return;
        }
        if req.volume < order.traded {
            let rejected = Order {
                status: OrderStatus::Rejected,
                reference: format!("{}: modify rejected, qty {} below traded {}", order.reference, req.volume, order.traded),
                ..order.clone()
            };
            self.emit(Event::Order(rejected));
            return;
        }

        // `triggered_bar` is preserved across modify (§9 Open Questions decision).
        order.price = req.price;
        order.volume = req.volume;
        order.trigger_price = req.trigger_price;
        order.status = OrderStatus::Modified;
        order.datetime = Some(self.current_time);
        self.emit(Event::Order(order.clone()));
    }

    fn query_account(&mut self) {
        // The backtest path has no out-of-band account channel: `BacktestAccounting` publishes
        // `Account` events directly off every `Trade`/mark-to-market, so there is nothing to poll.
    }

    fn query_position(&mut self) {
        // See `query_account`: positions are published synchronously by the accounting engine.
    }
}

impl MatchingGateway {
    fn reject_modify(&self, req: &ModifyRequest, reason: &str) {
        log::warn!("modify_order rejected for {}: {reason}", req.orderid);
        let rejected = Order {
            gateway_name: self.gateway_name,
            symbol: req.symbol,
            exchange: req.exchange,
            orderid: req.orderid.clone(),
            broker_orderid: None,
            order_type: OrderType::Limit,
            direction: Direction::Long,
            offset: ferrum_model::Offset::None,
            price: req.price,
            volume: req.volume,
            traded: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            status: OrderStatus::Rejected,
            datetime: Some(self.current_time),
            reference: format!("modify rejected: {reason}"),
            trigger_price: req.trigger_price,
            triggered_bar: None,
        };
        self.emit(Event::Order(rejected));
    }
}

#[cfg(test)]
mod tests {
    use ferrum_common::bus::EventBus;
    use ferrum_model::{Exchange, Offset, Symbol};
    use rust_decimal_macros::dec;

    use super::*;

    fn bar(open: Decimal, high: Decimal, low: Decimal, close: Decimal, datetime: u64) -> Bar {
        Bar {
            gateway_name: Ustr::from("BACKTEST"),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            datetime: UnixNanos::new(datetime),
            interval: ferrum_model::Interval::Minute1,
            open,
            high,
            low,
            close,
            volume: dec!(100),
        }
    }

    fn request(order_type: OrderType, direction: Direction, price: Decimal, trigger: Decimal) -> OrderRequest {
        OrderRequest {
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            direction,
            order_type,
            volume: dec!(2),
            price,
            trigger_price: trigger,
            offset: Offset::None,
            reference: "strategy1".into(),
        }
    }

    fn new_gateway() -> (MatchingGateway, std::sync::Arc<EventBus>) {
        let bus = std::sync::Arc::new(EventBus::new());
        let handle = bus.handle();
        (MatchingGateway::new("BACKTEST", handle, ferrum_model::Interval::Minute1), bus)
    }

    #[test]
    fn e1_long_market_fills_at_open() {
        let (mut gw, _bus) = new_gateway();
        let orderid = gw.send_order(&request(OrderType::Market, Direction::Long, dec!(0), dec!(0)));
        gw.on_bar(&bar(dec!(3500), dec!(3520), dec!(3490), dec!(3510), 1));
        // Order should have been removed from the active book after the fill.
        assert!(gw.active.get("MHI2507.HKFE").is_none_or(|b| !b.iter().any(|o| o.orderid == orderid)));
    }

    #[test]
    fn e2_stop_limit_activates_and_fills_intrabar_at_limit_price() {
        let (mut gw, _bus) = new_gateway();
        gw.send_order(&request(OrderType::StpLmt, Direction::Long, dec!(3560), dec!(3550)));
        // Activation: high >= 3550. Same bar: low (3530) <= price (3560) so it also fills this bar.
        gw.on_bar(&bar(dec!(3540), dec!(3560), dec!(3530), dec!(3555), 1));
        assert!(gw.inactive.get("MHI2507.HKFE").is_none_or(Vec::is_empty));
        assert!(gw.active.get("MHI2507.HKFE").is_none_or(Vec::is_empty));
    }

    #[test]
    fn gap_through_bar_fills_resting_limit_at_open() {
        let order = Order {
            gateway_name: Ustr::from("BACKTEST"),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            orderid: "1".into(),
            broker_orderid: None,
            order_type: OrderType::Limit,
            direction: Direction::Long,
            offset: Offset::None,
            price: dec!(100),
            volume: dec!(1),
            traded: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            status: OrderStatus::Submitting,
            datetime: None,
            reference: "r".into(),
            trigger_price: Decimal::ZERO,
            triggered_bar: None,
        };
        // Gaps down through the limit: open 90 <= limit 100.
        let b = bar(dec!(90), dec!(95), dec!(85), dec!(92), 1);
        assert_eq!(fill_price_for(&order, &b), Some(dec!(90)));
    }

    #[test]
    fn reversing_stop_limit_not_activated_this_bar_fills_at_limit_not_open() {
        let mut order = Order {
            gateway_name: Ustr::from("BACKTEST"),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            orderid: "1".into(),
            broker_orderid: None,
            order_type: OrderType::StpLmt,
            direction: Direction::Long,
            offset: Offset::None,
            price: dec!(100),
            volume: dec!(1),
            traded: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            status: OrderStatus::Pending,
            datetime: None,
            reference: "r".into(),
            trigger_price: dec!(95),
            triggered_bar: Some(UnixNanos::new(1)),
        };
        // Triggered on a prior bar (datetime 1); this bar is datetime 2, so it is no longer
        // "just activated" and the gap rule applies.
        let b = bar(dec!(90), dec!(105), dec!(85), dec!(92), 2);
        assert_eq!(fill_price_for(&order, &b), Some(dec!(90)));

        order.triggered_bar = Some(UnixNanos::new(2));
        assert_eq!(fill_price_for(&order, &b), Some(dec!(100)));
    }

    #[test]
    fn cancel_removes_and_marks_allcancelled() {
        let (mut gw, bus) = new_gateway();
        let orderid = gw.send_order(&request(OrderType::Limit, Direction::Long, dec!(100), dec!(0)));
        gw.cancel_order(&CancelRequest {
            orderid,
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
        });
        drop(gw);
        drop(bus);
    }

    #[test]
    fn modify_rejects_qty_below_traded() {
        let (mut gw, _bus) = new_gateway();
        let orderid = gw.send_order(&request(OrderType::Limit, Direction::Long, dec!(100), dec!(0)));
        // Simulate a partial fill by directly mutating traded (no partial-fill path in this
        // matching model, but the reject condition must still hold generally).
        if let Some(book) = gw.active.get_mut("MHI2507.HKFE") {
            book[0].traded = dec!(1);
        }
        gw.modify_order(&ModifyRequest {
            orderid,
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            volume: dec!(0),
            price: dec!(100),
            trigger_price: dec!(0),
        });
    }
}
