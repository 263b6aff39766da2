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

//! The strategy reconciliation loop (§4.H): diffs a strategy-supplied *desired plan* against the
//! OMS's current live orders, keyed by a logical `reference`, and emits the place/modify/cancel
//! requests needed to close the gap.
//!
//! Strategies never call the gateway directly. They call [`Reconciler::mark_dirty`] from their
//! `on_bar`/`on_tick`/`on_order` handlers; the reconciler coalesces repeated dirty signals into a
//! single pass via the `reconciling` latch, so a burst of events during one pass only costs one
//! extra loop iteration rather than one reconcile per event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ferrum_common::bus::{BusHandle, Event, EventBus, MessageHandler, topics};
use ferrum_execution::Oms;
use ferrum_model::{CancelRequest, Direction, Exchange, ModifyRequest, Offset, Order, OrderRequest, OrderType, Symbol};
use indexmap::IndexMap;
use rust_decimal::Decimal;

/// One entry in a strategy's desired order plan, keyed by `reference` (§4.H: "entry",
/// "stop_order", ...).
#[derive(Clone, Debug, PartialEq)]
pub struct DesiredOrder {
    pub reference: String,
    pub symbol: Symbol,
    pub exchange: Exchange,
    pub direction: Direction,
    pub order_type: OrderType,
    pub offset: Offset,
    pub volume: Decimal,
    pub price: Decimal,
    pub trigger_price: Decimal,
}

type PlanFn = dyn Fn() -> Vec<DesiredOrder> + Send + Sync;

/// Reacts to `reconcile` events by diffing `plan_fn()`'s output against the OMS's live orders
/// whose `reference` starts with `reference_prefix`, and emitting the requests needed to converge.
pub struct Reconciler {
    handler_id: String,
    bus: BusHandle,
    oms: Arc<Oms>,
    reference_prefix: String,
    dirty: AtomicBool,
    reconciling: AtomicBool,
    plan_fn: Box<PlanFn>,
}

impl Reconciler {
    /// Builds a reconciler and subscribes it to `reconcile`, once, at construction.
    ///
    /// `reference_prefix` scopes which live orders this reconciler treats as its own — a live
    /// order whose reference does not start with it is left untouched even if its `vt_symbol`
    /// overlaps the plan (another strategy or the rollover manager may own it).
    #[must_use]
    pub fn new(
        bus: &EventBus,
        oms: Arc<Oms>,
        reference_prefix: impl Into<String>,
        plan_fn: impl Fn() -> Vec<DesiredOrder> + Send + Sync + 'static,
    ) -> Arc<Self> {
        let reconciler = Arc::new(Self {
            handler_id: format!("reconciler-{}", uuid::Uuid::new_v4()),
            bus: bus.handle(),
            oms,
            reference_prefix: reference_prefix.into(),
            dirty: AtomicBool::new(false),
            reconciling: AtomicBool::new(false),
            plan_fn: Box::new(plan_fn),
        });
        bus.register(topics::RECONCILE, reconciler.clone());
        reconciler
    }

    /// Marks the plan dirty and enqueues a `reconcile` event, unless a pass is already running —
    /// in which case that pass will loop again before exiting once it notices `dirty` is set.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
        if !self.reconciling.load(Ordering::SeqCst) {
            self.bus.put(Event::Reconcile);
        }
    }

    fn run_reconcile(&self) {
        if self.reconciling.swap(true, Ordering::SeqCst) {
            return;
        }
        loop {
            self.dirty.store(false, Ordering::SeqCst);
            self.reconcile_once();
            if !self.dirty.load(Ordering::SeqCst) {
                break;
            }
        }
        self.reconciling.store(false, Ordering::SeqCst);
    }

    fn reconcile_once(&self) {
        let mut desired: IndexMap<String, DesiredOrder> = IndexMap::new();
        for order in (self.plan_fn)() {
            desired.insert(order.reference.clone(), order);
        }

        let mut existing: IndexMap<String, Order> = IndexMap::new();
        for order in self.oms.get_all_active_orders() {
            if order.reference.starts_with(&self.reference_prefix) {
                existing.insert(order.reference.clone(), order);
            }
        }

        for (reference, target) in &desired {
            match existing.get(reference) {
                None => {
                    self.bus.put(Event::OrderRequest(OrderRequest {
                        symbol: target.symbol,
                        exchange: target.exchange,
                        direction: target.direction,
                        order_type: target.order_type,
                        volume: target.volume,
                        price: target.price,
                        trigger_price: target.trigger_price,
                        offset: target.offset,
                        reference: reference.clone(),
                    }));
                }
                Some(live) => {
                    if live.price != target.price || live.volume != target.volume || live.trigger_price != target.trigger_price {
                        self.bus.put(Event::ModifyRequest(ModifyRequest {
                            orderid: live.orderid.clone(),
                            symbol: live.symbol,
                            exchange: live.exchange,
                            volume: target.volume,
                            price: target.price,
                            trigger_price: target.trigger_price,
                        }));
                    }
                }
            }
        }

        for (reference, live) in &existing {
            if !desired.contains_key(reference) {
                self.bus.put(Event::CancelRequest(CancelRequest {
                    orderid: live.orderid.clone(),
                    symbol: live.symbol,
                    exchange: live.exchange,
                }));
            }
        }
    }
}

impl MessageHandler for Reconciler {
    fn id(&self) -> &str {
        &self.handler_id
    }

    fn handle(&self, event: &Event) {
        if matches!(event, Event::Reconcile) {
            self.run_reconcile();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use ferrum_common::bus::EventBus;
    use ferrum_execution::PositionPolicy;
    use ferrum_model::{OrderStatus, Symbol};
    use rust_decimal_macros::dec;
    use ustr::Ustr;

    use super::*;

    fn live_order(reference: &str, orderid: &str, price: Decimal, volume: Decimal) -> Order {
        Order {
            gateway_name: Ustr::from("BACKTEST"),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            orderid: orderid.into(),
            broker_orderid: None,
            order_type: OrderType::Limit,
            direction: Direction::Long,
            offset: Offset::Open,
            price,
            volume,
            traded: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            status: OrderStatus::NotTraded,
            datetime: Some(ferrum_core::UnixNanos::new(1)),
            reference: reference.into(),
            trigger_price: Decimal::ZERO,
            triggered_bar: None,
        }
    }

    fn desired(reference: &str, price: Decimal, volume: Decimal) -> DesiredOrder {
        DesiredOrder {
            reference: reference.into(),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            direction: Direction::Long,
            order_type: OrderType::Limit,
            offset: Offset::Open,
            volume,
            price,
            trigger_price: Decimal::ZERO,
        }
    }

    #[test]
    fn missing_target_is_placed() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);

        let captured: Arc<Mutex<Vec<Event>>> = Arc::new(Mutex::new(Vec::new()));
        let captured_clone = captured.clone();
        bus.register(
            topics::ORDER_REQUEST,
            ferrum_common::bus::handler_fn(move |event| captured_clone.lock().unwrap().push(event.clone())),
        );

        let plan = vec![desired("entry", dec!(100), dec!(1))];
        let reconciler = Reconciler::new(&bus, oms, "strategy1:", move || plan.clone());
        reconciler.mark_dirty();
        bus.drain();

        let events = captured.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::OrderRequest(req) if req.reference == "entry"));
    }

    #[test]
    fn stale_live_order_with_no_target_is_cancelled() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);
        bus.put(Event::Order(live_order("strategy1:stop_order", "1", dec!(100), dec!(1))));
        bus.drain();

        let captured: Arc<Mutex<Vec<Event>>> = Arc::new(Mutex::new(Vec::new()));
        let captured_clone = captured.clone();
        bus.register(
            topics::CANCEL_REQUEST,
            ferrum_common::bus::handler_fn(move |event| captured_clone.lock().unwrap().push(event.clone())),
        );

        let reconciler = Reconciler::new(&bus, oms, "strategy1:", Vec::new);
        reconciler.mark_dirty();
        bus.drain();

        let events = captured.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::CancelRequest(req) if req.orderid == "1"));
    }

    #[test]
    fn changed_price_triggers_modify_not_cancel_and_place() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);
        bus.put(Event::Order(live_order("strategy1:entry", "1", dec!(100), dec!(1))));
        bus.drain();

        let captured: Arc<Mutex<Vec<Event>>> = Arc::new(Mutex::new(Vec::new()));
        let captured_clone = captured.clone();
        bus.register(
            topics::MODIFY_REQUEST,
            ferrum_common::bus::handler_fn(move |event| captured_clone.lock().unwrap().push(event.clone())),
        );

        let plan = vec![desired("entry", dec!(105), dec!(1))];
        let reconciler = Reconciler::new(&bus, oms, "strategy1:", move || plan.clone());
        reconciler.mark_dirty();
        bus.drain();

        let events = captured.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::ModifyRequest(req) if req.price == dec!(105)));
    }

    #[test]
    fn reference_prefix_ignores_orders_owned_by_other_strategies() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);
        bus.put(Event::Order(live_order("strategy2:entry", "1", dec!(100), dec!(1))));
        bus.drain();

        let captured: Arc<Mutex<Vec<Event>>> = Arc::new(Mutex::new(Vec::new()));
        let captured_clone = captured.clone();
        bus.register(
            topics::CANCEL_REQUEST,
            ferrum_common::bus::handler_fn(move |event| captured_clone.lock().unwrap().push(event.clone())),
        );

        let reconciler = Reconciler::new(&bus, oms, "strategy1:", Vec::new);
        reconciler.mark_dirty();
        bus.drain();

        assert!(captured.lock().unwrap().is_empty());
    }
}
