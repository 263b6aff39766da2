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

//! The Rollover Manager (§4.J): migrates a position from an expiring contract to its successor
//! through a small phase state machine, driven entirely by `Order`/`Position` events rather than
//! synchronous gateway calls, so it composes with both the backtest and a future live gateway.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use ferrum_common::bus::{BusHandle, CommandEvent, Event, EventBus, MessageHandler, topics};
use ferrum_execution::Oms;
use ferrum_model::{CancelRequest, Direction, Offset, Order, OrderRequest, OrderStatus, OrderType, Position, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `hedged` opens the new leg before closing the old one (briefly double exposed); `flat` closes
/// first (briefly flat).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolloverMode {
    Hedged,
    Flat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RolloverPhase {
    Idle,
    Cancel,
    WaitCancel,
    AwaitPos,
    Issue,
    WaitAcks,
    Done,
    Failed,
}

/// A read-only snapshot of the manager's in-flight task, for introspection (§10.6: the Rollover
/// Manager's in-flight task is exposed read-only to the Engine<->Hub adapter). `None` when idle.
#[derive(Clone, Debug, Serialize)]
pub struct RolloverStatus {
    pub symbol_group: String,
    pub old: String,
    pub new: String,
    pub mode: RolloverMode,
    pub phase: RolloverPhase,
}

/// `rollover {symbol_group, old, new, mode}` command payload (§4.J).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RolloverCommand {
    pub symbol_group: String,
    pub old: String,
    pub new: String,
    pub mode: RolloverMode,
}

struct Task {
    phase: RolloverPhase,
    symbol_group: String,
    old: String,
    new: String,
    mode: RolloverMode,
    seen_non_allcancelled: bool,
    pending_cancel: HashSet<String>,
    legs_needed: Vec<String>,
    legs_acked: HashSet<String>,
}

/// Drives one rollover at a time through `IDLE -> CANCEL -> WAIT_CANCEL -> AWAIT_POS -> ISSUE ->
/// WAIT_ACKS -> DONE|FAILED`.
pub struct RolloverManager {
    handler_id: String,
    bus: BusHandle,
    oms: Arc<Oms>,
    task: Mutex<Option<Task>>,
    in_progress: AtomicBool,
}

impl RolloverManager {
    #[must_use]
    pub fn new(bus: &EventBus, oms: Arc<Oms>) -> Arc<Self> {
        let manager = Arc::new(Self {
            handler_id: format!("rollover-{}", uuid::Uuid::new_v4()),
            bus: bus.handle(),
            oms,
            task: Mutex::new(None),
            in_progress: AtomicBool::new(false),
        });
        for topic in [topics::COMMAND, topics::ORDER, topics::POSITION] {
            bus.register(topic, manager.clone());
        }
        manager
    }

    #[must_use]
    pub fn phase(&self) -> RolloverPhase {
        self.task.lock().expect(ferrum_core::correctness::FAILED).as_ref().map_or(RolloverPhase::Idle, |t| t.phase)
    }

    /// A read-only snapshot of the in-flight rollover task, if one is running (§10.6).
    #[must_use]
    pub fn status(&self) -> Option<RolloverStatus> {
        self.task.lock().expect(ferrum_core::correctness::FAILED).as_ref().map(|task| RolloverStatus {
            symbol_group: task.symbol_group.clone(),
            old: task.old.clone(),
            new: task.new.clone(),
            mode: task.mode,
            phase: task.phase,
        })
    }

    fn handle_command(&self, command: &CommandEvent) {
        if command.cmd != "rollover" {
            return;
        }
        match serde_json::from_value::<RolloverCommand>(command.data.clone()) {
            Ok(cmd) => self.start_rollover(cmd),
            Err(err) => log::error!("dropping malformed rollover command: {err}"),
        }
    }

    fn start_rollover(&self, cmd: RolloverCommand) {
        let mut guard = self.task.lock().expect(ferrum_core::correctness::FAILED);
        if let Some(existing) = guard.as_ref() {
            if !matches!(existing.phase, RolloverPhase::Done | RolloverPhase::Failed) {
                log::warn!("rollover already in progress for group {}, dropping new request", cmd.symbol_group);
                return;
            }
        }

        let impacted: Vec<Order> = self
            .oms
            .get_all_active_orders()
            .into_iter()
            .filter(|o| (o.symbol.as_str() == cmd.old || o.symbol.as_str() == cmd.new) && !o.reference.starts_with("ROLL:"))
            .collect();

        let mut task = Task {
            phase: RolloverPhase::Cancel,
            symbol_group: cmd.symbol_group,
            old: cmd.old,
            new: cmd.new,
            mode: cmd.mode,
            seen_non_allcancelled: false,
            pending_cancel: impacted.iter().map(|o| o.orderid.clone()).collect(),
            legs_needed: Vec::new(),
            legs_acked: HashSet::new(),
        };

        for order in &impacted {
            self.bus.put(Event::CancelRequest(CancelRequest {
                orderid: order.orderid.clone(),
                symbol: order.symbol,
                exchange: order.exchange,
            }));
        }
        task.phase = RolloverPhase::WaitCancel;

        if task.pending_cancel.is_empty() {
            self.advance_to_await_pos(&mut task);
        }
        *guard = Some(task);
    }

    fn on_order(&self, order: &Order) {
        let mut guard = self.task.lock().expect(ferrum_core::correctness::FAILED);
        let Some(task) = guard.as_mut() else { return };

        match task.phase {
            RolloverPhase::WaitCancel => {
                if (order.symbol.as_str() == task.old || order.symbol.as_str() == task.new) && order.status.is_terminal() && task.pending_cancel.remove(&order.orderid) {
                    if order.status != OrderStatus::AllCancelled {
                        task.seen_non_allcancelled = true;
                    }
                    if task.pending_cancel.is_empty() {
                        self.advance_to_await_pos(task);
                    }
                }
            }
            RolloverPhase::WaitAcks => {
                if task.legs_needed.contains(&order.reference) {
                    if order.status == OrderStatus::Rejected {
                        log::error!("rollover {} leg {} rejected, failing", task.symbol_group, order.reference);
                        task.phase = RolloverPhase::Failed;
                    } else {
                        task.legs_acked.insert(order.reference.clone());
                        if task.legs_acked.len() == task.legs_needed.len() {
                            log::info!("rollover {} done: both legs acked", task.symbol_group);
                            task.phase = RolloverPhase::Done;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn on_position(&self, position: &Position) {
        let mut guard = self.task.lock().expect(ferrum_core::correctness::FAILED);
        let Some(task) = guard.as_mut() else { return };
        if task.phase == RolloverPhase::AwaitPos && position.symbol.as_str() == task.old {
            self.issue_legs(task, Some(position.clone()));
        }
    }

    fn find_old_position(&self, old: &str) -> Option<Position> {
        self.oms.get_all_positions().into_iter().find(|p| p.symbol.as_str() == old)
    }

    fn advance_to_await_pos(&self, task: &mut Task) {
        task.phase = RolloverPhase::AwaitPos;
        let position = self.find_old_position(&task.old);
        self.issue_legs(task, position);
    }

    /// Decides AWAIT_POS -> ISSUE|DONE|AWAIT_POS per §4.J step 4, then emits the two legs and
    /// moves to WAIT_ACKS if a position was found.
    fn issue_legs(&self, task: &mut Task, position: Option<Position>) {
        let Some(position) = position else {
            if task.seen_non_allcancelled {
                // A fill happened during cancellation but the resulting position hasn't been
                // observed yet; stay in AWAIT_POS for the out-of-order event.
                task.phase = RolloverPhase::AwaitPos;
            } else {
                log::info!("rollover {} done: all cancelled & no position", task.symbol_group);
                task.phase = RolloverPhase::Done;
            }
            return;
        };

        task.phase = RolloverPhase::Issue;
        let open_reference = format!("ROLL:{}:{}->{}:OPEN", task.symbol_group, task.old, task.new);
        let close_reference = format!("ROLL:{}:{}->{}:CLOSE", task.symbol_group, task.old, task.new);

        let open_request = OrderRequest {
            symbol: Symbol::new(&task.new),
            exchange: position.exchange,
            direction: position.direction,
            order_type: OrderType::Market,
            volume: position.volume,
            price: Decimal::ZERO,
            trigger_price: Decimal::ZERO,
            offset: Offset::Open,
            reference: open_reference.clone(),
        };
        let close_request = OrderRequest {
            symbol: Symbol::new(&task.old),
            exchange: position.exchange,
            direction: opposite(position.direction),
            order_type: OrderType::Market,
            volume: position.volume,
            price: Decimal::ZERO,
            trigger_price: Decimal::ZERO,
            offset: Offset::Close,
            reference: close_reference.clone(),
        };

        let (first, second, first_reference, second_reference) = match task.mode {
            RolloverMode::Hedged => (open_request, close_request, open_reference, close_reference),
            RolloverMode::Flat => (close_request, open_request, close_reference, open_reference),
        };

        self.bus.put(Event::OrderRequest(first));
        self.bus.put(Event::OrderRequest(second));
        task.legs_needed = vec![first_reference, second_reference];
        task.legs_acked.clear();
        task.phase = RolloverPhase::WaitAcks;
    }
}

fn opposite(direction: Direction) -> Direction {
    match direction {
        Direction::Long => Direction::Short,
        Direction::Short => Direction::Long,
        Direction::Net => Direction::Net,
    }
}

impl MessageHandler for RolloverManager {
    fn id(&self) -> &str {
        &self.handler_id
    }

    fn handle(&self, event: &Event) {
        // `in_progress` is not strictly needed for correctness (the task mutex already
        // serializes phase transitions) but keeps `start_rollover` from racing a concurrent
        // command arriving on another bus worker in a future multi-worker deployment.
        let _guard = self.in_progress.load(Ordering::SeqCst);
        match event {
            Event::Command(command) => self.handle_command(command),
            Event::Order(order) => self.on_order(order),
            Event::Position(position) => self.on_position(position),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use ferrum_common::bus::EventBus;
    use ferrum_execution::PositionPolicy;
    use ferrum_model::{Exchange, OrderType as OT, Symbol};
    use rust_decimal_macros::dec;
    use ustr::Ustr;

    use super::*;

    fn order(symbol: &str, orderid: &str, status: OrderStatus, reference: &str) -> Order {
        Order {
            gateway_name: Ustr::from("BACKTEST"),
            symbol: Symbol::new(symbol),
            exchange: Exchange::Hkfe,
            orderid: orderid.into(),
            broker_orderid: None,
            order_type: OT::Limit,
            direction: Direction::Long,
            offset: Offset::Open,
            price: dec!(100),
            volume: dec!(1),
            traded: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            status,
            datetime: Some(ferrum_core::UnixNanos::new(1)),
            reference: reference.into(),
            trigger_price: Decimal::ZERO,
            triggered_bar: None,
        }
    }

    fn position(symbol: &str, direction: Direction, volume: Decimal) -> Position {
        Position {
            gateway_name: Ustr::from("BACKTEST"),
            symbol: Symbol::new(symbol),
            exchange: Exchange::Hkfe,
            direction,
            volume,
            price: dec!(100),
            margin: dec!(10),
            frozen: Decimal::ZERO,
        }
    }

    #[test]
    fn no_active_orders_and_no_position_completes_immediately() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);
        let manager = RolloverManager::new(&bus, oms);

        manager.handle(&Event::Command(CommandEvent {
            cmd: "rollover".into(),
            data: serde_json::json!({"symbol_group": "G1", "old": "MHI2507", "new": "MHI2508", "mode": "hedged"}),
        }));

        assert_eq!(manager.phase(), RolloverPhase::Done);
    }

    #[test]
    fn active_orders_are_cancelled_then_position_issues_both_legs() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);

        bus.put(Event::Order(order("MHI2507", "1", OrderStatus::NotTraded, "strategy1")));
        bus.drain();

        let manager = RolloverManager::new(&bus, oms.clone());
        manager.handle(&Event::Command(CommandEvent {
            cmd: "rollover".into(),
            data: serde_json::json!({"symbol_group": "G1", "old": "MHI2507", "new": "MHI2508", "mode": "hedged"}),
        }));
        assert_eq!(manager.phase(), RolloverPhase::WaitCancel);

        manager.handle(&Event::Order(order("MHI2507", "1", OrderStatus::AllCancelled, "strategy1")));
        // No old position yet: done (no fills observed, no position).
        assert_eq!(manager.phase(), RolloverPhase::Done);

        bus.put(Event::Position(position("MHI2507", Direction::Long, dec!(2))));
        bus.drain();
        oms.get_all_positions(); // sanity: OMS tracked it too, independent of the manager's own lookup

        manager.handle(&Event::Command(CommandEvent {
            cmd: "rollover".into(),
            data: serde_json::json!({"symbol_group": "G1", "old": "MHI2507", "new": "MHI2508", "mode": "hedged"}),
        }));
        assert_eq!(manager.phase(), RolloverPhase::WaitAcks);

        manager.handle(&Event::Order(order("MHI2508", "2", OrderStatus::NotTraded, "ROLL:G1:MHI2507->MHI2508:OPEN")));
        assert_eq!(manager.phase(), RolloverPhase::WaitAcks);
        manager.handle(&Event::Order(order("MHI2507", "3", OrderStatus::NotTraded, "ROLL:G1:MHI2507->MHI2508:CLOSE")));
        assert_eq!(manager.phase(), RolloverPhase::Done);
    }

    #[test]
    fn status_reports_none_when_idle_and_the_in_flight_task_once_started() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);
        bus.put(Event::Position(position("MHI2507", Direction::Long, dec!(2))));
        bus.drain();

        let manager = RolloverManager::new(&bus, oms);
        assert!(manager.status().is_none());

        manager.handle(&Event::Command(CommandEvent {
            cmd: "rollover".into(),
            data: serde_json::json!({"symbol_group": "G1", "old": "MHI2507", "new": "MHI2508", "mode": "hedged"}),
        }));

        let status = manager.status().expect("rollover in flight");
        assert_eq!(status.symbol_group, "G1");
        assert_eq!(status.old, "MHI2507");
        assert_eq!(status.new, "MHI2508");
        assert_eq!(status.mode, RolloverMode::Hedged);
        assert_eq!(status.phase, RolloverPhase::WaitAcks);
    }

    #[test]
    fn rejected_leg_fails_the_rollover() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);
        bus.put(Event::Position(position("MHI2507", Direction::Short, dec!(1))));
        bus.drain();

        let manager = RolloverManager::new(&bus, oms);
        manager.handle(&Event::Command(CommandEvent {
            cmd: "rollover".into(),
            data: serde_json::json!({"symbol_group": "G1", "old": "MHI2507", "new": "MHI2508", "mode": "flat"}),
        }));
        assert_eq!(manager.phase(), RolloverPhase::WaitAcks);

        manager.handle(&Event::Order(order("MHI2507", "1", OrderStatus::Rejected, "ROLL:G1:MHI2507->MHI2508:CLOSE")));
        assert_eq!(manager.phase(), RolloverPhase::Failed);
    }

    #[test]
    fn second_rollover_is_rejected_while_one_is_in_flight() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);
        bus.put(Event::Order(order("MHI2507", "1", OrderStatus::NotTraded, "strategy1")));
        bus.drain();

        let manager = RolloverManager::new(&bus, oms);
        manager.handle(&Event::Command(CommandEvent {
            cmd: "rollover".into(),
            data: serde_json::json!({"symbol_group": "G1", "old": "MHI2507", "new": "MHI2508", "mode": "hedged"}),
        }));
        assert_eq!(manager.phase(), RolloverPhase::WaitCancel);

        manager.handle(&Event::Command(CommandEvent {
            cmd: "rollover".into(),
            data: serde_json::json!({"symbol_group": "G2", "old": "IF2507", "new": "IF2508", "mode": "hedged"}),
        }));
        // Still the first task: the second request was dropped.
        assert_eq!(manager.phase(), RolloverPhase::WaitCancel);
    }
}
