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

//! The Trade Engine / `CtaEngine` (§4.I): routes request events to the gateway behind a firewall
//! of muted symbols and a global kill switch, and handles the two commands that control them.
//!
//! Modeled here as a sibling struct composed inside a higher-level `TradeEngine` rather than one
//! God object combining firewall state with the Rollover Manager's in-flight task, per §10.6's
//! decomposition note: `Firewall` is the half that lives in this crate, next to the `Gateway`
//! trait and OMS it routes against; the Rollover Manager itself lives in `ferrum-trading`.

use std::sync::RwLock;

use ahash::AHashSet;
use ferrum_common::bus::{CommandEvent, Event, MessageHandler};
use ferrum_model::{CancelRequest, ModifyRequest, OrderRequest};
use serde::{Deserialize, Serialize};

/// Reference prefixes that bypass the mute firewall (§4.I, glossary "Reference prefix").
pub const INTERNAL_PREFIXES: &[&str] = &["ENGINE:", "ROLL:", "RISK:"];

fn is_internal_reference(reference: &str) -> bool {
    INTERNAL_PREFIXES.iter().any(|p| reference.starts_with(p))
}

/// `engine.mute {symbols, on, reason}` command payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MuteCommand {
    pub symbols: Vec<String>,
    pub on: bool,
    #[serde(default)]
    pub reason: String,
}

/// `engine.switch {on}` command payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SwitchCommand {
    pub on: bool,
}

/// Request firewall state: a mute set (by `vt_symbol`) and a global active switch.
///
/// - Cancels during mute are always allowed, to avoid leaving orders stuck (§4.I).
/// - Modify during mute is always blocked, even for internal references.
/// - Send/modify from a strategy (non-internal reference) on a muted symbol is blocked; internal
///   references (`ENGINE:`, `ROLL:`, `RISK:`) bypass the mute.
/// - The global switch halts all three request kinds regardless of reference or mute state.
pub struct Firewall {
    muted_symbols: RwLock<AHashSet<String>>,
    active: std::sync::atomic::AtomicBool,
}

impl Default for Firewall {
    fn default() -> Self {
        Self::new()
    }
}

impl Firewall {
    #[must_use]
    pub fn new() -> Self {
        Self {
            muted_symbols: RwLock::new(AHashSet::new()),
            active: std::sync::atomic::AtomicBool::new(true),
        }
    }

    pub fn set_mute(&self, symbols: &[String], on: bool) {
        let mut guard = self.muted_symbols.write().expect("firewall lock poisoned");
        if on {
            guard.extend(symbols.iter().cloned());
        } else {
            for symbol in symbols {
                guard.remove(symbol);
            }
        }
    }

    pub fn set_active(&self, on: bool) {
        self.active.store(on, std::sync::atomic::Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(std::sync::atomic::Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_muted(&self, vt_symbol: &str) -> bool {
        self.muted_symbols.read().expect("firewall lock poisoned").contains(vt_symbol)
    }

    /// A read-only snapshot of every currently-muted `vt_symbol`, for introspection (§10.6: the
    /// firewall's mute/switch state is exposed read-only to the Engine<->Hub adapter).
    #[must_use]
    pub fn muted_symbols(&self) -> Vec<String> {
        self.muted_symbols.read().expect("firewall lock poisoned").iter().cloned().collect()
    }

    #[must_use]
    pub fn allow_send(&self, vt_symbol: &str, reference: &str) -> bool {
        self.is_active() && (!self.is_muted(vt_symbol) || is_internal_reference(reference))
    }

    #[must_use]
    pub fn allow_modify(&self, vt_symbol: &str) -> bool {
        self.is_active() && !self.is_muted(vt_symbol)
    }

    #[must_use]
    pub fn allow_cancel(&self) -> bool {
        self.is_active()
    }
}

/// Routes `order.req` / `cancel.req` / `modify.req` events to a [`crate::gateway::Gateway`]
/// through the [`Firewall`], and handles `engine.mute` / `engine.switch` commands (§4.I).
pub struct TradeEngine<G: crate::gateway::Gateway> {
    handler_id: String,
    firewall: std::sync::Arc<Firewall>,
    gateway: std::sync::Mutex<G>,
}

impl<G: crate::gateway::Gateway> TradeEngine<G> {
    #[must_use]
    pub fn new(gateway: G) -> Self {
        Self::with_firewall(gateway, std::sync::Arc::new(Firewall::new()))
    }

    /// Builds a `TradeEngine` sharing an existing `Firewall` rather than owning a private one —
    /// needed so the Engine<->Hub adapter can read the same mute/switch state this engine
    /// enforces (§10.6).
    #[must_use]
    pub fn with_firewall(gateway: G, firewall: std::sync::Arc<Firewall>) -> Self {
        Self {
            handler_id: format!("trade-engine-{}", uuid::Uuid::new_v4()),
            firewall,
            gateway: std::sync::Mutex::new(gateway),
        }
    }

    #[must_use]
    pub fn firewall(&self) -> &Firewall {
        &self.firewall
    }

    /// A cheaply clonable handle to this engine's firewall, for handing to a sibling component
    /// (e.g. the adapter) that needs read access without owning the `TradeEngine` itself.
    #[must_use]
    pub fn firewall_handle(&self) -> std::sync::Arc<Firewall> {
        self.firewall.clone()
    }

    fn handle_order_request(&self, req: &OrderRequest) {
        if !self.firewall.allow_send(&req.vt_symbol(), &req.reference) {
            log::warn!("firewall blocked send_order on {} (reference={})", req.vt_symbol(), req.reference);
            return;
        }
        self.gateway.lock().expect("gateway lock poisoned").send_order(req);
    }

    fn handle_cancel_request(&self, req: &CancelRequest) {
        if !self.firewall.allow_cancel() {
            log::warn!("firewall blocked cancel_order: engine inactive");
            return;
        }
        self.gateway.lock().expect("gateway lock poisoned").cancel_order(req);
    }

    fn handle_modify_request(&self, req: &ModifyRequest, vt_symbol: &str) {
        if !self.firewall.allow_modify(vt_symbol) {
            log::warn!("firewall blocked modify_order on {vt_symbol}");
            return;
        }
        self.gateway.lock().expect("gateway lock poisoned").modify_order(req);
    }

    fn handle_command(&self, command: &CommandEvent) {
        match command.cmd.as_str() {
            "engine.mute" => {
                if let Ok(mute) = serde_json::from_value::<MuteCommand>(command.data.clone()) {
                    log::info!("engine.mute {:?} on={} reason={}", mute.symbols, mute.on, mute.reason);
                    self.firewall.set_mute(&mute.symbols, mute.on);
                } else {
                    log::error!("dropping malformed engine.mute command: {:?}", command.data);
                }
            }
            "engine.switch" => {
                if let Ok(switch) = serde_json::from_value::<SwitchCommand>(command.data.clone()) {
                    log::info!("engine.switch on={}", switch.on);
                    self.firewall.set_active(switch.on);
                } else {
                    log::error!("dropping malformed engine.switch command: {:?}", command.data);
                }
            }
            _ => {}
        }
    }
}

impl<G: crate::gateway::Gateway> MessageHandler for TradeEngine<G> {
    fn id(&self) -> &str {
        &self.handler_id
    }

    fn handle(&self, event: &Event) {
        match event {
            Event::OrderRequest(req) => self.handle_order_request(req),
            Event::CancelRequest(req) => self.handle_cancel_request(req),
            Event::ModifyRequest(req) => {
                let vt_symbol = ferrum_model::identifiers::vt_symbol(req.symbol, req.exchange);
                self.handle_modify_request(req, &vt_symbol);
            }
            Event::Command(command) => self.handle_command(command),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use ferrum_model::{Direction, Exchange, Offset, OrderType, Symbol};
    use rust_decimal::Decimal;

    use super::*;
    use crate::gateway::NullGateway;

    fn sample_request(reference: &str) -> OrderRequest {
        OrderRequest {
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            direction: Direction::Long,
            order_type: OrderType::Limit,
            volume: Decimal::ONE,
            price: Decimal::ONE,
            trigger_price: Decimal::ZERO,
            offset: Offset::None,
            reference: reference.into(),
        }
    }

    #[test]
    fn mute_blocks_strategy_sends_but_not_internal_references() {
        let engine = TradeEngine::new(NullGateway::new());
        engine.firewall().set_mute(&["MHI2507.HKFE".into()], true);

        engine.handle(&Event::OrderRequest(sample_request("strategy1")));
        engine.handle(&Event::OrderRequest(sample_request("ROLL:G1:MHI2507->MHI2508:OPEN")));

        let gateway = engine.gateway.lock().unwrap();
        assert_eq!(gateway.sent.len(), 1);
        assert_eq!(gateway.sent[0].reference, "ROLL:G1:MHI2507->MHI2508:OPEN");
    }

    #[test]
    fn cancels_allowed_during_mute() {
        let engine = TradeEngine::new(NullGateway::new());
        engine.firewall().set_mute(&["MHI2507.HKFE".into()], true);

        engine.handle(&Event::CancelRequest(CancelRequest {
            orderid: "1".into(),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
        }));

        assert_eq!(engine.gateway.lock().unwrap().cancelled.len(), 1);
    }

    #[test]
    fn modify_blocked_during_mute_even_for_internal_reference() {
        let engine = TradeEngine::new(NullGateway::new());
        engine.firewall().set_mute(&["MHI2507.HKFE".into()], true);

        engine.handle(&Event::ModifyRequest(ModifyRequest {
            orderid: "1".into(),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            volume: Decimal::ONE,
            price: Decimal::ONE,
            trigger_price: Decimal::ZERO,
        }));

        assert_eq!(engine.gateway.lock().unwrap().modified.len(), 0);
    }

    #[test]
    fn global_switch_off_blocks_everything() {
        let engine = TradeEngine::new(NullGateway::new());
        engine.firewall().set_active(false);

        engine.handle(&Event::OrderRequest(sample_request("strategy1")));
        engine.handle(&Event::CancelRequest(CancelRequest {
            orderid: "1".into(),
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
        }));

        let gateway = engine.gateway.lock().unwrap();
        assert_eq!(gateway.sent.len(), 0);
        assert_eq!(gateway.cancelled.len(), 0);
    }

    #[test]
    fn engine_mute_command_updates_firewall() {
        let engine = TradeEngine::new(NullGateway::new());
        engine.handle(&Event::Command(CommandEvent {
            cmd: "engine.mute".into(),
            data: serde_json::json!({"symbols": ["MHI2507.HKFE"], "on": true, "reason": "risk"}),
        }));
        assert!(engine.firewall().is_muted("MHI2507.HKFE"));
    }
}
