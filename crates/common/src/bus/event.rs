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

//! The tagged event variant every handler on the bus receives (§9 design note: "model as tagged
//! variant of events").

use ferrum_core::UnixNanos;
use ferrum_model::{
    Account, Bar, CancelRequest, ContractData, LogLevel, ModifyRequest, Order, OrderRequest,
    Position, QuoteData, QuoteRequest, Tick, Trade,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A log record raised at the data-source boundary and converted to an event rather than an
/// exception (§7 propagation rule).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub msg: String,
    pub ts: UnixNanos,
}

/// A generic command, forwarded verbatim by the Engine<->Hub adapter for commands it does not
/// interpret itself (§4.K, "Other: forward as `command` event").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandEvent {
    pub cmd: String,
    pub data: Value,
}

/// Every event kind flowing through the bus.
#[derive(Clone, Debug)]
pub enum Event {
    Bar(Bar),
    Tick(Tick),
    Order(Order),
    Trade(Trade),
    Position(Position),
    Account(Account),
    Contract(ContractData),
    Quote(QuoteData),
    Log(LogEvent),
    OrderRequest(OrderRequest),
    CancelRequest(CancelRequest),
    ModifyRequest(ModifyRequest),
    QuoteRequest(QuoteRequest),
    /// Raised by a strategy's dirty-flag logic to request another reconcile pass (§4.H).
    Reconcile,
    Command(CommandEvent),
    /// Fanned out by the bus's own periodic timer stream (§4.A).
    Timer(UnixNanos),
}

/// Topic name constants. Kept as plain `&'static str` rather than an enum so new topics can be
/// added without touching the dispatcher (§4.A: "the registration map is keyed so that adding
/// [wildcards] later is additive").
pub mod topics {
    pub const BAR: &str = "bar";
    pub const TICK: &str = "tick";
    pub const ORDER: &str = "order";
    pub const TRADE: &str = "trade";
    pub const POSITION: &str = "position";
    pub const ACCOUNT: &str = "account";
    pub const CONTRACT: &str = "contract";
    pub const QUOTE: &str = "quote";
    pub const LOG: &str = "log";
    pub const ORDER_REQUEST: &str = "order.req";
    pub const CANCEL_REQUEST: &str = "cancel.req";
    pub const MODIFY_REQUEST: &str = "modify.req";
    pub const QUOTE_REQUEST: &str = "quote.req";
    pub const RECONCILE: &str = "reconcile";
    pub const COMMAND: &str = "command";
    pub const TIMER: &str = "timer";
}

impl Event {
    /// The topic this event is dispatched under.
    #[must_use]
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Bar(_) => topics::BAR,
            Self::Tick(_) => topics::TICK,
            Self::Order(_) => topics::ORDER,
            Self::Trade(_) => topics::TRADE,
            Self::Position(_) => topics::POSITION,
            Self::Account(_) => topics::ACCOUNT,
            Self::Contract(_) => topics::CONTRACT,
            Self::Quote(_) => topics::QUOTE,
            Self::Log(_) => topics::LOG,
            Self::OrderRequest(_) => topics::ORDER_REQUEST,
            Self::CancelRequest(_) => topics::CANCEL_REQUEST,
            Self::ModifyRequest(_) => topics::MODIFY_REQUEST,
            Self::QuoteRequest(_) => topics::QUOTE_REQUEST,
            Self::Reconcile => topics::RECONCILE,
            Self::Command(_) => topics::COMMAND,
            Self::Timer(_) => topics::TIMER,
        }
    }
}
