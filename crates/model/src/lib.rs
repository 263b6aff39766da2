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

//! Domain model for the Ferrum trading runtime.
//!
//! Entities carry a `gateway_name` (origin) and derived composite IDs (`vt_symbol`,
//! `vt_orderid`, `vt_tradeid`, `vt_positionid`) as described in the runtime's data model. Orders,
//! trades, positions and accounts are plain value types; lifecycle and matching logic live in
//! `ferrum-execution` and `ferrum-backtest`.

pub mod account;
pub mod contract;
pub mod data;
pub mod enums;
pub mod identifiers;
pub mod orders;
pub mod position;
pub mod quote;
pub mod requests;
pub mod trade;

pub use account::Account;
pub use contract::ContractData;
pub use data::{Bar, Tick};
pub use enums::{Direction, Exchange, Interval, LogLevel, Offset, OptionType, OrderStatus, OrderType, Product};
pub use identifiers::Symbol;
pub use orders::{CancelRequest, ModifyRequest, Order, OrderRequest};
pub use position::Position;
pub use quote::{QuoteData, QuoteRequest};
pub use requests::{HistoryRequest, SubscribeRequest};
pub use trade::Trade;
