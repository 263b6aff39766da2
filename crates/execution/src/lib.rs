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

//! Order Management System, the live gateway abstraction, and the request-routing firewall
//! (§4.C, §4.G, §4.I).

pub mod error;
pub mod gateway;
pub mod oms;
pub mod trade_engine;

pub use error::{GatewayError, OmsError};
pub use gateway::{Gateway, NullGateway, classify_venue_status};
pub use oms::{Oms, PositionPolicy};
pub use trade_engine::{Firewall, MuteCommand, SwitchCommand, TradeEngine};
