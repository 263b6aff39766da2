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

//! The Hub (§4.L): a WS fan-out gateway in front of one or more engines. It accepts JWT-bearer
//! WebSocket connections speaking JSON-RPC 2.0, relays `event.emit` notifications bridged in from
//! each engine's [`ferrum_adapter::Publisher`] over ZMQ, and turns `engine.command` calls into
//! `cmd:<engine>`/`cmd:all` frames for each engine's [`ferrum_adapter::Subscriber`].
//!
//! It is the only component in the runtime that speaks both ZMQ (to engines) and WebSocket (to
//! UIs); everything else stays on one side of that boundary.

pub mod auth;
pub mod bridge;
pub mod error;
pub mod registry;
pub mod rpc;
pub mod server;
pub mod ws;

pub use auth::UserStore;
pub use bridge::Bridge;
pub use error::HubError;
pub use registry::Registry;
pub use server::{AppState, router, spawn_sweeper};
