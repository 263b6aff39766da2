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

//! The Engine<->Hub ZMQ adapter (§4.K): publishes `order`/`position` events as epoch/seq-tagged
//! frames, and runs a command loop answering `snapshot`, `order.query`, `log.query`,
//! `order.modify`, `order.cancel`, and `position.close`.

pub mod error;
pub mod publisher;
pub mod subscriber;

pub use error::AdapterError;
pub use publisher::Publisher;
pub use subscriber::Subscriber;
