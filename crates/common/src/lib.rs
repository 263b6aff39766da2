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

//! Runtime plumbing shared by every Ferrum component: the event bus, the clock abstraction, daily
//! log rotation, and the periodic timer stream.

pub mod bus;
pub mod clock;
pub mod logging;
pub mod timer;

pub use bus::{BusHandle, ClosureHandler, Event, EventBus, MessageHandler, SharedHandler};
pub use clock::{Clock, LiveClock, TestClock};
