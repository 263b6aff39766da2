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

//! The backtest matching gateway, OMS+ accounting, CSV bar loader, and driver engine (§4.D-§4.F).

pub mod accounting;
pub mod engine;
pub mod error;
pub mod loader;
pub mod matching;

pub use accounting::{BacktestAccounting, ContractParams};
pub use engine::BacktestEngine;
pub use error::BacktestError;
pub use loader::{load_bars, sort_by_end_timestamp};
pub use matching::MatchingGateway;
