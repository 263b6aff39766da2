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

//! The strategy-facing half of the runtime: the `StrategyBase` trait, the reconciliation loop
//! that turns a strategy's desired order plan into gateway requests, and the rollover manager
//! that migrates a position between contracts (§4.H, §4.J).

pub mod error;
pub mod reconcile;
pub mod rollover;
pub mod strategy;

pub use error::TradingError;
pub use reconcile::{DesiredOrder, Reconciler};
pub use rollover::{RolloverCommand, RolloverManager, RolloverMode, RolloverPhase, RolloverStatus};
pub use strategy::StrategyBase;
