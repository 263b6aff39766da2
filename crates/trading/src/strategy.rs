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

//! The strategy event-handler surface (§4.H): default no-op methods so a concrete strategy only
//! overrides what it reacts to. A strategy never calls the gateway directly — it reacts here,
//! updates its own state, and calls [`crate::reconcile::Reconciler::mark_dirty`] to request a
//! reconcile pass.

use ferrum_model::{Bar, Order, Position, Tick, Trade};

pub trait StrategyBase: Send + Sync {
    fn on_init(&self) {}

    fn on_start(&self) {}

    fn on_stop(&self) {}

    fn on_bar(&self, _bar: &Bar) {}

    fn on_tick(&self, _tick: &Tick) {}

    fn on_order(&self, _order: &Order) {}

    fn on_trade(&self, _trade: &Trade) {}

    fn on_position(&self, _position: &Position) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;
    impl StrategyBase for Silent {}

    #[test]
    fn default_methods_are_no_ops() {
        let strategy = Silent;
        strategy.on_init();
        strategy.on_start();
        strategy.on_stop();
    }
}
