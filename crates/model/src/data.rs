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

//! Market data: bars and ticks.

use ferrum_core::UnixNanos;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::{
    enums::{Exchange, Interval},
    identifiers::{Symbol, vt_symbol},
};

/// A candlestick bar over a fixed `interval`. Immutable once produced; `datetime` marks the
/// bar's start.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub gateway_name: Ustr,
    pub symbol: Symbol,
    pub exchange: Exchange,
    pub datetime: UnixNanos,
    pub interval: Interval,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(self.symbol, self.exchange)
    }
}

/// A last-price snapshot. Only the fields the runtime actually consumes (mark-to-market and
/// the Hub's live-price display) are modeled; full depth-of-book levels are out of scope.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub gateway_name: Ustr,
    pub symbol: Symbol,
    pub exchange: Exchange,
    pub datetime: UnixNanos,
    pub last_price: Decimal,
    pub last_volume: Decimal,
}

impl Tick {
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(self.symbol, self.exchange)
    }
}
