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

//! Fill events: one order can accumulate several trades.

use ferrum_core::UnixNanos;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::{
    enums::{Direction, Offset},
    identifiers::{Symbol, vt_orderid, vt_symbol, vt_tradeid},
};

/// A single fill against an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub gateway_name: Ustr,
    pub symbol: Symbol,
    pub exchange: crate::enums::Exchange,
    pub orderid: String,
    pub tradeid: String,
    pub direction: Direction,
    pub offset: Offset,
    pub price: Decimal,
    pub volume: Decimal,
    pub datetime: Option<UnixNanos>,
    pub reference: String,
}

impl Trade {
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(self.symbol, self.exchange)
    }

    #[must_use]
    pub fn vt_orderid(&self) -> String {
        vt_orderid(self.gateway_name.as_str(), &self.orderid)
    }

    #[must_use]
    pub fn vt_tradeid(&self) -> String {
        vt_tradeid(self.gateway_name.as_str(), &self.tradeid)
    }

    /// Signed fill volume: positive for LONG, negative for SHORT.
    #[must_use]
    pub fn signed_volume(&self) -> Decimal {
        match self.direction {
            Direction::Long => self.volume,
            Direction::Short => -self.volume,
            Direction::Net => self.volume,
        }
    }
}
