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

//! A single net holding for one symbol/direction pair.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::{
    enums::Direction,
    identifiers::{Symbol, vt_positionid, vt_symbol},
};

/// `volume == 0` is not a representable state: the owning OMS removes the entry instead (§3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub gateway_name: Ustr,
    pub symbol: Symbol,
    pub exchange: crate::enums::Exchange,
    pub direction: Direction,
    pub volume: Decimal,
    pub price: Decimal,
    pub margin: Decimal,
    pub frozen: Decimal,
}

impl Position {
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(self.symbol, self.exchange)
    }

    #[must_use]
    pub fn vt_positionid(&self) -> String {
        vt_positionid(self.gateway_name.as_str(), self.symbol, self.exchange, self.direction)
    }

    /// Signed holding: positive for LONG, negative for SHORT.
    #[must_use]
    pub fn signed_volume(&self) -> Decimal {
        match self.direction {
            Direction::Long => self.volume,
            Direction::Short => -self.volume,
            Direction::Net => self.volume,
        }
    }
}
