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

//! Static per-instrument metadata, supplemented from the originating system's `ContractData`
//! (SPEC_FULL.md §3) so the backtest accounting engine's contract params can be seeded from a
//! single source of truth.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::{
    enums::{OptionType, Product},
    identifiers::{Symbol, vt_symbol},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractData {
    pub gateway_name: Ustr,
    pub symbol: Symbol,
    pub exchange: crate::enums::Exchange,
    pub name: String,
    pub product: Product,
    /// Contract multiplier, the `size` used throughout §4.E's accounting math.
    pub size: Decimal,
    pub pricetick: Decimal,
    pub min_volume: Decimal,
    pub option_strike: Option<Decimal>,
    pub option_type: Option<OptionType>,
}

impl ContractData {
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(self.symbol, self.exchange)
    }
}
