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

//! Two-sided quotes, a first-class OMS entity alongside orders (SPEC_FULL.md §3) for
//! market-making style strategies.

use ferrum_core::UnixNanos;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::{
    enums::{Offset, OrderStatus},
    identifiers::{Symbol, vt_quoteid, vt_symbol},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub symbol: Symbol,
    pub exchange: crate::enums::Exchange,
    pub bid_price: Decimal,
    pub bid_volume: Decimal,
    pub ask_price: Decimal,
    pub ask_volume: Decimal,
    pub bid_offset: Offset,
    pub ask_offset: Offset,
    pub reference: String,
}

impl QuoteRequest {
    #[must_use]
    pub fn create_quote(&self, quoteid: String, gateway_name: Ustr) -> QuoteData {
        QuoteData {
            gateway_name,
            symbol: self.symbol,
            exchange: self.exchange,
            quoteid,
            bid_price: self.bid_price,
            bid_volume: self.bid_volume,
            ask_price: self.ask_price,
            ask_volume: self.ask_volume,
            bid_offset: self.bid_offset,
            ask_offset: self.ask_offset,
            status: OrderStatus::Submitting,
            datetime: None,
            reference: self.reference.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteData {
    pub gateway_name: Ustr,
    pub symbol: Symbol,
    pub exchange: crate::enums::Exchange,
    pub quoteid: String,
    pub bid_price: Decimal,
    pub bid_volume: Decimal,
    pub ask_price: Decimal,
    pub ask_volume: Decimal,
    pub bid_offset: Offset,
    pub ask_offset: Offset,
    pub status: OrderStatus,
    pub datetime: Option<UnixNanos>,
    pub reference: String,
}

impl QuoteData {
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(self.symbol, self.exchange)
    }

    #[must_use]
    pub fn vt_quoteid(&self) -> String {
        vt_quoteid(self.gateway_name.as_str(), &self.quoteid)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    #[must_use]
    pub fn create_cancel_request(&self) -> crate::orders::CancelRequest {
        crate::orders::CancelRequest {
            orderid: self.quoteid.clone(),
            symbol: self.symbol,
            exchange: self.exchange,
        }
    }
}
