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

//! Opaque request records the OMS and Strategy base pass to the out-of-scope vendor client.
//!
//! These are typed so the boundary is compile-checked even though no vendor implementation ships
//! with this runtime (SPEC_FULL.md §3).

use ferrum_core::UnixNanos;
use serde::{Deserialize, Serialize};

use crate::{
    enums::Interval,
    identifiers::{Symbol, vt_symbol},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub symbol: Symbol,
    pub exchange: crate::enums::Exchange,
}

impl SubscribeRequest {
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(self.symbol, self.exchange)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub exchange: crate::enums::Exchange,
    pub start: UnixNanos,
    pub end: Option<UnixNanos>,
    pub interval: Option<Interval>,
}

impl HistoryRequest {
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(self.symbol, self.exchange)
    }
}
