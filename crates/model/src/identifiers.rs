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

//! Composite identifiers: `vt_symbol`, `vt_orderid`, `vt_tradeid`, `vt_positionid`.
//!
//! Every entity carries a `gateway_name` (its origin) plus a local identifier; the composite IDs
//! below join the two with a `.` separator so they stay stable and collision-free for the life of
//! a process (§3 invariant), without requiring any central ID-allocation authority.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::enums::{Direction, Exchange};

/// A ticker symbol, interned for cheap equality and hashing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(Ustr);

impl Symbol {
    #[must_use]
    pub fn new<T: AsRef<str>>(value: T) -> Self {
        Self(Ustr::from(value.as_ref()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: AsRef<str>> From<T> for Symbol {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// `vt_symbol = symbol.exchange`.
#[must_use]
pub fn vt_symbol(symbol: Symbol, exchange: Exchange) -> String {
    format!("{symbol}.{exchange}")
}

/// `vt_orderid = gateway_name.orderid`.
#[must_use]
pub fn vt_orderid(gateway_name: &str, orderid: &str) -> String {
    format!("{gateway_name}.{orderid}")
}

/// `vt_tradeid = gateway_name.tradeid`.
#[must_use]
pub fn vt_tradeid(gateway_name: &str, tradeid: &str) -> String {
    format!("{gateway_name}.{tradeid}")
}

/// `vt_quoteid = gateway_name.quoteid`.
#[must_use]
pub fn vt_quoteid(gateway_name: &str, quoteid: &str) -> String {
    format!("{gateway_name}.{quoteid}")
}

/// `vt_positionid = gateway_name.vt_symbol.direction`.
#[must_use]
pub fn vt_positionid(gateway_name: &str, symbol: Symbol, exchange: Exchange, direction: Direction) -> String {
    format!("{gateway_name}.{}.{direction}", vt_symbol(symbol, exchange))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_ids_join_with_dot() {
        let sym = Symbol::new("MHI2507");
        assert_eq!(vt_symbol(sym, Exchange::Hkfe), "MHI2507.HKFE");
        assert_eq!(vt_orderid("BACKTEST", "1"), "BACKTEST.1");
        assert_eq!(
            vt_positionid("BACKTEST", sym, Exchange::Hkfe, Direction::Long),
            "BACKTEST.MHI2507.HKFE.LONG"
        );
    }
}
