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

//! Cash/margin/P&L bookkeeping for a single trading account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

/// `equity = cash + unrealized_pnl`; `available = equity - margin` (§3, §4.E invariants).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub gateway_name: Ustr,
    pub accountid: Ustr,
    pub cash: Decimal,
    pub margin: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub equity: Decimal,
    pub available: Decimal,
}

impl Account {
    #[must_use]
    pub fn new(gateway_name: Ustr, accountid: Ustr, starting_cash: Decimal) -> Self {
        Self {
            gateway_name,
            accountid,
            cash: starting_cash,
            margin: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            equity: starting_cash,
            available: starting_cash,
        }
    }

    #[must_use]
    pub fn vt_accountid(&self) -> String {
        format!("{}.{}", self.gateway_name, self.accountid)
    }

    /// Recomputes `equity` and `available` from `cash`, `unrealized_pnl`, and `margin` — the
    /// invariant that must hold after every mutation (§8 property 3).
    pub fn recompute(&mut self) {
        self.equity = self.cash + self.unrealized_pnl;
        self.available = self.equity - self.margin;
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn recompute_maintains_identity() {
        let mut account = Account::new(Ustr::from("BACKTEST"), Ustr::from("1"), dec!(1_000_000));
        account.cash = dec!(999_986);
        account.margin = dec!(7_000);
        account.unrealized_pnl = dec!(200);
        account.recompute();
        assert_eq!(account.equity, dec!(1_000_186));
        assert_eq!(account.available, dec!(993_186));
    }
}
