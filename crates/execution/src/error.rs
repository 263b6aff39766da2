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

//! Crate-local error types (§10.2): typed errors for fallible operations, `anyhow` reserved for
//! binaries and test helpers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OmsError {
    #[error("no order with vt_orderid {0}")]
    OrderNotFound(String),
    #[error("no position with vt_positionid {0}")]
    PositionNotFound(String),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("cannot modify order {0}: not found")]
    NotFound(String),
    #[error("cannot modify order {0}: already in a terminal status")]
    Terminal(String),
    #[error("cannot modify order {0}: requested volume {requested} is below traded {traded}")]
    VolumeBelowTraded {
        orderid: String,
        requested: rust_decimal::Decimal,
        traded: rust_decimal::Decimal,
    },
}
