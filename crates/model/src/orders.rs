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

//! Orders and the requests that create, cancel, or modify them.

use ferrum_core::UnixNanos;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::{
    enums::{Direction, Offset, OrderStatus, OrderType},
    identifiers::{Symbol, vt_orderid, vt_symbol},
};

/// Request sent to a gateway to create a new order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub exchange: crate::enums::Exchange,
    pub direction: Direction,
    pub order_type: OrderType,
    pub volume: Decimal,
    pub price: Decimal,
    pub trigger_price: Decimal,
    pub offset: Offset,
    pub reference: String,
}

impl OrderRequest {
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(self.symbol, self.exchange)
    }

    /// Builds the [`Order`] a gateway creates upon accepting this request.
    #[must_use]
    pub fn create_order(&self, orderid: String, gateway_name: Ustr) -> Order {
        Order {
            gateway_name,
            symbol: self.symbol,
            exchange: self.exchange,
            orderid,
            broker_orderid: None,
            order_type: self.order_type,
            direction: self.direction,
            offset: self.offset,
            price: self.price,
            volume: self.volume,
            traded: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            status: OrderStatus::Submitting,
            datetime: None,
            reference: self.reference.clone(),
            trigger_price: self.trigger_price,
            triggered_bar: None,
        }
    }
}

/// Request sent to a gateway to cancel an existing order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub orderid: String,
    pub symbol: Symbol,
    pub exchange: crate::enums::Exchange,
}

/// Request sent to a gateway to modify an existing order's price/volume/trigger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifyRequest {
    pub orderid: String,
    pub symbol: Symbol,
    pub exchange: crate::enums::Exchange,
    pub volume: Decimal,
    pub price: Decimal,
    pub trigger_price: Decimal,
}

/// Mutable lifecycle object for a single order, keyed by `orderid` (local to this process).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub gateway_name: Ustr,
    pub symbol: Symbol,
    pub exchange: crate::enums::Exchange,
    pub orderid: String,
    /// The venue-assigned identifier, when a live gateway maps one back.
    pub broker_orderid: Option<String>,
    pub order_type: OrderType,
    pub direction: Direction,
    pub offset: Offset,
    pub price: Decimal,
    pub volume: Decimal,
    pub traded: Decimal,
    pub avg_fill_price: Decimal,
    pub status: OrderStatus,
    pub datetime: Option<UnixNanos>,
    pub reference: String,
    pub trigger_price: Decimal,
    /// Set to the bar datetime that activated a stop order, so the matching gateway can tell
    /// "triggered on this very bar" apart from "already active" (§4.D.2).
    pub triggered_bar: Option<UnixNanos>,
}

impl Order {
    #[must_use]
    pub fn vt_symbol(&self) -> String {
        vt_symbol(self.symbol, self.exchange)
    }

    #[must_use]
    pub fn vt_orderid(&self) -> String {
        vt_orderid(self.gateway_name.as_str(), &self.orderid)
    }

    /// Whether this order is in one of the six active statuses (§3 invariant).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Builds the [`CancelRequest`] that would cancel this order.
    #[must_use]
    pub fn create_cancel_request(&self) -> CancelRequest {
        CancelRequest {
            orderid: self.orderid.clone(),
            symbol: self.symbol,
            exchange: self.exchange,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::enums::Exchange;

    fn sample_request() -> OrderRequest {
        OrderRequest {
            symbol: Symbol::new("MHI2507"),
            exchange: Exchange::Hkfe,
            direction: Direction::Long,
            order_type: OrderType::Limit,
            volume: dec!(2),
            price: dec!(3500),
            trigger_price: Decimal::ZERO,
            offset: Offset::None,
            reference: "strategy1".into(),
        }
    }

    #[test]
    fn create_order_starts_submitting_and_active() {
        let order = sample_request().create_order("1".into(), Ustr::from("BACKTEST"));
        assert_eq!(order.status, OrderStatus::Submitting);
        assert!(order.is_active());
        assert_eq!(order.vt_orderid(), "BACKTEST.1");
        assert_eq!(order.triggered_bar, None);
    }

    #[test]
    fn terminal_order_is_not_active() {
        let mut order = sample_request().create_order("1".into(), Ustr::from("BACKTEST"));
        order.status = OrderStatus::AllTraded;
        assert!(!order.is_active());
    }
}
