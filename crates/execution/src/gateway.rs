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

//! The narrow trait every venue connection implements (§4.G), so the Trade Engine and Strategy
//! Base never branch on backtest-vs-live. The Backtest Gateway (`ferrum-backtest`) and any future
//! live-venue gateway both satisfy this trait; only the trait, the venue-state mapping helpers,
//! and a [`NullGateway`] test double live here, since no concrete vendor ships with this runtime.

use ferrum_model::{CancelRequest, ModifyRequest, OrderRequest, OrderStatus};

/// Abstracts over a backtest matching engine or a live venue connection.
pub trait Gateway: Send + Sync {
    /// Submits `req`, returning the local `orderid` the gateway assigned.
    fn send_order(&mut self, req: &OrderRequest) -> String;
    fn cancel_order(&mut self, req: &CancelRequest);
    fn modify_order(&mut self, req: &ModifyRequest);
    /// Requests an out-of-band account refresh; a live gateway would poll or re-subscribe.
    fn query_account(&mut self);
    /// Requests an out-of-band position refresh; a live gateway would poll or re-subscribe.
    fn query_position(&mut self);
}

/// Classifies a raw venue order-state string into the runtime's [`OrderStatus`], the kind of
/// mapping a live gateway's callback handler performs before emitting an `Order` event so OMS and
/// Strategy code stay bit-identical across the backtest and live paths (§4.G).
///
/// Unrecognized venue strings map to [`OrderStatus::Unknown`] rather than erroring, matching the
/// specification's inclusion of `UNKNOWN` as an active status for exactly this case.
#[must_use]
pub fn classify_venue_status(raw: &str) -> OrderStatus {
    match raw.to_ascii_uppercase().as_str() {
        "SUBMITTING" | "NEW" | "PENDING_NEW" => OrderStatus::Submitting,
        "NOTTRADED" | "ACCEPTED" | "OPEN" => OrderStatus::NotTraded,
        "PARTTRADED" | "PARTIALLY_FILLED" => OrderStatus::PartTraded,
        "ALLTRADED" | "FILLED" => OrderStatus::AllTraded,
        "PARTCANCELLED" | "PARTIALLY_CANCELLED" => OrderStatus::PartCancelled,
        "ALLCANCELLED" | "CANCELLED" | "CANCELED" => OrderStatus::AllCancelled,
        "REJECTED" => OrderStatus::Rejected,
        "PENDING_TRIGGER" | "UNTRIGGERED" => OrderStatus::Pending,
        "MODIFIED" | "REPLACED" => OrderStatus::Modified,
        _ => OrderStatus::Unknown,
    }
}

/// A `Gateway` that records every request it receives and acknowledges immediately, used by the
/// reconciliation-loop tests (§4.G) in place of a live venue.
#[derive(Default)]
pub struct NullGateway {
    pub sent: Vec<OrderRequest>,
    pub cancelled: Vec<CancelRequest>,
    pub modified: Vec<ModifyRequest>,
    next_id: u64,
}

impl NullGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Gateway for NullGateway {
    fn send_order(&mut self, req: &OrderRequest) -> String {
        self.next_id += 1;
        self.sent.push(req.clone());
        self.next_id.to_string()
    }

    fn cancel_order(&mut self, req: &CancelRequest) {
        self.cancelled.push(req.clone());
    }

    fn modify_order(&mut self, req: &ModifyRequest) {
        self.modified.push(req.clone());
    }

    fn query_account(&mut self) {}

    fn query_position(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_venue_strings() {
        assert_eq!(classify_venue_status("filled"), OrderStatus::AllTraded);
        assert_eq!(classify_venue_status("CANCELED"), OrderStatus::AllCancelled);
        assert_eq!(classify_venue_status("bogus"), OrderStatus::Unknown);
    }

    #[test]
    fn null_gateway_assigns_increasing_ids() {
        let mut gateway = NullGateway::new();
        let req = OrderRequest {
            symbol: ferrum_model::Symbol::new("MHI2507"),
            exchange: ferrum_model::Exchange::Hkfe,
            direction: ferrum_model::Direction::Long,
            order_type: ferrum_model::OrderType::Limit,
            volume: rust_decimal::Decimal::ONE,
            price: rust_decimal::Decimal::ONE,
            trigger_price: rust_decimal::Decimal::ZERO,
            offset: ferrum_model::Offset::None,
            reference: "test".into(),
        };
        let first = gateway.send_order(&req);
        let second = gateway.send_order(&req);
        assert_eq!(first, "1");
        assert_eq!(second, "2");
        assert_eq!(gateway.sent.len(), 2);
    }
}
