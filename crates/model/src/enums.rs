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

//! Closed enumerations shared by every entity in the domain model.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, FromRepr};

/// The side of an order, trade, or position.
#[derive(
    Copy, Clone, Debug, Display, Hash, PartialEq, Eq, AsRefStr, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
    /// Only used for netted positions where the side is derived from signed volume.
    Net,
}

/// Open/close qualifier carried on orders and trades for venues that distinguish the two.
///
/// The backtest matching path treats this as advisory metadata (see `SPEC_FULL.md` §3); it does
/// not participate in matching or accounting math.
#[derive(
    Copy, Clone, Debug, Default, Display, Hash, PartialEq, Eq, AsRefStr, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Offset {
    #[default]
    None,
    Open,
    Close,
    CloseToday,
    CloseYesterday,
}

/// Lifecycle status of an order or quote.
#[derive(
    Copy, Clone, Debug, Display, Hash, PartialEq, Eq, AsRefStr, FromRepr, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum OrderStatus {
    Submitting = 0,
    NotTraded = 1,
    PartTraded = 2,
    AllTraded = 3,
    PartCancelled = 4,
    AllCancelled = 5,
    Rejected = 6,
    Pending = 7,
    Unknown = 8,
    Modified = 9,
}

impl OrderStatus {
    /// Returns `true` for the six statuses the specification defines as *active* (§3 invariant).
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Self::Submitting
                | Self::NotTraded
                | Self::PartTraded
                | Self::Pending
                | Self::Unknown
                | Self::Modified
        )
    }

    /// Returns `true` once the order can never transition again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !self.is_active()
    }
}

/// Order type, restricted to the variants the backtest matching gateway understands.
#[derive(
    Copy, Clone, Debug, Display, Hash, PartialEq, Eq, AsRefStr, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Limit,
    Market,
    /// Stop-limit: rests in the inactive book until `trigger_price` is touched, then matches as
    /// a limit order.
    StpLmt,
    /// Stop-market: rests in the inactive book until `trigger_price` is touched, then fills at
    /// the market.
    StpMkt,
    /// Absolute limit: fills at the exact `price` if the bar's range touches it, no gap logic.
    AbsLmt,
}

impl OrderType {
    /// Returns `true` for the two stop variants that start life in the inactive book.
    #[must_use]
    pub const fn is_stop(self) -> bool {
        matches!(self, Self::StpLmt | Self::StpMkt)
    }
}

/// Instrument product classification, carried on [`crate::contract::ContractData`].
#[derive(
    Copy, Clone, Debug, Display, Hash, PartialEq, Eq, AsRefStr, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Product {
    Equity,
    Futures,
    Option,
    Index,
    Forex,
    Spot,
    Bond,
}

/// Option right, only meaningful for `Product::Option` contracts.
#[derive(
    Copy, Clone, Debug, Display, Hash, PartialEq, Eq, AsRefStr, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionType {
    Call,
    Put,
}

/// Trading venue. Closed to the venues this runtime's composite IDs are known to need; `Local`
/// covers synthetic/backtest symbols that have no real venue.
#[derive(
    Copy, Clone, Debug, Display, Hash, PartialEq, Eq, AsRefStr, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Exchange {
    Cffex,
    Shfe,
    Czce,
    Dce,
    Ine,
    Sse,
    Szse,
    Hkfe,
    Local,
}

/// Log-event severity, shared by the bus's `log` topic and the adapter's `log.query` filter.
#[derive(
    Copy, Clone, Debug, Display, Hash, PartialEq, Eq, PartialOrd, Ord, AsRefStr, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// A bar aggregation interval, ordered by its duration in seconds.
#[derive(Copy, Clone, Debug, Display, Hash, PartialEq, Eq, AsRefStr, EnumIter, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum Interval {
    #[strum(serialize = "1m")]
    Minute1,
    #[strum(serialize = "3m")]
    Minute3,
    #[strum(serialize = "5m")]
    Minute5,
    #[strum(serialize = "15m")]
    Minute15,
    #[strum(serialize = "30m")]
    Minute30,
    #[strum(serialize = "1h")]
    Hour1,
    #[strum(serialize = "2h")]
    Hour2,
    #[strum(serialize = "4h")]
    Hour4,
    #[strum(serialize = "1d")]
    Day1,
    #[strum(serialize = "1w")]
    Week1,
}

impl Interval {
    /// The interval's duration in seconds, the key this type is totally ordered by.
    #[must_use]
    pub const fn seconds(self) -> u32 {
        match self {
            Self::Minute1 => 60,
            Self::Minute3 => 180,
            Self::Minute5 => 300,
            Self::Minute15 => 900,
            Self::Minute30 => 1_800,
            Self::Hour1 => 3_600,
            Self::Hour2 => 7_200,
            Self::Hour4 => 14_400,
            Self::Day1 => 86_400,
            Self::Week1 => 604_800,
        }
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.seconds().cmp(&other.seconds())
    }
}
