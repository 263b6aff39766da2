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

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("no bar series supplied")]
    EmptySeries,
    #[error("csv row {row} for {symbol}: {source}")]
    Csv {
        row: usize,
        symbol: String,
        #[source]
        source: csv::Error,
    },
    #[error("csv row {row}: invalid {field} value {value:?}")]
    InvalidField { row: usize, field: &'static str, value: String },
}
