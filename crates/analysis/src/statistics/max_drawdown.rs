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

//! Maximum drawdown: `max_t ((peak_t - equity_t) / peak_t)` over a cumulative-returns curve.

use crate::{Returns, statistic::ReturnsStatistic};

#[derive(Debug, Default)]
pub struct MaxDrawdown;

impl ReturnsStatistic for MaxDrawdown {
    fn name(&self) -> String {
        "MaxDrawdown".to_string()
    }

    fn calculate(&self, returns: &Returns) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }

        let mut cumulative = 1.0;
        let mut running_max = 1.0;
        let mut max_drawdown = 0.0;

        for &ret in returns.values() {
            cumulative *= 1.0 + ret;
            if cumulative > running_max {
                running_max = cumulative;
            }
            let drawdown = (running_max - cumulative) / running_max;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }

        -max_drawdown
    }
}
