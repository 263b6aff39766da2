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

//! The `ferrum-backtest` binary's own TOML config: a starting cash figure, statistic parameters,
//! and one `[[contracts]]` entry per traded symbol naming its CSV bar file and commission/margin
//! parameters (§6 bar CSV contract, §4.E `ContractParams`).
//!
//! This is narrower than `ferrum_core::RuntimeConfig` (no adapter/hub wiring) because a backtest
//! run is a one-shot replay with no live ZMQ/WS surface — it is the `ferrum-cli` binary's own
//! config, not ambient runtime plumbing shared across binaries.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BacktestConfig {
    pub gateway_name: String,
    pub accountid: String,
    pub starting_cash: Decimal,
    #[serde(default)]
    pub risk_free_rate: f64,
    #[serde(default = "default_annual_days")]
    pub annual_days: f64,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    pub contracts: Vec<ContractConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ContractConfig {
    pub vt_symbol: String,
    pub csv_path: PathBuf,
    pub size: Decimal,
    pub long_rate: Decimal,
    pub short_rate: Decimal,
    pub margin_rate: Decimal,
}

fn default_annual_days() -> f64 {
    252.0
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl BacktestConfig {
    /// Loads and parses a backtest config from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails to parse as valid TOML matching this
    /// shape.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|source| anyhow::anyhow!("failed to read config file {}: {source}", path.as_ref().display()))?;
        let config: Self = toml::from_str(&text)
            .map_err(|source| anyhow::anyhow!("failed to parse config file {}: {source}", path.as_ref().display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backtest.toml");
        std::fs::write(
            &path,
            r#"
            gateway_name = "BACKTEST"
            accountid = "1"
            starting_cash = 1000000

            [[contracts]]
            vt_symbol = "MHI2507.HKFE"
            csv_path = "data/mhi2507.csv"
            size = 10
            long_rate = 0.0002
            short_rate = 0.0002
            margin_rate = 0.1
            "#,
        )
        .unwrap();

        let config = BacktestConfig::load(&path).unwrap();
        assert_eq!(config.gateway_name, "BACKTEST");
        assert_eq!(config.annual_days, 252.0);
        assert_eq!(config.contracts.len(), 1);
        assert_eq!(config.contracts[0].vt_symbol, "MHI2507.HKFE");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = BacktestConfig::load("/nonexistent/backtest.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
