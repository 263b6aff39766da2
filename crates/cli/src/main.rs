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

//! Wires together a concrete backtest run from a config file and one CSV bar series per contract,
//! then prints the resulting performance report and final account snapshot as JSON.
//!
//! Unlike `ferrum-hub`, this is a one-shot synchronous driver: `BacktestEngine::run` pumps
//! `EventBus::drain` in lockstep with no need for an async runtime.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use config::BacktestConfig;
use ferrum_backtest::{BacktestEngine, ContractParams};
use ferrum_common::bus::EventBus;
use serde_json::json;

#[derive(Parser)]
#[command(name = "ferrum-backtest", about = "Runs a single backtest from a config file and CSV bar series")]
struct Cli {
    /// Path to a backtest config TOML file (see `ferrum_cli::config::BacktestConfig`).
    #[arg(long, env = "FERRUM_BACKTEST_CONFIG")]
    config: PathBuf,
    /// Where to write the JSON summary. Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = BacktestConfig::load(&cli.config)?;

    let _guard = ferrum_common::logging::init(&config.log_dir, "backtest")?;
    ferrum_common::logging::sweep_expired(&config.log_dir, "backtest", 30)?;

    let bus = Arc::new(EventBus::new());
    let mut engine = BacktestEngine::new(config.gateway_name.clone(), config.accountid.clone(), config.starting_cash, bus);

    let mut all_bars = Vec::new();
    for contract in &config.contracts {
        engine.set_contract_params(
            contract.vt_symbol.clone(),
            ContractParams {
                size: contract.size,
                long_rate: contract.long_rate,
                short_rate: contract.short_rate,
                margin_rate: contract.margin_rate,
            },
        );
        let bars = ferrum_backtest::load_bars(&contract.csv_path, config.gateway_name.clone())?;
        log::info!("loaded {} bars for {} from {}", bars.len(), contract.vt_symbol, contract.csv_path.display());
        all_bars.extend(bars);
    }

    let report = engine.run(all_bars, config.risk_free_rate, config.annual_days)?;
    let account = engine.account_snapshot();

    log::info!(
        "backtest complete: total_return={:.4} sharpe_ratio={:.4} max_drawdown={:.4}",
        report.total_return,
        report.sharpe_ratio,
        report.max_drawdown
    );

    let summary = json!({
        "report": {
            "start_date": report.start_date.map(|dt| dt.to_rfc3339()),
            "end_date": report.end_date.map(|dt| dt.to_rfc3339()),
            "total_days": report.total_days,
            "total_return": report.total_return,
            "annual_return": report.annual_return,
            "sharpe_ratio": report.sharpe_ratio,
            "max_drawdown": report.max_drawdown,
            "max_drawdown_duration": report.max_drawdown_duration,
            "profit_days": report.profit_days,
            "loss_days": report.loss_days,
            "return_drawdown_ratio": report.return_drawdown_ratio,
        },
        "account": {
            "vt_accountid": account.vt_accountid(),
            "cash": account.cash.to_string(),
            "margin": account.margin.to_string(),
            "realized_pnl": account.realized_pnl.to_string(),
            "unrealized_pnl": account.unrealized_pnl.to_string(),
            "equity": account.equity.to_string(),
            "available": account.available.to_string(),
        },
    });

    let rendered = serde_json::to_string_pretty(&summary)?;
    match &cli.out {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }

    Ok(())
}
