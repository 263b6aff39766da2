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

//! Boots one Hub process from a `RuntimeConfig` TOML file: the HTTP/WS server, the ZMQ bridge to
//! engine adapters, and the idle-client sweeper.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ferrum_core::RuntimeConfig;
use ferrum_hub::{AppState, Bridge, Registry, UserStore, router, spawn_sweeper};

#[derive(Parser)]
#[command(name = "ferrum-hub", about = "WS fan-out hub for the Ferrum trading runtime")]
struct Cli {
    /// Path to a RuntimeConfig TOML file (see `ferrum_core::config::RuntimeConfig`).
    #[arg(long, env = "FERRUM_CONFIG")]
    config: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = RuntimeConfig::load(&cli.config)?;

    let _guard = ferrum_common::logging::init(&config.log_dir, &format!("{}-hub", config.engine))?;
    ferrum_common::logging::sweep_expired(&config.log_dir, &format!("{}-hub", config.engine), config.log_retention_days)?;

    let user_store = Arc::new(UserStore::new(
        config.hub.jwt_secret.clone(),
        config.hub.access_token_ttl_secs,
        config.hub.refresh_token_ttl_secs,
    ));
    for user in &config.hub.users {
        user_store.insert_hashed(user.username.clone(), user.password_hash.clone());
    }

    let registry = Arc::new(Registry::new(Duration::from_secs(config.hub.ws_send_timeout_secs)));

    let zmq_ctx = zmq::Context::new();
    let (bridge, _sub_handle, _pub_handle) =
        Bridge::spawn(&zmq_ctx, &config.hub.zmq_sub_bind, &config.hub.zmq_pub_bind, registry.clone(), tokio::runtime::Handle::current())?;

    let sweep_interval = Duration::from_secs(config.hub.ws_idle_timeout_secs / 3).max(Duration::from_secs(1));
    let _sweeper = spawn_sweeper(registry.clone(), sweep_interval, Duration::from_secs(config.hub.ws_idle_timeout_secs));

    let state = AppState { user_store, registry, bridge };
    let app = router(state);

    log::info!("ferrum-hub listening on {} (zmq sub={} pub={})", config.hub.bind_addr, config.hub.zmq_sub_bind, config.hub.zmq_pub_bind);
    let listener = tokio::net::TcpListener::bind(&config.hub.bind_addr).await?;

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        log::info!("ferrum-hub shutting down");
    };
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    Ok(())
}
