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

//! TOML-backed runtime configuration.
//!
//! This is ambient plumbing: every binary built on this workspace needs to know its engine name,
//! where to bind its adapter sockets, and where to write logs, regardless of which functional
//! modules it wires up.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level runtime configuration, loaded once at process start.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// The engine name used in composite IDs, log file names, and adapter topics.
    pub engine: String,
    /// Symbols muted from strategy-originated order/modify requests at startup.
    #[serde(default)]
    pub muted_symbols: Vec<String>,
    /// Directory rotated log files are written under.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// How many days of rotated logs to retain.
    #[serde(default = "default_retention_days")]
    pub log_retention_days: i64,
    pub adapter: AdapterConfig,
    pub hub: HubConfig,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

const fn default_retention_days() -> i64 {
    30
}

/// ZMQ endpoint configuration for the Engine<->Hub adapter.
///
/// Both sockets connect outward to the Hub, which binds the corresponding ends: the adapter's
/// PUB connects to the Hub's bound SUB, and the adapter's SUB connects to the Hub's bound PUB.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Endpoint the adapter's PUB socket connects to, e.g. `tcp://127.0.0.1:5555`.
    pub pub_endpoint: String,
    /// Endpoint the adapter's SUB socket connects to, e.g. `tcp://127.0.0.1:5556`.
    pub sub_endpoint: String,
}

/// Hub bind address and JWT signing configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HubConfig {
    /// HTTP/WS bind address serving `/login`, `/refresh`, and the `/ws` JSON-RPC socket.
    pub bind_addr: String,
    pub jwt_secret: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_token_ttl_secs: i64,
    /// Bind address for the Hub's ZMQ SUB socket, the far end of every engine's
    /// [`AdapterConfig::pub_endpoint`].
    #[serde(default = "default_zmq_sub_bind")]
    pub zmq_sub_bind: String,
    /// Bind address for the Hub's ZMQ PUB socket, the far end of every engine's
    /// [`AdapterConfig::sub_endpoint`].
    #[serde(default = "default_zmq_pub_bind")]
    pub zmq_pub_bind: String,
    /// Per-send WS fan-out timeout before a slow client is evicted (§4.L).
    #[serde(default = "default_ws_send_timeout_secs")]
    pub ws_send_timeout_secs: u64,
    /// Idle threshold after which the ping sweeper evicts a silent client (§4.L).
    #[serde(default = "default_ws_idle_timeout_secs")]
    pub ws_idle_timeout_secs: u64,
    /// Bootstrap user table. Passwords are pre-hashed by the operator (§1 Non-goals excludes a
    /// user-management CRUD surface; this is the config-file equivalent of the originating
    /// system's small users DB).
    #[serde(default)]
    pub users: Vec<SeededUser>,
}

/// One bootstrap credential: a username and an already-bcrypt-hashed password.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeededUser {
    pub username: String,
    pub password_hash: String,
}

const fn default_access_ttl_secs() -> i64 {
    900
}

const fn default_refresh_ttl_secs() -> i64 {
    604_800
}

fn default_zmq_sub_bind() -> String {
    "tcp://0.0.0.0:5555".to_owned()
}

fn default_zmq_pub_bind() -> String {
    "tcp://0.0.0.0:5556".to_owned()
}

const fn default_ws_send_timeout_secs() -> u64 {
    1
}

const fn default_ws_idle_timeout_secs() -> u64 {
    45
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or fails to parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.toml");
        std::fs::write(
            &path,
            r#"
            engine = "mhi"

            [adapter]
            pub_endpoint = "tcp://127.0.0.1:5555"
            sub_endpoint = "tcp://127.0.0.1:5556"

            [hub]
            bind_addr = "0.0.0.0:8080"
            jwt_secret = "dev-secret"
            "#,
        )
        .unwrap();

        let cfg = RuntimeConfig::load(&path).unwrap();
        assert_eq!(cfg.engine, "mhi");
        assert_eq!(cfg.log_dir, PathBuf::from("logs"));
        assert_eq!(cfg.log_retention_days, 30);
        assert_eq!(cfg.hub.access_token_ttl_secs, 900);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = RuntimeConfig::load("/nonexistent/runtime.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
