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

//! Wires the Hub's HTTP surface (`POST /login`, `POST /refresh`, `GET /ws`) together with the
//! shared [`AppState`] the handlers in [`crate::ws`] close over (§4.L, §6).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::UserStore;
use crate::bridge::Bridge;
use crate::registry::Registry;

#[derive(Clone)]
pub struct AppState {
    pub user_store: Arc<UserStore>,
    pub registry: Arc<Registry>,
    pub bridge: Arc<Bridge>,
}

/// Builds the Hub's router: `POST /login`, `POST /refresh`, `GET /ws`.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/ws", get(crate::ws::ws_handler))
        .with_state(state)
}

/// Spawns the background idle-client sweeper (§4.L: "a periodic sweeper pings all clients and
/// evicts any whose last activity exceeds a threshold").
pub fn spawn_sweeper(registry: Arc<Registry>, interval: Duration, idle_timeout: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            registry.sweep(idle_timeout);
        }
    })
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
}

async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> Result<Json<LoginResponse>, ApiError> {
    let (access_token, refresh_token, expires_in) = state.user_store.login(&payload.username, &payload.password)?;
    Ok(Json(LoginResponse { access_token, refresh_token, expires_in }))
}

#[derive(Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Serialize)]
struct RefreshResponse {
    access_token: String,
}

async fn refresh(State(state): State<AppState>, Json(payload): Json<RefreshRequest>) -> Result<Json<RefreshResponse>, ApiError> {
    let (access_token, _expires_in) = state.user_store.refresh(&payload.refresh_token)?;
    Ok(Json(RefreshResponse { access_token }))
}

struct ApiError(crate::error::HubError);

impl From<crate::error::HubError> for ApiError {
    fn from(err: crate::error::HubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            crate::error::HubError::UnknownUser | crate::error::HubError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            crate::error::HubError::InvalidToken | crate::error::HubError::WrongTokenKind { .. } => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}
