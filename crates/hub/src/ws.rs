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

//! The `/ws` JSON-RPC 2.0 endpoint (§4.L, §6): `auth.login`, `sub.subscribe`, `sub.unsubscribe`,
//! `engine.command`, `meta.pong`, fanning out `event.emit`/`meta.ping` notifications queued by the
//! [`crate::registry::Registry`] and the ZMQ [`crate::bridge::Bridge`].

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::rpc::{RpcRequest, RpcResponse, error_codes};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

pub async fn ws_handler(ws: WebSocketUpgrade, Query(query): Query<WsQuery>, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

async fn handle_socket(socket: WebSocket, query: WsQuery, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = tokio::sync::mpsc::unbounded_channel();
    let client = state.registry.register(outbound_tx);

    // A token supplied at upgrade time (the only way a browser can send one for a WS handshake)
    // authenticates the connection immediately; otherwise the client must call `auth.login` as
    // its first RPC before any other method is accepted.
    let mut authenticated_as: Option<String> = query
        .token
        .as_deref()
        .and_then(|token| state.user_store.authenticate(token).ok())
        .map(|claims| claims.sub);

    loop {
        tokio::select! {
            outgoing = outbound_rx.recv() => {
                let Some(text) = outgoing else { break };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                let Some(Ok(message)) = incoming else { break };
                match message {
                    Message::Text(text) => {
                        client.touch();
                        handle_rpc_text(&text, &mut authenticated_as, &client, &state);
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    }

    state.registry.remove(client.id);
}

fn handle_rpc_text(text: &str, authenticated_as: &mut Option<String>, client: &crate::registry::ClientHandle, state: &AppState) {
    let request: RpcRequest = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(err) => {
            log::warn!("dropping malformed JSON-RPC frame: {err}");
            return;
        }
    };
    let id = request.id.clone().unwrap_or(Value::Null);
    let Some(response) = dispatch(&request, authenticated_as, client, state) else {
        return;
    };
    if let Ok(text) = serde_json::to_string(&response) {
        client.send(text);
    }
    let _ = id; // response already carries the echoed id
}

fn dispatch(request: &RpcRequest, authenticated_as: &mut Option<String>, client: &crate::registry::ClientHandle, state: &AppState) -> Option<RpcResponse> {
    let id = request.id.clone().unwrap_or(Value::Null);

    if request.method != "auth.login" && authenticated_as.is_none() {
        return Some(RpcResponse::err(id, error_codes::UNAUTHENTICATED, "auth.login required before other methods"));
    }

    match request.method.as_str() {
        "auth.login" => Some(auth_login(id, &request.params, authenticated_as, state)),
        "sub.subscribe" => Some(sub_change(id, &request.params, client, state, true)),
        "sub.unsubscribe" => Some(sub_change(id, &request.params, client, state, false)),
        "engine.command" => Some(engine_command(id, &request.params, state)),
        "meta.pong" => {
            client.touch();
            Some(RpcResponse::ok(id, json!({})))
        }
        other => Some(RpcResponse::err(id, error_codes::METHOD_NOT_FOUND, format!("unknown method '{other}'"))),
    }
}

#[derive(Deserialize)]
struct LoginParams {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

fn auth_login(id: Value, params: &Value, authenticated_as: &mut Option<String>, state: &AppState) -> RpcResponse {
    let Ok(params) = serde_json::from_value::<LoginParams>(params.clone()) else {
        return RpcResponse::err(id, error_codes::INVALID_PARAMS, "auth.login requires username/password or token");
    };

    if let Some(token) = params.token {
        return match state.user_store.authenticate(&token) {
            Ok(claims) => {
                *authenticated_as = Some(claims.sub.clone());
                RpcResponse::ok(id, json!({ "username": claims.sub }))
            }
            Err(err) => RpcResponse::err(id, error_codes::UNAUTHENTICATED, err.to_string()),
        };
    }

    let (Some(username), Some(password)) = (params.username, params.password) else {
        return RpcResponse::err(id, error_codes::INVALID_PARAMS, "auth.login requires username/password or token");
    };

    match state.user_store.login(&username, &password) {
        Ok((access, refresh, expires_in)) => {
            *authenticated_as = Some(username);
            RpcResponse::ok(id, json!({ "access_token": access, "refresh_token": refresh, "expires_in": expires_in }))
        }
        Err(err) => RpcResponse::err(id, error_codes::UNAUTHENTICATED, err.to_string()),
    }
}

#[derive(Deserialize)]
struct TopicsParams {
    #[serde(default)]
    topics: Vec<String>,
}

fn sub_change(id: Value, params: &Value, client: &crate::registry::ClientHandle, state: &AppState, subscribe: bool) -> RpcResponse {
    let Ok(params) = serde_json::from_value::<TopicsParams>(params.clone()) else {
        return RpcResponse::err(id, error_codes::INVALID_PARAMS, "expected { topics: [...] }");
    };
    if subscribe {
        state.registry.subscribe(client.id, &params.topics);
    } else {
        state.registry.unsubscribe(client.id, &params.topics);
    }
    RpcResponse::ok(id, json!({ "topics": params.topics }))
}

#[derive(Deserialize)]
struct EngineCommandParams {
    engine: String,
    cmd: String,
    #[serde(default)]
    data: Value,
}

fn engine_command(id: Value, params: &Value, state: &AppState) -> RpcResponse {
    let Ok(params) = serde_json::from_value::<EngineCommandParams>(params.clone()) else {
        return RpcResponse::err(id, error_codes::INVALID_PARAMS, "expected { engine, cmd, data? }");
    };
    state.bridge.send_command(&params.engine, &params.cmd, params.data);
    RpcResponse::ok(id, json!({ "accepted": true }))
}
