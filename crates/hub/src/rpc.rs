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

//! JSON-RPC 2.0 envelope types for the Hub's `/ws` protocol (§4.L, §6).
//!
//! Methods: `auth.login`, `sub.subscribe`, `sub.unsubscribe`, `engine.command`, `meta.pong`.
//! Notifications (server to client, no `id`): `event.emit`, `meta.ping`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes plus one reserved application code for "not authenticated yet".
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const UNAUTHENTICATED: i32 = -32000;
}

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    #[must_use]
    pub fn ok(id: Value, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
    }

    #[must_use]
    pub fn err(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: None, error: Some(RpcError { code, message: message.into() }) }
    }
}

/// A server-initiated notification: no `id`, never answered with a response.
#[derive(Debug, Serialize)]
pub struct RpcNotification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
}

impl RpcNotification {
    #[must_use]
    pub fn new(method: &'static str, params: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, method, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_parses_with_missing_id_and_params() {
        let req: RpcRequest = serde_json::from_str(r#"{"method":"meta.pong"}"#).unwrap();
        assert_eq!(req.method, "meta.pong");
        assert!(req.id.is_none());
        assert!(req.params.is_null());
    }

    #[test]
    fn response_err_omits_result_field() {
        let resp = RpcResponse::err(Value::from(1), error_codes::UNAUTHENTICATED, "not authenticated");
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("result").is_none());
        assert_eq!(json["error"]["code"], error_codes::UNAUTHENTICATED);
    }
}
