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

//! Error types for the Hub's auth and ZMQ bridge layers (§4.L, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("zmq error: {0}")]
    Zmq(#[from] zmq::Error),
    #[error("password hashing error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("unknown username")]
    UnknownUser,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("wrong token kind: expected {expected}, got {actual}")]
    WrongTokenKind { expected: &'static str, actual: String },
}
