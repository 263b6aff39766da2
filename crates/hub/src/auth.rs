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

//! A small in-memory, bcrypt-hashed user table and the JWT access/refresh token codec backing
//! `POST /login`, `POST /refresh`, and the `auth.login` WS method (§4.L).
//!
//! The spec explicitly keeps user-management CRUD and a real user-DB out of scope (§1
//! Non-goals): this is the minimal credential store the Hub needs to mint tokens, not a
//! multi-tenant identity service.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::HubError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims carried by both access and refresh tokens; `kind` distinguishes which so a refresh
/// token presented as a bearer token (or vice versa) is rejected rather than silently accepted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    exp: i64,
    kind: TokenKind,
}

/// One user record: username plus a bcrypt password hash. Never logged or serialized to a WS
/// client.
struct UserRecord {
    password_hash: String,
}

/// The credential store and token minter. Cheap to clone-share via `Arc` since its only mutable
/// state (the user map) is behind an `RwLock`.
pub struct UserStore {
    users: RwLock<HashMap<String, UserRecord>>,
    jwt_secret: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl UserStore {
    #[must_use]
    pub fn new(jwt_secret: impl Into<String>, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            jwt_secret: jwt_secret.into(),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Adds or replaces a user's password. Hashing happens here so callers (config loaders, admin
    /// tooling) never handle a raw hash.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Bcrypt`] if hashing fails.
    pub fn set_password(&self, username: impl Into<String>, password: &str) -> Result<(), HubError> {
        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
        self.users.write().expect(ferrum_core::correctness::FAILED).insert(username.into(), UserRecord { password_hash: hash });
        Ok(())
    }

    /// Inserts a user whose password is already bcrypt-hashed (the config-seeded bootstrap path,
    /// as opposed to [`Self::set_password`]'s raw-password path used by tests and admin tooling).
    pub fn insert_hashed(&self, username: impl Into<String>, password_hash: impl Into<String>) {
        self.users
            .write()
            .expect(ferrum_core::correctness::FAILED)
            .insert(username.into(), UserRecord { password_hash: password_hash.into() });
    }

    /// Verifies `username`/`password` and mints an `(access_token, refresh_token, expires_in)`
    /// triple on success.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::UnknownUser`] or [`HubError::InvalidCredentials`] on a bad login, or a
    /// JWT encoding error.
    pub fn login(&self, username: &str, password: &str) -> Result<(String, String, i64), HubError> {
        let verified = {
            let users = self.users.read().expect(ferrum_core::correctness::FAILED);
            let record = users.get(username).ok_or(HubError::UnknownUser)?;
            bcrypt::verify(password, &record.password_hash)?
        };
        if !verified {
            return Err(HubError::InvalidCredentials);
        }
        let access = self.issue(username, TokenKind::Access, self.access_ttl_secs)?;
        let refresh = self.issue(username, TokenKind::Refresh, self.refresh_ttl_secs)?;
        Ok((access, refresh, self.access_ttl_secs))
    }

    /// Exchanges a valid, unexpired refresh token for a fresh access token.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidToken`]/[`HubError::WrongTokenKind`] if `refresh_token` is
    /// malformed, expired, or is actually an access token.
    pub fn refresh(&self, refresh_token: &str) -> Result<(String, i64), HubError> {
        let claims = self.decode(refresh_token)?;
        if claims.kind != TokenKind::Refresh {
            return Err(HubError::WrongTokenKind { expected: "refresh", actual: claims.kind.to_string() });
        }
        let access = self.issue(&claims.sub, TokenKind::Access, self.access_ttl_secs)?;
        Ok((access, self.access_ttl_secs))
    }

    /// Validates a bearer token presented over `/ws` or `engine.command` and returns its claims,
    /// rejecting a refresh token used in place of an access token.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidToken`] or [`HubError::WrongTokenKind`].
    pub fn authenticate(&self, access_token: &str) -> Result<Claims, HubError> {
        let claims = self.decode(access_token)?;
        if claims.kind != TokenKind::Access {
            return Err(HubError::WrongTokenKind { expected: "access", actual: claims.kind.to_string() });
        }
        Ok(claims)
    }

    fn issue(&self, username: &str, kind: TokenKind, ttl_secs: i64) -> Result<String, HubError> {
        let exp = Utc::now().timestamp() + ttl_secs;
        let claims = Claims { sub: username.to_owned(), exp, kind };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(self.jwt_secret.as_bytes()))?;
        Ok(token)
    }

    fn decode(&self, token: &str) -> Result<Claims, HubError> {
        let decoded = decode::<Claims>(token, &DecodingKey::from_secret(self.jwt_secret.as_bytes()), &Validation::default())
            .map_err(|_| HubError::InvalidToken)?;
        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> UserStore {
        let store = UserStore::new("test-secret", 900, 604_800);
        store.set_password("alice", "hunter2").unwrap();
        store
    }

    #[test]
    fn login_round_trips_through_authenticate() {
        let store = store();
        let (access, _refresh, expires_in) = store.login("alice", "hunter2").unwrap();
        assert_eq!(expires_in, 900);
        let claims = store.authenticate(&access).unwrap();
        assert_eq!(claims.sub, "alice");
    }

    #[test]
    fn wrong_password_is_rejected() {
        let store = store();
        let err = store.login("alice", "wrong").unwrap_err();
        assert!(matches!(err, HubError::InvalidCredentials));
    }

    #[test]
    fn unknown_user_is_rejected() {
        let store = store();
        let err = store.login("bob", "anything").unwrap_err();
        assert!(matches!(err, HubError::UnknownUser));
    }

    #[test]
    fn refresh_token_cannot_be_used_as_access_token() {
        let store = store();
        let (_access, refresh, _) = store.login("alice", "hunter2").unwrap();
        let err = store.authenticate(&refresh).unwrap_err();
        assert!(matches!(err, HubError::WrongTokenKind { expected: "access", .. }));
    }

    #[test]
    fn access_token_cannot_be_used_to_refresh() {
        let store = store();
        let (access, _refresh, _) = store.login("alice", "hunter2").unwrap();
        let err = store.refresh(&access).unwrap_err();
        assert!(matches!(err, HubError::WrongTokenKind { expected: "refresh", .. }));
    }

    #[test]
    fn refresh_mints_a_new_access_token() {
        let store = store();
        let (_access, refresh, _) = store.login("alice", "hunter2").unwrap();
        let (new_access, expires_in) = store.refresh(&refresh).unwrap();
        assert_eq!(expires_in, 900);
        assert!(store.authenticate(&new_access).is_ok());
    }
}
