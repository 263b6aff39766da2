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

//! Message handler functionality for the event bus.
//!
//! Unlike a thread-confined bus, this one accepts `put` calls from arbitrary producer threads
//! (market data ingress, the adapter's receiver thread, the Hub's network task) while dispatch
//! always runs on the bus's own worker thread (§5 of the specification). Handlers therefore need
//! to be `Send + Sync` rather than the `Rc`-based thread-local handler some single-runtime buses
//! use.

use std::sync::Arc;

use uuid::Uuid;

use super::core::Event;

/// A registered reaction to events on some topic.
pub trait MessageHandler: Send + Sync {
    /// A stable identifier used for idempotent `register`/`unregister` and for log output.
    fn id(&self) -> &str;
    /// Handles a single event. Must not block indefinitely (§5): long work belongs on a
    /// component's own thread, not inside this callback.
    fn handle(&self, event: &Event);
}

/// A handler built from a plain closure, with an auto-generated or caller-supplied ID.
pub struct ClosureHandler<F: Fn(&Event) + Send + Sync + 'static> {
    id: String,
    callback: F,
}

impl<F: Fn(&Event) + Send + Sync + 'static> ClosureHandler<F> {
    pub fn new(id: impl Into<Option<String>>, callback: F) -> Self {
        let id = id.into().unwrap_or_else(|| Uuid::new_v4().to_string());
        Self { id, callback }
    }
}

impl<F: Fn(&Event) + Send + Sync + 'static> MessageHandler for ClosureHandler<F> {
    fn id(&self) -> &str {
        &self.id
    }

    fn handle(&self, event: &Event) {
        (self.callback)(event);
    }
}

/// A cheaply clonable, shareable handle to a registered handler.
pub type SharedHandler = Arc<dyn MessageHandler>;

/// Wraps any closure as a [`SharedHandler`] with an auto-generated ID.
pub fn handler_fn<F: Fn(&Event) + Send + Sync + 'static>(callback: F) -> SharedHandler {
    Arc::new(ClosureHandler::new(None, callback))
}

/// Wraps any closure as a [`SharedHandler`] with a caller-supplied, stable ID — needed when the
/// caller later wants to `unregister` this exact handler by identity.
pub fn handler_fn_named<F: Fn(&Event) + Send + Sync + 'static>(id: impl Into<String>, callback: F) -> SharedHandler {
    Arc::new(ClosureHandler::new(Some(id.into()), callback))
}
