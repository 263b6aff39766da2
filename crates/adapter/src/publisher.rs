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

//! Publisher side of the Engine<->Hub adapter (§4.K): turns local `order`/`position` events into
//! `order:<engine>` ZMQ frames, with epoch/seq tagging so a subscriber can tell a stale in-flight
//! message apart from the current snapshot generation.
//!
//! The PUB socket is not thread-safe to share, so a single dedicated thread owns it; handlers on
//! the bus worker thread only ever hand work to that thread through an internal channel, mirroring
//! the originating adapter's own `threading.Thread` + `Queue` split.

use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use ferrum_common::bus::{Event, EventBus, MessageHandler, topics};
use ferrum_execution::Oms;
use serde_json::{Value, json};

use crate::error::AdapterError;

enum QueueMessage {
    Event { payload: Value, enqueue_epoch: u64 },
    Snapshot { epoch: u64, payload: Value },
    Shutdown,
}

struct EpochState {
    epoch: u64,
    seq: u64,
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Subscribes to `order`/`position` events and forwards them, epoch/seq tagged, to a dedicated
/// publisher thread that owns the ZMQ PUB socket.
pub struct Publisher {
    handler_id: String,
    engine: String,
    queue_tx: Sender<QueueMessage>,
    state: Arc<Mutex<EpochState>>,
}

impl Publisher {
    /// Registers for `order`/`position` events and spawns the socket-owning thread connected to
    /// `pub_endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Zmq`] if the PUB socket cannot be created.
    pub fn spawn(
        engine: impl Into<String>,
        bus: &EventBus,
        ctx: &zmq::Context,
        pub_endpoint: &str,
    ) -> Result<(Arc<Self>, JoinHandle<()>), AdapterError> {
        let engine = engine.into();
        let socket = ctx.socket(zmq::PUB)?;
        socket.set_linger(0)?;
        socket.connect(pub_endpoint)?;

        let (queue_tx, queue_rx) = channel();
        let state = Arc::new(Mutex::new(EpochState { epoch: 1, seq: 0 }));
        let publisher = Arc::new(Self {
            handler_id: format!("adapter-publisher-{}", uuid::Uuid::new_v4()),
            engine: engine.clone(),
            queue_tx,
            state: state.clone(),
        });

        bus.register(topics::ORDER, publisher.clone());
        bus.register(topics::POSITION, publisher.clone());

        let topic = format!("order:{engine}");
        let handle = std::thread::Builder::new()
            .name(format!("{engine}-adapter-pub"))
            .spawn(move || pub_loop(socket, topic, queue_rx, state))
            .expect("failed to spawn adapter publisher thread");

        Ok((publisher, handle))
    }

    /// Triggers the epoch-switch snapshot (§4.K "Snapshot alignment"): increments the epoch,
    /// resets seq to zero, and enqueues one snapshot message built from `oms`'s current state.
    /// Any messages already queued under the old epoch are dropped by the publisher thread's
    /// enqueue-epoch check.
    pub fn snapshot(&self, oms: &Oms) {
        let payload = json!({
            "type": "snapshot",
            "engine": self.engine,
            "ts": now_ts(),
            "data": {
                "orders": oms.get_all_active_orders(),
                "positions": oms.get_all_positions(),
                "snapshot_at": now_ts(),
            },
        });

        let epoch = {
            let mut state = self.state.lock().expect(ferrum_core::correctness::FAILED);
            state.epoch += 1;
            state.seq = 0;
            state.epoch
        };

        let _ = self.queue_tx.send(QueueMessage::Snapshot { epoch, payload });
    }

    /// Stops the publisher thread. The caller should join the handle returned by [`Self::spawn`].
    pub fn shutdown(&self) {
        let _ = self.queue_tx.send(QueueMessage::Shutdown);
    }

    /// Pushes an arbitrary typed reply (`orders`, `log`, ...) through the same epoch/seq-tagged
    /// channel as the `order`/`position` events this publisher subscribes to — used by the
    /// subscriber side to answer `order.query`/`log.query` on the same outbound stream.
    pub(crate) fn enqueue(&self, event_type: &str, data: Value) {
        let enqueue_epoch = self.state.lock().expect(ferrum_core::correctness::FAILED).epoch;
        let payload = json!({
            "type": event_type,
            "engine": self.engine,
            "ts": now_ts(),
            "data": data,
        });
        let _ = self.queue_tx.send(QueueMessage::Event { payload, enqueue_epoch });
    }
}

impl MessageHandler for Publisher {
    fn id(&self) -> &str {
        &self.handler_id
    }

    fn handle(&self, event: &Event) {
        match event {
            Event::Order(order) => self.enqueue("order", json!(order)),
            Event::Position(position) => self.enqueue("position", json!(position)),
            _ => {}
        }
    }
}

fn pub_loop(socket: zmq::Socket, topic: String, queue_rx: Receiver<QueueMessage>, state: Arc<Mutex<EpochState>>) {
    for message in queue_rx {
        match message {
            QueueMessage::Shutdown => break,
            QueueMessage::Snapshot { epoch, mut payload } => {
                if let Value::Object(ref mut map) = payload {
                    map.insert("epoch".into(), json!(epoch));
                    map.insert("seq".into(), json!(0));
                }
                send(&socket, &topic, &payload);
            }
            QueueMessage::Event { mut payload, enqueue_epoch } => {
                // Reads the current epoch, drops stale messages, and increments seq, all under
                // one lock acquisition so a concurrent snapshot switch can't interleave with it.
                let mut guard = state.lock().expect(ferrum_core::correctness::FAILED);
                if enqueue_epoch < guard.epoch {
                    continue;
                }
                guard.seq += 1;
                let (epoch, seq) = (guard.epoch, guard.seq);
                drop(guard);

                if let Value::Object(ref mut map) = payload {
                    map.insert("epoch".into(), json!(epoch));
                    map.insert("seq".into(), json!(seq));
                }
                send(&socket, &topic, &payload);
            }
        }
    }
}

fn send(socket: &zmq::Socket, topic: &str, payload: &Value) {
    let bytes = serde_json::to_vec(payload).unwrap_or_default();
    if let Err(err) = socket.send_multipart([topic.as_bytes(), bytes.as_slice()], 0) {
        log::error!("adapter publisher failed to send on {topic}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use ferrum_common::bus::EventBus;
    use ferrum_execution::PositionPolicy;

    use super::*;

    #[test]
    fn spawn_registers_for_order_and_position() {
        let bus = EventBus::new();
        let ctx = zmq::Context::new();
        let (publisher, handle) = Publisher::spawn("TESTENG", &bus, &ctx, "inproc://pub-test-1").unwrap();
        assert!(bus.subscribed_topics().contains(topics::ORDER));
        assert!(bus.subscribed_topics().contains(topics::POSITION));
        publisher.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn snapshot_advances_epoch_and_resets_seq() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);
        let ctx = zmq::Context::new();
        let (publisher, handle) = Publisher::spawn("TESTENG", &bus, &ctx, "inproc://pub-test-2").unwrap();

        let before = publisher.state.lock().unwrap().epoch;
        publisher.snapshot(&oms);
        let after = publisher.state.lock().unwrap().epoch;
        assert_eq!(after, before + 1);

        publisher.shutdown();
        handle.join().unwrap();
    }
}
