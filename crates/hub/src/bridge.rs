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

//! The ZMQ half of the Hub (§4.L): binds a SUB socket that receives `order:<engine>` frames from
//! every connected adapter's [`ferrum_adapter::Publisher`] and bridges them onto `event.emit` WS
//! notifications, and a PUB socket that turns `engine.command` WS calls into `cmd:<engine>` /
//! `cmd:all` frames for the adapters' [`ferrum_adapter::Subscriber`] command loops.
//!
//! Like the adapter's own publisher, neither ZMQ socket is thread-safe to share, so each gets a
//! single dedicated thread; the SUB thread hands decoded frames to the tokio runtime via
//! `Handle::spawn` since `Registry::broadcast` is async, mirroring the adapter's own
//! thread-to-channel handoff for the inverse direction.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::JoinHandle;

use serde_json::{Value, json};
use tokio::runtime::Handle;

use crate::error::HubError;
use crate::registry::Registry;

enum CmdMessage {
    Send { topic: String, payload: Value },
    Shutdown,
}

/// Owns the Hub's two ZMQ sockets. Constructed once per process via [`Bridge::spawn`].
pub struct Bridge {
    cmd_tx: Sender<CmdMessage>,
}

impl Bridge {
    /// Binds the SUB socket at `sub_bind` (adapters' `Publisher::connect` dials in here) and the
    /// PUB socket at `pub_bind` (adapters' `Subscriber::connect` dials in here), and spawns one
    /// thread per socket.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Zmq`] if either socket cannot be created or bound.
    pub fn spawn(
        ctx: &zmq::Context,
        sub_bind: &str,
        pub_bind: &str,
        registry: Arc<Registry>,
        rt_handle: Handle,
    ) -> Result<(Arc<Self>, JoinHandle<()>, JoinHandle<()>), HubError> {
        let sub_socket = ctx.socket(zmq::SUB)?;
        sub_socket.set_linger(0)?;
        sub_socket.set_rcvtimeo(200)?;
        sub_socket.bind(sub_bind)?;
        sub_socket.set_subscribe(b"order:")?;

        let pub_socket = ctx.socket(zmq::PUB)?;
        pub_socket.set_linger(0)?;
        pub_socket.bind(pub_bind)?;

        let (cmd_tx, cmd_rx) = channel();
        let bridge = Arc::new(Self { cmd_tx });

        let sub_handle = std::thread::Builder::new()
            .name("hub-zmq-sub".into())
            .spawn(move || sub_loop(sub_socket, registry, rt_handle))
            .expect("failed to spawn hub zmq sub thread");

        let pub_handle = std::thread::Builder::new()
            .name("hub-zmq-pub".into())
            .spawn(move || pub_loop(pub_socket, cmd_rx))
            .expect("failed to spawn hub zmq pub thread");

        Ok((bridge, sub_handle, pub_handle))
    }

    /// Forwards an `engine.command` WS call as a `cmd:<engine>` (or `cmd:all`) frame.
    pub fn send_command(&self, target: &str, cmd: &str, data: Value) {
        let topic = if target == "all" { "cmd:all".to_owned() } else { format!("cmd:{target}") };
        let payload = json!({ "cmd": cmd, "data": data, "ts": chrono::Utc::now().timestamp() });
        let _ = self.cmd_tx.send(CmdMessage::Send { topic, payload });
    }

    /// Stops the PUB-side thread. The SUB thread stops on its own once its `rcvtimeo` next elapses
    /// after the caller drops every clone of its ZMQ context.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(CmdMessage::Shutdown);
    }
}

fn sub_loop(socket: zmq::Socket, registry: Arc<Registry>, rt_handle: Handle) {
    loop {
        let frames = match socket.recv_multipart(0) {
            Ok(frames) => frames,
            Err(zmq::Error::EAGAIN) => continue,
            Err(err) => {
                log::error!("hub zmq sub recv error: {err}");
                continue;
            }
        };

        let Some(topic_bytes) = frames.first() else {
            continue;
        };
        let Some(payload_bytes) = frames.get(1) else {
            log::error!("hub zmq sub received a frame with no payload");
            continue;
        };

        let topic = String::from_utf8_lossy(topic_bytes).into_owned();
        let data: Value = match serde_json::from_slice(payload_bytes) {
            Ok(value) => value,
            Err(err) => {
                log::error!("hub zmq sub received malformed JSON on {topic}: {err}");
                continue;
            }
        };

        let registry = registry.clone();
        rt_handle.spawn(async move { registry.broadcast(&topic, data).await });
    }
}

fn pub_loop(socket: zmq::Socket, cmd_rx: Receiver<CmdMessage>) {
    for message in cmd_rx {
        match message {
            CmdMessage::Shutdown => break,
            CmdMessage::Send { topic, payload } => {
                let bytes = serde_json::to_vec(&payload).unwrap_or_default();
                if let Err(err) = socket.send_multipart([topic.as_bytes(), bytes.as_slice()], 0) {
                    log::error!("hub zmq pub failed to send on {topic}: {err}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_command_targets_all_topic() {
        let ctx = zmq::Context::new();
        let registry = Arc::new(Registry::new(std::time::Duration::from_secs(1)));
        let (bridge, _sub, _pub) =
            Bridge::spawn(&ctx, "inproc://hub-bridge-test-sub-1", "inproc://hub-bridge-test-pub-1", registry, Handle::current()).unwrap();
        bridge.send_command("all", "snapshot", json!({}));
        bridge.shutdown();
    }
}
