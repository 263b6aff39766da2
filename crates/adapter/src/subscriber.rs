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

//! Subscriber side of the Engine<->Hub adapter (§4.K): the command loop that listens on
//! `cmd:<engine>` and `cmd:all` and executes the recognized commands against the OMS, the
//! publisher, and the bus.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use chrono::{DateTime, NaiveDate, Utc};
use ferrum_common::bus::{BusHandle, CommandEvent, Event};
use ferrum_core::paths::log_file_path;
use ferrum_execution::{Firewall, Oms};
use ferrum_model::{CancelRequest, Direction, ModifyRequest, Offset, OrderRequest, OrderType};
use ferrum_trading::RolloverManager;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AdapterError;
use crate::publisher::Publisher;

const DEFAULT_LOG_LIMIT: usize = 500;
const MAX_LOG_LIMIT: usize = 10_000;

#[derive(Deserialize)]
struct CommandPayload {
    cmd: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize, Default)]
struct OrderQuery {
    limit: Option<usize>,
    start_date: Option<i64>,
    end_date: Option<i64>,
}

#[derive(Deserialize, Default)]
struct OrderModify {
    vt_orderid: String,
    qty: Option<rust_decimal::Decimal>,
    trigger_price: Option<rust_decimal::Decimal>,
    price: Option<rust_decimal::Decimal>,
}

#[derive(Deserialize, Default)]
struct OrderCancel {
    vt_orderid: String,
}

#[derive(Deserialize, Default)]
struct PositionClose {
    vt_positionid: String,
}

#[derive(Deserialize, Default)]
struct LogQuery {
    date: Option<String>,
    start: Option<String>,
    end: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    level: Vec<String>,
}

/// Owns the SUB socket and runs the command loop on a dedicated thread.
pub struct Subscriber {
    running: Arc<AtomicBool>,
}

impl Subscriber {
    /// Spawns the command-loop thread, connected to `sub_endpoint` and subscribed to
    /// `cmd:<engine>`/`cmd:all`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Zmq`] if the SUB socket cannot be created.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        engine: impl Into<String>,
        bus: BusHandle,
        oms: Arc<Oms>,
        publisher: Arc<Publisher>,
        ctx: &zmq::Context,
        sub_endpoint: &str,
        log_dir: PathBuf,
        firewall: Option<Arc<Firewall>>,
        rollover: Option<Arc<RolloverManager>>,
    ) -> Result<(Self, JoinHandle<()>), AdapterError> {
        let engine = engine.into();
        let socket = ctx.socket(zmq::SUB)?;
        socket.set_linger(0)?;
        socket.set_rcvtimeo(200)?;
        socket.connect(sub_endpoint)?;
        socket.set_subscribe(format!("cmd:{engine}").as_bytes())?;
        socket.set_subscribe(b"cmd:all")?;

        let running = Arc::new(AtomicBool::new(true));
        let worker = Worker { engine, bus, oms, publisher, log_dir, firewall, rollover };

        let running_clone = running.clone();
        let handle = std::thread::Builder::new()
            .name(format!("{}-adapter-sub", worker.engine))
            .spawn(move || sub_loop(socket, worker, running_clone))
            .expect("failed to spawn adapter subscriber thread");

        Ok((Self { running }, handle))
    }

    /// Stops the command loop at its next receive timeout.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

struct Worker {
    engine: String,
    bus: BusHandle,
    oms: Arc<Oms>,
    publisher: Arc<Publisher>,
    log_dir: PathBuf,
    /// Read-only handle onto the Trade Engine's firewall, for `engine.status` (§10.6). `None`
    /// when this adapter runs without a co-located `TradeEngine` (e.g. most unit tests).
    firewall: Option<Arc<Firewall>>,
    /// Read-only handle onto the Rollover Manager's in-flight task, for `engine.status` (§10.6).
    rollover: Option<Arc<RolloverManager>>,
}

fn sub_loop(socket: zmq::Socket, worker: Worker, running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        let frames = match socket.recv_multipart(0) {
            Ok(frames) => frames,
            Err(zmq::Error::EAGAIN) => continue,
            Err(err) => {
                log::error!("adapter subscriber recv error: {err}");
                continue;
            }
        };

        let Some(payload_bytes) = frames.get(1) else {
            log::error!("adapter subscriber received a frame with no payload");
            continue;
        };

        let command: CommandPayload = match serde_json::from_slice(payload_bytes) {
            Ok(command) => command,
            Err(err) => {
                log::error!("[{}] bad command payload: {err}", worker.engine);
                continue;
            }
        };

        dispatch(&worker, &command.cmd, command.data);
    }
}

fn dispatch(worker: &Worker, cmd: &str, data: Value) {
    match cmd {
        "snapshot" => worker.publisher.snapshot(&worker.oms),
        "order.query" => handle_order_query(worker, data),
        "log.query" => handle_log_query(worker, data),
        "engine.status" => handle_engine_status(worker),
        "order.modify" => handle_order_modify(worker, data),
        "order.cancel" => handle_order_cancel(worker, data),
        "position.close" => handle_position_close(worker, data),
        other => {
            worker.bus.put(Event::Command(CommandEvent { cmd: other.to_owned(), data }));
        }
    }
}

fn handle_order_query(worker: &Worker, data: Value) {
    let query: OrderQuery = serde_json::from_value(data).unwrap_or_default();
    let start = query.start_date.map(|secs| ferrum_core::UnixNanos::new((secs.max(0) as u64) * 1_000_000_000));
    let end = query.end_date.map(|secs| ferrum_core::UnixNanos::new((secs.max(0) as u64) * 1_000_000_000));
    let orders = worker.oms.filter_orders(query.limit, start, end);
    worker.publisher.enqueue("orders", json!(orders));
}

/// Builds the `engine.status` payload (§10.6: the firewall's mute/switch state and the rollover
/// manager's in-flight task are both exposed read-only). Either handle may be absent — an adapter
/// spawned without a co-located `TradeEngine`/`RolloverManager` reports `null` for that half.
fn engine_status_payload(firewall: Option<&Firewall>, rollover: Option<&RolloverManager>) -> Value {
    let firewall = firewall.map(|firewall| {
        json!({
            "active": firewall.is_active(),
            "muted_symbols": firewall.muted_symbols(),
        })
    });
    let rollover = rollover.and_then(RolloverManager::status).map(|status| json!(status));
    json!({ "firewall": firewall, "rollover": rollover })
}

/// `engine.status`: dispatches to [`engine_status_payload`] and publishes the result.
fn handle_engine_status(worker: &Worker) {
    let payload = engine_status_payload(worker.firewall.as_deref(), worker.rollover.as_deref());
    worker.publisher.enqueue("status", payload);
}

fn handle_order_modify(worker: &Worker, data: Value) {
    let Ok(request) = serde_json::from_value::<OrderModify>(data) else {
        log::error!("[{}] malformed order.modify command", worker.engine);
        return;
    };
    let Some(order) = worker.oms.get_order(&request.vt_orderid) else {
        return;
    };
    if request.qty.is_none() && request.trigger_price.is_none() && request.price.is_none() {
        return;
    }
    worker.bus.put(Event::ModifyRequest(ModifyRequest {
        orderid: order.orderid,
        symbol: order.symbol,
        exchange: order.exchange,
        volume: request.qty.unwrap_or(order.volume),
        price: request.price.unwrap_or(order.price),
        trigger_price: request.trigger_price.unwrap_or(order.trigger_price),
    }));
}

fn handle_order_cancel(worker: &Worker, data: Value) {
    let Ok(request) = serde_json::from_value::<OrderCancel>(data) else {
        log::error!("[{}] malformed order.cancel command", worker.engine);
        return;
    };
    let Some(order) = worker.oms.get_order(&request.vt_orderid) else {
        return;
    };
    worker.bus.put(Event::CancelRequest(CancelRequest {
        orderid: order.orderid,
        symbol: order.symbol,
        exchange: order.exchange,
    }));
}

fn handle_position_close(worker: &Worker, data: Value) {
    let Ok(request) = serde_json::from_value::<PositionClose>(data) else {
        log::error!("[{}] malformed position.close command", worker.engine);
        return;
    };
    let Some(position) = worker.oms.get_position(&request.vt_positionid) else {
        return;
    };
    let direction = match position.direction {
        Direction::Long => Direction::Short,
        Direction::Short => Direction::Long,
        Direction::Net => Direction::Net,
    };
    worker.bus.put(Event::OrderRequest(OrderRequest {
        symbol: position.symbol,
        exchange: position.exchange,
        direction,
        order_type: OrderType::Market,
        volume: position.volume,
        price: rust_decimal::Decimal::ZERO,
        trigger_price: rust_decimal::Decimal::ZERO,
        offset: Offset::Close,
        reference: format!("{}_Close", worker.engine),
    }));
}

fn handle_log_query(worker: &Worker, data: Value) {
    let query: LogQuery = serde_json::from_value(data).unwrap_or_default();
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);

    let start = query.start.as_deref().and_then(parse_log_datetime);
    let end = query.end.as_deref().and_then(parse_log_datetime);
    let today = Utc::now().date_naive();
    let date = query
        .date
        .as_deref()
        .and_then(|s| s.parse::<NaiveDate>().ok())
        .or_else(|| start.map(|dt| dt.date_naive()))
        .unwrap_or(today);

    let path = log_file_path(&worker.log_dir, &worker.engine, date, today);
    let lines = read_log_lines(&path, start, end, &query.include, &query.level, limit);

    let payload = json!({
        "path": path.to_string_lossy(),
        "count": lines.len(),
        "range": {
            "start": start.map(|dt| dt.to_rfc3339()),
            "end": end.map(|dt| dt.to_rfc3339()),
        },
        "lines": lines,
    });
    worker.publisher.enqueue("log", payload);
}

fn parse_log_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc)).or_else(|| {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok().map(|naive| naive.and_utc())
    })
}

fn line_timestamp(line: &str) -> Option<DateTime<Utc>> {
    let prefix = line.split_whitespace().next()?;
    DateTime::parse_from_rfc3339(prefix).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Reads the tail of a rotated log file, filtering by timestamp range, level, and substring
/// match. A missing file yields no lines rather than an error (§4.K: absent log is an empty
/// result, not a protocol failure).
fn read_log_lines(
    path: &std::path::Path,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    include: &[String],
    level: &[String],
    limit: usize,
) -> Vec<String> {
    let Ok(text) = fs::read_to_string(path) else {
        return Vec::new();
    };

    let matched: Vec<String> = text
        .lines()
        .filter(|line| {
            if let Some(start) = start {
                match line_timestamp(line) {
                    Some(ts) if ts >= start => {}
                    _ => return false,
                }
            }
            if let Some(end) = end {
                match line_timestamp(line) {
                    Some(ts) if ts <= end => {}
                    _ => return false,
                }
            }
            if !level.is_empty() && !level.iter().any(|l| line.to_uppercase().contains(&l.to_uppercase())) {
                return false;
            }
            if !include.is_empty() && !include.iter().any(|term| line.contains(term.as_str())) {
                return false;
            }
            true
        })
        .map(str::to_owned)
        .collect();

    let start_index = matched.len().saturating_sub(limit);
    matched[start_index..].to_vec()
}

#[cfg(test)]
mod tests {
    use ferrum_common::bus::{EventBus, MessageHandler};
    use ferrum_execution::{Oms, PositionPolicy};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn engine_status_reports_null_for_absent_handles() {
        let payload = engine_status_payload(None, None);
        assert_eq!(payload["firewall"], Value::Null);
        assert_eq!(payload["rollover"], Value::Null);
    }

    #[test]
    fn engine_status_reports_firewall_mute_state() {
        let firewall = Firewall::new();
        firewall.set_mute(&["MHI2507.HKFE".to_owned()], true);
        firewall.set_active(false);

        let payload = engine_status_payload(Some(&firewall), None);
        assert_eq!(payload["firewall"]["active"], false);
        assert_eq!(payload["firewall"]["muted_symbols"], serde_json::json!(["MHI2507.HKFE"]));
        assert_eq!(payload["rollover"], Value::Null);
    }

    #[test]
    fn engine_status_reports_rollover_in_flight_task() {
        let bus = EventBus::new();
        let oms = Oms::new(&bus, PositionPolicy::FlatNet);
        let rollover = RolloverManager::new(&bus, oms);
        rollover.handle(&Event::Command(CommandEvent {
            cmd: "rollover".into(),
            data: serde_json::json!({"symbol_group": "G1", "old": "MHI2507", "new": "MHI2508", "mode": "hedged"}),
        }));

        let payload = engine_status_payload(None, Some(&rollover));
        assert_eq!(payload["firewall"], Value::Null);
        assert_eq!(payload["rollover"]["symbol_group"], "G1");
        assert_eq!(payload["rollover"]["phase"], "DONE");
    }

    #[test]
    fn missing_log_file_returns_no_lines() {
        let dir = tempdir().unwrap();
        let lines = read_log_lines(&dir.path().join("nope.log"), None, None, &[], &[], 500);
        assert!(lines.is_empty());
    }

    #[test]
    fn filters_by_include_substring_and_tail_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mhi.log");
        fs::write(
            &path,
            "2026-07-27T09:00:00Z  INFO engine: startup\n\
             2026-07-27T09:00:01Z ERROR engine: order rejected\n\
             2026-07-27T09:00:02Z  INFO engine: heartbeat\n",
        )
        .unwrap();

        let lines = read_log_lines(&path, None, None, &["rejected".into()], &[], 500);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("rejected"));
    }

    #[test]
    fn filters_by_level_substring() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mhi.log");
        fs::write(&path, "2026-07-27T09:00:00Z  INFO engine: a\n2026-07-27T09:00:01Z ERROR engine: b\n").unwrap();

        let lines = read_log_lines(&path, None, None, &[], &["ERROR".into()], 500);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ERROR"));
    }

    #[test]
    fn tail_limit_keeps_most_recent_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mhi.log");
        let body: String = (0..10).map(|i| format!("2026-07-27T09:00:{i:02}Z INFO engine: line{i}\n")).collect();
        fs::write(&path, body).unwrap();

        let lines = read_log_lines(&path, None, None, &[], &[], 3);
        assert_eq!(lines, vec!["2026-07-27T09:00:07Z INFO engine: line7", "2026-07-27T09:00:08Z INFO engine: line8", "2026-07-27T09:00:09Z INFO engine: line9"]);
    }
}
