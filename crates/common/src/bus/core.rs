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

//! A typed publish/subscribe dispatcher that fans out events to handlers (§4.A).
//!
//! Guarantees: FIFO per topic within the single worker; handlers invoked in registration order; a
//! panicking handler is caught and logged rather than taking the worker down.

use std::{
    collections::HashSet,
    panic::{self, AssertUnwindSafe},
    sync::{
        Mutex,
        mpsc::{self, Receiver, Sender},
    },
    thread::JoinHandle,
};

use indexmap::IndexMap;

pub use super::event::{CommandEvent, Event, LogEvent, topics};
use super::handler::SharedHandler;

/// Producer-facing handle: cheap to clone, safe to share across market-data, adapter, and Hub
/// threads. Enqueuing never blocks (`mpsc::Sender::send` on an unbounded channel).
#[derive(Clone)]
pub struct BusHandle {
    sender: Sender<Event>,
}

impl BusHandle {
    /// Enqueues `event` for dispatch on the bus worker thread.
    pub fn put(&self, event: Event) {
        // An error here means the worker has shut down; producers during shutdown simply drop
        // further events rather than panicking.
        let _ = self.sender.send(event);
    }
}

struct Registry {
    topics: IndexMap<String, Vec<SharedHandler>>,
}

impl Registry {
    fn new() -> Self {
        Self {
            topics: IndexMap::new(),
        }
    }

    /// Idempotent with respect to equal handler identity (§4.A).
    fn register(&mut self, topic: &str, handler: SharedHandler) {
        let handlers = self.topics.entry(topic.to_owned()).or_default();
        if !handlers.iter().any(|h| h.id() == handler.id()) {
            handlers.push(handler);
        }
    }

    fn unregister(&mut self, topic: &str, handler_id: &str) {
        if let Some(handlers) = self.topics.get_mut(topic) {
            handlers.retain(|h| h.id() != handler_id);
        }
    }

    fn handlers_for(&self, topic: &str) -> Vec<SharedHandler> {
        self.topics.get(topic).cloned().unwrap_or_default()
    }
}

/// The event bus. `EventBus::handle()` gives producers a [`BusHandle`]; `EventBus::run` blocks
/// the calling thread draining and dispatching events, intended to be spawned as the bus's
/// dedicated worker thread.
///
/// The bus's own copy of the channel's `Sender` is dropped at the start of `run()`: otherwise the
/// bus would always hold a live sender itself and the channel could never disconnect, so `run()`
/// would block forever even after every producer handle is gone. Callers must obtain every
/// [`BusHandle`] they need via `handle()` *before* calling `run()`.
pub struct EventBus {
    registry: Mutex<Registry>,
    sender: Mutex<Option<Sender<Event>>>,
    receiver: Mutex<Option<Receiver<Event>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            registry: Mutex::new(Registry::new()),
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
        }
    }

    #[must_use]
    pub fn handle(&self) -> BusHandle {
        let sender = self
            .sender
            .lock()
            .expect(ferrum_core::correctness::FAILED)
            .as_ref()
            .expect("EventBus::handle called after run() started")
            .clone();
        BusHandle { sender }
    }

    /// Registers `handler` for `topic`.
    pub fn register(&self, topic: &str, handler: SharedHandler) {
        self.registry.lock().expect(ferrum_core::correctness::FAILED).register(topic, handler);
    }

    /// Removes the handler with `handler_id` from `topic`, if present.
    pub fn unregister(&self, topic: &str, handler_id: &str) {
        self.registry
            .lock()
            .expect(ferrum_core::correctness::FAILED)
            .unregister(topic, handler_id);
    }

    /// Enqueues `event` without blocking. Equivalent to `self.handle().put(event)`.
    ///
    /// # Panics
    ///
    /// Panics if called after `run()` has started (see [`EventBus::handle`]).
    pub fn put(&self, event: Event) {
        let sender = self
            .sender
            .lock()
            .expect(ferrum_core::correctness::FAILED)
            .as_ref()
            .expect("EventBus::put called after run() started")
            .clone();
        let _ = sender.send(event);
    }

    /// Drains the queue on the calling thread until every [`BusHandle`] obtained before this call
    /// is dropped, dispatching each event to every handler registered for its topic, in
    /// registration order. Call this from a dedicated worker thread; it blocks.
    ///
    /// # Panics
    ///
    /// Panics if called more than once on the same bus (the receiver can only be taken once).
    pub fn run(&self) {
        // Drop the bus's own sender first so the channel can disconnect once every handle a
        // caller obtained via `handle()` goes out of scope.
        self.sender.lock().expect(ferrum_core::correctness::FAILED).take();

        let receiver = self
            .receiver
            .lock()
            .expect(ferrum_core::correctness::FAILED)
            .take()
            .expect("EventBus::run called more than once");

        for event in receiver {
            self.dispatch(&event);
        }
    }

    /// Dispatches every event currently queued, on the calling thread, without blocking for more
    /// to arrive. Unlike `run()`, this returns once the queue is empty rather than when every
    /// `BusHandle` is dropped, and it may be called repeatedly.
    ///
    /// Intended for single-threaded deterministic drivers (the backtest engine) that need to pump
    /// the bus in lockstep with their own loop instead of dedicating a worker thread to it. A
    /// handler that enqueues further events (e.g. accounting publishing `Position`/`Account` off a
    /// `Trade`) has those events drained too, since each iteration re-checks the queue before
    /// stopping.
    ///
    /// # Panics
    ///
    /// Panics if called after `run()` has taken the receiver.
    pub fn drain(&self) {
        loop {
            let event = {
                let guard = self.receiver.lock().expect(ferrum_core::correctness::FAILED);
                let receiver = guard.as_ref().expect("EventBus::drain called after run() started");
                receiver.try_recv().ok()
            };
            match event {
                Some(event) => self.dispatch(&event),
                None => break,
            }
        }
    }

    /// Spawns [`EventBus::run`] on a new OS thread. The bus must be wrapped in an `Arc` so the
    /// thread can hold a handle to it.
    pub fn spawn_worker(bus: std::sync::Arc<Self>) -> JoinHandle<()> {
        std::thread::Builder::new()
            .name("event-bus-worker".into())
            .spawn(move || bus.run())
            .expect("failed to spawn event bus worker thread")
    }

    fn dispatch(&self, event: &Event) {
        let handlers = self
            .registry
            .lock()
            .expect(ferrum_core::correctness::FAILED)
            .handlers_for(event.topic());

        for handler in handlers {
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event)));
            if let Err(payload) = result {
                let message = panic_message(&payload);
                log::error!(
                    "handler '{}' panicked on topic '{}': {message}",
                    handler.id(),
                    event.topic()
                );
            }
        }
    }

    /// Returns the set of topics that currently have at least one subscriber.
    #[must_use]
    pub fn subscribed_topics(&self) -> HashSet<String> {
        self.registry
            .lock()
            .expect(ferrum_core::correctness::FAILED)
            .topics
            .keys()
            .cloned()
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};

    use super::*;
    use crate::bus::handler::handler_fn;

    #[test]
    fn dispatches_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::<&'static str>::new()));

        let order_a = order.clone();
        bus.register(topics::TIMER, handler_fn(move |_| order_a.lock().unwrap().push("a")));
        let order_b = order.clone();
        bus.register(topics::TIMER, handler_fn(move |_| order_b.lock().unwrap().push("b")));

        bus.put(Event::Timer(ferrum_core::UnixNanos::EPOCH));
        bus.run();

        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn register_is_idempotent_by_handler_id() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let handler = crate::bus::handler::handler_fn_named("dup", move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        bus.register(topics::TIMER, handler.clone());
        bus.register(topics::TIMER, handler);

        bus.put(Event::Timer(ferrum_core::UnixNanos::EPOCH));
        bus.run();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_handler_does_not_stop_dispatch() {
        let bus = EventBus::new();
        let ran = Arc::new(AtomicUsize::new(0));
        bus.register(topics::TIMER, handler_fn(|_| panic!("boom")));
        let ran_clone = ran.clone();
        bus.register(topics::TIMER, handler_fn(move |_| {
            ran_clone.fetch_add(1, Ordering::SeqCst);
        }));

        bus.put(Event::Timer(ferrum_core::UnixNanos::EPOCH));
        bus.run();

        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_removes_handler() {
        let bus = EventBus::new();
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = ran.clone();
        let handler = crate::bus::handler::handler_fn_named("h1", move |_| {
            ran_clone.fetch_add(1, Ordering::SeqCst);
        });
        bus.register(topics::TIMER, handler);
        bus.unregister(topics::TIMER, "h1");

        bus.put(Event::Timer(ferrum_core::UnixNanos::EPOCH));
        bus.run();

        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
