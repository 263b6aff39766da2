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

//! A periodic timer stream that fans a `timer` topic event out on the bus (§4.A: "a separate
//! timer stream may fan out a periodic timer topic for components that poll rather than react").

use std::{
    sync::atomic::{AtomicBool, Ordering},
    sync::Arc,
    thread::JoinHandle,
    time::Duration,
};

use crate::bus::{BusHandle, Event};
use crate::clock::Clock;

/// Fires [`Event::Timer`] on `bus` every `period` until [`TimerHandle::stop`] is called or the
/// handle is dropped.
pub struct TimerHandle {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl TimerHandle {
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawns a dedicated thread that publishes `Event::Timer(clock.timestamp_ns())` every `period`.
pub fn spawn(bus: BusHandle, clock: Arc<dyn Clock>, period: Duration) -> TimerHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = stop.clone();

    let join = std::thread::Builder::new()
        .name("event-bus-timer".into())
        .spawn(move || {
            while !stop_clone.load(Ordering::SeqCst) {
                std::thread::sleep(period);
                if stop_clone.load(Ordering::SeqCst) {
                    break;
                }
                bus.put(Event::Timer(clock.timestamp_ns()));
            }
        })
        .expect("failed to spawn timer thread");

    TimerHandle {
        stop,
        join: Some(join),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bus::{EventBus, handler_fn};
    use crate::clock::LiveClock;

    #[test]
    fn fires_timer_events_until_stopped() {
        let bus = Arc::new(EventBus::new());
        let bus_handle = bus.handle();
        let fire_count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let fire_count_clone = fire_count.clone();
        bus.register(
            crate::bus::topics::TIMER,
            handler_fn(move |_| {
                fire_count_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let worker_bus = bus.clone();
        let worker = std::thread::spawn(move || worker_bus.run());

        let mut timer = spawn(bus_handle, Arc::new(LiveClock), Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(30));
        timer.stop();

        drop(bus);
        worker.join().unwrap();

        assert!(fire_count.load(Ordering::SeqCst) >= 2);
    }
}
