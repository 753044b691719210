//! Timer scheduling for the UI loop.
//!
//! [`TimerService`] holds pending timers keyed by a generational
//! [`TimerId`]. It never spawns threads: the host loop calls
//! [`TimerService::poll`] with the current instant and dispatches the due
//! entries itself. Tests drive time explicitly.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use slotmap::SlotMap;

use crate::object::ObjectId;

slotmap::new_key_type! {
    /// Identifies a scheduled timer.
    pub struct TimerId;
}

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    owner: ObjectId,
    deadline: Instant,
    /// Re-arm interval; `None` for one-shot timers.
    repeat: Option<Duration>,
}

/// Pending timers, polled by the host event loop.
pub struct TimerService {
    timers: Mutex<SlotMap<TimerId, TimerEntry>>,
}

impl TimerService {
    /// Create an empty service.
    pub fn new() -> Self {
        Self {
            timers: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Schedule a one-shot timer owned by `owner`.
    pub fn start(&self, owner: ObjectId, delay: Duration, now: Instant) -> TimerId {
        self.timers.lock().insert(TimerEntry {
            owner,
            deadline: now + delay,
            repeat: None,
        })
    }

    /// Schedule a repeating timer with an initial delay.
    pub fn start_repeating(
        &self,
        owner: ObjectId,
        initial_delay: Duration,
        interval: Duration,
        now: Instant,
    ) -> TimerId {
        self.timers.lock().insert(TimerEntry {
            owner,
            deadline: now + initial_delay,
            repeat: Some(interval),
        })
    }

    /// Cancel a timer. Returns whether it was pending.
    pub fn stop(&self, id: TimerId) -> bool {
        self.timers.lock().remove(id).is_some()
    }

    /// Cancel every timer owned by `owner`.
    pub fn stop_all_for(&self, owner: ObjectId) {
        self.timers.lock().retain(|_, entry| entry.owner != owner);
    }

    /// Change a repeating timer's interval from its next firing onward.
    pub fn set_interval(&self, id: TimerId, interval: Duration) -> bool {
        match self.timers.lock().get_mut(id) {
            Some(entry) => {
                entry.repeat = Some(interval);
                true
            }
            None => false,
        }
    }

    /// Whether the timer is still pending.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.lock().contains_key(id)
    }

    /// Collect timers due at `now`, re-arming repeating ones.
    ///
    /// One-shot timers are removed; repeating timers fire at most once per
    /// poll and their next deadline is `now + interval` (late polls do not
    /// produce catch-up bursts).
    pub fn poll(&self, now: Instant) -> Vec<(TimerId, ObjectId)> {
        let mut timers = self.timers.lock();
        let due: Vec<TimerId> = timers
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(id, _)| id)
            .collect();

        let mut fired = Vec::with_capacity(due.len());
        for id in due {
            let entry = timers[id];
            fired.push((id, entry.owner));
            match entry.repeat {
                Some(interval) => {
                    timers[id].deadline = now + interval;
                }
                None => {
                    timers.remove(id);
                }
            }
        }
        fired
    }

    /// Deadline of the soonest pending timer, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers
            .lock()
            .values()
            .map(|entry| entry.deadline)
            .min()
    }
}

impl Default for TimerService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectRegistry;

    #[test]
    fn one_shot_fires_once() {
        let reg = ObjectRegistry::new();
        let owner = reg.register();
        let service = TimerService::new();
        let t0 = Instant::now();

        let id = service.start(owner, Duration::from_millis(100), t0);
        assert!(service.poll(t0 + Duration::from_millis(50)).is_empty());

        let fired = service.poll(t0 + Duration::from_millis(100));
        assert_eq!(fired, vec![(id, owner)]);
        assert!(!service.is_pending(id));
        assert!(service.poll(t0 + Duration::from_millis(200)).is_empty());
    }

    #[test]
    fn repeating_rearms_from_poll_time() {
        let reg = ObjectRegistry::new();
        let owner = reg.register();
        let service = TimerService::new();
        let t0 = Instant::now();

        let id = service.start_repeating(
            owner,
            Duration::from_millis(400),
            Duration::from_millis(40),
            t0,
        );

        assert!(service.poll(t0 + Duration::from_millis(399)).is_empty());
        assert_eq!(service.poll(t0 + Duration::from_millis(400)).len(), 1);
        // Next firing is 40ms after the poll that fired it.
        assert!(service.poll(t0 + Duration::from_millis(420)).is_empty());
        assert_eq!(service.poll(t0 + Duration::from_millis(440)).len(), 1);
        assert!(service.is_pending(id));
    }

    #[test]
    fn stop_all_for_owner() {
        let reg = ObjectRegistry::new();
        let a = reg.register();
        let b = reg.register();
        let service = TimerService::new();
        let t0 = Instant::now();

        service.start(a, Duration::from_millis(10), t0);
        service.start(a, Duration::from_millis(20), t0);
        let kept = service.start(b, Duration::from_millis(10), t0);

        service.stop_all_for(a);
        let fired = service.poll(t0 + Duration::from_millis(50));
        assert_eq!(fired, vec![(kept, b)]);
    }
}
