//! Deterministic event queue in logical milliseconds.
//!
//! Every periodic callback (production ticks, arrivals, payouts) and every
//! delayed completion (deliveries, training, construction) is an entry here.
//! Entries due at the same instant fire in the order they were scheduled.
//! A cancelled timer never fires again, even if its entry is still queued.

use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use crate::components::{BuildingRef, Profession, ResourceKind};

/// Handle of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// Callbacks the simulation can schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Periodic production of a gathering building
    ProductionTick { building: BuildingRef },
    /// A batch of goods reaches its warehouse
    DeliveryArrival {
        producer: BuildingRef,
        warehouse: BuildingRef,
        resource: ResourceKind,
        amount: f64,
    },
    /// Periodic search for a house with a free bed
    VillagerArrival,
    /// A newcomer reaches the house that reserved a bed
    ArrivalComplete { house: BuildingRef },
    TrainingComplete {
        center: BuildingRef,
        profession: Profession,
    },
    /// Periodic gold income
    GoldPayout,
    ConstructionComplete { building: BuildingRef },
}

/// A queued timer entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTimer {
    pub id: TimerId,
    pub due_ms: u64,
    seq: u64,
    pub repeat_ms: Option<u64>,
    pub event: SimEvent,
}

impl PartialEq for PendingTimer {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl Eq for PendingTimer {}

impl PartialOrd for PendingTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingTimer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due_ms
            .cmp(&other.due_ms)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Serializable scheduler state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    pub now_ms: u64,
    pub next_id: u64,
    pub pending: Vec<PendingTimer>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    queue: BinaryHeap<Reverse<PendingTimer>>,
    live: HashSet<TimerId>,
    next_id: u64,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical time
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Fire `event` once, `delay_ms` from now
    pub fn schedule_once(&mut self, delay_ms: u64, event: SimEvent) -> TimerId {
        self.push(delay_ms, None, event)
    }

    /// Fire `event` every `interval_ms`, first after one interval
    pub fn schedule_every(&mut self, interval_ms: u64, event: SimEvent) -> TimerId {
        let interval_ms = interval_ms.max(1);
        self.push(interval_ms, Some(interval_ms), event)
    }

    fn push(&mut self, delay_ms: u64, repeat_ms: Option<u64>, event: SimEvent) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.live.insert(id);
        self.enqueue(id, self.now_ms.saturating_add(delay_ms), repeat_ms, event);
        id
    }

    fn enqueue(&mut self, id: TimerId, due_ms: u64, repeat_ms: Option<u64>, event: SimEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(PendingTimer {
            id,
            due_ms,
            seq,
            repeat_ms,
            event,
        }));
    }

    /// Cancel a timer. Returns false if it was not active.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.live.remove(&id)
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.live.contains(&id)
    }

    /// Number of active timers
    pub fn active_count(&self) -> usize {
        self.live.len()
    }

    /// Pop the next live entry due at or before `until_ms`, moving the clock
    /// to its due time. Repeating timers are re-queued before being returned,
    /// so cancelling one from inside its own callback works.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, SimEvent)> {
        loop {
            let due = self.queue.peek().map(|Reverse(t)| t.due_ms)?;
            if due > until_ms {
                return None;
            }
            let Reverse(timer) = self.queue.pop()?;
            if !self.live.contains(&timer.id) {
                continue;
            }
            self.now_ms = self.now_ms.max(timer.due_ms);
            match timer.repeat_ms {
                Some(interval) => {
                    self.enqueue(
                        timer.id,
                        timer.due_ms.saturating_add(interval),
                        Some(interval),
                        timer.event.clone(),
                    );
                }
                None => {
                    self.live.remove(&timer.id);
                }
            }
            return Some((timer.id, timer.event));
        }
    }

    /// Move the clock forward without firing anything
    pub fn advance_clock(&mut self, to_ms: u64) {
        self.now_ms = self.now_ms.max(to_ms);
    }

    /// Live entries in firing order
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let mut pending: Vec<PendingTimer> = self
            .queue
            .iter()
            .map(|Reverse(t)| t.clone())
            .filter(|t| self.live.contains(&t.id))
            .collect();
        pending.sort();
        SchedulerSnapshot {
            now_ms: self.now_ms,
            next_id: self.next_id,
            pending,
        }
    }

    pub fn restore(snapshot: SchedulerSnapshot) -> Self {
        let mut scheduler = Scheduler {
            now_ms: snapshot.now_ms,
            next_id: snapshot.next_id,
            ..Default::default()
        };
        for timer in snapshot.pending {
            scheduler.live.insert(timer.id);
            scheduler.enqueue(timer.id, timer.due_ms, timer.repeat_ms, timer.event);
        }
        scheduler
    }
}
