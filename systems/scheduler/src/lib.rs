#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Time-ordered event scheduler driving the simulation.
//!
//! The scheduler owns a priority queue of `(due time, entity, action)`
//! events. Events fire in non-decreasing due-time order; equal due times
//! fire in insertion order. Cancellation is by entity identity and uses
//! cancellation epochs: [`EventScheduler::unschedule_all_events`] bumps the
//! entity's epoch and queued events carrying a stale epoch are discarded on
//! pop, so cancellation is immediate, total and idempotent while scheduling
//! after cancellation keeps working.
//!
//! Draining is a caller-side loop over [`EventScheduler::pop_due`] so the
//! executing behavior can reschedule into the same drain; follow-up events
//! whose due time still falls at or before the target fire within the same
//! pass. After the loop the caller snaps the clock to the target with
//! [`EventScheduler::align_to`], so current time always equals the most
//! recently requested target once a drain completes.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use grove_core::{Action, EntityId};

/// A due event popped from the scheduler, ready for execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Entity the action targets.
    pub entity: EntityId,
    /// Action to execute against the entity.
    pub action: Action,
    /// Simulated time at which the event came due.
    pub due: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct QueuedEvent {
    due: Duration,
    sequence: u64,
    entity: EntityId,
    epoch: u64,
    action: Action,
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the earliest due time; insertion
        // sequence breaks ties deterministically.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders and fires time-stamped actions against entities.
#[derive(Debug, Default)]
pub struct EventScheduler {
    queue: BinaryHeap<QueuedEvent>,
    epochs: HashMap<EntityId, u64>,
    current_time: Duration,
    sequence: u64,
}

impl EventScheduler {
    /// Creates an empty scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time.
    #[must_use]
    pub const fn current_time(&self) -> Duration {
        self.current_time
    }

    /// Enqueues an action to fire at `current_time + delay`.
    pub fn schedule_event(&mut self, entity: EntityId, action: Action, delay: Duration) {
        let epoch = self.epochs.get(&entity).copied().unwrap_or(0);
        self.sequence += 1;
        self.queue.push(QueuedEvent {
            due: self.current_time.saturating_add(delay),
            sequence: self.sequence,
            entity,
            epoch,
            action,
        });
    }

    /// Cancels every pending event targeting the entity.
    ///
    /// Safe to call for entities with nothing pending, and calling it twice
    /// is a no-op the second time.
    pub fn unschedule_all_events(&mut self, entity: EntityId) {
        *self.epochs.entry(entity).or_insert(0) += 1;
    }

    /// Pops the earliest live event due at or before `target`, advancing
    /// current time to its due time.
    ///
    /// Returns `None` once no due events remain; the caller then finishes
    /// the drain with [`EventScheduler::align_to`].
    pub fn pop_due(&mut self, target: Duration) -> Option<ScheduledEvent> {
        while let Some(head) = self.queue.peek() {
            if head.due > target {
                return None;
            }

            let event = self.queue.pop()?;
            let live_epoch = self.epochs.get(&event.entity).copied().unwrap_or(0);
            if event.epoch != live_epoch {
                continue;
            }

            if event.due > self.current_time {
                self.current_time = event.due;
            }
            return Some(ScheduledEvent {
                entity: event.entity,
                action: event.action,
                due: event.due,
            });
        }

        None
    }

    /// Snaps current time forward to `target` after a drain.
    pub fn align_to(&mut self, target: Duration) {
        if target > self.current_time {
            self.current_time = target;
        }
    }

    /// Reports whether any live event targeting the entity is queued.
    #[must_use]
    pub fn has_pending(&self, entity: EntityId) -> bool {
        let live_epoch = self.epochs.get(&entity).copied().unwrap_or(0);
        self.queue
            .iter()
            .any(|event| event.entity == entity && event.epoch == live_epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    fn drain(scheduler: &mut EventScheduler, target: Duration) -> Vec<ScheduledEvent> {
        let mut fired = Vec::new();
        while let Some(event) = scheduler.pop_due(target) {
            fired.push(event);
        }
        scheduler.align_to(target);
        fired
    }

    #[test]
    fn events_fire_in_due_time_order() {
        let mut scheduler = EventScheduler::new();
        let first = EntityId::new(1);
        let second = EntityId::new(2);

        scheduler.schedule_event(second, Action::Activity, TICK * 3);
        scheduler.schedule_event(first, Action::Activity, TICK);

        let fired = drain(&mut scheduler, TICK * 4);
        assert_eq!(
            fired.iter().map(|event| event.entity).collect::<Vec<_>>(),
            vec![first, second]
        );
        assert_eq!(fired[0].due, TICK);
        assert_eq!(fired[1].due, TICK * 3);
    }

    #[test]
    fn equal_due_times_fire_in_insertion_order() {
        let mut scheduler = EventScheduler::new();
        let ids: Vec<EntityId> = (0..5).map(EntityId::new).collect();

        for id in &ids {
            scheduler.schedule_event(*id, Action::Activity, TICK);
        }

        let fired = drain(&mut scheduler, TICK);
        assert_eq!(
            fired.iter().map(|event| event.entity).collect::<Vec<_>>(),
            ids
        );
    }

    #[test]
    fn events_beyond_target_stay_queued() {
        let mut scheduler = EventScheduler::new();
        let entity = EntityId::new(7);
        scheduler.schedule_event(entity, Action::Activity, TICK * 2);

        assert!(drain(&mut scheduler, TICK).is_empty());
        assert!(scheduler.has_pending(entity));
        assert_eq!(scheduler.current_time(), TICK);

        let fired = drain(&mut scheduler, TICK * 2);
        assert_eq!(fired.len(), 1);
    }

    #[test]
    fn current_time_snaps_to_target_after_drain() {
        let mut scheduler = EventScheduler::new();
        let entity = EntityId::new(3);
        scheduler.schedule_event(entity, Action::Activity, TICK);

        let fired = drain(&mut scheduler, TICK * 7);
        assert_eq!(fired.len(), 1);
        assert_eq!(scheduler.current_time(), TICK * 7);
    }

    #[test]
    fn time_advances_to_each_due_event_before_execution() {
        let mut scheduler = EventScheduler::new();
        let entity = EntityId::new(3);
        scheduler.schedule_event(entity, Action::Activity, TICK * 2);

        let event = scheduler.pop_due(TICK * 5).expect("event due");
        assert_eq!(scheduler.current_time(), event.due);
    }

    #[test]
    fn rescheduling_during_a_drain_fires_within_the_same_drain() {
        let mut scheduler = EventScheduler::new();
        let entity = EntityId::new(9);
        scheduler.schedule_event(entity, Action::Activity, TICK);

        let mut fired = 0;
        while let Some(event) = scheduler.pop_due(TICK * 3) {
            fired += 1;
            // Behaviors re-arm themselves relative to the popped due time.
            scheduler.schedule_event(event.entity, Action::Activity, TICK);
        }
        scheduler.align_to(TICK * 3);

        assert_eq!(fired, 3);
        assert!(scheduler.has_pending(entity));
    }

    #[test]
    fn unschedule_cancels_everything_for_the_entity() {
        let mut scheduler = EventScheduler::new();
        let doomed = EntityId::new(1);
        let survivor = EntityId::new(2);

        scheduler.schedule_event(doomed, Action::Activity, TICK);
        scheduler.schedule_event(doomed, Action::Animation { repeat_count: 0 }, TICK);
        scheduler.schedule_event(survivor, Action::Activity, TICK);

        scheduler.unschedule_all_events(doomed);
        assert!(!scheduler.has_pending(doomed));

        let fired = drain(&mut scheduler, TICK);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].entity, survivor);
    }

    #[test]
    fn unschedule_is_idempotent_and_safe_without_pending_events() {
        let mut scheduler = EventScheduler::new();
        let entity = EntityId::new(4);

        scheduler.unschedule_all_events(entity);
        scheduler.unschedule_all_events(entity);
        assert!(!scheduler.has_pending(entity));
    }

    #[test]
    fn scheduling_after_cancellation_takes_effect() {
        let mut scheduler = EventScheduler::new();
        let entity = EntityId::new(5);

        scheduler.schedule_event(entity, Action::Activity, TICK);
        scheduler.unschedule_all_events(entity);
        scheduler.schedule_event(entity, Action::Activity, TICK * 2);

        let fired = drain(&mut scheduler, TICK * 2);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].due, TICK * 2);
    }
}
