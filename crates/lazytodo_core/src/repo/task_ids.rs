//! Clock-derived task id generation.
//!
//! # Invariants
//! - Ids are decimal epoch milliseconds.
//! - Issued ids strictly increase within one generator while the numeric
//!   space lasts, and never equal an id already present in the list being
//!   extended.

use crate::model::task::{Task, TaskId};
use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock source, injectable for deterministic tests.
pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
            })
    }
}

/// Monotonic id generator on top of a `Clock`.
pub struct TaskIdGenerator {
    clock: Box<dyn Clock + Send>,
    last_issued: Cell<u64>,
}

impl TaskIdGenerator {
    pub fn new(clock: impl Clock + Send + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            last_issued: Cell::new(0),
        }
    }

    /// Issues the next id for a task appended to `existing`.
    ///
    /// Same-millisecond creations and clock steps backwards are bumped past
    /// the previous id instead of colliding. The result never equals an id
    /// already in `existing`.
    pub fn next_id(&self, existing: &[Task]) -> TaskId {
        let now = self.clock.now_millis();
        // A list or generator already at `u64::MAX` cannot be bumped past.
        let newest_in_list = existing
            .iter()
            .filter_map(|task| task.id.as_millis())
            .max()
            .and_then(|millis| millis.checked_add(1))
            .unwrap_or(0);
        let after_last = self.last_issued.get().checked_add(1).unwrap_or(0);

        let mut issued = now.max(after_last).max(newest_in_list);
        while is_taken(existing, &issued.to_string()) {
            match issued.checked_add(1) {
                Some(next) => issued = next,
                None => return suffixed_id(now, existing),
            }
        }
        self.last_issued.set(issued);
        TaskId::new(issued.to_string())
    }
}

fn is_taken(existing: &[Task], candidate: &str) -> bool {
    existing.iter().any(|task| task.id.as_str() == candidate)
}

// Numeric space exhausted: `<now>-<n>` with the first free suffix.
fn suffixed_id(now: u64, existing: &[Task]) -> TaskId {
    let mut suffix: usize = 1;
    loop {
        let candidate = format!("{now}-{suffix}");
        if !is_taken(existing, &candidate) {
            return TaskId::new(candidate);
        }
        suffix += 1;
    }
}

impl Default for TaskIdGenerator {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}
