//! Fire-and-forget store decorator with a single background writer.
//!
//! # Responsibility
//! - Return from `set` without waiting for the backing store.
//! - Apply queued writes strictly in submission order.
//!
//! # Invariants
//! - Exactly one thread writes to the backing store, so a later value for a
//!   key can never be overwritten by an earlier one.
//! - `get` observes the newest queued value for a key (read-your-writes).
//! - Write failures are logged by the writer and then dropped; no retry.
//! - Dropping the store drains the queue and joins the writer.
//! - Once the writer has exited, `flush` and `set` fail with `WriterClosed`
//!   instead of waiting on it.

use super::{KeyValueStore, StoreError, StoreResult};
use log::{debug, error};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Instant;

const WRITER_THREAD_NAME: &str = "lazytodo-store-writer";

struct WriteJob {
    seq: u64,
    key: String,
    value: String,
}

#[derive(Default)]
struct QueueState {
    // key -> (seq, value) of the newest write not yet applied.
    pending: HashMap<String, (u64, String)>,
    submitted: u64,
    applied: u64,
    writer_exited: bool,
}

#[derive(Default)]
struct Queue {
    state: Mutex<QueueState>,
    drained: Condvar,
}

/// Write-behind wrapper around any thread-safe `KeyValueStore`.
pub struct WriteBehindStore<S: KeyValueStore + Send + Sync + 'static> {
    inner: Arc<S>,
    queue: Arc<Queue>,
    sender: Option<Sender<WriteJob>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: KeyValueStore + Send + Sync + 'static> WriteBehindStore<S> {
    /// Starts the writer thread for `inner`.
    pub fn new(inner: S) -> StoreResult<Self> {
        let inner = Arc::new(inner);
        let queue = Arc::new(Queue::default());
        let (sender, receiver) = mpsc::channel();

        let worker_inner = Arc::clone(&inner);
        let worker_queue = Arc::clone(&queue);
        let worker = std::thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || run_writer(worker_inner.as_ref(), &worker_queue, receiver))
            .map_err(StoreError::WriterSpawn)?;

        Ok(Self {
            inner,
            queue,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Backing store, bypassing the queue.
    pub fn inner(&self) -> &S {
        self.inner.as_ref()
    }

    /// Number of writes submitted but not yet attempted.
    pub fn pending_writes(&self) -> StoreResult<u64> {
        let state = self.lock_state()?;
        Ok(state.submitted - state.applied)
    }

    /// Blocks until every write submitted so far has been attempted.
    ///
    /// # Errors
    /// - `WriterClosed` when the writer exited with writes still queued.
    pub fn flush(&self) -> StoreResult<()> {
        let mut state = self.lock_state()?;
        while state.applied < state.submitted {
            if state.writer_exited {
                error!(
                    "event=store_flush module=store status=error reason=writer_exited unapplied={}",
                    state.submitted - state.applied
                );
                return Err(StoreError::WriterClosed);
            }
            state = self
                .queue
                .drained
                .wait(state)
                .map_err(|_| StoreError::LockPoisoned("write-behind queue"))?;
        }
        Ok(())
    }

    fn lock_state(&self) -> StoreResult<std::sync::MutexGuard<'_, QueueState>> {
        self.queue
            .state
            .lock()
            .map_err(|_| StoreError::LockPoisoned("write-behind queue"))
    }
}

impl<S: KeyValueStore + Send + Sync + 'static> KeyValueStore for WriteBehindStore<S> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        {
            let state = self.lock_state()?;
            if let Some((_, value)) = state.pending.get(key) {
                return Ok(Some(value.clone()));
            }
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let sender = self.sender.as_ref().ok_or(StoreError::WriterClosed)?;
        let mut state = self.lock_state()?;
        if state.writer_exited {
            return Err(StoreError::WriterClosed);
        }
        let seq = state.submitted + 1;
        let job = WriteJob {
            seq,
            key: key.to_string(),
            value: value.to_string(),
        };
        // Sent under the lock so channel order matches sequence order.
        sender.send(job).map_err(|_| StoreError::WriterClosed)?;
        state.submitted = seq;
        state
            .pending
            .insert(key.to_string(), (seq, value.to_string()));
        Ok(())
    }
}

impl<S: KeyValueStore + Send + Sync + 'static> Drop for WriteBehindStore<S> {
    fn drop(&mut self) {
        // Closing the channel lets the writer drain the backlog and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("event=store_writer_join module=store status=error error=writer_panicked");
            }
        }
    }
}

// Marks the writer as gone on every exit path, unwinding included.
struct WriterExit<'a>(&'a Queue);

impl Drop for WriterExit<'_> {
    fn drop(&mut self) {
        let mut state = self
            .0
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.writer_exited = true;
        self.0.drained.notify_all();
    }
}

fn run_writer<S: KeyValueStore>(inner: &S, queue: &Queue, receiver: Receiver<WriteJob>) {
    let _exit = WriterExit(queue);
    for job in receiver {
        let started_at = Instant::now();
        match inner.set(&job.key, &job.value) {
            Ok(()) => debug!(
                "event=store_write module=store status=ok key={} seq={} duration_ms={}",
                job.key,
                job.seq,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=store_write module=store status=error key={} seq={} duration_ms={} error={}",
                job.key,
                job.seq,
                started_at.elapsed().as_millis(),
                err
            ),
        }

        let Ok(mut state) = queue.state.lock() else {
            error!("event=store_write module=store status=error error=queue_lock_poisoned");
            return;
        };
        if state
            .pending
            .get(&job.key)
            .is_some_and(|(seq, _)| *seq == job.seq)
        {
            state.pending.remove(&job.key);
        }
        state.applied = job.seq;
        queue.drained.notify_all();
    }
}
