//! Bounded single-producer, multi-consumer telemetry fan-out.
//!
//! Every consumer owns its own bounded queue. The producer never blocks:
//! when a queue is full it is thinned in place, oldest first, by dropping
//! every second buffered record of each turbine. A consumer that keeps the
//! producer thinning for more than `stall_limit` consecutive pushes without
//! reading anything makes the pipeline unrecoverable.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use super::record::TelemetryRecord;
use crate::turbine::TurbineId;

/// Pipeline failure surfaced to the run owner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("consumer {consumer} stalled after {thin_passes} consecutive thinning passes")]
    Unrecoverable { consumer: u64, thin_passes: u32 },
    #[error("pipeline capacity must be at least 1")]
    ZeroCapacity,
}

/// Sizing of per-consumer queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Records buffered per consumer before thinning.
    pub capacity: usize,
    /// Consecutive thinning passes tolerated without a read.
    pub stall_limit: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: 4096,
            stall_limit: 16,
        }
    }
}

/// Outcome of reading from a consumer handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Next {
    Record(TelemetryRecord),
    /// The publisher closed and every buffered record has been read.
    EndOfStream,
}

#[derive(Debug, Default)]
struct SlotState {
    queue: VecDeque<TelemetryRecord>,
    closed: bool,
    thin_passes: u32,
    dropped: u64,
}

#[derive(Debug)]
struct Slot {
    id: u64,
    state: Mutex<SlotState>,
    ready: Condvar,
}

#[derive(Debug, Default)]
struct Registry {
    slots: Vec<Arc<Slot>>,
    closed: bool,
    next_id: u64,
}

#[derive(Debug)]
struct Shared {
    config: PipelineConfig,
    registry: Mutex<Registry>,
}

/// Attachment point for consumers. Cheap to clone and share across threads.
#[derive(Debug, Clone)]
pub struct TelemetryPipeline {
    shared: Arc<Shared>,
}

/// The single writing end of a pipeline. Closing or dropping it ends the
/// stream for every consumer.
#[derive(Debug)]
pub struct Publisher {
    shared: Arc<Shared>,
    pushed: u64,
    closed: bool,
}

/// A consumer's private cursor into the stream. Dropping it detaches the
/// consumer.
#[derive(Debug)]
pub struct ConsumerHandle {
    slot: Arc<Slot>,
    shared: Arc<Shared>,
}

impl TelemetryPipeline {
    /// Creates a pipeline and its publisher.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::ZeroCapacity` if `config.capacity` is 0.
    pub fn new(config: PipelineConfig) -> Result<(Self, Publisher), PipelineError> {
        if config.capacity == 0 {
            return Err(PipelineError::ZeroCapacity);
        }
        let shared = Arc::new(Shared {
            config,
            registry: Mutex::new(Registry::default()),
        });
        let publisher = Publisher {
            shared: Arc::clone(&shared),
            pushed: 0,
            closed: false,
        };
        Ok((Self { shared }, publisher))
    }

    /// Registers a new consumer. It receives every record pushed from now
    /// on; attaching after close yields an immediate end of stream.
    pub fn attach(&self) -> ConsumerHandle {
        let mut registry = self.shared.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        let slot = Arc::new(Slot {
            id,
            state: Mutex::new(SlotState {
                queue: VecDeque::with_capacity(self.shared.config.capacity),
                closed: registry.closed,
                ..SlotState::default()
            }),
            ready: Condvar::new(),
        });
        registry.slots.push(Arc::clone(&slot));
        ConsumerHandle {
            slot,
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn consumer_count(&self) -> usize {
        self.shared.registry.lock().slots.len()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.registry.lock().closed
    }

    pub fn config(&self) -> PipelineConfig {
        self.shared.config
    }
}

impl Publisher {
    /// Delivers a copy of `record` to every attached consumer.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Unrecoverable` when a consumer has exceeded
    /// the stall limit. The record is still delivered to every consumer.
    pub fn push(&mut self, record: TelemetryRecord) -> Result<(), PipelineError> {
        let PipelineConfig {
            capacity,
            stall_limit,
        } = self.shared.config;
        let registry = self.shared.registry.lock();
        let mut failure = None;

        for slot in &registry.slots {
            let mut st = slot.state.lock();
            if st.queue.len() >= capacity {
                let removed = thin(&mut st.queue);
                st.dropped += removed as u64;
                st.thin_passes += 1;
                debug!(
                    consumer = slot.id,
                    removed,
                    remaining = st.queue.len(),
                    passes = st.thin_passes,
                    "thinned consumer queue"
                );
                if st.thin_passes > stall_limit && failure.is_none() {
                    error!(
                        consumer = slot.id,
                        thin_passes = st.thin_passes,
                        "consumer cannot keep pace with telemetry"
                    );
                    failure = Some(PipelineError::Unrecoverable {
                        consumer: slot.id,
                        thin_passes: st.thin_passes,
                    });
                }
            }
            st.queue.push_back(record);
            drop(st);
            slot.ready.notify_one();
        }

        self.pushed += 1;
        failure.map_or(Ok(()), Err)
    }

    /// Number of records accepted so far.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Ends the stream. Consumers drain what is buffered, then see
    /// [`Next::EndOfStream`].
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let mut registry = self.shared.registry.lock();
        registry.closed = true;
        for slot in &registry.slots {
            slot.state.lock().closed = true;
            slot.ready.notify_all();
        }
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl ConsumerHandle {
    pub fn id(&self) -> u64 {
        self.slot.id
    }

    /// Blocks until a record is available or the stream has ended.
    pub fn next_record(&mut self) -> Next {
        let mut st = self.slot.state.lock();
        loop {
            if let Some(next) = take(&mut st) {
                return next;
            }
            self.slot.ready.wait(&mut st);
        }
    }

    /// Like [`Self::next_record`] but gives up after `timeout`.
    ///
    /// # Returns
    ///
    /// * `Some(next)` - A record or the end of stream
    /// * `None` - Nothing arrived before the deadline
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<Next> {
        let deadline = Instant::now() + timeout;
        let mut st = self.slot.state.lock();
        loop {
            if let Some(next) = take(&mut st) {
                return Some(next);
            }
            if self.slot.ready.wait_until(&mut st, deadline).timed_out() {
                return take(&mut st);
            }
        }
    }

    /// Returns immediately; `None` when nothing is buffered yet.
    pub fn try_next(&mut self) -> Option<Next> {
        take(&mut self.slot.state.lock())
    }

    /// Records thinned out of this consumer's queue so far.
    pub fn dropped(&self) -> u64 {
        self.slot.state.lock().dropped
    }

    /// Records currently waiting in this consumer's queue.
    pub fn buffered(&self) -> usize {
        self.slot.state.lock().queue.len()
    }
}

impl Iterator for ConsumerHandle {
    type Item = TelemetryRecord;

    fn next(&mut self) -> Option<TelemetryRecord> {
        match self.next_record() {
            Next::Record(r) => Some(r),
            Next::EndOfStream => None,
        }
    }
}

impl Drop for ConsumerHandle {
    fn drop(&mut self) {
        let mut registry = self.shared.registry.lock();
        registry.slots.retain(|s| !Arc::ptr_eq(s, &self.slot));
    }
}

fn take(st: &mut SlotState) -> Option<Next> {
    if let Some(record) = st.queue.pop_front() {
        st.thin_passes = 0;
        Some(Next::Record(record))
    } else if st.closed {
        Some(Next::EndOfStream)
    } else {
        None
    }
}

/// Drops every second record of each turbine, keeping the oldest of each
/// pair. Falls back to dropping the single oldest record when every turbine
/// has at most one record buffered. Returns the number of records removed.
fn thin(queue: &mut VecDeque<TelemetryRecord>) -> usize {
    let before = queue.len();
    let mut parity: HashMap<TurbineId, bool> = HashMap::new();
    queue.retain(|r| {
        let odd = parity.entry(r.turbine_id).or_insert(false);
        let keep = !*odd;
        *odd = !*odd;
        keep
    });
    if queue.len() == before {
        queue.pop_front();
    }
    before - queue.len()
}
