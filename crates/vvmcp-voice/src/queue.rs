//! Dialogue queue: FIFO of Turn-lists drained by a single worker task.
//!
//! Each dequeued Turn-list is one *stream* with its own cancellation token.
//! [`DialogueQueue::stop`] drops everything still queued, fires the active
//! token and interrupts the player, so nothing further is heard until the
//! next `enqueue`.
//!
//! The FIFO and the active token sit behind a `std::sync::Mutex` that is
//! never held across an `.await`; the worker parks on a [`Notify`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::{Notify, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vvmcp_core::Turn;

use crate::pipeline::SpeechPipeline;

/// Capacity of the stream-outcome broadcast channel.
const OUTCOME_CHANNEL_CAPACITY: usize = 16;

/// Summary of one finished (or stopped) stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamOutcome {
    /// Turns in the stream.
    pub turns: usize,
    /// Turns with at least one failed chunk.
    pub failed_turns: usize,
    /// The stream was stopped before it finished.
    pub cancelled: bool,
}

impl StreamOutcome {
    pub const fn succeeded(&self) -> bool {
        self.failed_turns == 0 && !self.cancelled
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Vec<Turn>>,
    active: Option<CancellationToken>,
    busy: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    wake: Notify,
    pipeline: SpeechPipeline,
    max_chunk_len: usize,
    outcomes: broadcast::Sender<StreamOutcome>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pop the next stream and arm a fresh token for it.
    fn begin_next(&self) -> Option<(Vec<Turn>, CancellationToken)> {
        let mut state = self.lock();
        let turns = state.pending.pop_front()?;
        let token = CancellationToken::new();
        state.active = Some(token.clone());
        state.busy = true;
        Some((turns, token))
    }

    fn finish(&self) {
        let mut state = self.lock();
        state.active = None;
        state.busy = false;
    }

    async fn run_stream(&self, turns: Vec<Turn>, token: &CancellationToken) -> StreamOutcome {
        let mut outcome = StreamOutcome {
            turns: turns.len(),
            ..StreamOutcome::default()
        };

        for (ordinal, turn) in turns.iter().enumerate() {
            if token.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let result = self
                .pipeline
                .speak_turn(turn, self.max_chunk_len, token)
                .await;

            if result.cancelled {
                outcome.cancelled = true;
                break;
            }
            if !result.succeeded() {
                tracing::warn!(
                    ordinal,
                    speaker = %turn.speaker(),
                    failed_chunks = result.failed,
                    "Turn finished with errors"
                );
                outcome.failed_turns += 1;
            }
        }

        outcome
    }

    async fn worker_loop(self: Arc<Self>) {
        loop {
            let Some((turns, token)) = self.begin_next() else {
                self.wake.notified().await;
                continue;
            };

            let outcome = self.run_stream(turns, &token).await;
            self.finish();

            tracing::info!(
                turns = outcome.turns,
                failed_turns = outcome.failed_turns,
                cancelled = outcome.cancelled,
                "Dialogue stream finished"
            );
            // No subscribers is fine.
            let _ = self.outcomes.send(outcome);
        }
    }
}

/// Serializes dialogue streams onto a single speech pipeline.
///
/// Must be created inside a Tokio runtime; the worker task is aborted when
/// the queue is dropped.
pub struct DialogueQueue {
    shared: Arc<Shared>,
    worker: JoinHandle<()>,
}

impl DialogueQueue {
    pub fn new(pipeline: SpeechPipeline, max_chunk_len: usize) -> Self {
        let (outcomes, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState::default()),
            wake: Notify::new(),
            pipeline,
            max_chunk_len,
            outcomes,
        });
        let worker = tokio::spawn(Arc::clone(&shared).worker_loop());
        Self { shared, worker }
    }

    /// Queue a Turn-list; returns how many streams are ahead of it.
    ///
    /// An empty list is ignored.
    pub fn enqueue(&self, turns: Vec<Turn>) -> usize {
        if turns.is_empty() {
            return 0;
        }
        let ahead = {
            let mut state = self.shared.lock();
            let ahead = state.pending.len() + usize::from(state.busy);
            state.pending.push_back(turns);
            ahead
        };
        self.shared.wake.notify_one();
        ahead
    }

    /// Drop queued streams, cancel the active one and interrupt playback.
    ///
    /// Returns the number of queued (not yet started) streams discarded.
    pub fn stop(&self) -> usize {
        let (dropped, active) = {
            let mut state = self.shared.lock();
            let dropped = state.pending.len();
            state.pending.clear();
            (dropped, state.active.take())
        };

        if let Some(token) = active {
            token.cancel();
        }
        self.shared.pipeline.sink().interrupt();

        tracing::info!(dropped, "Speech stopped");
        dropped
    }

    /// Streams waiting to start.
    pub fn pending(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Nothing playing and nothing queued.
    pub fn is_idle(&self) -> bool {
        let state = self.shared.lock();
        !state.busy && state.pending.is_empty()
    }

    /// Receive a [`StreamOutcome`] for every stream finished from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamOutcome> {
        self.shared.outcomes.subscribe()
    }

    pub fn pipeline(&self) -> &SpeechPipeline {
        &self.shared.pipeline
    }
}

impl Drop for DialogueQueue {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
