//! Concurrency limiter for batches of work units
//!
//! This module handles:
//! - Admission control through a shared semaphore
//! - A bounded pool of workers draining a queue of units
//! - Publishing each result on a channel as soon as it is ready
//! - Notifying the progress sink once per completed unit

use crate::output::ProgressSink;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Caps the number of simultaneously in-flight work units
///
/// Clones share the same admission slots, so two batches running through
/// clones of one limiter together never exceed the ceiling.
#[derive(Debug, Clone)]
pub struct Limiter {
    /// Admission slots, one per unit allowed in flight
    slots: Arc<Semaphore>,

    /// Configured ceiling (always at least 1)
    ceiling: usize,
}

impl Limiter {
    /// Creates a limiter admitting at most `ceiling` units at once
    ///
    /// A ceiling of 0 would never admit anything and is raised to 1.
    pub fn new(ceiling: usize) -> Self {
        let ceiling = ceiling.max(1);
        Self {
            slots: Arc::new(Semaphore::new(ceiling)),
            ceiling,
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Slots not currently held by a running unit
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Runs every item through `work`, at most `ceiling` at a time
    ///
    /// Returns one output per item, in completion order. An output that
    /// represents "nothing" (an absent fetch) is still an output: units are
    /// never dropped. `label` names each completed unit for the progress
    /// sink.
    ///
    /// # Scheduling
    ///
    /// `min(ceiling, items.len())` workers pull from a shared queue. Each
    /// worker takes an admission slot before popping a unit and releases it
    /// once the unit's future resolves, so the next queued unit starts as
    /// soon as any unit finishes.
    pub async fn run_batch<I, O, F, Fut>(
        &self,
        items: Vec<I>,
        work: F,
        progress: &dyn ProgressSink,
        label: impl Fn(&O) -> String,
    ) -> Vec<O>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        let total = items.len();
        progress.start(total);

        if total == 0 {
            progress.finish();
            return Vec::new();
        }

        let queue = Arc::new(Mutex::new(VecDeque::from(items)));
        let work = Arc::new(work);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut workers = JoinSet::new();

        for _ in 0..self.ceiling.min(total) {
            let queue = Arc::clone(&queue);
            let work = Arc::clone(&work);
            let slots = Arc::clone(&self.slots);
            let tx = tx.clone();

            workers.spawn(async move {
                loop {
                    let Ok(_permit) = slots.acquire().await else {
                        break;
                    };

                    let next = queue
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .pop_front();
                    let Some(item) = next else {
                        break;
                    };

                    let output = (*work)(item).await;
                    if tx.send(output).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(total);
        while let Some(output) = rx.recv().await {
            progress.advance(&label(&output));
            results.push(output);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Batch worker stopped abnormally: {}", e);
            }
        }

        if results.len() != total {
            tracing::warn!(
                "Batch finished with {} of {} units completed",
                results.len(),
                total
            );
        }

        progress.finish();
        results
    }
}
