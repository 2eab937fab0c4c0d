use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::trace;

use super::Adaptor;
use super::CoalesceOutcome;
use super::PendingQueue;
use crate::metrics::BATCHES_DELIVERED;
use crate::metrics::BATCH_SIZE;
use crate::metrics::COALESCE_OUTCOMES;
use crate::metrics::DELIVERY_FAILURES;
use crate::metrics::PENDING_EVENTS;
use crate::Event;
use crate::Result;

/// Coalesces events per service instance and flushes them in batches.
///
/// Any number of producers may call [`enqueue`](Self::enqueue); exactly one
/// task should drive [`run`](Self::run). The queue lock is never held across
/// an await.
pub struct Dispatcher {
    queue: Mutex<PendingQueue>,
    wakeup: Notify,
    adaptor: Arc<dyn Adaptor>,
    dry_run: bool,
}

impl Dispatcher {
    pub fn new(
        adaptor: Arc<dyn Adaptor>,
        dry_run: bool,
    ) -> Self {
        Self {
            queue: Mutex::new(PendingQueue::new()),
            wakeup: Notify::new(),
            adaptor,
            dry_run,
        }
    }

    pub fn enqueue(
        &self,
        event: Event,
    ) -> CoalesceOutcome {
        trace!(kind = %event.kind, name = %event.name(), "enqueueing event");

        let outcome = {
            let mut queue = self.queue.lock();
            let outcome = queue.push(event);
            PENDING_EVENTS.set(queue.len() as i64);
            outcome
        };

        COALESCE_OUTCOMES.with_label_values(&[outcome.as_str()]).inc();
        self.wakeup.notify_one();

        outcome
    }

    pub fn enqueue_all<I>(
        &self,
        events: I,
    ) where
        I: IntoIterator<Item = Event>,
    {
        for event in events {
            self.enqueue(event);
        }
    }

    /// Copy of the pending events, ordered by instance name
    pub fn pending(&self) -> Vec<Event> {
        self.queue.lock().events().cloned().collect()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Takes everything pending out of the queue
    pub fn drain(&self) -> Vec<Event> {
        let mut queue = self.queue.lock();
        let batch = queue.drain();
        PENDING_EVENTS.set(0);
        batch
    }

    /// Drains and delivers once; returns the size of the batch handed over.
    pub async fn flush(&self) -> Result<usize> {
        let batch = self.drain();
        if batch.is_empty() {
            return Ok(0);
        }

        let size = batch.len();
        self.deliver(batch).await?;
        Ok(size)
    }

    /// Flush worker: waits for events, then delivers all of them as a single
    /// batch. Cancellation is checked between batches, so a delivery already
    /// under way completes first; whatever is pending at that point is not
    /// delivered.
    pub async fn run(
        &self,
        cancel: CancellationToken,
    ) -> Result<()> {
        info!(dry_run = self.dry_run, "dispatcher started");

        while !cancel.is_cancelled() {
            let batch = self.drain();

            if batch.is_empty() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = self.wakeup.notified() => continue,
                }
            }

            let size = batch.len();
            if let Err(e) = self.deliver(batch).await {
                error!(events = size, error = %e, "could not deliver batch, dropping it");
            }
        }

        info!(pending = self.pending_len(), "dispatcher stopped");
        Ok(())
    }

    async fn deliver(
        &self,
        batch: Vec<Event>,
    ) -> Result<()> {
        BATCH_SIZE.observe(batch.len() as f64);

        if self.dry_run {
            for event in &batch {
                info!(
                    kind = %event.kind,
                    name = %event.name(),
                    address = %event.service.address,
                    port = event.service.port,
                    "dry run: not delivering event"
                );
            }
            return Ok(());
        }

        match self.adaptor.deliver(&batch).await {
            Ok(()) => {
                BATCHES_DELIVERED.inc();
                info!(events = batch.len(), "batch delivered");
                Ok(())
            }
            Err(e) => {
                DELIVERY_FAILURES.inc();
                Err(e)
            }
        }
    }
}
