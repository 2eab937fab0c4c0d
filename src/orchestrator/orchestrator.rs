use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use futures::StreamExt;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::diff::diff_snapshots;
use crate::diff::ChangeClassifier;
use crate::dispatcher::Dispatcher;
use crate::metrics::EVENTS_PRODUCED;
use crate::metrics::REGISTRY_FAILURES;
use crate::registry::ServiceRegistry;
use crate::utils::registry_call_with_timeout;
use crate::utils::spawn_task;
use crate::Error;
use crate::Event;
use crate::ObserveMode;
use crate::RawChange;
use crate::RegistryConfig;
use crate::RegistryError;
use crate::Result;
use crate::Snapshot;

/// Runs one producer (poll or watch loop) and the dispatcher's flush worker
/// until cancelled.
///
/// The last observed [`Snapshot`] is kept behind an [`ArcSwap`]: poll cycles
/// replace it wholesale, watch notifications replace it with a copy carrying
/// the change.
pub struct Orchestrator<R: ServiceRegistry> {
    registry: Arc<R>,
    classifier: ChangeClassifier<R>,
    dispatcher: Arc<Dispatcher>,
    snapshot: ArcSwap<Snapshot>,
    mode: ObserveMode,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl<R: ServiceRegistry> Orchestrator<R> {
    pub fn new(
        registry: Arc<R>,
        dispatcher: Arc<Dispatcher>,
        config: &RegistryConfig,
    ) -> Result<Self> {
        let keys = config.required_keys()?;

        Ok(Self {
            classifier: ChangeClassifier::new(registry.clone(), keys),
            registry,
            dispatcher,
            snapshot: ArcSwap::from_pointee(Snapshot::new()),
            mode: config.mode,
            poll_interval: config.poll_interval(),
            poll_timeout: config.poll_timeout(),
        })
    }

    pub fn mode(&self) -> ObserveMode {
        self.mode
    }

    /// Last observed registry state
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Runs until `cancel` fires or the producer fails. The token is
    /// cancelled on the way out so the flush worker always stops too.
    pub async fn run(
        &self,
        cancel: CancellationToken,
    ) -> Result<()> {
        info!(mode = ?self.mode, "starting registry reader");

        let dispatcher = self.dispatcher.clone();
        let worker_cancel = cancel.clone();
        let worker = spawn_task("dispatcher", async move { dispatcher.run(worker_cancel).await });

        let produced = match self.mode {
            ObserveMode::Poll => self.run_poll(cancel.clone()).await,
            ObserveMode::Watch => self.run_watch(cancel.clone()).await,
        };

        if let Err(e) = &produced {
            error!(error = %e, "registry observation stopped");
        }
        cancel.cancel();

        if let Err(e) = worker.await {
            error!(error = %e, "dispatcher task panicked");
        }

        info!("registry reader stopped");
        produced
    }

    /// Polls the full state every interval; a failed or timed out cycle is
    /// skipped and the previous snapshot kept.
    pub async fn run_poll(
        &self,
        cancel: CancellationToken,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let cycle = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                cycle = self.poll_once() => cycle,
            };

            match cycle {
                Ok(count) => debug!(events = count, "poll cycle done"),
                Err(e) => warn!(error = %e, "poll cycle failed, keeping previous state"),
            }
        }

        debug!("poll loop stopped");
        Ok(())
    }

    /// One poll cycle: read the state, diff it against the held snapshot and
    /// enqueue the differences. Returns the number of events produced.
    pub async fn poll_once(&self) -> Result<usize> {
        let current = registry_call_with_timeout(self.registry.get_current_state(), self.poll_timeout)
            .await
            .map_err(|e| {
                REGISTRY_FAILURES.with_label_values(&["get_current_state"]).inc();
                e
            })?;

        let previous = self.snapshot.load();
        let events = diff_snapshots(&previous, &current, self.classifier.keys());
        self.snapshot.store(Arc::new(current));

        Ok(self.publish(events))
    }

    /// Subscribes first, then seeds from the full state, so no change between
    /// the two is missed. The seed is retried every poll interval until it
    /// succeeds. Gaps reported by the stream trigger a resync.
    pub async fn run_watch(
        &self,
        cancel: CancellationToken,
    ) -> Result<()> {
        let mut changes = self.registry.watch(cancel.clone()).await.map_err(|e| {
            REGISTRY_FAILURES.with_label_values(&["watch"]).inc();
            e
        })?;

        if !self.seed(&cancel).await {
            debug!("watch loop stopped before the initial state was loaded");
            return Ok(());
        }

        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                item = changes.next() => item,
            };

            match item {
                Some(Ok(change)) => {
                    if let Err(e) = self.handle_change(&change).await {
                        warn!(key = ?change.key, error = %e, "dropping change notification");
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "watch reported a gap, resyncing");
                    if let Err(e) = self.poll_once().await {
                        warn!(error = %e, "resync failed");
                    }
                }
                None if cancel.is_cancelled() => break,
                None => {
                    REGISTRY_FAILURES.with_label_values(&["watch"]).inc();
                    return Err(RegistryError::WatchClosed.into());
                }
            }
        }

        debug!("watch loop stopped");
        Ok(())
    }

    /// Loads the initial state, retrying on the poll interval. Returns false
    /// when cancelled first.
    async fn seed(
        &self,
        cancel: &CancellationToken,
    ) -> bool {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                _ = ticker.tick() => {}
            }

            let seeded = tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                seeded = self.poll_once() => seeded,
            };

            match seeded {
                Ok(count) => {
                    info!(events = count, "initial registry state loaded");
                    return true;
                }
                Err(e) => warn!(error = %e, "initial registry state unavailable, retrying"),
            }
        }
    }

    /// Classifies one notification and enqueues its events. The held
    /// snapshot only moves forward when classification succeeds, so a later
    /// resync still sees what was missed.
    ///
    /// A lookup that finds the owning service gone means the registry moved
    /// on past this notification; the full state is re-read instead.
    pub async fn handle_change(
        &self,
        change: &RawChange,
    ) -> Result<usize> {
        let events = match self.classifier.classify(change).await {
            Ok(events) => events,
            Err(Error::Registry(e)) if e.is_not_found() => {
                warn!(key = ?change.key, error = %e, "owner of the change is gone, resyncing");
                return self.poll_once().await;
            }
            Err(e) => return Err(e),
        };
        let count = self.publish(events);
        self.snapshot.rcu(|current| current.with_change(change));

        Ok(count)
    }

    fn publish(
        &self,
        events: Vec<Event>,
    ) -> usize {
        let count = events.len();
        for event in events {
            EVENTS_PRODUCED.with_label_values(&[event.kind.as_str()]).inc();
            debug!(kind = %event.kind, name = %event.name(), "event produced");
            self.dispatcher.enqueue(event);
        }
        count
    }
}
