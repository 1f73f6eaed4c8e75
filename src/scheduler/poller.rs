//! PollScheduler - walks the target list and fetches what changed
//!
//! One scheduler serves the whole target list. Each cycle it evaluates the
//! gate once, then spawns an isolated check task per sync-enabled target
//! into a `JoinSet`. Dispatch is decoupled from completion: the ticker
//! re-arms as soon as dispatch is done, while the actor reaps finished
//! tasks in the background.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::{Instant, interval_at};
use tracing::{debug, error, instrument, trace, warn};

use crate::fetch::Fetcher;
use crate::gate::Gate;
use crate::notify::{Notifier, change_summary};
use crate::storage::Store;
use crate::{Snapshot, Target};

use super::messages::{CheckEvent, CheckOutcome, CycleStats, SchedulerCommand};

/// Collaborators the scheduler calls into, injected at construction
#[derive(Clone)]
pub struct SchedulerDeps {
    pub store: Arc<dyn Store>,
    pub fetcher: Arc<dyn Fetcher>,
    pub gate: Arc<dyn Gate>,
    pub notifier: Arc<dyn Notifier>,
}

/// Actor that runs poll cycles over the monitored targets
pub struct PollScheduler {
    /// Injected collaborators (storage, network, gate, notification sink)
    deps: SchedulerDeps,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SchedulerCommand>,

    /// Broadcast sender for publishing check results
    event_tx: broadcast::Sender<CheckEvent>,

    /// Current cycle interval
    interval_duration: Duration,

    /// In-flight check tasks from dispatched cycles
    tasks: JoinSet<()>,
}

impl PollScheduler {
    pub fn new(
        deps: SchedulerDeps,
        interval_secs: u64,
        command_rx: mpsc::Receiver<SchedulerCommand>,
        event_tx: broadcast::Sender<CheckEvent>,
    ) -> Self {
        Self {
            deps,
            command_rx,
            event_tx,
            interval_duration: schedulable_interval(interval_secs),
            tasks: JoinSet::new(),
        }
    }

    /// Run the actor's main loop
    ///
    /// This is the entry point for the actor. It runs until:
    /// - A Shutdown command is received
    /// - The command channel is closed
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting poll scheduler");

        // First cycle happens one full interval after startup, not immediately
        let mut ticker = interval_at(Instant::now() + self.interval_duration, self.interval_duration);

        loop {
            tokio::select! {
                // Timer tick - run a poll cycle
                _ = ticker.tick() => {
                    match self.run_cycle().await {
                        Ok(stats) if !stats.gate_satisfied => {
                            debug!("cycle skipped, gate not satisfied");
                        }
                        Ok(stats) => {
                            trace!("cycle dispatched {} checks", stats.dispatched);
                        }
                        Err(e) => {
                            error!("poll cycle failed: {e:#}");
                        }
                    }
                }

                // Reap finished check tasks; resolves None (branch disabled)
                // while no checks are in flight
                Some(result) = self.tasks.join_next() => {
                    if let Err(e) = result {
                        error!("check task panicked: {e}");
                    }
                }

                // Handle commands
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        SchedulerCommand::CycleNow { respond_to } => {
                            debug!("received CycleNow command");
                            let result = match self.run_cycle().await {
                                Ok(mut stats) => {
                                    stats.completed = self.drain_tasks().await;
                                    Ok(stats)
                                }
                                Err(e) => Err(e),
                            };
                            let _ = respond_to.send(result);
                        }

                        SchedulerCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = schedulable_interval(interval_secs);
                            ticker = interval_at(
                                Instant::now() + self.interval_duration,
                                self.interval_duration,
                            );
                        }

                        SchedulerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                // Command channel closed - exit
                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        // A started cycle runs its dispatched checks to completion
        let drained = self.drain_tasks().await;
        if drained > 0 {
            debug!("drained {drained} in-flight checks during shutdown");
        }

        debug!("poll scheduler stopped");
    }

    /// Run one poll cycle: evaluate the gate, then dispatch check tasks
    ///
    /// The gate is evaluated exactly once per cycle, never per target. A
    /// closed gate skips the whole cycle with no partial progress; the
    /// interval ticker re-arms either way.
    async fn run_cycle(&mut self) -> Result<CycleStats> {
        if !self.deps.gate.satisfied().await {
            return Ok(CycleStats::default());
        }

        let targets = self
            .deps
            .store
            .list_targets()
            .await
            .context("failed to load target list")?;

        let mut dispatched = 0;
        for target in targets {
            if !target.sync_enabled {
                trace!("skipping {} (sync disabled)", target.id);
                continue;
            }

            dispatched += 1;
            self.tasks.spawn(check_target(
                target,
                self.deps.clone(),
                self.event_tx.clone(),
            ));
        }

        debug!("dispatched {dispatched} check tasks");

        Ok(CycleStats {
            gate_satisfied: true,
            dispatched,
            completed: 0,
        })
    }

    /// Await every in-flight check task, returning how many finished.
    async fn drain_tasks(&mut self) -> usize {
        let mut completed = 0;
        while let Some(result) = self.tasks.join_next().await {
            completed += 1;
            if let Err(e) = result {
                error!("check task panicked: {e}");
            }
        }
        completed
    }
}

/// Check a single target: fetch, snapshot, update, maybe notify
///
/// All failure handling is contained here; nothing propagates to the
/// scheduler. A transport error leaves the target's stored state untouched
/// and records no snapshot. A completed fetch always records a snapshot,
/// blank or not.
#[instrument(skip_all, fields(target = %target.display_name()))]
async fn check_target(
    target: Target,
    deps: SchedulerDeps,
    event_tx: broadcast::Sender<CheckEvent>,
) {
    let body = match deps.fetcher.fetch(&target.url).await {
        Ok(body) => body,
        Err(e) => {
            warn!("fetch failed: {e:#}");
            publish(
                &event_tx,
                &target,
                CheckOutcome::TransportError {
                    message: format!("{e:#}"),
                },
            );
            return;
        }
    };

    let now = Utc::now();
    let snapshot = Snapshot::new(target.id.clone(), now, body);
    let success = !snapshot.is_blank();

    trace!("fetched {} bytes (success: {success})", snapshot.content_len);

    // Prior snapshot must be read before the new one is appended
    let prior = match deps.store.latest_snapshot(&target.id).await {
        Ok(prior) => prior,
        Err(e) => {
            error!("failed to load prior snapshot: {e}");
            publish_storage_error(&event_tx, &target, &e);
            return;
        }
    };

    let mut updated = target.clone();
    updated.last_checked = Some(now);
    updated.last_success = success;

    if let Err(e) = deps.store.save_target(updated).await {
        error!("failed to save target: {e}");
        publish_storage_error(&event_tx, &target, &e);
        return;
    }

    let persisted = match deps.store.save_snapshot(snapshot).await {
        Ok(persisted) => persisted,
        Err(e) => {
            error!("failed to save snapshot: {e}");
            publish_storage_error(&event_tx, &target, &e);
            return;
        }
    };

    // First fetch is the baseline: nothing to compare, never a change
    let changed = prior
        .map(|prior| !prior.same_length_as(&persisted))
        .unwrap_or(false);

    let mut notified = false;
    if should_notify(target.notify_enabled, success, changed) {
        let (title, body) = change_summary(&target);
        deps.notifier.notify(&title, &body).await;
        notified = true;
    }

    publish(
        &event_tx,
        &target,
        CheckOutcome::Completed {
            success,
            changed,
            notified,
        },
    );
}

/// Clamp an interval to something the ticker accepts
///
/// `interval_at` panics on a zero period, which would kill the actor task
/// while the rest of the process keeps running none the wiser.
fn schedulable_interval(interval_secs: u64) -> Duration {
    if interval_secs == 0 {
        warn!("interval of 0s is not schedulable, clamping to 1s");
        Duration::from_secs(1)
    } else {
        Duration::from_secs(interval_secs)
    }
}

/// Notification decision for a completed check
///
/// A notification goes out only when the target opted in, the fetch
/// produced usable content, and the change predicate fired. Failed (blank)
/// fetches never notify, no matter how much the length moved.
pub fn should_notify(notify_enabled: bool, success: bool, changed: bool) -> bool {
    notify_enabled && success && changed
}

fn publish(event_tx: &broadcast::Sender<CheckEvent>, target: &Target, outcome: CheckOutcome) {
    let event = CheckEvent {
        target_id: target.id.clone(),
        url: target.url.clone(),
        timestamp: Utc::now(),
        outcome,
    };

    // Ignore send errors - it's fine if nobody subscribed.
    if event_tx.send(event).is_err() {
        trace!("no receivers for check event");
    }
}

fn publish_storage_error(
    event_tx: &broadcast::Sender<CheckEvent>,
    target: &Target,
    error: &crate::storage::StorageError,
) {
    publish(
        event_tx,
        target,
        CheckOutcome::StorageError {
            message: error.to_string(),
        },
    );
}

/// Handle for controlling a running PollScheduler
///
/// Cloneable; all clones talk to the same actor.
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
    event_tx: broadcast::Sender<CheckEvent>,
}

impl SchedulerHandle {
    /// Spawn a new scheduler actor
    ///
    /// This creates the actor, spawns it as a tokio task, and returns a
    /// handle for commands and event subscriptions.
    pub fn spawn(deps: SchedulerDeps, interval_secs: u64) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (event_tx, _) = broadcast::channel(256);

        let actor = PollScheduler::new(deps, interval_secs, cmd_rx, event_tx.clone());

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            event_tx,
        }
    }

    /// Subscribe to per-check result events.
    pub fn subscribe(&self) -> broadcast::Receiver<CheckEvent> {
        self.event_tx.subscribe()
    }

    /// Run a cycle immediately and wait for every dispatched check to finish.
    ///
    /// This bypasses the interval timer. Useful for testing and manual
    /// refresh operations.
    pub async fn cycle_now(&self) -> Result<CycleStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::CycleNow { respond_to: tx })
            .await
            .context("failed to send CycleNow command")?;

        rx.await.context("failed to receive response")?
    }

    /// Update the cycle interval
    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(SchedulerCommand::UpdateInterval { interval_secs })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    /// Gracefully shut down the scheduler
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(SchedulerCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
