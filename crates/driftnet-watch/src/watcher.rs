//! Poll scheduling: drives fetch, diff and dispatch on a fixed period.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::diff::diff;
use crate::dispatch::HandlerRegistry;
use crate::snapshot::SnapshotSet;
use crate::source::TorrentSource;

/// Default poll period.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(1);

enum State {
    Idle,
    Running {
        shutdown: watch::Sender<bool>,
        task: JoinHandle<()>,
    },
}

/// Periodic poller emitting lifecycle events through a [`HandlerRegistry`].
///
/// A single spawned task owns the poll loop and the retained previous
/// snapshot set, so at most one poll is ever in flight and state replacement
/// is single-writer by construction. Ticks that land while a poll is still
/// running are skipped rather than queued.
#[allow(missing_debug_implementations)]
pub struct Watcher<S> {
    source: Arc<S>,
    period: Duration,
    state: Mutex<State>,
}

impl<S: TorrentSource + 'static> Watcher<S> {
    /// Creates a watcher polling `source` every [`DEFAULT_POLL_PERIOD`].
    pub fn new(source: S) -> Self {
        Self::with_period(source, DEFAULT_POLL_PERIOD)
    }

    /// Creates a watcher polling `source` every `period`.
    pub fn with_period(source: S, period: Duration) -> Self {
        Self {
            source: Arc::new(source),
            period,
            state: Mutex::new(State::Idle),
        }
    }

    /// Starts polling, dispatching events through `registry`.
    ///
    /// Must be called from within a tokio runtime. Returns `false` without
    /// touching the running loop if the watcher is already started.
    pub fn start(&self, registry: HandlerRegistry) -> bool {
        let mut state = self.state.lock().expect("watcher state lock poisoned");
        if matches!(*state, State::Running { .. }) {
            return false;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.source),
            self.period,
            registry,
            shutdown_rx,
        ));
        *state = State::Running { shutdown, task };
        true
    }

    /// Halts future ticks and waits for an in-flight poll to finish
    /// dispatching. A no-op if the watcher is idle.
    pub async fn stop(&self) {
        let state = {
            let mut state = self.state.lock().expect("watcher state lock poisoned");
            std::mem::replace(&mut *state, State::Idle)
        };

        if let State::Running { shutdown, task } = state {
            let _ = shutdown.send(true);
            if task.await.is_err() {
                warn!("watch loop ended with a panic");
            }
        }
    }

    /// Whether the poll loop is currently running.
    pub fn is_running(&self) -> bool {
        matches!(
            *self.state.lock().expect("watcher state lock poisoned"),
            State::Running { .. }
        )
    }
}

async fn poll_loop<S: TorrentSource>(
    source: Arc<S>,
    period: Duration,
    registry: HandlerRegistry,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(period);
    // A tick that lands while a poll is still running is dropped rather
    // than queued up behind it.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut previous: Option<SnapshotSet> = None;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                previous = poll_once(source.as_ref(), &registry, previous).await;
            }
        }
    }
    debug!("watch loop stopped");
}

/// One fetch-diff-dispatch cycle.
///
/// Returns the snapshot set to retain for the next poll: the fresh one on
/// success, the old one untouched when the fetch failed.
pub(crate) async fn poll_once<S: TorrentSource + ?Sized>(
    source: &S,
    registry: &HandlerRegistry,
    previous: Option<SnapshotSet>,
) -> Option<SnapshotSet> {
    match source.fetch().await {
        Ok(torrents) => {
            let current: SnapshotSet = torrents.into_iter().collect();
            let events = diff(previous.as_ref(), &current);
            debug!(
                torrents = current.len(),
                events = events.len(),
                "poll completed"
            );
            for event in &events {
                registry.dispatch(event);
            }
            Some(current)
        }
        Err(error) => {
            warn!(%error, "poll skipped");
            registry.notify_error(&error);
            previous
        }
    }
}
