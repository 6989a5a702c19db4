//! Coordinator runtime.
//!
//! Owns one [`Coordinator`] inside a single tokio task and feeds it messages
//! one at a time, so reconciler passes never overlap. Queued "tabs changed"
//! notifications collapse into a single pass. A separate ticker task drives
//! housekeeping; UI events go out on a broadcast channel.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::command::{Command, Outcome};
use crate::coordinator::Coordinator;
use crate::types::errors::CoordinatorError;
use crate::types::event::UiEvent;
use crate::types::geometry::Region;
use crate::types::settings::HousekeepingSettings;

const EVENT_BUFFER: usize = 64;

type Reply = oneshot::Sender<Result<Outcome, CoordinatorError>>;

enum Message {
    Command {
        command: Command,
        reply: Option<Reply>,
    },
    Tick,
    Dispose {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable sender side of a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<Message>,
    events: broadcast::Sender<UiEvent>,
}

impl CoordinatorHandle {
    /// Queues `command` and waits for its outcome.
    pub async fn send(&self, command: Command) -> Result<Outcome, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Command {
                command,
                reply: Some(reply),
            })
            .map_err(|_| CoordinatorError::Stopped)?;
        rx.await.map_err(|_| CoordinatorError::Stopped)?
    }

    /// Queues `command` without waiting.
    pub fn post(&self, command: Command) -> Result<(), CoordinatorError> {
        self.tx
            .send(Message::Command {
                command,
                reply: None,
            })
            .map_err(|_| CoordinatorError::Stopped)
    }

    /// Backend push notification; coalesces with any other queued ones.
    pub fn notify_tabs_changed(&self) -> Result<(), CoordinatorError> {
        self.post(Command::TabsChanged)
    }

    /// Queues a layout region for the next [`Command::FlushBounds`].
    pub fn request_bounds(&self, region: Region) -> Result<(), CoordinatorError> {
        self.post(Command::RequestBounds { region })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A started coordinator: its task, its housekeeping timer and a handle to both.
pub struct CoordinatorRuntime {
    handle: CoordinatorHandle,
    task: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
    housekeeping: HousekeepingSettings,
}

impl CoordinatorRuntime {
    /// Spawns the coordinator task, queues the initial refresh and starts the
    /// housekeeping timer when enabled. Must be called inside a tokio runtime.
    pub fn start(coordinator: Coordinator) -> Self {
        let housekeeping = coordinator.settings().housekeeping.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let task = tokio::spawn(run_loop(coordinator, rx, events.clone()));

        let handle = CoordinatorHandle { tx, events };
        if handle.post(Command::Refresh).is_err() {
            tracing::warn!("coordinator task exited before the initial refresh");
        }

        let mut runtime = Self {
            handle,
            task: Some(task),
            ticker: None,
            housekeeping,
        };
        runtime.start_timer();
        tracing::info!(
            housekeeping = runtime.housekeeping.enabled,
            interval_secs = runtime.housekeeping.interval_secs,
            "coordinator started"
        );
        runtime
    }

    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    /// Starts the housekeeping timer unless it is disabled or already running.
    pub fn start_timer(&mut self) {
        if !self.housekeeping.enabled || self.ticker.is_some() {
            return;
        }
        let period = self.housekeeping.interval().max(Duration::from_secs(1));
        self.ticker = Some(spawn_ticker(self.handle.tx.clone(), period));
    }

    pub fn is_timer_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Releases the housekeeping timer. Commands are still accepted.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            tracing::debug!("housekeeping timer stopped");
        }
    }

    /// Stops the timer, tears down every surface and ends the coordinator task.
    pub async fn dispose(mut self) {
        self.stop();
        let (reply, done) = oneshot::channel();
        if self.handle.tx.send(Message::Dispose { reply }).is_ok() {
            let _ = done.await;
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "coordinator task ended abnormally");
            }
        }
    }
}

impl Drop for CoordinatorRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_ticker(tx: mpsc::UnboundedSender<Message>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if tx.send(Message::Tick).is_err() {
                break;
            }
        }
    })
}

fn publish(coordinator: &mut Coordinator, events: &broadcast::Sender<UiEvent>) {
    for event in coordinator.take_events() {
        // No subscribers is fine.
        let _ = events.send(event);
    }
}

async fn run_loop(
    mut coordinator: Coordinator,
    mut rx: mpsc::UnboundedReceiver<Message>,
    events: broadcast::Sender<UiEvent>,
) {
    let mut backlog: VecDeque<Message> = VecDeque::new();

    loop {
        let message = match backlog.pop_front() {
            Some(message) => message,
            None => match rx.recv().await {
                Some(message) => message,
                None => break,
            },
        };

        match message {
            Message::Command {
                command: Command::TabsChanged,
                reply,
            } => {
                let mut replies = vec![reply];
                let mut rest = VecDeque::new();
                let queued: Vec<Message> = backlog
                    .drain(..)
                    .chain(std::iter::from_fn(|| rx.try_recv().ok()))
                    .collect();
                for queued in queued {
                    match queued {
                        Message::Command {
                            command: Command::TabsChanged,
                            reply,
                        } => replies.push(reply),
                        other => rest.push_back(other),
                    }
                }
                backlog = rest;
                if replies.len() > 1 {
                    tracing::debug!(coalesced = replies.len(), "collapsed tabs-changed notifications");
                }

                let result = coordinator.dispatch(Command::TabsChanged).await;
                publish(&mut coordinator, &events);
                for reply in replies.into_iter().flatten() {
                    let _ = reply.send(result.clone());
                }
            }
            Message::Command { command, reply } => {
                let result = coordinator.dispatch(command).await;
                publish(&mut coordinator, &events);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            Message::Tick => {
                let report = coordinator.run_housekeeping().await;
                if !report.planned.is_empty() {
                    tracing::debug!(
                        planned = report.planned.len(),
                        applied = report.applied.len(),
                        "housekeeping tick"
                    );
                }
                publish(&mut coordinator, &events);
            }
            Message::Dispose { reply } => {
                coordinator.dispose().await;
                publish(&mut coordinator, &events);
                let _ = reply.send(());
                return;
            }
        }
    }

    // Every handle was dropped without an explicit dispose.
    coordinator.dispose().await;
}
