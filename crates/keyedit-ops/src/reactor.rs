//! The async I/O reactor.
//!
//! The engine's I/O model is "register descriptors, call me back on
//! readiness". The reactor adapts that onto the host event loop: the engine
//! announces descriptor registrations and start/finish notifications
//! through [`IoHooks`] (continuation objects over an unbounded channel, in
//! place of raw callback pointers), and the reactor task — the single
//! canonical owner of the engine context and the watch table — turns
//! readiness into `io_ready` calls and resolves to exactly one completion.
//!
//! Watch lifecycle: the engine may register descriptors speculatively
//! before an operation has actually started, so a watch is only monitored
//! once the session is busy (`started` seen) and still registered. On
//! `finished`, every remaining watch is defensively unmonitored and no
//! descriptor callback fires afterwards.

use std::collections::HashMap;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::engine::{Engine, EngineError, EngineOp, IoDirection};
use crate::error::OpError;

/// Identifies one registered watch.
pub type WatchTag = u64;

/// An engine-side I/O notification.
#[derive(Debug)]
pub(crate) enum IoEvent {
    Register {
        tag: WatchTag,
        fd: RawFd,
        direction: IoDirection,
    },
    Unregister {
        tag: WatchTag,
    },
    Started,
    Finished {
        status: Result<(), EngineError>,
    },
}

/// The callback target handed to the engine.
///
/// Cheap to clone; the engine may call it from any thread. Calls made after
/// the reactor has gone away are silently dropped.
#[derive(Debug, Clone)]
pub struct IoHooks {
    events: mpsc::UnboundedSender<IoEvent>,
    next_tag: Arc<AtomicU64>,
}

impl IoHooks {
    pub(crate) fn new(events: mpsc::UnboundedSender<IoEvent>) -> Self {
        Self {
            events,
            next_tag: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Announce a descriptor to monitor. Returns the tag to unregister
    /// with.
    pub fn register(&self, fd: RawFd, direction: IoDirection) -> WatchTag {
        let tag = self.next_tag.fetch_add(1, Ordering::Relaxed);
        let _ = self.events.send(IoEvent::Register { tag, fd, direction });
        tag
    }

    /// Withdraw a previously registered descriptor. Idempotent.
    pub fn unregister(&self, tag: WatchTag) {
        let _ = self.events.send(IoEvent::Unregister { tag });
    }

    /// Announce that the operation has actually started.
    pub fn started(&self) {
        let _ = self.events.send(IoEvent::Started);
    }

    /// Announce the single completion outcome of the operation.
    pub fn finished(&self, status: Result<(), EngineError>) {
        let _ = self.events.send(IoEvent::Finished { status });
    }
}

// ============================================================================
// Session state
// ============================================================================

#[derive(Debug)]
struct Watch {
    fd: RawFd,
    direction: IoDirection,
    monitored: bool,
}

/// What the driver must do after applying an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Monitor {
        tag: WatchTag,
        fd: RawFd,
        direction: IoDirection,
    },
    Unmonitor {
        tag: WatchTag,
    },
}

/// Pure per-session state: the watch table and lifecycle flags.
///
/// Invariant: a watch is monitored iff it is registered AND the session is
/// busy and not finished.
#[derive(Debug, Default)]
struct ReactorCore {
    watches: HashMap<WatchTag, Watch>,
    busy: bool,
    finished: bool,
    status: Option<Result<(), EngineError>>,
}

impl ReactorCore {
    fn apply(&mut self, event: IoEvent) -> Vec<Directive> {
        let mut directives = Vec::new();
        match event {
            IoEvent::Register { tag, fd, direction } => {
                // Before `started`, registrations are speculative and only
                // recorded; monitoring begins when the session goes busy.
                let monitored = self.busy && !self.finished;
                self.watches.insert(
                    tag,
                    Watch {
                        fd,
                        direction,
                        monitored,
                    },
                );
                if monitored {
                    directives.push(Directive::Monitor { tag, fd, direction });
                }
            }
            IoEvent::Unregister { tag } => {
                if let Some(watch) = self.watches.remove(&tag) {
                    if watch.monitored {
                        directives.push(Directive::Unmonitor { tag });
                    }
                }
            }
            IoEvent::Started => {
                if self.finished {
                    return directives;
                }
                self.busy = true;
                for (tag, watch) in &mut self.watches {
                    if !watch.monitored {
                        watch.monitored = true;
                        directives.push(Directive::Monitor {
                            tag: *tag,
                            fd: watch.fd,
                            direction: watch.direction,
                        });
                    }
                }
            }
            IoEvent::Finished { status } => {
                // Only the first completion counts.
                if self.finished {
                    return directives;
                }
                self.busy = false;
                self.finished = true;
                self.status = Some(status);
                for (tag, watch) in &mut self.watches {
                    if watch.monitored {
                        watch.monitored = false;
                        directives.push(Directive::Unmonitor { tag: *tag });
                    }
                }
            }
        }
        directives
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    /// Look up a watch for dispatch; `None` once unmonitored or finished.
    fn dispatchable(&self, tag: WatchTag) -> Option<(RawFd, IoDirection)> {
        if self.finished || !self.busy {
            return None;
        }
        self.watches
            .get(&tag)
            .filter(|watch| watch.monitored)
            .map(|watch| (watch.fd, watch.direction))
    }

    fn take_status(&mut self) -> Option<Result<(), EngineError>> {
        self.status.take()
    }
}

// ============================================================================
// Descriptor monitors
// ============================================================================

/// Borrowed descriptor; the engine keeps ownership of the fd itself.
struct WatchedFd(RawFd);

impl AsRawFd for WatchedFd {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

struct Monitor {
    stop: CancellationToken,
    ack: mpsc::UnboundedSender<()>,
}

fn spawn_monitor(
    tag: WatchTag,
    fd: RawFd,
    direction: IoDirection,
    ready_tx: mpsc::UnboundedSender<WatchTag>,
) -> Monitor {
    let stop = CancellationToken::new();
    let (ack_tx, mut ack_rx) = mpsc::unbounded_channel::<()>();
    let token = stop.clone();

    tokio::spawn(async move {
        let interest = match direction {
            IoDirection::Read => Interest::READABLE,
            IoDirection::Write => Interest::WRITABLE,
        };
        let watched = match AsyncFd::with_interest(WatchedFd(fd), interest) {
            Ok(watched) => watched,
            Err(err) => {
                tracing::warn!(fd, error = %err, "couldn't watch engine descriptor");
                return;
            }
        };
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                ready = watched.ready(interest) => {
                    let mut guard = match ready {
                        Ok(guard) => guard,
                        Err(_) => break,
                    };
                    if ready_tx.send(tag).is_err() {
                        break;
                    }
                    // Re-arm only after the engine has serviced the
                    // descriptor, so readiness doesn't spin.
                    match ack_rx.recv().await {
                        Some(()) => guard.clear_ready(),
                        None => break,
                    }
                }
            }
        }
    });

    Monitor { stop, ack: ack_tx }
}

// ============================================================================
// Driver
// ============================================================================

/// Drives one-shot engine operations to a single completion outcome.
#[derive(Debug, Clone)]
pub struct Reactor {
    trace_io: bool,
}

impl Reactor {
    /// Build a reactor with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            trace_io: config.trace_io,
        }
    }

    /// Run `op` on `engine` until it completes.
    ///
    /// The reactor takes exclusive ownership of the engine context for the
    /// duration of the run. Descriptor callbacks fire in the order the
    /// event loop reports readiness (in-order per descriptor); the
    /// completion is always the last event. A fired `cancel` token asks the
    /// engine to stop once; the engine's cancelled completion then flows
    /// through normally. No timeout is enforced here.
    ///
    /// # Errors
    ///
    /// Engine failures, [`OpError::Cancelled`] for a cancelled run.
    pub async fn run(
        &self,
        mut engine: Box<dyn Engine>,
        op: EngineOp,
        cancel: CancellationToken,
    ) -> Result<(), OpError> {
        let (event_tx, mut events) = mpsc::unbounded_channel();
        let hooks = IoHooks::new(event_tx);
        engine.set_io_hooks(hooks.clone());

        let (ready_tx, mut ready) = mpsc::unbounded_channel::<WatchTag>();
        let mut core = ReactorCore::default();
        let mut monitors: HashMap<WatchTag, Monitor> = HashMap::new();

        engine.start(op).map_err(OpError::from)?;

        let mut cancel_requested = false;
        while !core.is_finished() {
            // Apply everything the engine announced during the last
            // callback before sleeping again.
            while let Ok(event) = events.try_recv() {
                for directive in core.apply(event) {
                    self.obey(directive, &mut monitors, &ready_tx);
                }
            }
            if core.is_finished() {
                break;
            }

            tokio::select! {
                biased;

                () = cancel.cancelled(), if !cancel_requested => {
                    cancel_requested = true;
                    tracing::debug!("asking the engine to cancel");
                    engine.cancel();
                }

                event = events.recv() => {
                    let Some(event) = event else { break };
                    for directive in core.apply(event) {
                        self.obey(directive, &mut monitors, &ready_tx);
                    }
                }

                tag = ready.recv() => {
                    let Some(tag) = tag else { break };
                    if let Some((fd, direction)) = core.dispatchable(tag) {
                        if self.trace_io {
                            tracing::trace!(tag, fd, ?direction, "dispatching descriptor");
                        }
                        engine.io_ready(fd, direction);
                        if let Some(monitor) = monitors.get(&tag) {
                            let _ = monitor.ack.send(());
                        }
                    }
                }
            }
        }

        for (_, monitor) in monitors.drain() {
            monitor.stop.cancel();
        }

        match core.take_status() {
            Some(status) => status.map_err(OpError::from),
            None => Err(OpError::Engine {
                message: "engine stopped without reporting a result".to_string(),
            }),
        }
    }

    fn obey(
        &self,
        directive: Directive,
        monitors: &mut HashMap<WatchTag, Monitor>,
        ready_tx: &mpsc::UnboundedSender<WatchTag>,
    ) {
        match directive {
            Directive::Monitor { tag, fd, direction } => {
                if self.trace_io {
                    tracing::trace!(tag, fd, ?direction, "monitoring descriptor");
                }
                monitors.insert(tag, spawn_monitor(tag, fd, direction, ready_tx.clone()));
            }
            Directive::Unmonitor { tag } => {
                if self.trace_io {
                    tracing::trace!(tag, "dropping descriptor monitor");
                }
                if let Some(monitor) = monitors.remove(&tag) {
                    monitor.stop.cancel();
                }
            }
        }
    }
}
