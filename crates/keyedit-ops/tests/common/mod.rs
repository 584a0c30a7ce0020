//! Scripted fake engines shared by the integration tests.
//!
//! `EditEngine` replays a fixed status-line script through the synchronous
//! edit entry point, capturing everything the conversation writes back.
//! `OneShotEngine` exercises the reactor: it registers real descriptors,
//! delays its start notification, and completes (or waits for
//! cancellation) the way the engine contract describes.

#![allow(dead_code)]

use std::io::Write;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use keyedit_core::session::EditConversation;
use keyedit_core::{KeyHandle, StatusLine};
use keyedit_ops::{Engine, EngineError, EngineOp, EngineProvider, IoDirection, IoHooks};

/// One step of a scripted edit conversation.
pub enum Step {
    /// Emit a status line.
    Status(&'static str, &'static str),
    /// Run a side effect (e.g. render a photo file) before the next line.
    Effect(Box<dyn FnMut() + Send>),
}

/// Build a pure status-line script.
pub fn statuses(lines: &[(&'static str, &'static str)]) -> Vec<Step> {
    lines
        .iter()
        .map(|&(keyword, args)| Step::Status(keyword, args))
        .collect()
}

/// Collects outbound conversation lines.
#[derive(Clone, Default)]
pub struct Outbound(Arc<Mutex<Vec<u8>>>);

impl Outbound {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).expect("answers are ASCII")
    }
}

impl Write for Outbound {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Fake engine for synchronous edit conversations.
pub struct EditEngine {
    steps: Vec<Step>,
    /// Everything the conversation wrote.
    pub outbound: Outbound,
    /// Keys selected for signing.
    pub signers: Arc<Mutex<Vec<String>>>,
    /// Engine-level result of the conversation.
    pub edit_result: Result<(), EngineError>,
}

impl EditEngine {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            outbound: Outbound::default(),
            signers: Arc::new(Mutex::new(Vec::new())),
            edit_result: Ok(()),
        }
    }

    pub fn with_result(mut self, result: Result<(), EngineError>) -> Self {
        self.edit_result = result;
        self
    }
}

impl Engine for EditEngine {
    fn set_io_hooks(&mut self, _hooks: IoHooks) {}

    fn start(&mut self, _op: EngineOp) -> Result<(), EngineError> {
        Err(EngineError::failed("edit engine has no one-shot entry"))
    }

    fn io_ready(&mut self, _fd: RawFd, _direction: IoDirection) {}

    fn cancel(&mut self) {}

    fn add_signer(&mut self, signer: &KeyHandle) -> Result<(), EngineError> {
        self.signers.lock().unwrap().push(signer.keyid.clone());
        Ok(())
    }

    fn edit_key(
        &mut self,
        _key: &KeyHandle,
        conversation: &mut dyn EditConversation,
    ) -> Result<(), EngineError> {
        let mut out = self.outbound.clone();
        for step in std::mem::take(&mut self.steps) {
            match step {
                Step::Effect(mut effect) => effect(),
                Step::Status(keyword, args) => {
                    let error =
                        conversation.interpret(&StatusLine::new(keyword, args), &mut out);
                    if error.is_some() {
                        break;
                    }
                }
            }
        }
        let _ = conversation.interpret(&StatusLine::eof(), &mut out);
        self.edit_result.clone()
    }
}

/// Observable state of a [`OneShotEngine`] run.
#[derive(Default)]
pub struct OneShotState {
    /// Set once the engine announced `started`.
    pub started: AtomicBool,
    /// Set if a descriptor callback arrived before `started`.
    pub dispatched_before_start: AtomicBool,
    /// Set if a descriptor callback arrived after `finished`.
    pub dispatched_after_finish: AtomicBool,
    /// Set once the engine announced `finished`.
    pub finished: AtomicBool,
    /// Number of descriptor callbacks received.
    pub dispatches: AtomicUsize,
    /// Set when cancellation reached the engine.
    pub cancel_requests: AtomicUsize,
}

/// How a [`OneShotEngine`] behaves after `start`.
pub enum OneShotMode {
    /// Announce started and finished immediately.
    Complete(Result<(), EngineError>),
    /// Register `fd` before announcing started (after `start_delay`), then
    /// finish successfully after `finish_after` descriptor callbacks.
    ReadyPipe {
        fd: RawFd,
        start_delay: Duration,
        finish_after: usize,
    },
    /// Announce started, then wait for a cancel request.
    WaitForCancel,
}

/// Fake engine for reactor-driven one-shot operations.
pub struct OneShotEngine {
    hooks: Option<IoHooks>,
    mode: Option<OneShotMode>,
    pub state: Arc<OneShotState>,
}

impl OneShotEngine {
    pub fn new(mode: OneShotMode) -> Self {
        Self {
            hooks: None,
            mode: Some(mode),
            state: Arc::new(OneShotState::default()),
        }
    }

    pub fn state(&self) -> Arc<OneShotState> {
        Arc::clone(&self.state)
    }

    fn hooks(&self) -> IoHooks {
        self.hooks.clone().expect("hooks installed before start")
    }
}

impl Engine for OneShotEngine {
    fn set_io_hooks(&mut self, hooks: IoHooks) {
        self.hooks = Some(hooks);
    }

    fn start(&mut self, _op: EngineOp) -> Result<(), EngineError> {
        let hooks = self.hooks();
        let state = Arc::clone(&self.state);
        match self.mode.take().expect("start called once") {
            OneShotMode::Complete(status) => {
                state.started.store(true, Ordering::SeqCst);
                hooks.started();
                state.finished.store(true, Ordering::SeqCst);
                hooks.finished(status);
            }
            OneShotMode::ReadyPipe {
                fd,
                start_delay,
                finish_after,
            } => {
                // Speculative registration: the operation has not started.
                hooks.register(fd, IoDirection::Read);
                self.mode = Some(OneShotMode::ReadyPipe {
                    fd,
                    start_delay,
                    finish_after,
                });
                std::thread::spawn(move || {
                    std::thread::sleep(start_delay);
                    state.started.store(true, Ordering::SeqCst);
                    hooks.started();
                });
            }
            OneShotMode::WaitForCancel => {
                state.started.store(true, Ordering::SeqCst);
                hooks.started();
            }
        }
        Ok(())
    }

    fn io_ready(&mut self, _fd: RawFd, _direction: IoDirection) {
        let state = &self.state;
        if !state.started.load(Ordering::SeqCst) {
            state.dispatched_before_start.store(true, Ordering::SeqCst);
        }
        if state.finished.load(Ordering::SeqCst) {
            state.dispatched_after_finish.store(true, Ordering::SeqCst);
        }
        let dispatches = state.dispatches.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(OneShotMode::ReadyPipe { finish_after, .. }) = &self.mode {
            if dispatches >= *finish_after && !state.finished.swap(true, Ordering::SeqCst) {
                self.hooks().finished(Ok(()));
            }
        }
    }

    fn cancel(&mut self) {
        self.state.cancel_requests.fetch_add(1, Ordering::SeqCst);
        if !self.state.finished.swap(true, Ordering::SeqCst) {
            self.hooks().finished(Err(EngineError::Cancelled));
        }
    }

    fn add_signer(&mut self, _signer: &KeyHandle) -> Result<(), EngineError> {
        Ok(())
    }

    fn edit_key(
        &mut self,
        _key: &KeyHandle,
        _conversation: &mut dyn EditConversation,
    ) -> Result<(), EngineError> {
        Err(EngineError::failed("one-shot engine has no edit entry"))
    }
}

/// Provider that hands out one prebuilt engine context, then reports the
/// engine as unavailable.
pub struct SingleContext(Mutex<Option<Box<dyn Engine>>>);

impl SingleContext {
    pub fn new(engine: impl Engine + 'static) -> Arc<Self> {
        Arc::new(Self(Mutex::new(Some(Box::new(engine)))))
    }
}

impl EngineProvider for SingleContext {
    fn context(&self) -> Result<Box<dyn Engine>, EngineError> {
        self.0
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| EngineError::Unavailable {
                reason: "context already consumed".to_string(),
            })
    }
}

/// Provider with no engine at all.
pub struct NoEngine;

impl EngineProvider for NoEngine {
    fn context(&self) -> Result<Box<dyn Engine>, EngineError> {
        Err(EngineError::Unavailable {
            reason: "engine not installed".to_string(),
        })
    }
}
