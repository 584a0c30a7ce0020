//! keyedit-ops - Asynchronous key operations over an external OpenPGP engine.
//!
//! This crate is the integration half of the keyedit system. It owns the
//! narrow call/callback interface to the engine, the reactor that lets the
//! engine's descriptor-based I/O model run inside a cooperative event loop,
//! and the [`KeyOps`](ops::KeyOps) facade that exposes every key operation
//! as one async call.
//!
//! Two invocation styles coexist. *Event-driven* operations (key
//! generation, passphrase changes, subkey/uid creation, primary-uid flags)
//! return control immediately and resume through the reactor when the
//! engine's descriptors become ready; they are cancellable mid-flight
//! through a shared token. *Synchronous edit sessions* (everything built on
//! the `keyedit-core` state machines) block for the whole conversation, so
//! the facade runs them on a blocking worker thread and marshals only the
//! final result back; their only cancellation granularity is "do not start
//! the next item" inside a multi-item batch such as photo listing.
//!
//! One engine context is exclusively owned by one reactor run or one edit
//! session until completion; it is never driven by two at once.
//!
//! # Modules
//!
//! - [`engine`]: the `Engine`/`EngineProvider` traits and one-shot op types
//! - [`reactor`]: descriptor watches, lifecycle events, the reactor driver
//! - [`ops`]: the public operation facade
//! - [`config`]: the explicit configuration object
//! - [`error`]: the operation-level error taxonomy

pub mod config;
pub mod engine;
pub mod error;
pub mod ops;
mod photos;
pub mod reactor;

pub use config::{AlgoTable, Config};
pub use engine::{Engine, EngineError, EngineOp, EngineProvider, IoDirection};
pub use error::OpError;
pub use ops::{KeyOps, KeygenParams};
pub use reactor::{IoHooks, Reactor, WatchTag};
