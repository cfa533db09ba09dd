#![forbid(unsafe_code)]

//! Runtime state for the Mosaic tile grid.
//!
//! - [`store`]: the canonical [`ItemStore`] with subscriptions and batching.
//! - [`config`]: [`GridConfig`] loading and validation.
//! - [`debounce`]: host-driven debounce/throttle deadlines.
//! - [`autosave`]: quiet-period snapshots for the external publisher.
//!
//! Everything here is single-threaded: handles are `Rc`-based and time is
//! passed in by the host as a monotonic [`std::time::Duration`].

pub mod autosave;
pub mod config;
pub mod debounce;
pub mod store;

pub use autosave::AutosaveScheduler;
pub use config::{GridConfig, GridConfigError};
pub use debounce::{DebouncePolicy, Debouncer};
pub use store::{ItemStore, StoreBatch, Subscription};
