// src/reload/mod.rs

//! Hot-reload signalling to the running service.
//!
//! - [`request`]: the per-cycle `ReloadRequest` and `Credentials`.
//! - [`transport`]: one attempt over HTTP (`reqwest`), behind the
//!   `ReloadTransport` seam.
//! - [`signaller`]: retry policy and error classification.

pub mod request;
pub mod signaller;
pub mod transport;

pub use request::{Credentials, ReloadRequest};
pub use signaller::{ReloadSignaller, RetryPolicy};
pub use transport::{AttemptError, HttpReloadTransport, ReloadTransport};
