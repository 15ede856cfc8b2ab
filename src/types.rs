// src/types.rs

//! Small shared types used across module seams.

use std::future::Future;
use std::pin::Pin;

/// Boxed, `Send` future returned by the pluggable backends
/// (`ContainerRuntime`, `ReloadTransport`, `BuildTrigger`, `CycleExecutor`).
///
/// Spelled out once here instead of at every trait method.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
