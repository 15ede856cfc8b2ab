// src/engine/mod.rs

//! Orchestration engine for plugwatch.
//!
//! This module ties together:
//! - the cycle queue (what happens when changes arrive mid-cycle)
//! - the reload pipeline (build, locate artifact, reload)
//! - the runtime event loop that reacts to:
//!   - consolidated change notifications
//!   - cycle completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::watch::ChangeSet;

/// Monotonic identifier of a reload cycle within one run.
pub type CycleId = u64;

/// Why a reload cycle was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleReason {
    /// Seeded at startup (`--once`).
    Manual,
    /// Consolidated change notification from the watcher.
    FileWatch,
}

/// How a reload cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Succeeded,
    Failed(String),
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit once no cycle is running and nothing is queued (`--once`).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the watcher, the cycle executor and
/// the exit hook.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    CycleRequested {
        changes: ChangeSet,
        reason: CycleReason,
    },
    CycleFinished {
        cycle_id: CycleId,
        outcome: CycleOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod cycle;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use cycle::{CycleExecutor, CycleJob, PipelineExecutor, PipelineSettings, ReloadPipeline};
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::{CycleQueue, PendingCycle};
pub use runtime::Runtime;
