//! Microtask job scheduler and sandbox (§3 "Job", §4.6, §5).

pub mod capability;
pub mod jobs;
pub mod queue;
pub mod sandbox;

pub use capability::{Capability, Handler};
pub use jobs::{run_cleanup_some_job, run_promise_reaction_job, run_promise_resolve_thenable_job, CleanupRegistry, JobHooks, Reaction};
pub use queue::{JobQueue, LocalJob, PendingJob};
pub use sandbox::{Sandbox, SandboxOutcome};
