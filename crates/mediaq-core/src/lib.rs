//! mediaq Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Async runtime
//! - Rendering
//!
//! Everything the orchestration engine reasons about (tasks, their lifecycle
//! state machine, media kinds and quality tiers, wire status mapping) lives here.

pub mod error;
pub mod ids;
pub mod media;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::TaskId;
pub use media::{MediaKind, QualityTier};
pub use status::{LifecycleState, RemoteStatus};
pub use task::{Task, TaskResult, Transition, TransitionOutcome};
