//! Multi-job orchestration engine for mediaq.
//!
//! Data flows one way: pollers push remote status into the [`Registry`],
//! and every registry mutation recomputes the [`PlaylistView`] and syncs the
//! presentation. [`Session`] ties the pieces together and implements the
//! submission flow.

pub mod config;
pub mod error;
pub mod playlist;
pub mod poller;
pub mod presentation;
pub mod registry;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::EngineError;
pub use playlist::PlaylistView;
pub use poller::{PollError, PollHandle, Poller};
pub use presentation::{
    NullPresenter, PresentationDiff, PresentationSnapshot, PresentationSync, Presenter,
    TracingPresenter,
};
pub use registry::{Registry, RegistryEvent};
pub use session::Session;
