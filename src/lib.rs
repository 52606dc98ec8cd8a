// Library surface for the binary and headless integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod host;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod store;
pub mod ui;
pub mod variant;

pub use error::{EngineError, StoreError};
pub use host::{AssignmentContext, GameHost, HostView, Notice};
pub use session::SessionResult;
pub use variant::GameVariant;
