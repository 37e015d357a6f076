pub mod bus;
pub mod error;
pub mod provider;
pub mod registry;
pub mod router;
pub mod runner;
pub mod session;
pub mod slots;
pub mod workflow;

// Re-export key types
pub use error::Error;
pub use registry::{AgentRegistry, AgentSpec};
pub use runner::{AgentRunner, TurnOutcome};
pub use session::{Role, SessionStore, Snapshot, Turn};
pub use slots::{OutputSlot, Stage};
