//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the routing core and the outside world.
//! They are defined here (in `app`) so that both the orchestrator and the
//! adapter crates can depend on them without creating circular dependencies.

pub mod bus;
pub mod intake;
pub mod notifier;

pub use bus::BusClient;
pub use intake::Intake;
pub use notifier::{Notifier, UserCommand};
