//! Listener/dispatcher and shutdown coordination.

pub mod listener;
pub mod shutdown;

pub use listener::{Listener, run};
pub use shutdown::{Shutdown, ShutdownSignal};
