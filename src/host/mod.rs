//! Host-facing contract and JSON-lines bridge for native shells.

pub mod contract;
pub mod router;
pub mod stdio;

pub use router::HostRouter;
pub use stdio::{run_bridge, run_stdio_bridge};
