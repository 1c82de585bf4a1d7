//! The unisex bathroom simulation.
//!
//! Members of two groups repeatedly work for a while, then use a shared bathroom through a
//! [`GroupGate`](crate::gate::GroupGate).

mod config;
mod driver;
mod report;
mod trace;

pub use config::{ConfigError, SimConfig};
pub use driver::{SimError, Simulation, StopHandle};
pub use report::{MemberStats, Report};
pub use trace::{Trace, TraceViolation};
