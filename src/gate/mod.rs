//! Fair two-group mutual exclusion.

mod error;
mod event;
#[allow(clippy::module_inception)]
mod gate;
mod group;
mod state;

pub use error::GateError;
pub use event::{Action, Event, Occupancy};
pub use gate::{GroupGate, Visit};
pub use group::{Group, MemberId, PerGroup};
pub use state::BatchPolicy;
