//! Fair two-group mutual exclusion.
//!
//! [`GroupGate`] admits members of one of two groups into a shared resource. Any number of
//! members of the same group may be inside together, the two groups never are, and neither group
//! waits forever. The [`sim`] module drives the gate with simulated members, as in the classic
//! unisex bathroom problem.

#![warn(missing_docs, missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod gate;
pub mod sim;
pub mod sync;

pub use gate::{
    Action, BatchPolicy, Event, GateError, Group, GroupGate, MemberId, Occupancy, PerGroup, Visit,
};
