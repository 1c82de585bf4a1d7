//! Contract violations and timeouts.

use thiserror::Error;

use super::group::{Group, MemberId};

/// Errors returned by [`GroupGate`](super::GroupGate).
///
/// Every variant except [`GateError::Timeout`] is a violation of the enter/leave contract by the
/// caller. The gate detects them before touching its counters, so the gate itself stays usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    /// `leave` by a member that is not inside.
    #[error("member {member} of group {group} left without entering")]
    UnmatchedLeave {
        /// The offending member.
        member: MemberId,
        /// The group it claimed.
        group: Group,
    },

    /// `leave` with a group tag different from the one used to enter.
    #[error("member {member} entered as group {entered} but left as group {claimed}")]
    GroupMismatch {
        /// The offending member.
        member: MemberId,
        /// The group it entered with.
        entered: Group,
        /// The group it claimed on leave.
        claimed: Group,
    },

    /// `enter` by a member that is already inside.
    #[error("member {member} is already inside as group {group}")]
    AlreadyInside {
        /// The offending member.
        member: MemberId,
        /// The group it is inside with.
        group: Group,
    },

    /// `enter` by a member that is already waiting to enter.
    #[error("member {member} is already waiting to enter as group {group}")]
    AlreadyWaiting {
        /// The offending member.
        member: MemberId,
        /// The group it is waiting with.
        group: Group,
    },

    /// `enter_timeout` gave up before the member was admitted.
    #[error("member {member} of group {group} timed out waiting for entry")]
    Timeout {
        /// The member that gave up.
        member: MemberId,
        /// Its group.
        group: Group,
    },
}
