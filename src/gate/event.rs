//! Trace records.
//!
//! The gate emits one [`Event`] per interesting transition while it still holds its mutex, so the
//! sequence of events observed on a trace channel is the linearization order of the gate.

use core::fmt;

use super::group::{Group, MemberId, PerGroup};

/// What a member did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// The member was admitted.
    Enter,
    /// The member left.
    Leave,
    /// The member was denied immediate entry and started waiting.
    Wait,
    /// The member gave up waiting.
    Timeout,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Enter => "ENTERS",
            Action::Leave => "LEAVES",
            Action::Wait => "WAITS",
            Action::Timeout => "GIVES UP",
        })
    }
}

/// Consistent snapshot of the gate's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    /// Members inside, per group. Includes admitted members that have not woken up yet.
    pub occupied: PerGroup<usize>,
    /// Members blocked in `enter`, per group.
    pub waiting: PerGroup<usize>,
    /// Group that wins the next tie on an empty resource.
    pub next_turn: Group,
}

impl Occupancy {
    /// The group currently inside, if any.
    pub fn occupant(&self) -> Option<Group> {
        Group::ALL.into_iter().find(|&g| self.occupied[g] > 0)
    }

    /// Whether nobody is inside.
    pub fn is_empty(&self) -> bool {
        self.occupied.total() == 0
    }
}

/// One line of the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Who.
    pub member: MemberId,
    /// Which group the member belongs to.
    pub group: Group,
    /// What happened.
    pub action: Action,
    /// Counters right after the transition.
    pub occupancy: Occupancy,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.occupancy;
        write!(
            f,
            "{} {} {}, in=({}, {}) waiting=({}, {}) next={}",
            self.group,
            self.member,
            self.action,
            o.occupied[Group::A],
            o.occupied[Group::B],
            o.waiting[Group::A],
            o.waiting[Group::B],
            o.next_turn,
        )
    }
}

impl Event {
    /// Forwards the event to `tracing`.
    pub(crate) fn log(&self) {
        let o = &self.occupancy;
        match self.action {
            Action::Enter | Action::Leave => tracing::info!(
                target: "groupgate",
                member = self.member.0,
                group = %self.group,
                action = %self.action,
                occupied_a = o.occupied[Group::A],
                occupied_b = o.occupied[Group::B],
                waiting_a = o.waiting[Group::A],
                waiting_b = o.waiting[Group::B],
            ),
            Action::Wait | Action::Timeout => tracing::debug!(
                target: "groupgate",
                member = self.member.0,
                group = %self.group,
                action = %self.action,
                occupied_a = o.occupied[Group::A],
                occupied_b = o.occupied[Group::B],
                waiting_a = o.waiting[Group::A],
                waiting_b = o.waiting[Group::B],
            ),
        }
    }
}
