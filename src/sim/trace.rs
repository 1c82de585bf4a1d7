//! Replaying the event history of a gate.

use thiserror::Error;

use crate::gate::{Action, Event, Group, MemberId, PerGroup};

/// A history that breaks the gate's guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TraceViolation {
    /// Members of both groups were inside together.
    #[error("event {index}: both groups inside ({inside})")]
    Overlap {
        /// Position of the offending event.
        index: usize,
        /// Members inside per group at that point.
        inside: PerGroup<usize>,
    },

    /// A leave without a matching enter.
    #[error("event {index}: member {member} left group {group} with nobody inside")]
    Underflow {
        /// Position of the offending event.
        index: usize,
        /// Who left.
        member: MemberId,
        /// The group it left.
        group: Group,
    },
}

/// Events of a gate in linearization order.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    events: Vec<Event>,
}

impl FromIterator<Event> for Trace {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl Trace {
    /// All events.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Groups of the admitted members, in admission order.
    pub fn admissions(&self) -> impl Iterator<Item = Group> + '_ {
        self.events
            .iter()
            .filter(|e| e.action == Action::Enter)
            .map(|e| e.group)
    }

    /// Number of runs of consecutive admissions of the same group.
    pub fn batches(&self) -> usize {
        let mut batches = 0;
        let mut last = None;
        for group in self.admissions() {
            if last != Some(group) {
                batches += 1;
                last = Some(group);
            }
        }
        batches
    }

    /// Replays the history and checks mutual exclusion and counter integrity.
    ///
    /// Returns the largest number of members seen inside at once, per group.
    pub fn check(&self) -> Result<PerGroup<usize>, TraceViolation> {
        let mut inside = PerGroup::<usize>::default();
        let mut peak = PerGroup::<usize>::default();

        for (index, event) in self.events.iter().enumerate() {
            let group = event.group;
            match event.action {
                Action::Enter => inside[group] += 1,
                Action::Leave => {
                    inside[group] =
                        inside[group]
                            .checked_sub(1)
                            .ok_or(TraceViolation::Underflow {
                                index,
                                member: event.member,
                                group,
                            })?
                }
                Action::Wait | Action::Timeout => {}
            }

            let occupied = event.occupancy.occupied;
            if inside[Group::A] > 0 && inside[Group::B] > 0 {
                return Err(TraceViolation::Overlap { index, inside });
            }
            if occupied[Group::A] > 0 && occupied[Group::B] > 0 {
                return Err(TraceViolation::Overlap {
                    index,
                    inside: occupied,
                });
            }
            peak[group] = peak[group].max(inside[group]);
        }
        Ok(peak)
    }
}

#[cfg(test)]
mod tests {
    use super::{Trace, TraceViolation};
    use crate::gate::{Action, Event, Group, MemberId, Occupancy, PerGroup};

    fn event(member: usize, group: Group, action: Action, a: usize, b: usize) -> Event {
        Event {
            member: MemberId(member),
            group,
            action,
            occupancy: Occupancy {
                occupied: PerGroup::new(a, b),
                waiting: PerGroup::default(),
                next_turn: Group::A,
            },
        }
    }

    #[test]
    fn accepts_alternating_batches() {
        let trace: Trace = [
            event(0, Group::A, Action::Enter, 1, 0),
            event(1, Group::A, Action::Enter, 2, 0),
            event(2, Group::B, Action::Wait, 2, 0),
            event(0, Group::A, Action::Leave, 1, 0),
            event(1, Group::A, Action::Leave, 0, 0),
            event(2, Group::B, Action::Enter, 0, 1),
            event(2, Group::B, Action::Leave, 0, 0),
        ]
        .into_iter()
        .collect();

        assert_eq!(trace.check(), Ok(PerGroup::new(2, 1)));
        assert_eq!(trace.batches(), 2);
        assert_eq!(
            trace.admissions().collect::<Vec<_>>(),
            vec![Group::A, Group::A, Group::B]
        );
    }

    #[test]
    fn rejects_overlap() {
        let trace: Trace = [
            event(0, Group::A, Action::Enter, 1, 0),
            event(1, Group::B, Action::Enter, 1, 1),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            trace.check(),
            Err(TraceViolation::Overlap { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_unmatched_leave() {
        let trace: Trace = [event(3, Group::B, Action::Leave, 0, 0)]
            .into_iter()
            .collect();
        assert_eq!(
            trace.check(),
            Err(TraceViolation::Underflow {
                index: 0,
                member: MemberId(3),
                group: Group::B
            })
        );
    }
}
