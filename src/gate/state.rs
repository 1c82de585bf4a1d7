//! The admission state machine.
//!
//! Everything here runs with the gate's mutex held. Nothing blocks; the gate turns the decisions
//! made here into condvar waits and notifications.

use std::collections::HashMap;

use super::error::GateError;
use super::event::Occupancy;
use super::group::{Group, MemberId, PerGroup};

/// Whether newcomers may join a batch that is already inside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BatchPolicy {
    /// Newcomers join a running batch only while the opposite group has nobody waiting. Once the
    /// opposite group queues, the batch admits only the members that were already waiting when it
    /// opened, then drains.
    #[default]
    Yielding,
    /// Newcomers always join a running batch of their own group. The opposite group gets in only
    /// when arrivals pause long enough for the batch to drain.
    Greedy,
}

/// Shared counters of the gate.
///
/// Members admitted by the baton holder on behalf of a sleeping thread are moved from `waiting`
/// to `occupied` at decision time and parked in `granted` until that thread wakes up and claims
/// the admission.
#[derive(Debug)]
pub(crate) struct State {
    occupied: PerGroup<usize>,
    waiting: PerGroup<usize>,
    granted: PerGroup<usize>,
    /// Waiters of the current batch's group that were queued when it opened and may still be
    /// admitted regardless of the policy.
    cohort: PerGroup<usize>,
    next_turn: Group,
    /// Every member that is waiting or inside, with its group.
    members: HashMap<MemberId, (Group, Presence)>,
    policy: BatchPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Waiting,
    Inside,
}

impl State {
    pub(crate) fn new(policy: BatchPolicy, first_turn: Group) -> Self {
        Self {
            occupied: PerGroup::default(),
            waiting: PerGroup::default(),
            granted: PerGroup::default(),
            cohort: PerGroup::default(),
            next_turn: first_turn,
            members: HashMap::new(),
            policy,
        }
    }

    pub(crate) fn snapshot(&self) -> Occupancy {
        Occupancy {
            occupied: self.occupied,
            waiting: self.waiting,
            next_turn: self.next_turn,
        }
    }

    fn occupant(&self) -> Option<Group> {
        Group::ALL.into_iter().find(|&g| self.occupied[g] > 0)
    }

    /// Whether a running batch of `group` takes members that were not in its cohort.
    fn takes_newcomers(&self, group: Group) -> bool {
        match self.policy {
            BatchPolicy::Greedy => true,
            BatchPolicy::Yielding => self.waiting[group.other()] == 0,
        }
    }

    /// Rejects a member id that is already waiting or inside.
    pub(crate) fn check_enter(&self, member: MemberId) -> Result<(), GateError> {
        match self.members.get(&member) {
            Some(&(group, Presence::Inside)) => Err(GateError::AlreadyInside { member, group }),
            Some(&(group, Presence::Waiting)) => Err(GateError::AlreadyWaiting { member, group }),
            None => Ok(()),
        }
    }

    /// Whether a member of `group` that just arrived may enter without waiting.
    pub(crate) fn admits_arrival(&self, group: Group) -> bool {
        match self.occupant() {
            Some(g) if g == group => self.takes_newcomers(group),
            Some(_) => false,
            None => self.waiting.total() == 0,
        }
    }

    /// Admits an arriving member directly. The caller must have checked `admits_arrival`.
    pub(crate) fn enter(&mut self, member: MemberId, group: Group) {
        let previous = self.members.insert(member, (group, Presence::Inside));
        assert!(previous.is_none(), "member {member} entered twice");
        self.occupy(group);
    }

    pub(crate) fn enqueue(&mut self, member: MemberId, group: Group) {
        let previous = self.members.insert(member, (group, Presence::Waiting));
        assert!(previous.is_none(), "member {member} queued twice");
        self.waiting[group] += 1;
    }

    /// Claims an admission granted to some waiter of `group`.
    pub(crate) fn claim(&mut self, member: MemberId, group: Group) -> bool {
        if self.granted[group] == 0 {
            return false;
        }
        self.granted[group] -= 1;
        let previous = self.members.insert(member, (group, Presence::Inside));
        assert_eq!(
            previous,
            Some((group, Presence::Waiting)),
            "member {member} claimed an admission it was not waiting for"
        );
        true
    }

    /// Called by a waiter whose deadline passed. Claims a pending grant of `group` if there is
    /// one, otherwise withdraws the waiter. Returns whether the member got in.
    pub(crate) fn give_up(&mut self, member: MemberId, group: Group) -> bool {
        if self.claim(member, group) {
            return true;
        }
        self.withdraw(member, group);
        false
    }

    /// Removes a waiter of `group` that gave up.
    fn withdraw(&mut self, member: MemberId, group: Group) {
        assert_eq!(
            self.members.remove(&member),
            Some((group, Presence::Waiting)),
            "withdrawing member {member} that is not waiting"
        );
        assert!(self.waiting[group] > 0, "withdrawing a waiter that is not counted");
        self.waiting[group] -= 1;
        self.cohort[group] = self.cohort[group].min(self.waiting[group]);
    }

    pub(crate) fn leave(&mut self, member: MemberId, group: Group) -> Result<(), GateError> {
        match self.members.get(&member) {
            None | Some((_, Presence::Waiting)) => {
                return Err(GateError::UnmatchedLeave { member, group })
            }
            Some(&(entered, Presence::Inside)) if entered != group => {
                return Err(GateError::GroupMismatch {
                    member,
                    entered,
                    claimed: group,
                })
            }
            Some(_) => {}
        }
        let _ = self.members.remove(&member);
        self.occupied[group] = self.occupied[group]
            .checked_sub(1)
            .expect("occupancy underflow: a member left a group with nobody inside");
        Ok(())
    }

    fn occupy(&mut self, group: Group) {
        assert_eq!(
            self.occupied[group.other()],
            0,
            "both groups inside at the same time"
        );
        if self.occupied[group] == 0 {
            // A new batch. The other group wins the next tie.
            self.next_turn = group.other();
            self.cohort = PerGroup::default();
        }
        self.occupied[group] += 1;
    }

    fn grant(&mut self, group: Group) {
        assert!(self.waiting[group] > 0, "granting entry with nobody waiting");
        self.waiting[group] -= 1;
        self.occupy(group);
        self.granted[group] += 1;
    }

    /// Decides who, if anyone, is admitted next, and admits them.
    ///
    /// Must run after every change of the counters. Admits at most one waiter; the admitted
    /// member runs this again once it wakes up, which continues the batch one member at a time.
    /// Returns the group whose queue must be notified.
    pub(crate) fn pass_baton(&mut self) -> Option<Group> {
        match self.occupant() {
            None => {
                let group = match (self.waiting[Group::A] > 0, self.waiting[Group::B] > 0) {
                    (true, true) => self.next_turn,
                    (true, false) => Group::A,
                    (false, true) => Group::B,
                    (false, false) => return None,
                };
                self.grant(group);
                self.cohort[group] = self.waiting[group];
                Some(group)
            }
            Some(group) => {
                if self.waiting[group] == 0 {
                    return None;
                }
                if self.cohort[group] > 0 {
                    self.cohort[group] -= 1;
                } else if !self.takes_newcomers(group) {
                    return None;
                }
                self.grant(group);
                Some(group)
            }
        }
    }
}
