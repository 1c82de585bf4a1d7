//! The blocking gate and its RAII visit guard.

use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use crossbeam_utils::CachePadded;

use super::error::GateError;
use super::event::{Action, Event, Occupancy};
use super::group::{Group, MemberId, PerGroup};
use super::state::{BatchPolicy, State};
use crate::sync::{Condvar, Mutex, MutexGuard};

const POISONED: &str = "group gate poisoned: a thread panicked while holding the baton";

/// A fair two-group mutual exclusion gate.
///
/// Any number of members of one group may be inside at once, but never members of both groups.
/// Admission is decided by whichever thread currently holds the gate's mutex (the baton): after
/// each change of the counters it admits at most one waiter on behalf of that waiter, then wakes
/// it through its group's condition variable. The woken member continues the batch the same way.
///
/// When both groups wait on an empty resource, the group that did not get the previous batch goes
/// first. Under [`BatchPolicy::Yielding`] this bounds the wait of either group by one batch of the
/// other. Fairness is per group; members of the same group are not admitted in arrival order.
#[derive(Debug)]
pub struct GroupGate {
    state: Mutex<State>,
    queues: PerGroup<CachePadded<Condvar>>,
    trace: Option<Sender<Event>>,
}

impl Default for GroupGate {
    fn default() -> Self {
        Self::new(BatchPolicy::default(), Group::A)
    }
}

impl GroupGate {
    /// Creates an empty gate. `first_turn` wins the first tie between the groups.
    pub fn new(policy: BatchPolicy, first_turn: Group) -> Self {
        Self {
            state: Mutex::new(State::new(policy, first_turn)),
            queues: PerGroup::from_fn(|_| CachePadded::new(Condvar::new())),
            trace: None,
        }
    }

    /// Sends every event of the gate to `sink`, in linearization order.
    pub fn with_trace(mut self, sink: Sender<Event>) -> Self {
        self.trace = Some(sink);
        self
    }

    /// Blocks until `member` may occupy the resource as a member of `group`, then records it as
    /// inside.
    ///
    /// Returns the counters right after the admission. Fails only if `member` is already inside
    /// or already waiting to enter.
    pub fn enter(&self, group: Group, member: MemberId) -> Result<Occupancy, GateError> {
        self.acquire(group, member, None)
    }

    /// Like [`GroupGate::enter`], but gives up after `timeout`.
    ///
    /// A member that gives up is no longer counted as waiting. If it was admitted concurrently
    /// with the timeout expiring, the admission wins and the call succeeds.
    pub fn enter_timeout(
        &self,
        group: Group,
        member: MemberId,
        timeout: Duration,
    ) -> Result<Occupancy, GateError> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.acquire(group, member, Some(deadline)),
            None => self.acquire(group, member, None),
        }
    }

    /// Records that `member` left, and admits whoever is next.
    ///
    /// Must be called exactly once per successful `enter`, with the same group.
    pub fn leave(&self, group: Group, member: MemberId) -> Result<Occupancy, GateError> {
        let mut state = self.lock();
        state.leave(member, group)?;
        let occupancy = state.snapshot();
        self.emit(&state, member, group, Action::Leave);
        self.hand_over(&mut state);
        Ok(occupancy)
    }

    /// Enters and returns a guard that leaves when dropped.
    pub fn visit(&self, group: Group, member: MemberId) -> Result<Visit<'_>, GateError> {
        let occupancy = self.enter(group, member)?;
        Ok(Visit {
            gate: self,
            group,
            member,
            occupancy,
            left: false,
        })
    }

    /// Like [`GroupGate::visit`], but gives up after `timeout`.
    pub fn visit_timeout(
        &self,
        group: Group,
        member: MemberId,
        timeout: Duration,
    ) -> Result<Visit<'_>, GateError> {
        let occupancy = self.enter_timeout(group, member, timeout)?;
        Ok(Visit {
            gate: self,
            group,
            member,
            occupancy,
            left: false,
        })
    }

    /// Current counters.
    pub fn occupancy(&self) -> Occupancy {
        self.lock().snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect(POISONED)
    }

    fn acquire(
        &self,
        group: Group,
        member: MemberId,
        deadline: Option<Instant>,
    ) -> Result<Occupancy, GateError> {
        let mut state = self.lock();
        state.check_enter(member)?;

        if state.admits_arrival(group) {
            state.enter(member, group);
        } else {
            state.enqueue(member, group);
            self.emit(&state, member, group, Action::Wait);
            self.hand_over(&mut state);
            state = self.wait_for_grant(state, group, member, deadline)?;
        }

        let occupancy = state.snapshot();
        self.emit(&state, member, group, Action::Enter);
        self.hand_over(&mut state);
        Ok(occupancy)
    }

    /// Sleeps on the group's queue until an admission for the group can be claimed.
    fn wait_for_grant<'s>(
        &'s self,
        mut state: MutexGuard<'s, State>,
        group: Group,
        member: MemberId,
        deadline: Option<Instant>,
    ) -> Result<MutexGuard<'s, State>, GateError> {
        let queue = &self.queues[group];
        while !state.claim(member, group) {
            state = match deadline {
                None => queue.wait(state).expect(POISONED),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        if state.give_up(member, group) {
                            return Ok(state);
                        }
                        self.emit(&state, member, group, Action::Timeout);
                        // Its absence may reopen a batch it was holding closed.
                        self.hand_over(&mut state);
                        return Err(GateError::Timeout { member, group });
                    }
                    queue.wait_timeout(state, deadline - now).expect(POISONED).0
                }
            };
        }
        Ok(state)
    }

    /// Runs the admission rule and wakes the admitted group, still holding the mutex.
    fn hand_over(&self, state: &mut State) {
        if let Some(group) = state.pass_baton() {
            self.queues[group].notify_one();
        }
    }

    fn emit(&self, state: &State, member: MemberId, group: Group, action: Action) {
        let event = Event {
            member,
            group,
            action,
            occupancy: state.snapshot(),
        };
        event.log();
        if let Some(sink) = &self.trace {
            // A dropped receiver only means nobody is recording.
            let _ = sink.send(event);
        }
    }
}

/// A member inside the resource. Leaves when dropped.
#[derive(Debug)]
#[must_use = "dropping a `Visit` leaves the resource immediately"]
pub struct Visit<'g> {
    gate: &'g GroupGate,
    group: Group,
    member: MemberId,
    occupancy: Occupancy,
    left: bool,
}

impl Visit<'_> {
    /// The visitor's group.
    pub fn group(&self) -> Group {
        self.group
    }

    /// The visitor.
    pub fn member(&self) -> MemberId {
        self.member
    }

    /// Counters right after the visitor entered.
    pub fn occupancy(&self) -> Occupancy {
        self.occupancy
    }

    /// Leaves and returns the counters right after leaving.
    pub fn leave(mut self) -> Result<Occupancy, GateError> {
        self.left = true;
        self.gate.leave(self.group, self.member)
    }
}

impl Drop for Visit<'_> {
    fn drop(&mut self) {
        if self.left {
            return;
        }
        if let Err(err) = self.gate.leave(self.group, self.member) {
            tracing::error!(
                target: "groupgate",
                %err,
                "visit dropped after its member already left"
            );
        }
    }
}
