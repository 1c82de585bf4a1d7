//! Member threads.

use std::io;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::thread_rng;
use thiserror::Error;

use super::config::{sample, ConfigError, SimConfig};
use super::report::{MemberStats, Report};
use crate::gate::{Event, GateError, Group, GroupGate, MemberId};

/// Errors of a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid parameters.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A member thread could not be created. Members already running were stopped.
    #[error("failed to spawn member {member}")]
    Spawn {
        /// The member that has no thread.
        member: MemberId,
        /// Why.
        #[source]
        source: io::Error,
    },

    /// A member broke the enter/leave contract. This is a bug in the driver.
    #[error("member broke the gate contract")]
    Gate(#[from] GateError),
}

/// Asks a running simulation to finish.
///
/// Members complete the visit they are in, then stop instead of thinking again.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    /// Requests the stop.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether a stop was requested.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// The unisex bathroom: members of two groups repeatedly think, then visit a shared resource
/// through a [`GroupGate`].
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    stop: StopHandle,
    trace: Option<Sender<Event>>,
}

impl Simulation {
    /// Creates a simulation with validated parameters.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            stop: StopHandle::default(),
            trace: None,
        })
    }

    /// The parameters.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// A handle that stops the run from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Returns a channel carrying the gate's events of the coming run.
    ///
    /// The channel disconnects when the run ends.
    pub fn trace(&mut self) -> Receiver<Event> {
        let (sender, receiver) = unbounded();
        self.trace = Some(sender);
        receiver
    }

    /// Runs all members to completion.
    ///
    /// Returns when every member has done its rounds, or after a stop once every member has
    /// finished its current visit.
    pub fn run(self) -> Result<Report, SimError> {
        let Self {
            config,
            stop,
            trace,
        } = self;

        let mut gate = GroupGate::new(config.policy, config.first_turn);
        if let Some(sink) = trace {
            gate = gate.with_trace(sink);
        }

        tracing::info!(
            target: "groupgate::sim",
            members = %config.members,
            policy = ?config.policy,
            "starting simulation"
        );

        let started = Instant::now();
        let member = Member {
            config: &config,
            gate: &gate,
            stop: &stop,
        };
        let mut members = thread::scope(|s| -> Result<Vec<MemberStats>, SimError> {
            let mut handles: Vec<ScopedJoinHandle<'_, Result<MemberStats, GateError>>> =
                Vec::new();
            for group in Group::ALL {
                for _ in 0..config.members[group] {
                    let id = MemberId(handles.len());
                    let member = member.clone();
                    let spawned = thread::Builder::new()
                        .name(format!("{}-{}", config.label(group), id.0))
                        .spawn_scoped(s, move || member.run(group, id));
                    match spawned {
                        Ok(handle) => handles.push(handle),
                        Err(source) => {
                            // Let the members already running wind down before the scope joins.
                            stop.stop();
                            return Err(SimError::Spawn { member: id, source });
                        }
                    }
                }
            }

            Ok(join_members(handles, &stop)?)
        })?;
        members.sort_by_key(|m| m.member);

        let report = Report::new(members, config.labels.clone(), started.elapsed());
        tracing::info!(
            target: "groupgate::sim",
            admissions = %report.admissions(),
            elapsed = ?report.elapsed(),
            "simulation finished"
        );
        Ok(report)
    }
}

/// Joins every member. On the first error the others are stopped, so that the scope can join
/// them too.
fn join_members<T, E>(
    handles: Vec<ScopedJoinHandle<'_, Result<T, E>>>,
    stop: &StopHandle,
) -> Result<Vec<T>, E> {
    let mut members = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle
            .join()
            .unwrap_or_else(|payload| panic::resume_unwind(payload))
        {
            Ok(stats) => members.push(stats),
            Err(err) => {
                stop.stop();
                return Err(err);
            }
        }
    }
    Ok(members)
}

/// What every member thread borrows.
#[derive(Debug, Clone)]
struct Member<'a> {
    config: &'a SimConfig,
    gate: &'a GroupGate,
    stop: &'a StopHandle,
}

impl Member<'_> {
    fn done(&self, visits: usize) -> bool {
        self.stop.is_stopped() || self.config.rounds.is_some_and(|rounds| visits >= rounds)
    }

    fn run(self, group: Group, id: MemberId) -> Result<MemberStats, GateError> {
        let mut rng = thread_rng();
        let mut stats = MemberStats::new(id, group);
        let label = self.config.label(group);

        while !self.done(stats.visits) {
            thread::sleep(sample(&mut rng, &self.config.think));

            let asked = Instant::now();
            let visit = self.gate.visit(group, id)?;
            stats.longest_wait = stats.longest_wait.max(asked.elapsed());
            stats.peak_company = stats.peak_company.max(visit.occupancy().occupied[group]);
            tracing::debug!(target: "groupgate::sim", "{label} {} is in", id.0);

            thread::sleep(sample(&mut rng, &self.config.stay));
            let _ = visit.leave()?;
            stats.visits += 1;
        }
        Ok(stats)
    }
}
