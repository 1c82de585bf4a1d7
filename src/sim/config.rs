//! Simulation parameters.

use core::ops::Range;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use crate::gate::{BatchPolicy, Group, PerGroup};

/// Errors in a [`SimConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Neither group has members.
    #[error("the simulation needs at least one member")]
    NoMembers,

    /// A duration range ends before it starts.
    #[error("{what} range is inverted: {start:?}..{end:?}")]
    InvertedRange {
        /// Which range.
        what: &'static str,
        /// Its start.
        start: Duration,
        /// Its end.
        end: Duration,
    },

    /// `rounds` is zero.
    #[error("members must visit at least once")]
    ZeroRounds,
}

/// Parameters of a simulation run.
///
/// Durations are drawn uniformly from the half-open ranges; a range with `start == end` always
/// yields `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Number of member threads per group.
    pub members: PerGroup<usize>,
    /// Time spent working between visits.
    pub think: Range<Duration>,
    /// Time spent inside the resource.
    pub stay: Range<Duration>,
    /// Visits per member. `None` runs until stopped.
    pub rounds: Option<usize>,
    /// Batch policy of the gate.
    pub policy: BatchPolicy,
    /// Group that wins the first tie.
    pub first_turn: Group,
    /// Human readable names of the groups, used in reports.
    pub labels: PerGroup<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            members: PerGroup::new(3, 3),
            think: Duration::from_millis(100)..Duration::from_millis(500),
            stay: Duration::from_millis(50)..Duration::from_millis(200),
            rounds: None,
            policy: BatchPolicy::default(),
            first_turn: Group::A,
            labels: PerGroup::new("man".to_string(), "woman".to_string()),
        }
    }
}

impl SimConfig {
    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.members.total() == 0 {
            return Err(ConfigError::NoMembers);
        }
        for (what, range) in [("think", &self.think), ("stay", &self.stay)] {
            if range.start > range.end {
                return Err(ConfigError::InvertedRange {
                    what,
                    start: range.start,
                    end: range.end,
                });
            }
        }
        if self.rounds == Some(0) {
            return Err(ConfigError::ZeroRounds);
        }
        Ok(())
    }

    /// Name of `group` in reports.
    pub fn label(&self, group: Group) -> &str {
        &self.labels[group]
    }
}

/// Draws a duration from `range`.
pub(crate) fn sample<R: Rng>(rng: &mut R, range: &Range<Duration>) -> Duration {
    if range.start >= range.end {
        range.start
    } else {
        rng.gen_range(range.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::thread_rng;

    use super::{sample, ConfigError, SimConfig};
    use crate::gate::PerGroup;

    #[test]
    fn default_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_parameters() {
        let config = SimConfig {
            members: PerGroup::new(0, 0),
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoMembers));

        let config = SimConfig {
            stay: Duration::from_millis(5)..Duration::from_millis(1),
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { what: "stay", .. })
        ));

        let config = SimConfig {
            rounds: Some(0),
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroRounds));
    }

    #[test]
    fn sample_stays_in_range() {
        let mut rng = thread_rng();
        let range = Duration::from_millis(10)..Duration::from_millis(20);
        for _ in 0..1024 {
            assert!(range.contains(&sample(&mut rng, &range)));
        }
        let fixed = Duration::ZERO..Duration::ZERO;
        assert_eq!(sample(&mut rng, &fixed), Duration::ZERO);
    }
}
