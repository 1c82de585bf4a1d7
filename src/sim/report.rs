//! Simulation report.

use core::fmt;
use std::time::Duration;

use crate::gate::{Group, MemberId, PerGroup};

/// What one member did during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberStats {
    /// The member.
    pub member: MemberId,
    /// Its group.
    pub group: Group,
    /// Completed visits.
    pub visits: usize,
    /// Longest time spent blocked in `enter`.
    pub longest_wait: Duration,
    /// Most members of its group inside at once, as seen by this member on entry.
    pub peak_company: usize,
}

impl MemberStats {
    pub(crate) fn new(member: MemberId, group: Group) -> Self {
        Self {
            member,
            group,
            visits: 0,
            longest_wait: Duration::ZERO,
            peak_company: 0,
        }
    }
}

/// Outcome of a simulation run.
#[derive(Debug, Clone)]
pub struct Report {
    members: Vec<MemberStats>,
    labels: PerGroup<String>,
    elapsed: Duration,
}

impl Report {
    pub(crate) fn new(
        members: Vec<MemberStats>,
        labels: PerGroup<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            members,
            labels,
            elapsed,
        }
    }

    /// Per-member results, ordered by member id.
    pub fn members(&self) -> &[MemberStats] {
        &self.members
    }

    /// Wall-clock duration of the run.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Completed visits per group.
    pub fn admissions(&self) -> PerGroup<usize> {
        let mut admissions = PerGroup::<usize>::default();
        for m in &self.members {
            admissions[m.group] += m.visits;
        }
        admissions
    }

    /// Most members of each group inside at once.
    pub fn peak(&self) -> PerGroup<usize> {
        let mut peak = PerGroup::<usize>::default();
        for m in &self.members {
            peak[m.group] = peak[m.group].max(m.peak_company);
        }
        peak
    }

    /// Longest wait in `enter` per group.
    pub fn longest_wait(&self) -> PerGroup<Duration> {
        let mut longest = PerGroup::<Duration>::default();
        for m in &self.members {
            longest[m.group] = longest[m.group].max(m.longest_wait);
        }
        longest
    }

    /// Ratio of the smaller to the larger per-member admission rate of the two groups.
    ///
    /// `1.0` is perfectly even. `None` if a group has no members or nobody visited.
    pub fn fairness_ratio(&self) -> Option<f64> {
        let admissions = self.admissions();
        let mut rates = [0f64; 2];
        for (i, group) in Group::ALL.into_iter().enumerate() {
            let members = self.members.iter().filter(|m| m.group == group).count();
            if members == 0 {
                return None;
            }
            rates[i] = admissions[group] as f64 / members as f64;
        }
        let (lo, hi) = (rates[0].min(rates[1]), rates[0].max(rates[1]));
        if hi == 0.0 {
            None
        } else {
            Some(lo / hi)
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let admissions = self.admissions();
        let peak = self.peak();
        let longest = self.longest_wait();
        writeln!(f, "ran for {:.2?}", self.elapsed)?;
        for group in Group::ALL {
            writeln!(
                f,
                "{}: {} visits, at most {} inside, longest wait {:.2?}",
                self.labels[group], admissions[group], peak[group], longest[group]
            )?;
        }
        match self.fairness_ratio() {
            Some(ratio) => write!(f, "fairness {ratio:.3}"),
            None => write!(f, "fairness n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{MemberStats, Report};
    use crate::gate::{Group, MemberId, PerGroup};

    fn stats(id: usize, group: Group, visits: usize, peak: usize) -> MemberStats {
        MemberStats {
            visits,
            peak_company: peak,
            ..MemberStats::new(MemberId(id), group)
        }
    }

    fn labels() -> PerGroup<String> {
        PerGroup::new("man".into(), "woman".into())
    }

    #[test]
    fn aggregates_per_group() {
        let report = Report::new(
            vec![
                stats(0, Group::A, 4, 1),
                stats(1, Group::A, 6, 2),
                stats(2, Group::B, 5, 1),
            ],
            labels(),
            Duration::from_secs(1),
        );
        assert_eq!(report.admissions(), PerGroup::new(10, 5));
        assert_eq!(report.peak(), PerGroup::new(2, 1));
        // 5 visits per member on both sides.
        assert_eq!(report.fairness_ratio(), Some(1.0));
        assert!(report.to_string().contains("woman: 5 visits"));
    }

    #[test]
    fn fairness_needs_both_groups() {
        let report = Report::new(vec![stats(0, Group::A, 3, 1)], labels(), Duration::ZERO);
        assert_eq!(report.fairness_ratio(), None);
    }
}
