//! Group tags and per-group storage.

use core::fmt;
use core::ops::{Index, IndexMut};

/// One of the two mutually exclusive classes of resource users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    /// The first group.
    A,
    /// The second group.
    B,
}

impl Group {
    /// Both groups, in index order.
    pub const ALL: [Group; 2] = [Group::A, Group::B];

    /// Returns the opposite group.
    pub const fn other(self) -> Group {
        match self {
            Group::A => Group::B,
            Group::B => Group::A,
        }
    }

    const fn index(self) -> usize {
        match self {
            Group::A => 0,
            Group::B => 1,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::A => f.write_str("A"),
            Group::B => f.write_str("B"),
        }
    }
}

/// Identifies one member for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub usize);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for MemberId {
    fn from(id: usize) -> Self {
        MemberId(id)
    }
}

/// A pair of values, one per group, indexed by [`Group`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PerGroup<T> {
    inner: [T; 2],
}

impl<T> PerGroup<T> {
    /// Creates a pair from the values for `A` and `B`.
    pub const fn new(a: T, b: T) -> Self {
        Self { inner: [a, b] }
    }

    /// Creates a pair by calling `f` for each group.
    pub fn from_fn<F: FnMut(Group) -> T>(mut f: F) -> Self {
        Self::new(f(Group::A), f(Group::B))
    }

    /// Applies `f` to both values.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PerGroup<U> {
        PerGroup {
            inner: self.inner.map(f),
        }
    }

    /// Iterates over `(group, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Group, &T)> {
        Group::ALL.into_iter().zip(self.inner.iter())
    }
}

impl PerGroup<usize> {
    /// Sum over both groups.
    pub fn total(&self) -> usize {
        self.inner[0] + self.inner[1]
    }
}

impl<T: fmt::Display> fmt::Display for PerGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A: {}, B: {}", self.inner[0], self.inner[1])
    }
}

impl<T> Index<Group> for PerGroup<T> {
    type Output = T;

    fn index(&self, group: Group) -> &T {
        &self.inner[group.index()]
    }
}

impl<T> IndexMut<Group> for PerGroup<T> {
    fn index_mut(&mut self, group: Group) -> &mut T {
        &mut self.inner[group.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::{Group, PerGroup};

    #[test]
    fn other_is_involution() {
        for g in Group::ALL {
            assert_ne!(g, g.other());
            assert_eq!(g, g.other().other());
        }
    }

    #[test]
    fn per_group_indexing() {
        let mut pair = PerGroup::new(1usize, 2);
        pair[Group::B] += 10;
        assert_eq!(pair[Group::A], 1);
        assert_eq!(pair[Group::B], 12);
        assert_eq!(pair.total(), 13);
        assert_eq!(
            pair.iter().map(|(g, v)| (g, *v)).collect::<Vec<_>>(),
            vec![(Group::A, 1), (Group::B, 12)]
        );
    }
}
