// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collision groups: which prior entries count as obstructions.

use hashbrown::HashMap;

use cartouche_collision::GroupFilter;

/// A source's collision group: its id and the query filter derived from it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CollisionGroup {
    /// Group id tagged onto inserted geometry.
    pub id: u16,
    /// Filter applied when querying; `None` treats every entry as an
    /// obstruction.
    pub filter: GroupFilter,
}

/// Assigns collision groups to sources for one placement pass.
///
/// With cross-source collisions enabled there is a single global group and
/// no filtering. Otherwise each source gets its own monotonically assigned
/// group the first time it is seen, memoized for the lifetime of the pass;
/// its filter only admits entries of the same group, so symbols from
/// different sources never exclude each other.
#[derive(Debug)]
pub struct CollisionGroups {
    cross_source_collisions: bool,
    max_group_id: u16,
    groups: HashMap<String, CollisionGroup>,
}

impl CollisionGroups {
    /// Creates the group table for one pass.
    #[must_use]
    pub fn new(cross_source_collisions: bool) -> Self {
        Self {
            cross_source_collisions,
            max_group_id: 0,
            groups: HashMap::new(),
        }
    }

    /// The collision group for `source_id`, assigning one if needed.
    pub fn get(&mut self, source_id: &str) -> CollisionGroup {
        if self.cross_source_collisions {
            return CollisionGroup {
                id: 0,
                filter: None,
            };
        }
        if let Some(group) = self.groups.get(source_id) {
            return *group;
        }
        self.max_group_id += 1;
        let group = CollisionGroup {
            id: self.max_group_id,
            filter: Some(self.max_group_id),
        };
        self.groups.insert(source_id.to_owned(), group);
        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_source_collisions_share_one_unfiltered_group() {
        let mut groups = CollisionGroups::new(true);
        let a = groups.get("a");
        let b = groups.get("b");
        assert_eq!(a, b);
        assert_eq!(a.id, 0);
        assert_eq!(a.filter, None);
    }

    #[test]
    fn sources_get_distinct_memoized_groups() {
        let mut groups = CollisionGroups::new(false);
        let a = groups.get("a");
        let b = groups.get("b");
        assert_ne!(a.id, b.id);
        assert_eq!(a.filter, Some(a.id));
        assert_eq!(groups.get("a"), a);
        assert_eq!(groups.get("b"), b);
    }
}
