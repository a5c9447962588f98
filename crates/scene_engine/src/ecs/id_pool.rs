//! Identifier allocation
//!
//! Scenes, entities and components draw ids from independent namespaces.
//! Each namespace owns an [`IdPool`]: a counter handing out fresh ids until it
//! reaches [`Identifier::MAX`], after which the pool scans for the lowest id
//! nobody holds any more.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw identifier type shared by all namespaces
pub type Identifier = i32;

/// Sentinel for "no such object"
pub const INVALID_ID: Identifier = -1;

/// First id handed out by a fresh pool
pub const START_ID: Identifier = 0;

/// The independent id spaces of the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdNamespace {
    /// Scene ids
    Scene,
    /// Entity ids
    Entity,
    /// Component ids
    Component,
}

impl fmt::Display for IdNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scene => "scene",
            Self::Entity => "entity",
            Self::Component => "component",
        };
        f.write_str(name)
    }
}

/// Monotonic id generator with a free-id scan once the counter runs out
#[derive(Debug, Clone)]
pub struct IdPool {
    next: Identifier,
}

impl Default for IdPool {
    fn default() -> Self {
        Self::new()
    }
}

impl IdPool {
    /// Create a pool starting at [`START_ID`]
    pub const fn new() -> Self {
        Self { next: START_ID }
    }

    /// Create a pool whose counter starts at `next`
    pub const fn starting_at(next: Identifier) -> Self {
        Self { next }
    }

    /// Hand out an id not reported as taken by `is_taken`
    ///
    /// Returns [`INVALID_ID`] if every non-negative id is taken.
    pub fn next_available(&mut self, is_taken: impl Fn(Identifier) -> bool) -> Identifier {
        // Restored snapshots can bring back ids the counter has not reached yet.
        while self.next < Identifier::MAX {
            let id = self.next;
            self.next += 1;
            if !is_taken(id) {
                return id;
            }
        }

        (START_ID..=Identifier::MAX)
            .find(|id| !is_taken(*id))
            .unwrap_or(INVALID_ID)
    }

    /// Whether the counter is exhausted and allocation falls back to scanning
    pub const fn is_scanning(&self) -> bool {
        self.next == Identifier::MAX
    }
}

/// Keyed registry of pools, one per namespace
#[derive(Debug, Default)]
pub struct IdPoolRegistry {
    pools: HashMap<IdNamespace, IdPool>,
}

impl IdPoolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the pool for `namespace`, creating it on first use
    pub fn get_or_create(&mut self, namespace: IdNamespace) -> &mut IdPool {
        self.pools.entry(namespace).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn counter_hands_out_sequential_ids() {
        let mut pool = IdPool::new();
        assert_eq!(pool.next_available(|_| false), 0);
        assert_eq!(pool.next_available(|_| false), 1);
        assert_eq!(pool.next_available(|_| false), 2);
    }

    #[test]
    fn counter_skips_live_ids() {
        let taken: BTreeSet<Identifier> = [0, 1, 3].into_iter().collect();
        let mut pool = IdPool::new();
        assert_eq!(pool.next_available(|id| taken.contains(&id)), 2);
        assert_eq!(pool.next_available(|id| taken.contains(&id)), 4);
    }

    #[test]
    fn exhausted_counter_falls_back_to_lowest_free_id() {
        let taken: BTreeSet<Identifier> = [0, 1, Identifier::MAX - 1].into_iter().collect();
        let mut pool = IdPool::starting_at(Identifier::MAX - 1);

        let id = pool.next_available(|id| taken.contains(&id));
        assert_eq!(id, 2);
        assert!(pool.is_scanning());

        let mut more = taken.clone();
        more.insert(2);
        assert_eq!(pool.next_available(|id| more.contains(&id)), 3);
    }

    #[test]
    fn last_counter_value_is_still_handed_out() {
        let mut pool = IdPool::starting_at(Identifier::MAX - 1);
        assert_eq!(pool.next_available(|_| false), Identifier::MAX - 1);
        assert!(pool.is_scanning());
        assert_eq!(pool.next_available(|_| false), START_ID);
    }

    #[test]
    fn namespaces_are_independent() {
        let mut registry = IdPoolRegistry::new();
        assert_eq!(registry.get_or_create(IdNamespace::Scene).next_available(|_| false), 0);
        assert_eq!(registry.get_or_create(IdNamespace::Scene).next_available(|_| false), 1);
        assert_eq!(registry.get_or_create(IdNamespace::Entity).next_available(|_| false), 0);
        assert_eq!(registry.get_or_create(IdNamespace::Component).next_available(|_| false), 0);
    }
}
