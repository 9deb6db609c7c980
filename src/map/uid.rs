//! Reconciliation between server-assigned uids and local room ids.
//!
//! One uid may resolve to several rooms (the same server location mapped
//! more than once across data refreshes) and one room may carry several
//! uids. Entries are only ever added.

use std::collections::{BTreeSet, HashMap};

use crate::map::room::{Room, RoomId, Uid};

/// Append-only multimap from external uid to local room ids.
#[derive(Debug, Clone, Default)]
pub struct UidRegistry {
    entries: HashMap<Uid, BTreeSet<RoomId>>,
}

impl UidRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from every room's own uid list.
    pub fn from_rooms<'a>(rooms: impl IntoIterator<Item = &'a Room>) -> Self {
        let mut registry = Self::new();
        for room in rooms {
            for &uid in &room.uid {
                registry.register(uid, room.id);
            }
        }
        registry
    }

    /// Record that `uid` resolves to `room_id`. Returns false when the pair
    /// was already known.
    pub fn register(&mut self, uid: Uid, room_id: RoomId) -> bool {
        self.entries.entry(uid).or_default().insert(room_id)
    }

    /// Room ids for `uid`, ascending. Empty when the uid is unknown.
    pub fn resolve(&self, uid: Uid) -> BTreeSet<RoomId> {
        self.entries.get(&uid).cloned().unwrap_or_default()
    }

    /// Every uid that resolves to `room_id`, ascending.
    pub fn uids_for(&self, room_id: RoomId) -> Vec<Uid> {
        let mut uids: Vec<Uid> = self
            .entries
            .iter()
            .filter(|(_, rooms)| rooms.contains(&room_id))
            .map(|(&uid, _)| uid)
            .collect();
        uids.sort_unstable();
        uids
    }

    /// Number of distinct uids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = UidRegistry::new();
        assert!(registry.register(7150105, 228));
        assert!(!registry.register(7150105, 228));
        assert_eq!(registry.resolve(7150105), BTreeSet::from([228]));
    }

    #[test]
    fn test_one_uid_many_rooms() {
        let mut registry = UidRegistry::new();
        registry.register(42, 10);
        registry.register(42, 3);
        assert_eq!(registry.resolve(42), BTreeSet::from([3, 10]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_uid_is_empty() {
        let registry = UidRegistry::new();
        assert!(registry.resolve(99).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_from_rooms_and_reverse_lookup() {
        let rooms = vec![
            Room::new(1).with_uid(500).with_uid(501),
            Room::new(2).with_uid(501),
        ];
        let registry = UidRegistry::from_rooms(&rooms);
        assert_eq!(registry.resolve(501), BTreeSet::from([1, 2]));
        assert_eq!(registry.uids_for(1), vec![500, 501]);
        assert_eq!(registry.uids_for(2), vec![501]);
        assert!(registry.uids_for(3).is_empty());
    }
}
