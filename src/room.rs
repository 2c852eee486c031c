//! Room directory and membership
//!
//! Known room names and the display names present in each room.
//! A room's name outlives its occupancy: once known, it stays listed
//! even after the last member leaves.

use std::collections::{BTreeSet, HashMap};

/// Result of removing a member from a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The name wasn't a member
    NotMember,
    /// Removed, others remain
    Left,
    /// Removed and the room is now unoccupied
    Emptied,
}

#[derive(Debug, Default)]
pub struct RoomDirectory {
    /// Every room ever referenced
    known: BTreeSet<String>,
    /// room -> members; entries exist only while occupied
    members: HashMap<String, BTreeSet<String>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-seeded with `rooms`
    pub fn with_rooms<I, S>(rooms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut directory = Self::new();
        for room in rooms {
            directory.ensure_room(room);
        }
        directory
    }

    /// Add `room` to the known set if absent
    pub fn ensure_room(&mut self, room: impl Into<String>) {
        self.known.insert(room.into());
    }

    /// Add `name` to `room`; returns false if it was already a member
    pub fn join(&mut self, room: &str, name: &str) -> bool {
        self.ensure_room(room);
        self.members
            .entry(room.to_string())
            .or_default()
            .insert(name.to_string())
    }

    /// Remove `name` from `room`
    ///
    /// When the last member leaves, the occupancy entry is dropped but the
    /// room stays known. Clearing history is the caller's job.
    pub fn leave(&mut self, room: &str, name: &str) -> LeaveOutcome {
        let Some(members) = self.members.get_mut(room) else {
            return LeaveOutcome::NotMember;
        };

        if !members.remove(name) {
            return LeaveOutcome::NotMember;
        }

        if members.is_empty() {
            self.members.remove(room);
            LeaveOutcome::Emptied
        } else {
            LeaveOutcome::Left
        }
    }

    /// Members of `room`, sorted
    pub fn list_members(&self, room: &str) -> Vec<String> {
        self.members
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Known rooms, sorted
    pub fn list_known_rooms(&self) -> Vec<String> {
        self.known.iter().cloned().collect()
    }
}
