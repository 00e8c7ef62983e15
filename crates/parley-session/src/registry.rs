//! Owner of every live room.

use std::collections::HashMap;

use parley_common::ConnectionId;
use tracing::info;

use crate::room::Room;

/// Maps room ids to rooms. Rooms are created on first join and removed as
/// soon as their last participant goes.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    rooms: HashMap<String, Room>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a room, creating it in the Idle phase if absent.
    pub fn get_or_create(&mut self, room_id: &str) -> &mut Room {
        self.rooms.entry(room_id.to_string()).or_insert_with(|| {
            info!(room_id, "Room created");
            Room::new(room_id.to_string())
        })
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn get_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Delete a room, cancelling its pending phase timer.
    pub fn remove(&mut self, room_id: &str) -> Option<Room> {
        let mut room = self.rooms.remove(room_id)?;
        room.cancel_timer();
        info!(room_id, "Room closed");
        Some(room)
    }

    /// Ids of every room the connection participates in.
    pub fn rooms_with(&self, connection_id: &ConnectionId) -> Vec<String> {
        self.rooms
            .values()
            .filter(|room| room.contains(connection_id))
            .map(|room| room.room_id().to_string())
            .collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn participant_count(&self) -> usize {
        self.rooms.values().map(Room::participant_count).sum()
    }

    /// Drop every room and cancel every pending timer. Returns how many
    /// rooms were cleared.
    pub fn shutdown(&mut self) -> usize {
        let count = self.rooms.len();
        for (_, mut room) in self.rooms.drain() {
            room.cancel_timer();
        }
        if count > 0 {
            info!(rooms = count, "Registry cleared");
        }
        count
    }
}
