//! Outbound queues of live connections.

use std::collections::HashMap;

use parley_common::ConnectionId;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::contribution::compute_contributions;
use crate::protocol::ServerEvent;
use crate::room::Room;

/// Maps each live connection to the sender half of its outbound queue.
#[derive(Default)]
pub struct ConnectionDirectory {
    outbound: HashMap<ConnectionId, mpsc::Sender<ServerEvent>>,
}

impl ConnectionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection_id: ConnectionId, tx: mpsc::Sender<ServerEvent>) {
        if self.outbound.insert(connection_id.clone(), tx).is_some() {
            warn!(connection = %connection_id, "Connection re-registered, replacing queue");
        }
    }

    pub fn unregister(&mut self, connection_id: &ConnectionId) -> bool {
        self.outbound.remove(connection_id).is_some()
    }

    /// Whether events can currently be queued for this connection.
    pub fn is_reachable(&self, connection_id: &ConnectionId) -> bool {
        self.outbound
            .get(connection_id)
            .is_some_and(|tx| !tx.is_closed())
    }

    pub fn len(&self) -> usize {
        self.outbound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty()
    }

    /// Queue an event for one connection without waiting. Returns `false`
    /// if the event was dropped.
    pub fn send(&self, connection_id: &ConnectionId, event: ServerEvent) -> bool {
        let Some(tx) = self.outbound.get(connection_id) else {
            return false;
        };
        match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(connection = %connection_id, "Outbound queue full, dropping event");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(connection = %connection_id, "Outbound queue closed");
                false
            }
        }
    }

    /// Send to every participant of `room`.
    pub fn broadcast(&self, room: &Room, event: &ServerEvent) {
        for connection_id in room.connection_ids() {
            self.send(&connection_id, event.clone());
        }
    }

    /// Send to every participant of `room` except `skip`.
    pub fn broadcast_except(&self, room: &Room, skip: &ConnectionId, event: &ServerEvent) {
        for connection_id in room.connection_ids() {
            if &connection_id != skip {
                self.send(&connection_id, event.clone());
            }
        }
    }

    pub fn broadcast_roster(&self, room: &Room) {
        let participants = room.roster().into_iter().map(|p| p.snapshot()).collect();
        self.broadcast(room, &ServerEvent::RoomData { participants });
    }

    pub fn broadcast_contributions(&self, room: &Room) {
        let contributions = compute_contributions(room);
        self.broadcast(room, &ServerEvent::ContributionUpdate { contributions });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_to_unknown_connection_is_dropped() {
        let directory = ConnectionDirectory::new();
        assert!(!directory.send(&"ghost".into(), ServerEvent::DiscussionEnded));
        assert!(!directory.is_reachable(&"ghost".into()));
    }

    #[test]
    fn closed_queue_is_unreachable() {
        let mut directory = ConnectionDirectory::new();
        let (tx, rx) = mpsc::channel(4);
        directory.register("a".into(), tx);
        assert!(directory.is_reachable(&"a".into()));

        drop(rx);
        assert!(!directory.is_reachable(&"a".into()));
        assert!(!directory.send(&"a".into(), ServerEvent::DiscussionEnded));
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        let mut directory = ConnectionDirectory::new();
        let (tx, mut rx) = mpsc::channel(1);
        directory.register("a".into(), tx);

        assert!(directory.send(&"a".into(), ServerEvent::DiscussionEnded));
        assert!(!directory.send(&"a".into(), ServerEvent::error("second")));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::DiscussionEnded);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn broadcast_except_skips_sender() {
        let mut directory = ConnectionDirectory::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        directory.register("a".into(), tx_a);
        directory.register("b".into(), tx_b);

        let mut room = Room::new("R1".into());
        room.add_participant("a".into(), "Alice".into());
        room.add_participant("b".into(), "Bob".into());

        directory.broadcast_except(&room, &"a".into(), &ServerEvent::DiscussionEnded);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), ServerEvent::DiscussionEnded);
    }

    #[test]
    fn unregister_reports_presence() {
        let mut directory = ConnectionDirectory::new();
        let (tx, _rx) = mpsc::channel(4);
        directory.register("a".into(), tx);
        assert_eq!(directory.len(), 1);
        assert!(directory.unregister(&"a".into()));
        assert!(!directory.unregister(&"a".into()));
        assert!(directory.is_empty());
    }
}
