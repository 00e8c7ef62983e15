//! Join, leave, disconnect and media toggles.

use parley_common::{ConnectionId, SessionError};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::coordinator::Coordinator;
use crate::participant::{duration_ms, Participant};
use crate::protocol::ServerEvent;

impl Coordinator {
    pub(crate) fn join(
        &mut self,
        connection_id: &ConnectionId,
        room_id: &str,
        name: &str,
    ) -> Result<(), SessionError> {
        let name = name.trim();
        if room_id.trim().is_empty() || name.is_empty() {
            return Err(SessionError::InvalidRequest(
                "Room ID and name are required".into(),
            ));
        }

        let room = self.registry.get_or_create(room_id);
        let user = room
            .add_participant(connection_id.clone(), name.to_string())
            .snapshot();

        let connections = &self.connections;
        connections.broadcast_roster(room);
        connections.broadcast_contributions(room);
        connections.broadcast_except(
            room,
            connection_id,
            &ServerEvent::NewUserJoined {
                user_id: user.user_id.clone(),
                user_name: user.name.clone(),
                connection_id: connection_id.clone(),
            },
        );
        connections.send(
            connection_id,
            ServerEvent::RoomJoined {
                room_id: room_id.to_string(),
                user,
            },
        );

        info!(
            room_id,
            connection = %connection_id,
            name,
            participants = room.participant_count(),
            "Participant joined"
        );
        Ok(())
    }

    pub(crate) fn leave(
        &mut self,
        connection_id: &ConnectionId,
        room_id: &str,
        now: Instant,
    ) -> Option<Participant> {
        self.remove_from_room(room_id, connection_id, now)
    }

    /// Remove a closed connection from every room it was in. Returns the
    /// departed participants with their final speaking totals.
    pub(crate) fn disconnect(
        &mut self,
        connection_id: &ConnectionId,
        now: Instant,
    ) -> Vec<Participant> {
        self.connections.unregister(connection_id);
        let departed: Vec<Participant> = self
            .registry
            .rooms_with(connection_id)
            .iter()
            .filter_map(|room_id| self.remove_from_room(room_id, connection_id, now))
            .collect();
        debug!(connection = %connection_id, rooms = departed.len(), "Connection closed");
        departed
    }

    /// Shared exit path for leave and disconnect. An open speaking
    /// interval is finalized before removal; an emptied room is destroyed.
    fn remove_from_room(
        &mut self,
        room_id: &str,
        connection_id: &ConnectionId,
        now: Instant,
    ) -> Option<Participant> {
        let room = self.registry.get_mut(room_id)?;
        let departed = room.remove_participant(connection_id, now)?;

        info!(
            room_id,
            connection = %connection_id,
            name = %departed.display_name,
            spoke_ms = duration_ms(departed.accumulated_speaking()),
            "Participant left"
        );

        if room.is_empty() {
            self.registry.remove(room_id);
            return Some(departed);
        }

        let connections = &self.connections;
        connections.broadcast(
            room,
            &ServerEvent::UserLeft {
                connection_id: connection_id.clone(),
            },
        );
        connections.broadcast_roster(room);
        connections.broadcast_contributions(room);
        Some(departed)
    }

    pub(crate) fn toggle_media(
        &mut self,
        connection_id: &ConnectionId,
        room_id: &str,
        mic: Option<bool>,
        video: Option<bool>,
    ) {
        let Some(room) = self.registry.get_mut(room_id) else {
            return;
        };
        let Some(participant) = room.participant_mut(connection_id) else {
            return;
        };
        if let Some(mic) = mic {
            participant.mic_enabled = mic;
        }
        if let Some(video) = video {
            participant.video_enabled = video;
        }
        debug!(room_id, connection = %connection_id, ?mic, ?video, "Media toggled");
        self.connections.broadcast_roster(room);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::protocol::ClientEvent;
    use crate::test_support::{drain, drain_kinds, Harness};

    #[test]
    fn join_broadcasts_roster_and_acknowledges() {
        let mut h = Harness::new();
        let (a, mut rx_a) = h.connect();
        h.join(&a, "R1", "  Alice  ");

        let events = drain(&mut rx_a);
        assert_eq!(events.len(), 3);
        match &events[0] {
            ServerEvent::RoomData { participants } => {
                assert_eq!(participants.len(), 1);
                assert_eq!(participants[0].name, "Alice");
                assert_eq!(participants[0].connection_id, a);
                assert!(!participants[0].speaking);
                assert_eq!(participants[0].speaking_time_ms, 0);
                assert!(participants[0].mic && participants[0].video);
            }
            other => panic!("expected roster, got {other:?}"),
        }
        match &events[1] {
            ServerEvent::ContributionUpdate { contributions } => {
                assert_eq!(contributions.len(), 1);
                assert_eq!(contributions[0].percent, 0);
            }
            other => panic!("expected contributions, got {other:?}"),
        }
        match &events[2] {
            ServerEvent::RoomJoined { room_id, user } => {
                assert_eq!(room_id, "R1");
                assert_eq!(user.name, "Alice");
            }
            other => panic!("expected ack, got {other:?}"),
        }
    }

    #[test]
    fn others_are_told_about_the_newcomer() {
        let mut h = Harness::new();
        let (a, mut rx_a) = h.connect();
        let (b, mut rx_b) = h.connect();
        h.join(&a, "R1", "Alice");
        drain(&mut rx_a);

        h.join(&b, "R1", "Bob");

        let events = drain(&mut rx_a);
        assert_eq!(
            events.iter().map(crate::test_support::kind).collect::<Vec<_>>(),
            vec!["room-data", "contribution-update", "new-user-joined"]
        );
        match &events[2] {
            ServerEvent::NewUserJoined {
                user_name,
                connection_id,
                user_id,
            } => {
                assert_eq!(user_name, "Bob");
                assert_eq!(connection_id, &b);
                assert!(!user_id.is_empty());
            }
            other => panic!("expected notice, got {other:?}"),
        }

        assert_eq!(
            drain_kinds(&mut rx_b),
            vec!["room-data", "contribution-update", "room-joined"]
        );
    }

    #[test]
    fn joiner_appears_exactly_once() {
        let mut h = Harness::new();
        let (a, mut rx_a) = h.connect();
        h.join(&a, "R1", "Alice");
        h.join(&a, "R1", "Alice");

        let rosters: Vec<_> = drain(&mut rx_a)
            .into_iter()
            .filter_map(|e| match e {
                ServerEvent::RoomData { participants } => Some(participants),
                _ => None,
            })
            .collect();
        let last = rosters.last().unwrap();
        assert_eq!(last.iter().filter(|p| p.connection_id == a).count(), 1);
    }

    #[test]
    fn join_requires_room_and_name() {
        let mut h = Harness::new();
        let (a, mut rx_a) = h.connect();

        h.join(&a, "", "Alice");
        h.join(&a, "R1", "");
        h.join(&a, "  ", "Alice");

        let events = drain(&mut rx_a);
        assert_eq!(events.len(), 3);
        assert!(events
            .iter()
            .all(|e| *e == ServerEvent::error("Room ID and name are required")));
        assert_eq!(h.coordinator.registry().room_count(), 0);
    }

    #[test]
    fn leave_notifies_remaining_participants() {
        let mut h = Harness::new();
        let (a, mut rx_a) = h.connect();
        let (b, mut rx_b) = h.connect();
        h.join(&a, "R1", "Alice");
        h.join(&b, "R1", "Bob");
        drain(&mut rx_a);
        drain(&mut rx_b);

        h.send(
            &a,
            ClientEvent::Leave {
                room_id: "R1".into(),
            },
        );

        let events = drain(&mut rx_b);
        assert_eq!(
            events[0],
            ServerEvent::UserLeft {
                connection_id: a.clone()
            }
        );
        match &events[1] {
            ServerEvent::RoomData { participants } => {
                assert_eq!(participants.len(), 1);
                assert_eq!(participants[0].name, "Bob");
            }
            other => panic!("expected roster, got {other:?}"),
        }
        assert!(matches!(events[2], ServerEvent::ContributionUpdate { .. }));
        assert!(drain(&mut rx_a).is_empty());
    }

    #[test]
    fn leave_of_absent_room_or_participant_is_noop() {
        let mut h = Harness::new();
        let (a, mut rx_a) = h.connect();
        let (b, _rx_b) = h.connect();
        h.join(&a, "R1", "Alice");
        drain(&mut rx_a);

        h.send(
            &b,
            ClientEvent::Leave {
                room_id: "R1".into(),
            },
        );
        h.send(
            &a,
            ClientEvent::Leave {
                room_id: "nowhere".into(),
            },
        );

        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(h.coordinator.registry().get("R1").unwrap().participant_count(), 1);
    }

    #[test]
    fn last_leave_destroys_room() {
        let mut h = Harness::new();
        let (a, _rx_a) = h.connect();
        h.join(&a, "R1", "Alice");
        h.send(
            &a,
            ClientEvent::Leave {
                room_id: "R1".into(),
            },
        );
        assert!(!h.coordinator.registry().contains("R1"));
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_while_speaking_finalizes_and_destroys_room() {
        let mut h = Harness::new();
        let (a, _rx_a) = h.connect();
        h.join(&a, "R1", "Alice");
        h.send(
            &a,
            ClientEvent::StartSpeaking {
                room_id: "R1".into(),
            },
        );

        tokio::time::advance(Duration::from_millis(5000)).await;
        let departed = h.coordinator.disconnect(&a, Instant::now());

        assert_eq!(departed.len(), 1);
        assert_eq!(
            departed[0].accumulated_speaking(),
            Duration::from_millis(5000)
        );
        assert!(!departed[0].is_speaking());
        assert!(!h.coordinator.registry().contains("R1"));
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_broadcasts_finalized_contribution() {
        let mut h = Harness::new();
        let (a, _rx_a) = h.connect();
        let (b, mut rx_b) = h.connect();
        h.join(&a, "R1", "Alice");
        h.join(&b, "R1", "Bob");
        h.send(
            &a,
            ClientEvent::StartSpeaking {
                room_id: "R1".into(),
            },
        );
        tokio::time::advance(Duration::from_millis(1200)).await;
        drain(&mut rx_b);

        h.disconnect(&a);

        let events = drain(&mut rx_b);
        assert_eq!(
            events
                .iter()
                .map(crate::test_support::kind)
                .collect::<Vec<_>>(),
            vec!["user-left", "room-data", "contribution-update"]
        );
        match &events[2] {
            ServerEvent::ContributionUpdate { contributions } => {
                assert_eq!(contributions.len(), 1);
                assert_eq!(contributions[0].name, "Bob");
            }
            other => panic!("expected contributions, got {other:?}"),
        }
        assert_eq!(h.coordinator.stats().connections, 1);
    }

    #[test]
    fn disconnect_leaves_every_room() {
        let mut h = Harness::new();
        let (a, _rx_a) = h.connect();
        let (b, mut rx_b) = h.connect();
        h.join(&a, "R1", "Alice");
        h.join(&a, "R2", "Alice");
        h.join(&b, "R2", "Bob");
        drain(&mut rx_b);

        h.disconnect(&a);

        assert!(!h.coordinator.registry().contains("R1"));
        assert_eq!(h.coordinator.registry().get("R2").unwrap().participant_count(), 1);
        assert_eq!(
            drain_kinds(&mut rx_b),
            vec!["user-left", "room-data", "contribution-update"]
        );
    }

    #[test]
    fn toggle_media_updates_flags() {
        let mut h = Harness::new();
        let (a, mut rx_a) = h.connect();
        h.join(&a, "R1", "Alice");
        drain(&mut rx_a);

        h.send(
            &a,
            ClientEvent::ToggleMedia {
                room_id: "R1".into(),
                mic: Some(false),
                video: None,
            },
        );

        match drain(&mut rx_a).as_slice() {
            [ServerEvent::RoomData { participants }] => {
                assert!(!participants[0].mic);
                assert!(participants[0].video);
            }
            other => panic!("expected one roster, got {other:?}"),
        }
    }

    #[test]
    fn toggle_media_for_absent_participant_is_noop() {
        let mut h = Harness::new();
        let (a, mut rx_a) = h.connect();
        let (b, _rx_b) = h.connect();
        h.join(&a, "R1", "Alice");
        drain(&mut rx_a);

        h.send(
            &b,
            ClientEvent::ToggleMedia {
                room_id: "R1".into(),
                mic: Some(false),
                video: Some(false),
            },
        );
        assert!(drain(&mut rx_a).is_empty());
    }
}
