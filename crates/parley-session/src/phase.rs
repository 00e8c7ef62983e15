//! Idle → Prep → Discussion cycle.
//!
//! `start_prep` picks a topic and arms a one-shot timer that posts
//! `PrepElapsed` back into the coordinator queue. The timer is cancelled
//! by `end_discussion` and by room teardown; a firing that arrives after
//! its cycle was superseded is ignored.

use std::time::Duration;

use parley_common::{ConnectionId, SessionError};
use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::coordinator::{Command, Coordinator};
use crate::protocol::ServerEvent;
use crate::room::{Phase, PhaseTimer, Room};

impl Coordinator {
    /// Begin a prep cycle. An unknown room id is treated as a fresh Idle
    /// room; if it still has no participants afterwards it is closed again
    /// before this event completes.
    pub(crate) fn start_prep(
        &mut self,
        connection_id: &ConnectionId,
        room_id: &str,
        starter: Option<&str>,
    ) -> Result<(), SessionError> {
        let result = self.begin_prep_cycle(connection_id, room_id, starter);
        if self.registry.get(room_id).is_some_and(Room::is_empty) {
            debug!(room_id, "Closing room with no participants");
            self.registry.remove(room_id);
        }
        result
    }

    fn begin_prep_cycle(
        &mut self,
        connection_id: &ConnectionId,
        room_id: &str,
        starter: Option<&str>,
    ) -> Result<(), SessionError> {
        let cycle = self.next_cycle();
        let room = self.registry.get_or_create(room_id);

        match room.phase() {
            Phase::Idle => {}
            Phase::Prep => {
                return Err(SessionError::PhaseConflict(
                    "Preparation already in progress".into(),
                ))
            }
            Phase::Discussion => {
                return Err(SessionError::PhaseConflict(
                    "Discussion already in progress".into(),
                ))
            }
        }

        let topic = self
            .discussion
            .topics
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| {
                SessionError::InvalidRequest("No discussion topics configured".into())
            })?;

        let starter = match starter.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name.to_string(),
            None => room
                .participant(connection_id)
                .map(|p| p.display_name.clone())
                .unwrap_or_else(|| self.discussion.default_display_name.clone()),
        };

        let duration = self.discussion.prep_duration();
        room.begin_prep(topic.clone());
        let task = spawn_prep_timer(self.commands.clone(), room_id.to_string(), cycle, duration);
        room.arm_timer(PhaseTimer::new(cycle, task));

        self.connections.broadcast(
            room,
            &ServerEvent::PrepStart {
                topic: topic.clone(),
                prep_duration: duration.as_secs(),
                starter: starter.clone(),
            },
        );

        info!(room_id, cycle, %topic, %starter, "Preparation started");
        Ok(())
    }

    /// Timer callback. Only the cycle that is still pending may move the
    /// room into Discussion.
    pub(crate) fn prep_elapsed(&mut self, room_id: &str, cycle: u64) {
        let Some(room) = self.registry.get_mut(room_id) else {
            debug!(room_id, cycle, "Phase timer fired for a closed room");
            return;
        };
        if !room.begin_discussion(cycle) {
            debug!(room_id, cycle, "Stale phase timer ignored");
            return;
        }

        let topic = room.current_topic().unwrap_or_default().to_string();
        self.connections
            .broadcast(room, &ServerEvent::DiscussionStart { topic });
        info!(room_id, cycle, "Discussion started");
    }

    /// End the current cycle from Prep or Discussion. No-op while Idle or
    /// for an unknown room.
    pub(crate) fn end_discussion(&mut self, room_id: &str, now: Instant) {
        let Some(room) = self.registry.get_mut(room_id) else {
            return;
        };
        if room.phase() == Phase::Idle {
            return;
        }

        let finalized = room.finalize_all_speaking(now);
        room.reset_to_idle();

        let connections = &self.connections;
        connections.broadcast(room, &ServerEvent::DiscussionEnded);
        connections.broadcast_roster(room);
        connections.broadcast_contributions(room);

        info!(room_id, finalized, "Discussion ended");
    }
}

fn spawn_prep_timer(
    commands: mpsc::WeakSender<Command>,
    room_id: String,
    cycle: u64,
    after: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        if let Some(tx) = commands.upgrade() {
            let _ = tx.send(Command::PrepElapsed { room_id, cycle }).await;
        }
    })
}
