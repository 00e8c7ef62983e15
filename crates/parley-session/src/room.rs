//! Room state: participants, discussion phase and the pending phase timer.

use std::collections::HashMap;

use parley_common::ConnectionId;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::participant::Participant;

/// Discussion lifecycle of a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Prep,
    Discussion,
}

/// Handle to the deferred Prep → Discussion transition.
///
/// Cancelling aborts the sleeping task. Aborting a task that already
/// finished or was already aborted does nothing, so cancellation can be
/// repeated freely. Dropping the handle cancels it too.
#[derive(Debug)]
pub struct PhaseTimer {
    cycle: u64,
    task: JoinHandle<()>,
}

impl PhaseTimer {
    pub fn new(cycle: u64, task: JoinHandle<()>) -> Self {
        Self { cycle, task }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// An isolated discussion session.
#[derive(Debug)]
pub struct Room {
    room_id: String,
    participants: HashMap<ConnectionId, Participant>,
    phase: Phase,
    /// Only `Some` while `phase == Prep`.
    pending_timer: Option<PhaseTimer>,
    current_topic: Option<String>,
    next_join_seq: u64,
}

impl Room {
    pub fn new(room_id: String) -> Self {
        Self {
            room_id,
            participants: HashMap::new(),
            phase: Phase::Idle,
            pending_timer: None,
            current_topic: None,
            next_join_seq: 0,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_topic(&self) -> Option<&str> {
        self.current_topic.as_deref()
    }

    pub fn has_pending_timer(&self) -> bool {
        self.pending_timer.is_some()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.participants.contains_key(connection_id)
    }

    pub fn participant(&self, connection_id: &ConnectionId) -> Option<&Participant> {
        self.participants.get(connection_id)
    }

    pub fn participant_mut(&mut self, connection_id: &ConnectionId) -> Option<&mut Participant> {
        self.participants.get_mut(connection_id)
    }

    /// Add a participant, or rename an existing one in place. Speaking
    /// state of an existing participant is kept.
    pub fn add_participant(
        &mut self,
        connection_id: ConnectionId,
        display_name: String,
    ) -> &Participant {
        let seq = self.next_join_seq;
        let participant = self
            .participants
            .entry(connection_id.clone())
            .and_modify(|p| p.display_name.clone_from(&display_name))
            .or_insert_with(|| Participant::new(connection_id, display_name, seq));
        if participant.join_seq() == seq {
            self.next_join_seq += 1;
        }
        participant
    }

    /// Remove a participant, closing any open speaking interval first.
    pub fn remove_participant(
        &mut self,
        connection_id: &ConnectionId,
        now: Instant,
    ) -> Option<Participant> {
        let mut participant = self.participants.remove(connection_id)?;
        participant.finalize_speaking(now);
        Some(participant)
    }

    /// Participants in join order.
    pub fn roster(&self) -> Vec<&Participant> {
        let mut roster: Vec<&Participant> = self.participants.values().collect();
        roster.sort_by_key(|p| p.join_seq());
        roster
    }

    /// Connection ids in join order.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.roster()
            .into_iter()
            .map(|p| p.connection_id.clone())
            .collect()
    }

    /// Close every open speaking interval. Returns how many were open.
    pub fn finalize_all_speaking(&mut self, now: Instant) -> usize {
        self.participants
            .values_mut()
            .filter_map(|p| p.finalize_speaking(now))
            .count()
    }

    /// Idle → Prep. The caller arms the timer right after.
    pub(crate) fn begin_prep(&mut self, topic: String) {
        self.phase = Phase::Prep;
        self.current_topic = Some(topic);
    }

    pub(crate) fn arm_timer(&mut self, timer: PhaseTimer) {
        if let Some(old) = self.pending_timer.replace(timer) {
            old.cancel();
        }
    }

    /// Cancel the pending timer if there is one.
    pub fn cancel_timer(&mut self) -> bool {
        match self.pending_timer.take() {
            Some(timer) => {
                timer.cancel();
                true
            }
            None => false,
        }
    }

    /// Prep → Discussion, but only for the timer that is still pending.
    /// A firing from a cancelled or superseded cycle returns `false`.
    pub(crate) fn begin_discussion(&mut self, cycle: u64) -> bool {
        let current = self.pending_timer.as_ref().map(PhaseTimer::cycle);
        if self.phase != Phase::Prep || current != Some(cycle) {
            return false;
        }
        self.pending_timer = None;
        self.phase = Phase::Discussion;
        true
    }

    pub(crate) fn reset_to_idle(&mut self) {
        self.cancel_timer();
        self.phase = Phase::Idle;
        self.current_topic = None;
    }
}
