//! Speaking-time accrual.

use parley_common::ConnectionId;
use tokio::time::Instant;
use tracing::debug;

use crate::coordinator::Coordinator;
use crate::participant::duration_ms;

impl Coordinator {
    pub(crate) fn start_speaking(
        &mut self,
        connection_id: &ConnectionId,
        room_id: &str,
        now: Instant,
    ) {
        let Some(room) = self.registry.get_mut(room_id) else {
            return;
        };
        let started = room
            .participant_mut(connection_id)
            .is_some_and(|p| p.start_speaking(now));
        if !started {
            return;
        }
        debug!(room_id, connection = %connection_id, "Started speaking");
        self.connections.broadcast_roster(room);
    }

    pub(crate) fn stop_speaking(
        &mut self,
        connection_id: &ConnectionId,
        room_id: &str,
        now: Instant,
    ) {
        let Some(room) = self.registry.get_mut(room_id) else {
            return;
        };
        let Some(delta) = room
            .participant_mut(connection_id)
            .and_then(|p| p.finalize_speaking(now))
        else {
            return;
        };
        debug!(
            room_id,
            connection = %connection_id,
            delta_ms = duration_ms(delta),
            "Stopped speaking"
        );
        self.connections.broadcast_roster(room);
        self.connections.broadcast_contributions(room);
    }
}
