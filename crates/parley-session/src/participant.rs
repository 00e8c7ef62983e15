//! Per-participant presence and speaking-time state.

use std::time::Duration;

use parley_common::{new_id, ConnectionId};
use tokio::time::Instant;

use crate::protocol::ParticipantSnapshot;

/// Whether a participant currently has an open speaking interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeakingState {
    #[default]
    NotSpeaking,
    Speaking {
        since: Instant,
    },
}

/// One connected person inside one room.
#[derive(Debug, Clone)]
pub struct Participant {
    pub connection_id: ConnectionId,
    /// Fresh per join; reported to clients alongside the connection id.
    pub user_id: String,
    pub display_name: String,
    pub mic_enabled: bool,
    pub video_enabled: bool,
    speaking: SpeakingState,
    accumulated: Duration,
    join_seq: u64,
}

impl Participant {
    pub fn new(connection_id: ConnectionId, display_name: String, join_seq: u64) -> Self {
        Self {
            connection_id,
            user_id: new_id(),
            display_name,
            mic_enabled: true,
            video_enabled: true,
            speaking: SpeakingState::NotSpeaking,
            accumulated: Duration::ZERO,
            join_seq,
        }
    }

    pub fn speaking_state(&self) -> SpeakingState {
        self.speaking
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self.speaking, SpeakingState::Speaking { .. })
    }

    /// Total closed speaking time. An open interval is not included until
    /// it is finalized.
    pub fn accumulated_speaking(&self) -> Duration {
        self.accumulated
    }

    pub(crate) fn join_seq(&self) -> u64 {
        self.join_seq
    }

    /// Open a speaking interval at `now`. Returns `false` if one is
    /// already open.
    pub fn start_speaking(&mut self, now: Instant) -> bool {
        if self.is_speaking() {
            return false;
        }
        self.speaking = SpeakingState::Speaking { since: now };
        true
    }

    /// Close the open speaking interval, if any, and add it to the total.
    ///
    /// Every exit path (stop, leave, disconnect, end of discussion) goes
    /// through here so an interval is counted exactly once.
    pub fn finalize_speaking(&mut self, now: Instant) -> Option<Duration> {
        match std::mem::take(&mut self.speaking) {
            SpeakingState::Speaking { since } => {
                let delta = now.saturating_duration_since(since);
                self.accumulated += delta;
                Some(delta)
            }
            SpeakingState::NotSpeaking => None,
        }
    }

    pub fn snapshot(&self) -> ParticipantSnapshot {
        ParticipantSnapshot {
            connection_id: self.connection_id.clone(),
            user_id: self.user_id.clone(),
            name: self.display_name.clone(),
            mic: self.mic_enabled,
            video: self.video_enabled,
            speaking: self.is_speaking(),
            speaking_time_ms: duration_ms(self.accumulated),
        }
    }
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Participant {
        Participant::new(ConnectionId::from("conn-a"), "Alice".into(), 0)
    }

    #[test]
    fn new_participant_defaults() {
        let p = alice();
        assert!(p.mic_enabled);
        assert!(p.video_enabled);
        assert!(!p.is_speaking());
        assert_eq!(p.accumulated_speaking(), Duration::ZERO);
        assert!(uuid::Uuid::parse_str(&p.user_id).is_ok());
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut p = alice();
        let t0 = Instant::now();
        assert!(p.start_speaking(t0));
        assert!(!p.start_speaking(t0 + Duration::from_secs(1)));
        assert_eq!(p.speaking_state(), SpeakingState::Speaking { since: t0 });
    }

    #[test]
    fn finalize_accumulates_interval() {
        let mut p = alice();
        let t0 = Instant::now();
        p.start_speaking(t0);
        let delta = p.finalize_speaking(t0 + Duration::from_millis(1500));
        assert_eq!(delta, Some(Duration::from_millis(1500)));
        assert_eq!(p.accumulated_speaking(), Duration::from_millis(1500));
        assert!(!p.is_speaking());
    }

    #[test]
    fn finalize_without_open_interval_is_noop() {
        let mut p = alice();
        assert_eq!(p.finalize_speaking(Instant::now()), None);
        assert_eq!(p.accumulated_speaking(), Duration::ZERO);
    }

    #[test]
    fn intervals_add_up() {
        let mut p = alice();
        let t0 = Instant::now();
        p.start_speaking(t0);
        p.finalize_speaking(t0 + Duration::from_millis(200));
        p.start_speaking(t0 + Duration::from_millis(1000));
        p.finalize_speaking(t0 + Duration::from_millis(1300));
        assert_eq!(p.accumulated_speaking(), Duration::from_millis(500));
    }

    #[test]
    fn clock_going_backwards_clamps_to_zero() {
        let mut p = alice();
        let t0 = Instant::now() + Duration::from_secs(10);
        p.start_speaking(t0);
        assert_eq!(
            p.finalize_speaking(t0 - Duration::from_secs(5)),
            Some(Duration::ZERO)
        );
        assert_eq!(p.accumulated_speaking(), Duration::ZERO);
    }

    #[test]
    fn snapshot_reports_closed_time_only() {
        let mut p = alice();
        let t0 = Instant::now();
        p.start_speaking(t0);
        p.finalize_speaking(t0 + Duration::from_millis(750));
        p.start_speaking(t0 + Duration::from_secs(2));

        let snap = p.snapshot();
        assert_eq!(snap.name, "Alice");
        assert!(snap.speaking);
        assert_eq!(snap.speaking_time_ms, 750);
    }
}
