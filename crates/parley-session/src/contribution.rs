//! Speaking-time share per participant.

use parley_common::ConnectionId;
use serde::{Deserialize, Serialize};

use crate::participant::duration_ms;
use crate::room::Room;

/// One participant's share of the room's total speaking time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub name: String,
    pub connection_id: ConnectionId,
    pub speaking_time_ms: u64,
    pub percent: u32,
}

/// Compute contributions in join order.
///
/// The total is floored to 1 ms, so a room where nobody has spoken yet
/// reports 0% for everyone.
pub fn compute_contributions(room: &Room) -> Vec<Contribution> {
    let roster = room.roster();
    let total: u64 = roster
        .iter()
        .map(|p| duration_ms(p.accumulated_speaking()))
        .sum::<u64>()
        .max(1);

    roster
        .into_iter()
        .map(|p| {
            let spoken = duration_ms(p.accumulated_speaking());
            Contribution {
                name: p.display_name.clone(),
                connection_id: p.connection_id.clone(),
                speaking_time_ms: spoken,
                percent: ((spoken as f64 / total as f64) * 100.0).round() as u32,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;

    fn room_with_times(times_ms: &[u64]) -> Room {
        let mut room = Room::new("R1".into());
        let t0 = Instant::now();
        for (i, ms) in times_ms.iter().enumerate() {
            let conn = ConnectionId::from(format!("c{i}"));
            room.add_participant(conn.clone(), format!("P{i}"));
            let p = room.participant_mut(&conn).unwrap();
            p.start_speaking(t0);
            p.finalize_speaking(t0 + Duration::from_millis(*ms));
        }
        room
    }

    #[test]
    fn empty_room_has_no_entries() {
        let room = Room::new("R1".into());
        assert!(compute_contributions(&room).is_empty());
    }

    #[test]
    fn all_zero_reports_zero_percent() {
        let room = room_with_times(&[0, 0, 0]);
        let contributions = compute_contributions(&room);
        assert_eq!(contributions.len(), 3);
        assert!(contributions.iter().all(|c| c.percent == 0));
        assert!(contributions.iter().all(|c| c.speaking_time_ms == 0));
    }

    #[test]
    fn shares_are_proportional() {
        let room = room_with_times(&[1000, 3000]);
        let contributions = compute_contributions(&room);
        assert_eq!(contributions[0].name, "P0");
        assert_eq!(contributions[0].percent, 25);
        assert_eq!(contributions[1].percent, 75);
        assert_eq!(contributions[1].speaking_time_ms, 3000);
    }

    #[test]
    fn percentages_sum_to_about_100() {
        for times in [
            vec![1000, 2000, 3000],
            vec![1, 1, 1],
            vec![333, 333, 334],
            vec![5, 0, 17, 9, 2],
        ] {
            let room = room_with_times(&times);
            let sum: u32 = compute_contributions(&room).iter().map(|c| c.percent).sum();
            let tolerance = times.len() as u32;
            assert!(
                sum.abs_diff(100) <= tolerance,
                "times {times:?} summed to {sum}"
            );
        }
    }

    #[test]
    fn half_rounds_up() {
        // 1 of 8 ms = 12.5%
        let room = room_with_times(&[1, 7]);
        let contributions = compute_contributions(&room);
        assert_eq!(contributions[0].percent, 13);
        assert_eq!(contributions[1].percent, 88);
    }

    #[test]
    fn serializes_camel_case() {
        let room = room_with_times(&[10]);
        let json = serde_json::to_value(compute_contributions(&room)).unwrap();
        assert_eq!(json[0]["connectionId"], "c0");
        assert_eq!(json[0]["speakingTimeMs"], 10);
        assert_eq!(json[0]["percent"], 100);
    }
}
