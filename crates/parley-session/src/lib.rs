//! In-memory coordination for live group discussion rooms.
//!
//! Tracks who is present in each room, relays WebRTC negotiation messages
//! between participants, accumulates per-participant speaking time and
//! drives the Idle → Prep → Discussion cycle. Media never passes through
//! here; this crate only handles the coordination layer.
//!
//! All state is owned by a single [`Coordinator`] task. Connections talk
//! to it through a [`CoordinatorHandle`] and receive [`ServerEvent`]s on
//! their own outbound queue.

mod connections;
mod contribution;
mod coordinator;
mod participant;
mod phase;
mod presence;
mod protocol;
mod registry;
mod room;
mod signaling;
mod speaking;

#[cfg(test)]
mod test_support;

pub use connections::ConnectionDirectory;
pub use contribution::{compute_contributions, Contribution};
pub use coordinator::{Command, Coordinator, CoordinatorHandle, RegistryStats};
pub use participant::{Participant, SpeakingState};
pub use protocol::{ClientEvent, ParticipantSnapshot, ServerEvent, SignalKind};
pub use registry::SessionRegistry;
pub use room::{Phase, PhaseTimer, Room};
