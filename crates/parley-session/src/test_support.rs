//! Shared fixtures for coordinator tests.

use parley_common::ConnectionId;
use parley_config::DiscussionConfig;
use tokio::sync::mpsc;

use crate::coordinator::{Command, Coordinator};
use crate::protocol::{ClientEvent, ServerEvent};

/// A coordinator driven by hand, with its command queue exposed so tests
/// can observe and deliver timer firings.
pub(crate) struct Harness {
    pub coordinator: Coordinator,
    pub commands: mpsc::Receiver<Command>,
    _commands_tx: mpsc::Sender<Command>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(DiscussionConfig::default())
    }

    pub fn with_config(config: DiscussionConfig) -> Self {
        let (tx, rx) = mpsc::channel(64);
        Self {
            coordinator: Coordinator::new(config, tx.downgrade()),
            commands: rx,
            _commands_tx: tx,
        }
    }

    pub fn connect(&mut self) -> (ConnectionId, mpsc::Receiver<ServerEvent>) {
        let connection_id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(64);
        self.coordinator.dispatch(Command::Connect {
            connection_id: connection_id.clone(),
            outbound: tx,
        });
        (connection_id, rx)
    }

    pub fn send(&mut self, connection_id: &ConnectionId, event: ClientEvent) {
        self.coordinator.dispatch(Command::Client {
            connection_id: connection_id.clone(),
            event,
        });
    }

    pub fn join(&mut self, connection_id: &ConnectionId, room_id: &str, name: &str) {
        self.send(
            connection_id,
            ClientEvent::Join {
                room_id: room_id.into(),
                name: name.into(),
            },
        );
    }

    pub fn disconnect(&mut self, connection_id: &ConnectionId) {
        self.coordinator.dispatch(Command::Disconnect {
            connection_id: connection_id.clone(),
        });
    }

    /// Wait for the next timer firing and deliver it.
    pub async fn deliver_next_command(&mut self) {
        if let Some(command) = self.commands.recv().await {
            self.coordinator.dispatch(command);
        }
    }
}

/// Everything queued for a connection so far.
pub(crate) fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Tags of queued events, for order assertions.
pub(crate) fn drain_kinds(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<&'static str> {
    drain(rx).iter().map(kind).collect()
}

pub(crate) fn kind(event: &ServerEvent) -> &'static str {
    match event {
        ServerEvent::RoomData { .. } => "room-data",
        ServerEvent::ContributionUpdate { .. } => "contribution-update",
        ServerEvent::NewUserJoined { .. } => "new-user-joined",
        ServerEvent::RoomJoined { .. } => "room-joined",
        ServerEvent::UserLeft { .. } => "user-left",
        ServerEvent::Offer { .. } => "offer",
        ServerEvent::Answer { .. } => "answer",
        ServerEvent::IceCandidate { .. } => "ice-candidate",
        ServerEvent::PrepStart { .. } => "prep-start",
        ServerEvent::DiscussionStart { .. } => "discussion-start",
        ServerEvent::DiscussionEnded => "discussion-ended",
        ServerEvent::Error { .. } => "error",
    }
}
