//! The single task that owns all room state.
//!
//! Every inbound client event, connection change and timer firing becomes
//! a [`Command`] on one queue. The coordinator handles them one at a time,
//! to completion, in arrival order, so room state needs no locking.

use parley_common::{ConnectionId, ParleyError, SessionError};
use parley_config::{DiscussionConfig, DEFAULT_TOPICS};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::connections::ConnectionDirectory;
use crate::protocol::{ClientEvent, ServerEvent, SignalKind};
use crate::registry::SessionRegistry;

/// Work items processed by the coordinator.
#[derive(Debug)]
pub enum Command {
    /// A socket was accepted; `outbound` receives its events.
    Connect {
        connection_id: ConnectionId,
        outbound: mpsc::Sender<ServerEvent>,
    },
    Client {
        connection_id: ConnectionId,
        event: ClientEvent,
    },
    Disconnect {
        connection_id: ConnectionId,
    },
    /// Posted by a room's phase timer when the prep countdown ends.
    PrepElapsed {
        room_id: String,
        cycle: u64,
    },
    Stats {
        respond_to: oneshot::Sender<RegistryStats>,
    },
    Shutdown,
}

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub rooms: usize,
    pub participants: usize,
    pub connections: usize,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable sender side used by connection tasks.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    pub async fn connect(
        &self,
        connection_id: ConnectionId,
        outbound: mpsc::Sender<ServerEvent>,
    ) -> Result<(), ParleyError> {
        self.submit(Command::Connect {
            connection_id,
            outbound,
        })
        .await
    }

    pub async fn send(
        &self,
        connection_id: ConnectionId,
        event: ClientEvent,
    ) -> Result<(), ParleyError> {
        self.submit(Command::Client {
            connection_id,
            event,
        })
        .await
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) -> Result<(), ParleyError> {
        self.submit(Command::Disconnect { connection_id }).await
    }

    pub async fn stats(&self) -> Result<RegistryStats, ParleyError> {
        let (respond_to, rx) = oneshot::channel();
        self.submit(Command::Stats { respond_to }).await?;
        rx.await
            .map_err(|_| ParleyError::Other("coordinator stopped".into()))
    }

    pub async fn shutdown(&self) -> Result<(), ParleyError> {
        self.submit(Command::Shutdown).await
    }

    async fn submit(&self, command: Command) -> Result<(), ParleyError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| ParleyError::Other("coordinator stopped".into()))
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Owns the session registry and the connection directory.
pub struct Coordinator {
    pub(crate) discussion: DiscussionConfig,
    pub(crate) registry: SessionRegistry,
    pub(crate) connections: ConnectionDirectory,
    /// Used by phase timers to post back into the queue. Weak so that the
    /// queue closes once every handle is gone.
    pub(crate) commands: mpsc::WeakSender<Command>,
    next_cycle: u64,
}

impl Coordinator {
    pub fn new(mut discussion: DiscussionConfig, commands: mpsc::WeakSender<Command>) -> Self {
        discussion.topics.retain(|t| !t.trim().is_empty());
        if discussion.topics.is_empty() {
            discussion.topics = DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect();
        }
        Self {
            discussion,
            registry: SessionRegistry::new(),
            connections: ConnectionDirectory::new(),
            commands,
            next_cycle: 0,
        }
    }

    /// Start the coordinator task. It runs until `Shutdown` is received or
    /// every handle has been dropped.
    pub fn spawn(
        discussion: DiscussionConfig,
        capacity: usize,
    ) -> (CoordinatorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let coordinator = Coordinator::new(discussion, tx.downgrade());
        let task = tokio::spawn(coordinator.run(rx));
        (CoordinatorHandle { tx }, task)
    }

    pub async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        info!("Coordinator started");
        while let Some(command) = rx.recv().await {
            if !self.dispatch(command) {
                break;
            }
        }
        self.shutdown();
        info!("Coordinator stopped");
    }

    /// Handle one command to completion. Returns `false` on shutdown.
    pub fn dispatch(&mut self, command: Command) -> bool {
        let now = Instant::now();
        match command {
            Command::Connect {
                connection_id,
                outbound,
            } => {
                debug!(connection = %connection_id, "Connection registered");
                self.connections.register(connection_id, outbound);
            }
            Command::Client {
                connection_id,
                event,
            } => self.handle_client(&connection_id, event, now),
            Command::Disconnect { connection_id } => {
                self.disconnect(&connection_id, now);
            }
            Command::PrepElapsed { room_id, cycle } => self.prep_elapsed(&room_id, cycle),
            Command::Stats { respond_to } => {
                let _ = respond_to.send(self.stats());
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn handle_client(&mut self, connection_id: &ConnectionId, event: ClientEvent, now: Instant) {
        let result = match event {
            ClientEvent::Join { room_id, name } => self.join(connection_id, &room_id, &name),
            ClientEvent::Leave { room_id } => {
                self.leave(connection_id, &room_id, now);
                Ok(())
            }
            ClientEvent::Offer { to, payload } => {
                self.relay(SignalKind::Offer, &to, connection_id, payload)
            }
            ClientEvent::Answer { to, payload } => {
                self.relay(SignalKind::Answer, &to, connection_id, payload)
            }
            ClientEvent::IceCandidate { to, payload } => {
                self.relay(SignalKind::IceCandidate, &to, connection_id, payload)
            }
            ClientEvent::ToggleMedia {
                room_id,
                mic,
                video,
            } => {
                self.toggle_media(connection_id, &room_id, mic, video);
                Ok(())
            }
            ClientEvent::StartSpeaking { room_id } => {
                self.start_speaking(connection_id, &room_id, now);
                Ok(())
            }
            ClientEvent::StopSpeaking { room_id } => {
                self.stop_speaking(connection_id, &room_id, now);
                Ok(())
            }
            ClientEvent::StartPrep { room_id, starter } => {
                self.start_prep(connection_id, &room_id, starter.as_deref())
            }
            ClientEvent::EndDiscussion { room_id } => {
                self.end_discussion(&room_id, now);
                Ok(())
            }
        };

        if let Err(err) = result {
            self.report(connection_id, err);
        }
    }

    /// Tell the caller what went wrong. Errors without a client message
    /// are dropped here.
    fn report(&self, connection_id: &ConnectionId, err: SessionError) {
        match err.client_message() {
            Some(message) => {
                debug!(connection = %connection_id, error = %err, "Request rejected");
                self.connections
                    .send(connection_id, ServerEvent::Error { message });
            }
            None => debug!(connection = %connection_id, error = %err, "Dropped"),
        }
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            rooms: self.registry.room_count(),
            participants: self.registry.participant_count(),
            connections: self.connections.len(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Clear every room, cancelling their pending timers.
    pub fn shutdown(&mut self) {
        self.registry.shutdown();
    }

    pub(crate) fn next_cycle(&mut self) -> u64 {
        self.next_cycle += 1;
        self.next_cycle
    }
}
