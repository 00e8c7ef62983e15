//! Store-and-forward of WebRTC negotiation messages.

use parley_common::{ConnectionId, SessionError};
use serde_json::Value;
use tracing::debug;

use crate::coordinator::Coordinator;
use crate::protocol::SignalKind;

impl Coordinator {
    /// Forward a negotiation payload to `target`, tagged with the sender.
    ///
    /// The payload is never inspected. A target that is gone yields
    /// `UnreachableTarget`, which the caller drops silently.
    pub(crate) fn relay(
        &self,
        kind: SignalKind,
        target: &ConnectionId,
        sender: &ConnectionId,
        payload: Value,
    ) -> Result<(), SessionError> {
        if !self.connections.is_reachable(target)
            || !self
                .connections
                .send(target, kind.into_event(sender.clone(), payload))
        {
            return Err(SessionError::UnreachableTarget(target.clone()));
        }
        debug!(kind = kind.as_str(), from = %sender, to = %target, "Relayed signal");
        Ok(())
    }
}
