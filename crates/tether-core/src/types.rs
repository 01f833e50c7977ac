//! Core domain types

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token naming this client's registration at the remote service.
///
/// The token is remote-unique, not locally enforced: registering again under
/// an identity that is already taken silently overwrites the previous
/// registration at the remote service. There is no local way to detect the
/// overwrite, so pick something collision-resistant (reverse-domain names
/// work well).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(pub String);

impl SubscriberId {
    /// Create a new subscriber identity
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw identity string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SubscriberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SubscriberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque unit of data pushed by the remote service.
///
/// The payload is forwarded verbatim; nothing on this side interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Raw payload as handed over by the transport
    pub payload: Bytes,
}

impl Event {
    /// Wrap a payload into an event
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// Lifecycle state of the link to the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No bind requested
    Unbound,
    /// Bind request accepted, waiting for the transport to complete it
    Binding,
    /// Link established; the remote handle is available
    Bound,
    /// Registration call in flight on the current link
    Subscribing,
    /// Subscription active; events flow
    Ready,
    /// The transport dropped the link
    Disconnected,
}

impl LinkState {
    /// States in which the remote handle must be present
    pub fn has_handle(&self) -> bool {
        matches!(
            self,
            LinkState::Bound | LinkState::Subscribing | LinkState::Ready
        )
    }
}

/// Unit of consumer-visible delivery.
///
/// The readiness notice travels through the same FIFO as events, so a
/// consumer draining the inbox observes `Ready` strictly before any event of
/// the same subscription cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    /// The readiness handshake completed; events may follow
    Ready,
    /// An event forwarded verbatim from the remote service
    Event(Event),
}
