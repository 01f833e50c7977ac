//! Remote service capability surface

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{ConnectError, TransportFault};
use crate::types::{Event, SubscriberId};

/// Entry point to the remote service process
pub trait RemoteService: Send + Sync {
    /// Request that the service process start running.
    ///
    /// Idempotent if the service is already running. Does not block and does
    /// not guarantee that a later bind succeeds.
    fn start(&self);

    /// Request an asynchronous bind.
    ///
    /// Returns `Ok(())` when the request was accepted for asynchronous
    /// completion, `Err(ConnectError::RequestRejected)` when the transport
    /// refuses outright. Completion or failure is reported later through
    /// `monitor` as exactly one of `on_connected` / `on_disconnected`.
    fn bind(&self, monitor: Arc<dyn LinkMonitor>) -> Result<(), ConnectError>;

    /// Release the link. Safe to call when not bound.
    fn unbind(&self);
}

/// Connect/disconnect notifications, invoked by the transport on the IPC
/// callback context
pub trait LinkMonitor: Send + Sync {
    /// The link is up; `handle` stays valid until `on_disconnected`
    fn on_connected(&self, handle: Arc<dyn ServiceHandle>);

    /// The link dropped; the handle from `on_connected` must not be used
    /// afterwards
    fn on_disconnected(&self);
}

/// Handle into the remote service, valid while the link is up
#[async_trait]
pub trait ServiceHandle: Send + Sync {
    /// Register `sink` as the subscriber named `identity`.
    ///
    /// Returns `true` when the service is already ready for further calls,
    /// `false` when readiness will be signalled later through exactly one
    /// [`EventSink::on_service_ready`] call. Registering an identity that is
    /// already taken silently overwrites the previous registration.
    async fn subscribe(
        &self,
        identity: &SubscriberId,
        sink: Arc<dyn EventSink>,
    ) -> Result<bool, TransportFault>;
}

/// Local sink the remote service calls back into.
///
/// Both methods run on the IPC callback context at any time after
/// subscription and must not block.
pub trait EventSink: Send + Sync {
    /// The service finished initializing; calls into it are now safe
    fn on_service_ready(&self);

    /// An event arrived; the payload is opaque to this layer
    fn handle_event(&self, event: Event);
}
