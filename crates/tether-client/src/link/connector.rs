//! Service connector
//!
//! Owns the lifecycle of the link to the remote service process: requests
//! service start, requests a bind, and receives the transport's raw
//! connect/disconnect notifications. Notifications are forwarded onto an
//! unbounded channel consumed by the subscription driver; the shared link
//! snapshot is updated *before* a notification is forwarded, so no other
//! component can observe a disconnected link that still exposes a handle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use tether_core::error::ConnectError;
use tether_core::traits::{LinkMonitor, RemoteService, ServiceHandle};
use tether_core::types::LinkState;

/// Raw link notifications, in transport order
pub enum LinkEvent {
    /// The transport established the link
    Connected(Arc<dyn ServiceHandle>),
    /// The transport dropped the link
    Disconnected,
}

impl fmt::Debug for LinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkEvent::Connected(_) => f.write_str("Connected"),
            LinkEvent::Disconnected => f.write_str("Disconnected"),
        }
    }
}

struct LinkSnapshot {
    state: LinkState,
    handle: Option<Arc<dyn ServiceHandle>>,
}

/// Shared view of the link, written from the IPC callback context and read
/// from the consumer context.
///
/// A single lock covers state and handle together, keeping the invariant
/// "handle present iff state is Bound/Subscribing/Ready" atomic for every
/// observer.
pub(crate) struct LinkShared {
    inner: Mutex<LinkSnapshot>,
}

impl LinkShared {
    fn new() -> Self {
        Self {
            inner: Mutex::new(LinkSnapshot {
                state: LinkState::Unbound,
                handle: None,
            }),
        }
    }

    pub(crate) fn state(&self) -> LinkState {
        self.inner.lock().state
    }

    pub(crate) fn handle(&self) -> Option<Arc<dyn ServiceHandle>> {
        self.inner.lock().handle.clone()
    }

    /// Whether `handle` is still the live handle of the current link
    pub(crate) fn is_current(&self, handle: &Arc<dyn ServiceHandle>) -> bool {
        matches!(&self.inner.lock().handle, Some(current) if Arc::ptr_eq(current, handle))
    }

    fn try_begin_binding(&self) -> Result<(), ConnectError> {
        let mut inner = self.inner.lock();
        if inner.state == LinkState::Binding || inner.handle.is_some() {
            return Err(ConnectError::AlreadyBound);
        }
        inner.state = LinkState::Binding;
        Ok(())
    }

    fn binding_rejected(&self) {
        let mut inner = self.inner.lock();
        if inner.state == LinkState::Binding {
            inner.state = LinkState::Unbound;
        }
    }

    fn connected(&self, handle: Arc<dyn ServiceHandle>) {
        let mut inner = self.inner.lock();
        inner.handle = Some(handle);
        inner.state = LinkState::Bound;
    }

    fn disconnected(&self) {
        let mut inner = self.inner.lock();
        // handle goes first: nothing may pick up a stale handle once the new
        // state is visible
        inner.handle = None;
        inner.state = LinkState::Disconnected;
    }

    fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.handle = None;
        inner.state = LinkState::Unbound;
    }

    /// Move to Subscribing; refused when the link went away in the meantime
    pub(crate) fn begin_subscribing(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.handle.is_none() {
            return false;
        }
        inner.state = LinkState::Subscribing;
        true
    }

    /// Registration finished without readiness; the link stays bound
    pub(crate) fn subscribe_failed(&self) {
        let mut inner = self.inner.lock();
        if inner.handle.is_some() {
            inner.state = LinkState::Bound;
        }
    }

    /// Subscription is active on the current link
    pub(crate) fn subscription_ready(&self) {
        let mut inner = self.inner.lock();
        if inner.handle.is_some() {
            inner.state = LinkState::Ready;
        }
    }
}

/// One generation of transport callbacks.
///
/// A fresh watcher is installed per bind cycle; retiring it makes late
/// callbacks from an old cycle invisible to the rest of the client.
struct LinkWatcher {
    shared: Arc<LinkShared>,
    events: mpsc::UnboundedSender<LinkEvent>,
    active: AtomicBool,
}

impl LinkWatcher {
    fn new(shared: Arc<LinkShared>, events: mpsc::UnboundedSender<LinkEvent>) -> Self {
        Self {
            shared,
            events,
            active: AtomicBool::new(true),
        }
    }

    fn retire(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl LinkMonitor for LinkWatcher {
    fn on_connected(&self, handle: Arc<dyn ServiceHandle>) {
        if !self.active.load(Ordering::SeqCst) {
            tracing::debug!("ignoring connect notification from a retired bind cycle");
            return;
        }
        self.shared.connected(Arc::clone(&handle));
        tracing::info!("connected to the remote service");
        let _ = self.events.send(LinkEvent::Connected(handle));
    }

    fn on_disconnected(&self) {
        if !self.active.load(Ordering::SeqCst) {
            tracing::debug!("ignoring disconnect notification from a retired bind cycle");
            return;
        }
        self.shared.disconnected();
        tracing::warn!("remote service disconnected");
        let _ = self.events.send(LinkEvent::Disconnected);
    }
}

/// Client-side owner of the link to the remote service
pub struct ServiceConnector {
    service: Arc<dyn RemoteService>,
    shared: Arc<LinkShared>,
    events: mpsc::UnboundedSender<LinkEvent>,
    watcher: Mutex<Option<Arc<LinkWatcher>>>,
}

impl ServiceConnector {
    /// Create a connector for `service`.
    ///
    /// The returned receiver carries the raw connect/disconnect
    /// notifications, in transport order; hand it to
    /// [`SubscriptionClient::spawn`](crate::subscription::SubscriptionClient::spawn).
    pub fn new(service: Arc<dyn RemoteService>) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Self {
            service,
            shared: Arc::new(LinkShared::new()),
            events: tx,
            watcher: Mutex::new(None),
        };
        (connector, rx)
    }

    /// Ask the host to start the service process.
    ///
    /// Idempotent if the service is already running; starting before binding
    /// makes a bind much less likely to fail silently.
    pub fn start(&self) {
        self.service.start();
    }

    /// Request an asynchronous bind.
    ///
    /// Returns as soon as the transport accepted or rejected the request;
    /// completion arrives later as a `Connected` or `Disconnected`
    /// notification.
    pub fn bind(&self) -> Result<(), ConnectError> {
        let mut slot = self.watcher.lock();
        self.shared.try_begin_binding()?;

        if let Some(old) = slot.take() {
            old.retire();
        }

        let watcher = Arc::new(LinkWatcher::new(
            Arc::clone(&self.shared),
            self.events.clone(),
        ));
        tracing::debug!("requesting bind to the remote service");
        match self.service.bind(Arc::clone(&watcher) as Arc<dyn LinkMonitor>) {
            Ok(()) => {
                *slot = Some(watcher);
                Ok(())
            }
            Err(err) => {
                self.shared.binding_rejected();
                tracing::warn!(%err, "bind request rejected");
                Err(err)
            }
        }
    }

    /// Release the link.
    ///
    /// Safe to call at any state and any number of times. The remote handle
    /// is cleared before the transport's own unbind runs, and callbacks from
    /// the released cycle are ignored from here on.
    pub fn unbind(&self) {
        let mut slot = self.watcher.lock();
        if let Some(watcher) = slot.take() {
            watcher.retire();
        }
        self.shared.reset();
        self.service.unbind();
        tracing::debug!("link released");
    }

    /// Current lifecycle state of the link
    pub fn state(&self) -> LinkState {
        self.shared.state()
    }

    /// Whether a remote handle is currently held
    pub fn has_handle(&self) -> bool {
        self.shared.handle().is_some()
    }

    pub(crate) fn shared(&self) -> Arc<LinkShared> {
        Arc::clone(&self.shared)
    }
}
