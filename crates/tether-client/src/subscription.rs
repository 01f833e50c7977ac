//! Subscription handshake state machine
//!
//! Turns a raw remote handle into an active subscription. The remote
//! registration call returns either "already ready" or "readiness will be
//! signalled later"; both paths must produce exactly one readiness notice
//! for the local consumer, and never two. All subscription state is owned by
//! a single driver task fed by channels, so nothing here is mutated from two
//! execution contexts at once.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use tether_core::config::ClientConfig;
use tether_core::error::{ConnectError, TransportFault};
use tether_core::traits::{EventSink, ServiceHandle};
use tether_core::types::{Event, FeedItem};

use crate::inbox::{EventInbox, InboxPoster};
use crate::link::{ExponentialBackoff, LinkEvent, LinkShared, ServiceConnector};

/// Handshake states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeState {
    /// No registration attempted on the current link
    Idle,
    /// Registration call in flight
    Registering,
    /// Registration returned "already ready"; the readiness notice is
    /// emitted locally
    ReadyImmediate,
    /// Registration returned "not ready yet"; waiting for the remote
    /// readiness signal
    ReadyPending,
    /// Readiness delivered; events flow to the inbox
    Ready,
    /// The link dropped; a fresh bind is required to resume
    Unregistered,
}

/// Signals pushed by the sink adapter from the IPC callback context
enum SinkSignal {
    Ready,
    Event(Event),
}

/// Sink handed to the remote service for one registration cycle.
///
/// Forwards callbacks onto the driver's channel without blocking. Signals
/// carry the cycle they belong to; the driver drops anything from a cycle
/// that is no longer current.
struct SubscriberSink {
    cycle: u64,
    shared: Arc<LinkShared>,
    signals: mpsc::UnboundedSender<(u64, SinkSignal)>,
}

impl EventSink for SubscriberSink {
    fn on_service_ready(&self) {
        if self.shared.handle().is_none() {
            tracing::debug!("readiness signal after unbind, ignoring");
            return;
        }
        let _ = self.signals.send((self.cycle, SinkSignal::Ready));
    }

    fn handle_event(&self, event: Event) {
        if self.shared.handle().is_none() {
            tracing::debug!("event after unbind, ignoring");
            return;
        }
        let _ = self.signals.send((self.cycle, SinkSignal::Event(event)));
    }
}

/// Application-facing half of the subscription client
pub struct SubscriptionClient {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    state: Arc<Mutex<SubscribeState>>,
}

impl SubscriptionClient {
    /// Spawn the driver task.
    ///
    /// `link_rx` is the notification channel returned by
    /// [`ServiceConnector::new`]. Feed items surface through the returned
    /// inbox, readiness notice first.
    pub fn spawn(
        connector: Arc<ServiceConnector>,
        link_rx: mpsc::UnboundedReceiver<LinkEvent>,
        config: ClientConfig,
    ) -> (Self, EventInbox) {
        let (inbox, poster) = EventInbox::channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(SubscribeState::Idle));
        let cancel = CancellationToken::new();

        let driver = Driver {
            shared: connector.shared(),
            backoff: ExponentialBackoff::from_config(&config.backoff),
            connector,
            config,
            poster,
            state: Arc::clone(&state),
            signal_tx,
            cancel: cancel.clone(),
            cycle: 0,
            ready_signalled: false,
            pending: Vec::new(),
        };
        let task = tokio::spawn(driver.run(link_rx, signal_rx));

        (Self { cancel, task, state }, inbox)
    }

    /// Current handshake state
    pub fn state(&self) -> SubscribeState {
        *self.state.lock()
    }

    /// Stop the driver task.
    ///
    /// Items already posted to the inbox stay drainable. Call
    /// [`ServiceConnector::unbind`] first to release the link itself.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Single owner of all subscription state
struct Driver {
    connector: Arc<ServiceConnector>,
    shared: Arc<LinkShared>,
    config: ClientConfig,
    backoff: ExponentialBackoff,
    poster: InboxPoster,
    state: Arc<Mutex<SubscribeState>>,
    signal_tx: mpsc::UnboundedSender<(u64, SinkSignal)>,
    cancel: CancellationToken,
    /// Registration cycle counter; signals tagged with an older value are
    /// stale
    cycle: u64,
    ready_signalled: bool,
    /// Events that arrived before readiness (remote protocol violation)
    pending: Vec<Event>,
}

impl Driver {
    async fn run(
        mut self,
        mut link_rx: mpsc::UnboundedReceiver<LinkEvent>,
        mut signal_rx: mpsc::UnboundedReceiver<(u64, SinkSignal)>,
    ) {
        let cancel = self.cancel.clone();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                notification = link_rx.recv() => match notification {
                    Some(event) => self.on_link_event(event).await,
                    None => break,
                },
                Some((cycle, signal)) = signal_rx.recv() => {
                    self.on_sink_signal(cycle, signal);
                }
            }
        }
    }

    async fn on_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Connected(handle) => {
                self.backoff.reset();
                self.register(handle).await;
            }
            LinkEvent::Disconnected => {
                self.drop_subscription();
                if self.config.auto_rebind {
                    self.rebind_with_backoff().await;
                }
            }
        }
    }

    /// Run the registration half of the handshake on a fresh link
    async fn register(&mut self, handle: Arc<dyn ServiceHandle>) {
        if !self.shared.is_current(&handle) || !self.shared.begin_subscribing() {
            tracing::debug!("connect notification for a link that is already gone");
            return;
        }

        self.cycle += 1;
        self.ready_signalled = false;
        self.pending.clear();
        self.set_state(SubscribeState::Registering);

        let sink: Arc<dyn EventSink> = Arc::new(SubscriberSink {
            cycle: self.cycle,
            shared: Arc::clone(&self.shared),
            signals: self.signal_tx.clone(),
        });

        tracing::debug!(identity = %self.config.identity, "registering subscriber");
        let outcome = tokio::time::timeout(
            self.config.registration_timeout,
            handle.subscribe(&self.config.identity, sink),
        )
        .await;

        // the link may have dropped or been released while the call was in
        // flight; a stale result must not resurrect the old cycle
        if self.cancel.is_cancelled() || !self.shared.is_current(&handle) {
            tracing::debug!("registration result discarded, link no longer current");
            self.cycle += 1;
            self.set_state(SubscribeState::Unregistered);
            return;
        }

        let ready = match outcome {
            Err(_) => {
                self.registration_fault(TransportFault(format!(
                    "registration timed out after {:?}",
                    self.config.registration_timeout
                )));
                return;
            }
            Ok(Err(fault)) => {
                self.registration_fault(fault);
                return;
            }
            Ok(Ok(ready)) => ready,
        };

        if ready {
            // the service was already up; the readiness notice is ours to
            // send, exactly once, before anything else happens
            self.set_state(SubscribeState::ReadyImmediate);
            self.mark_ready();
        } else {
            self.set_state(SubscribeState::ReadyPending);
            tracing::debug!("service not ready yet, waiting for its readiness signal");
        }
    }

    /// Non-fatal: the link stays bound, a future connect notification
    /// restarts the handshake. No automatic retry.
    fn registration_fault(&mut self, fault: TransportFault) {
        tracing::warn!(%fault, "registration failed");
        self.cycle += 1;
        self.shared.subscribe_failed();
        self.set_state(SubscribeState::Idle);
    }

    fn on_sink_signal(&mut self, cycle: u64, signal: SinkSignal) {
        if cycle != self.cycle {
            tracing::debug!("signal from a stale registration cycle ignored");
            return;
        }
        match signal {
            SinkSignal::Ready => self.mark_ready(),
            SinkSignal::Event(event) => {
                if self.ready_signalled {
                    self.poster.post(FeedItem::Event(event));
                } else {
                    // remote protocol violation: events must not precede
                    // readiness; buffer and flush once ready rather than
                    // deliver early or drop
                    tracing::warn!("event before readiness, buffering");
                    self.pending.push(event);
                }
            }
        }
    }

    fn mark_ready(&mut self) {
        if self.ready_signalled {
            // duplicate readiness is a remote protocol violation, not fatal
            tracing::warn!("duplicate readiness signal ignored");
            return;
        }
        self.ready_signalled = true;
        self.shared.subscription_ready();
        self.set_state(SubscribeState::Ready);
        tracing::info!("subscription ready");
        self.poster.post(FeedItem::Ready);
        for event in self.pending.drain(..) {
            self.poster.post(FeedItem::Event(event));
        }
    }

    /// Discard the subscription after a disconnect, without a final
    /// callback. Items already in the inbox stay drainable.
    fn drop_subscription(&mut self) {
        if !self.pending.is_empty() {
            tracing::warn!(
                count = self.pending.len(),
                "discarding events buffered before readiness"
            );
        }
        self.pending.clear();
        self.ready_signalled = false;
        self.cycle += 1;
        self.set_state(SubscribeState::Unregistered);
    }

    async fn rebind_with_backoff(&mut self) {
        loop {
            let delay = self.backoff.next_delay();
            tracing::info!(?delay, "rebinding after disconnect");
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            match self.connector.bind() {
                Ok(()) => return,
                Err(ConnectError::AlreadyBound) => return,
                Err(err) => tracing::warn!(%err, "rebind rejected, backing off"),
            }
        }
    }

    fn set_state(&self, state: SubscribeState) {
        *self.state.lock() = state;
    }
}
