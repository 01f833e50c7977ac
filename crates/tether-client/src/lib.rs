//! tether-client: subscription client for the Tether data service
//!
//! Connects to a lazily-started out-of-process service, registers a named
//! subscriber, resolves the registered-vs-ready race, and delivers the
//! resulting event feed to a single consumer in arrival order. A thin
//! read-only reader over the service's tabular store rides along.

pub mod inbox;
pub mod link;
pub mod store;
pub mod subscription;

pub use inbox::{EventInbox, InboxPoster};
pub use link::{ExponentialBackoff, LinkEvent, ServiceConnector};
pub use store::{Row, RowSet, TableReader};
pub use subscription::{SubscribeState, SubscriptionClient};
