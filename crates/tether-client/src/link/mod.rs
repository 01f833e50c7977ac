//! Link lifecycle: bind requests, connect/disconnect notifications, and
//! rebind backoff

mod connector;
mod reconnect;

pub use connector::{LinkEvent, ServiceConnector};
pub use reconnect::ExponentialBackoff;

pub(crate) use connector::LinkShared;
