//! Capability traits at the process boundary
//!
//! All interfaces here are in-process capability calls whose serialization
//! across the process boundary is delegated to the external transport.

mod service;
mod store;

pub use service::{EventSink, LinkMonitor, RemoteService, ServiceHandle};
pub use store::{RowCursor, TableStore};
