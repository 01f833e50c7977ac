//! tether-core: Shared types, traits, and configuration for Tether
//!
//! This crate provides the capability trait surfaces, domain types, error
//! taxonomy, and configuration structures used by the client components.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::TetherError;
pub use types::{Event, FeedItem, LinkState, SubscriberId};
