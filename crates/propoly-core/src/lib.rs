//! Propoly core - backend gateway and client-side game-state synchronization.
//!
//! This crate mirrors a server-authoritative game state locally, speculatively
//! prefetches the "next age" state to hide network latency, and funnels every
//! mutation through a single synchronizer so the UI layer only ever reads.

pub mod config;
pub mod gateway;
pub mod prefetch;
pub mod sync;

pub use config::ClientConfig;
pub use gateway::{Gateway, GatewayError, HttpGateway};
pub use prefetch::{PrefetchCache, PrefetchEntry};
pub use sync::Synchronizer;
