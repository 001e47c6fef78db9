//! Gateway to the simulator backend.
//!
//! All game math lives server-side; the client only exchanges wire snapshots
//! over five POST endpoints. The trait seam exists so the synchronizer can be
//! driven by an in-memory fake in tests.

mod http;

use async_trait::async_trait;
use thiserror::Error;

use propoly_protocol::{ProtocolError, WireChance, WireFilterOptions, WireHouse, WireState};

pub use http::HttpGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned status {status} for {endpoint}")]
    Status {
        endpoint: &'static str,
        status: u16,
    },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Backend endpoints consumed by the synchronizer.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// POST `/initialize-game` with the player's starting finances.
    async fn initialize_game(
        &self,
        income: f64,
        capital: f64,
        interest_rates: f64,
        desired_rates: f64,
    ) -> Result<WireState, GatewayError>;

    /// POST `/change-age` with a delta and the current wire state.
    async fn change_age(&self, delta: i32, state: &WireState) -> Result<WireState, GatewayError>;

    /// POST `/houses` with the current wire state, returning listings.
    async fn houses(&self, state: &WireState) -> Result<Vec<WireHouse>, GatewayError>;

    /// POST `/change-filter`, returning the backend's view of the filters.
    async fn change_filter(
        &self,
        filter_options: &WireFilterOptions,
        state: &WireState,
    ) -> Result<WireFilterOptions, GatewayError>;

    /// POST `/change-chance` with a submitted life event.
    async fn change_chance(
        &self,
        chance: &WireChance,
        state: &WireState,
    ) -> Result<WireState, GatewayError>;
}
