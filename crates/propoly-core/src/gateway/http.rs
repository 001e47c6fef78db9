//! HTTP gateway implementation over reqwest.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use propoly_protocol::{
    validate_house, validate_state, ChangeAgeRequest, ChangeChanceRequest, ChangeFilterRequest,
    HousesRequest, InitializeRequest, WireChance, WireFilterOptions, WireHouse, WireState,
};

use super::{Gateway, GatewayError};
use crate::config::ClientConfig;

/// Gateway talking JSON to the real backend.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<Req, Resp>(
        &self,
        endpoint: &'static str,
        body: &Req,
    ) -> Result<Resp, GatewayError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(endpoint, "posting to backend");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        Ok(response.json::<Resp>().await?)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn initialize_game(
        &self,
        income: f64,
        capital: f64,
        interest_rates: f64,
        desired_rates: f64,
    ) -> Result<WireState, GatewayError> {
        let state: WireState = self
            .post(
                "initialize-game",
                &InitializeRequest {
                    income,
                    capital,
                    interest_rates,
                    desired_rates,
                },
            )
            .await?;
        validate_state(&state)?;
        Ok(state)
    }

    async fn change_age(&self, delta: i32, state: &WireState) -> Result<WireState, GatewayError> {
        let updated: WireState = self
            .post(
                "change-age",
                &ChangeAgeRequest {
                    age: delta,
                    game_state: state.clone(),
                },
            )
            .await?;
        validate_state(&updated)?;
        Ok(updated)
    }

    async fn houses(&self, state: &WireState) -> Result<Vec<WireHouse>, GatewayError> {
        let houses: Vec<WireHouse> = self
            .post(
                "houses",
                &HousesRequest {
                    game_state: state.clone(),
                },
            )
            .await?;
        for house in &houses {
            validate_house(house)?;
        }
        Ok(houses)
    }

    async fn change_filter(
        &self,
        filter_options: &WireFilterOptions,
        state: &WireState,
    ) -> Result<WireFilterOptions, GatewayError> {
        self.post(
            "change-filter",
            &ChangeFilterRequest {
                filter_options: filter_options.clone(),
                state: state.clone(),
            },
        )
        .await
    }

    async fn change_chance(
        &self,
        chance: &WireChance,
        state: &WireState,
    ) -> Result<WireState, GatewayError> {
        let updated: WireState = self
            .post(
                "change-chance",
                &ChangeChanceRequest {
                    chance: chance.clone(),
                    state: state.clone(),
                },
            )
            .await?;
        validate_state(&updated)?;
        Ok(updated)
    }
}
