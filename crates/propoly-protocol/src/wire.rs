//! Backend wire types and boundary validation.
//!
//! Shapes mirror the backend contract exactly; field names are part of that
//! contract and must not be renamed. Responses are validated here so a malformed
//! payload surfaces as a typed error instead of a panic deeper in the client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid payload: {0}")]
    Invalid(String),
}

/// `finance` block of the wire state. No `savings_rate`: that field is
/// client-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireFinance {
    pub income: f64,
    pub capital: f64,
    pub interest_rates: f64,
    pub desired_rates: f64,
}

/// `filter_option` block. `type` is a comma-joined list of property tags,
/// `sort_type` is `<key>_<asc|desc>`. `size` is a legacy field the backend
/// still carries; we send 0 and ignore it on receipt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireFilterOptions {
    pub max_budget: f64,
    #[serde(rename = "type")]
    pub kinds: String,
    pub sort_type: String,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireChance {
    pub chance_type: String,
    pub yearly_cost: f64,
    pub onetime_cost: f64,
    pub age: u32,
}

/// Full wire game state as exchanged with every stateful endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireState {
    pub age: u32,
    pub equity: Vec<f64>,
    pub square_id: u32,
    pub finance: WireFinance,
    pub filter_option: WireFilterOptions,
    #[serde(default)]
    pub chance: Vec<WireChance>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireHouse {
    pub id: String,
    pub title: String,
    pub buying_price: f64,
    pub rooms: u32,
    pub square_meter: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub construction_year: u32,
    #[serde(default)]
    pub finance_duration: String,
    #[serde(default)]
    pub link: String,
}

/// Request body for `/initialize-game`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InitializeRequest {
    pub income: f64,
    pub capital: f64,
    pub interest_rates: f64,
    pub desired_rates: f64,
}

/// Request body for `/change-age`. `age` carries the delta, not an absolute.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeAgeRequest {
    pub age: i32,
    pub game_state: WireState,
}

/// Request body for `/houses`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HousesRequest {
    pub game_state: WireState,
}

/// Request body for `/change-filter`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeFilterRequest {
    pub filter_options: WireFilterOptions,
    pub state: WireState,
}

/// Request body for `/change-chance`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeChanceRequest {
    pub chance: WireChance,
    pub state: WireState,
}

fn ensure_finite(name: &str, value: f64) -> Result<(), ProtocolError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProtocolError::Invalid(format!(
            "non-finite value in field `{name}`"
        )))
    }
}

/// Validate a wire state received from the backend.
pub fn validate_state(state: &WireState) -> Result<(), ProtocolError> {
    ensure_finite("finance.income", state.finance.income)?;
    ensure_finite("finance.capital", state.finance.capital)?;
    ensure_finite("finance.interest_rates", state.finance.interest_rates)?;
    ensure_finite("finance.desired_rates", state.finance.desired_rates)?;
    ensure_finite("filter_option.max_budget", state.filter_option.max_budget)?;
    for (i, e) in state.equity.iter().enumerate() {
        ensure_finite(&format!("equity[{i}]"), *e)?;
    }
    Ok(())
}

/// Validate a house listing received from the backend.
pub fn validate_house(house: &WireHouse) -> Result<(), ProtocolError> {
    if house.id.is_empty() {
        return Err(ProtocolError::Invalid("house with empty id".into()));
    }
    ensure_finite("buying_price", house.buying_price)?;
    ensure_finite("square_meter", house.square_meter)?;
    if house.square_meter < 0.0 {
        return Err(ProtocolError::Invalid(format!(
            "negative square_meter on house `{}`",
            house.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> WireState {
        WireState {
            age: 30,
            equity: vec![20_000.0, 24_000.0],
            square_id: 3,
            finance: WireFinance {
                income: 4_000.0,
                capital: 20_000.0,
                interest_rates: 3.5,
                desired_rates: 7.0,
            },
            filter_option: WireFilterOptions {
                max_budget: 300_000.0,
                kinds: "APPARTMENTBUY,HOUSEBUY".into(),
                sort_type: "buying_price_asc".into(),
                size: 0,
                city: "Munich".into(),
                region: "Bayern".into(),
            },
            chance: vec![WireChance {
                chance_type: "medical".into(),
                yearly_cost: 0.0,
                onetime_cost: 2_000.0,
                age: 30,
            }],
        }
    }

    #[test]
    fn wire_state_json_round_trip() {
        let state = sample_state();
        let json = serde_json::to_string(&state).unwrap();
        let back: WireState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn filter_type_field_serializes_as_type() {
        let state = sample_state();
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(
            value["filter_option"]["type"],
            serde_json::json!("APPARTMENTBUY,HOUSEBUY")
        );
    }

    #[test]
    fn missing_chance_defaults_to_empty() {
        let json = r#"{
            "age": 25,
            "equity": [10000.0],
            "square_id": 0,
            "finance": {"income": 1.0, "capital": 2.0, "interest_rates": 3.0, "desired_rates": 4.0},
            "filter_option": {"max_budget": 5.0, "type": "", "sort_type": "buying_price_asc"}
        }"#;
        let state: WireState = serde_json::from_str(json).unwrap();
        assert!(state.chance.is_empty());
        assert!(state.filter_option.city.is_empty());
    }

    #[test]
    fn non_finite_equity_is_rejected() {
        let mut state = sample_state();
        state.equity.push(f64::NAN);
        assert!(matches!(
            validate_state(&state),
            Err(ProtocolError::Invalid(_))
        ));
    }

    #[test]
    fn empty_house_id_is_rejected() {
        let house = WireHouse {
            id: String::new(),
            title: "Loft".into(),
            buying_price: 250_000.0,
            rooms: 3,
            square_meter: 80.0,
            image_url: String::new(),
            construction_year: 1990,
            finance_duration: String::new(),
            link: String::new(),
        };
        assert!(validate_house(&house).is_err());
    }
}
