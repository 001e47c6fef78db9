//! Two-way mapping between the client `GameState` and the backend wire shape.
//!
//! The merge direction overwrites backend-owned fields wholesale and preserves
//! client-only fields (`savings_rate`, `min_price`, listings, initialization
//! flag) from the previous state. `merge_from_wire(to_wire(s), s)` reproduces
//! every backend-owned field of `s` exactly.

use crate::state::{
    FilterSet, GameState, House, LifeEvent, LifeEventKind, PropertyKind, SortDir, SortKey,
};
use crate::wire::{WireChance, WireFilterOptions, WireFinance, WireHouse, WireState};

/// Encode sort key and direction into the single wire `sort_type` field.
fn encode_sort(key: SortKey, dir: SortDir) -> String {
    format!("{}_{}", key.wire_name(), dir.wire_name())
}

/// Decode a wire `sort_type`. Unknown encodings fall back to the defaults
/// rather than failing the whole state merge.
fn decode_sort(sort_type: &str) -> (SortKey, SortDir) {
    if let Some((key, dir)) = sort_type.rsplit_once('_') {
        if let (Some(key), Some(dir)) = (SortKey::from_wire_name(key), SortDir::from_wire_name(dir))
        {
            return (key, dir);
        }
    }
    (SortKey::default(), SortDir::default())
}

fn encode_kinds(kinds: &[PropertyKind]) -> String {
    kinds
        .iter()
        .map(PropertyKind::wire_tag)
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_kinds(csv: &str) -> Vec<PropertyKind> {
    csv.split(',')
        .filter_map(|tag| PropertyKind::from_wire_tag(tag.trim()))
        .collect()
}

/// Flatten the client state into the shape every stateful endpoint expects.
pub fn to_wire(state: &GameState) -> WireState {
    WireState {
        age: state.age,
        equity: state.equity.clone(),
        square_id: state.square_id,
        finance: WireFinance {
            income: state.finances.income,
            capital: state.finances.capital,
            interest_rates: state.finances.interest_rate,
            desired_rates: state.finances.desired_rate,
        },
        filter_option: WireFilterOptions {
            max_budget: state.filters.max_price,
            kinds: encode_kinds(&state.filters.kinds),
            sort_type: encode_sort(state.filters.sort_key, state.filters.sort_by),
            size: 0,
            city: state.filters.city.clone(),
            region: state.filters.region.clone(),
        },
        chance: state.active_chance.iter().map(chance_to_wire).collect(),
    }
}

pub fn chance_to_wire(event: &LifeEvent) -> WireChance {
    WireChance {
        chance_type: event.kind.wire_tag().to_string(),
        yearly_cost: event.yearly_cost,
        onetime_cost: event.one_time_cost,
        age: event.age,
    }
}

fn chance_from_wire(wire: &WireChance) -> LifeEvent {
    LifeEvent {
        kind: LifeEventKind::from_wire_tag(&wire.chance_type),
        one_time_cost: wire.onetime_cost,
        yearly_cost: wire.yearly_cost,
        age: wire.age,
    }
}

/// Merge an authoritative backend state onto the previous client state.
///
/// Backend-owned fields (age, equity, square position, finance quadruple,
/// chance list, wire filter fields) are overwritten; everything else carries
/// over from `previous`.
pub fn merge_from_wire(wire: &WireState, previous: &GameState) -> GameState {
    let (sort_key, sort_by) = decode_sort(&wire.filter_option.sort_type);
    GameState {
        is_initialized: previous.is_initialized,
        age: wire.age,
        equity: wire.equity.clone(),
        square_id: wire.square_id,
        finances: crate::state::Finances {
            income: wire.finance.income,
            capital: wire.finance.capital,
            interest_rate: wire.finance.interest_rates,
            desired_rate: wire.finance.desired_rates,
            savings_rate: previous.finances.savings_rate,
        },
        houses: previous.houses.clone(),
        active_chance: wire.chance.iter().map(chance_from_wire).collect(),
        filters: FilterSet {
            kinds: decode_kinds(&wire.filter_option.kinds),
            sort_by,
            sort_key,
            min_price: previous.filters.min_price,
            max_price: wire.filter_option.max_budget,
            city: wire.filter_option.city.clone(),
            region: wire.filter_option.region.clone(),
        },
        last_square_capital: previous.last_square_capital,
    }
}

/// Build a display-ready listing from its wire form.
pub fn house_from_wire(wire: &WireHouse) -> House {
    let price_per_sqm = if wire.square_meter > 0.0 {
        wire.buying_price / wire.square_meter
    } else {
        0.0
    };
    House {
        id: wire.id.clone(),
        title: wire.title.clone(),
        kind: None,
        buying_price: wire.buying_price,
        rooms: wire.rooms,
        square_meter: wire.square_meter,
        image_url: wire.image_url.clone(),
        construction_year: wire.construction_year,
        finance_duration: wire.finance_duration.clone(),
        link: wire.link.clone(),
        price_per_sqm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Finances;

    fn populated_state() -> GameState {
        GameState {
            is_initialized: true,
            age: 32,
            equity: vec![20_000.0, 26_500.0, 33_100.0],
            square_id: 4,
            finances: Finances {
                income: 4_000.0,
                capital: 33_100.0,
                interest_rate: 3.5,
                desired_rate: 7.0,
                savings_rate: 25.0,
            },
            houses: Vec::new(),
            active_chance: vec![LifeEvent {
                kind: LifeEventKind::Medical,
                one_time_cost: 2_000.0,
                yearly_cost: 0.0,
                age: 31,
            }],
            filters: FilterSet {
                kinds: vec![PropertyKind::Apartment, PropertyKind::House],
                sort_by: SortDir::Desc,
                sort_key: SortKey::PricePerSqm,
                min_price: 50_000.0,
                max_price: 450_000.0,
                city: "Hamburg".into(),
                region: "Hamburg".into(),
            },
            last_square_capital: 30_000.0,
        }
    }

    #[test]
    fn round_trip_preserves_backend_owned_fields() {
        let state = populated_state();
        let merged = merge_from_wire(&to_wire(&state), &state);

        assert_eq!(merged.age, state.age);
        assert_eq!(merged.equity, state.equity);
        assert_eq!(merged.square_id, state.square_id);
        assert_eq!(merged.finances, state.finances);
        assert_eq!(merged.active_chance, state.active_chance);
        assert_eq!(merged.filters, state.filters);
    }

    #[test]
    fn round_trip_preserves_local_only_fields() {
        let mut state = populated_state();
        state.finances.savings_rate = 42.0;
        state.filters.min_price = 123.0;
        state.last_square_capital = 31_337.0;

        let merged = merge_from_wire(&to_wire(&state), &state);

        assert_eq!(merged.finances.savings_rate, 42.0);
        assert_eq!(merged.filters.min_price, 123.0);
        assert_eq!(merged.last_square_capital, 31_337.0);
        assert!(merged.is_initialized);
    }

    #[test]
    fn merge_overwrites_backend_fields_wholesale() {
        let previous = populated_state();
        let mut wire = to_wire(&previous);
        wire.age = 40;
        wire.equity = vec![99_000.0];
        wire.finance.capital = 99_000.0;
        wire.chance.clear();

        let merged = merge_from_wire(&wire, &previous);

        assert_eq!(merged.age, 40);
        assert_eq!(merged.equity, vec![99_000.0]);
        assert_eq!(merged.finances.capital, 99_000.0);
        assert!(merged.active_chance.is_empty());
        // Local-only fields still come from the previous state.
        assert_eq!(merged.finances.savings_rate, 25.0);
    }

    #[test]
    fn sort_encoding_survives_keys_with_underscores() {
        assert_eq!(
            decode_sort(&encode_sort(SortKey::RentPricePerSqm, SortDir::Desc)),
            (SortKey::RentPricePerSqm, SortDir::Desc)
        );
    }

    #[test]
    fn unknown_sort_encoding_falls_back_to_defaults() {
        assert_eq!(
            decode_sort("mystery_sideways"),
            (SortKey::BuyingPrice, SortDir::Asc)
        );
        assert_eq!(decode_sort(""), (SortKey::BuyingPrice, SortDir::Asc));
    }

    #[test]
    fn unknown_kind_tags_are_dropped() {
        assert_eq!(
            decode_kinds("APPARTMENTBUY,CASTLEBUY,HOUSEBUY"),
            vec![PropertyKind::Apartment, PropertyKind::House]
        );
    }

    #[test]
    fn house_gets_derived_price_per_sqm() {
        let wire = WireHouse {
            id: "h1".into(),
            title: "Altbau".into(),
            buying_price: 400_000.0,
            rooms: 4,
            square_meter: 100.0,
            image_url: String::new(),
            construction_year: 1910,
            finance_duration: "22.5".into(),
            link: String::new(),
        };
        let house = house_from_wire(&wire);
        assert_eq!(house.price_per_sqm, 4_000.0);

        let degenerate = WireHouse {
            square_meter: 0.0,
            ..wire
        };
        assert_eq!(house_from_wire(&degenerate).price_per_sqm, 0.0);
    }
}
