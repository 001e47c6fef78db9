//! Client-side game state.
//!
//! The synchronizer in `propoly-core` is the single writer; everything here is a
//! plain value type that consumers receive as snapshots.

use serde::{Deserialize, Serialize};

/// Property categories understood by the listing search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Apartment,
    House,
    Land,
    Garage,
    Office,
}

impl PropertyKind {
    /// Wire tag used inside the comma-joined `filter_option.type` field.
    pub fn wire_tag(&self) -> &'static str {
        match self {
            Self::Apartment => "APPARTMENTBUY",
            Self::House => "HOUSEBUY",
            Self::Land => "LANDBUY",
            Self::Garage => "GARAGEBUY",
            Self::Office => "OFFICEBUY",
        }
    }

    pub fn from_wire_tag(tag: &str) -> Option<Self> {
        match tag {
            "APPARTMENTBUY" => Some(Self::Apartment),
            "HOUSEBUY" => Some(Self::House),
            "LANDBUY" => Some(Self::Land),
            "GARAGEBUY" => Some(Self::Garage),
            "OFFICEBUY" => Some(Self::Office),
            _ => None,
        }
    }
}

/// Sortable listing fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    BuyingPrice,
    PublishDate,
    SquareMeter,
    RentPricePerSqm,
    GrossReturn,
    ConstructionYear,
    PricePerSqm,
}

impl SortKey {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::BuyingPrice => "buying_price",
            Self::PublishDate => "publish_date",
            Self::SquareMeter => "square_meter",
            Self::RentPricePerSqm => "rent_price_per_sqm",
            Self::GrossReturn => "gross_return",
            Self::ConstructionYear => "construction_year",
            Self::PricePerSqm => "price_per_sqm",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "buying_price" => Some(Self::BuyingPrice),
            "publish_date" => Some(Self::PublishDate),
            "square_meter" => Some(Self::SquareMeter),
            "rent_price_per_sqm" => Some(Self::RentPricePerSqm),
            "gross_return" => Some(Self::GrossReturn),
            "construction_year" => Some(Self::ConstructionYear),
            "price_per_sqm" => Some(Self::PricePerSqm),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Listing filters. Mutated only through the synchronizer's `update_filters`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub kinds: Vec<PropertyKind>,
    pub sort_by: SortDir,
    pub sort_key: SortKey,
    /// Local-only lower bound; the backend contract only carries `max_budget`.
    pub min_price: f64,
    pub max_price: f64,
    pub city: String,
    pub region: String,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            kinds: Vec::new(),
            sort_by: SortDir::Asc,
            sort_key: SortKey::BuyingPrice,
            min_price: 0.0,
            max_price: 2_000_000.0,
            city: String::new(),
            region: String::new(),
        }
    }
}

/// Partial filter update, merged field-by-field onto the current `FilterSet`.
#[derive(Clone, Debug, Default)]
pub struct FilterPatch {
    pub kinds: Option<Vec<PropertyKind>>,
    pub sort_by: Option<SortDir>,
    pub sort_key: Option<SortKey>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub city: Option<String>,
    pub region: Option<String>,
}

impl FilterSet {
    pub fn apply(&mut self, patch: FilterPatch) {
        if let Some(kinds) = patch.kinds {
            self.kinds = kinds;
        }
        if let Some(sort_by) = patch.sort_by {
            self.sort_by = sort_by;
        }
        if let Some(sort_key) = patch.sort_key {
            self.sort_key = sort_key;
        }
        if let Some(min_price) = patch.min_price {
            self.min_price = min_price;
        }
        if let Some(max_price) = patch.max_price {
            self.max_price = max_price;
        }
        if let Some(city) = patch.city {
            self.city = city;
        }
        if let Some(region) = patch.region {
            self.region = region;
        }
    }
}

/// Player finances. `savings_rate` is client-only and never crosses the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Finances {
    pub income: f64,
    pub capital: f64,
    pub interest_rate: f64,
    pub desired_rate: f64,
    pub savings_rate: f64,
}

impl Default for Finances {
    fn default() -> Self {
        Self {
            income: 3_500.0,
            capital: 10_000.0,
            interest_rate: 3.5,
            desired_rate: 7.0,
            savings_rate: 20.0,
        }
    }
}

/// A property listing as shown on the marketplace carousel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub id: String,
    pub title: String,
    pub kind: Option<PropertyKind>,
    pub buying_price: f64,
    pub rooms: u32,
    pub square_meter: f64,
    pub image_url: String,
    pub construction_year: u32,
    pub finance_duration: String,
    pub link: String,
    /// Derived display field, `buying_price / square_meter`.
    pub price_per_sqm: f64,
}

/// Life-event categories the player can submit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LifeEventKind {
    Car,
    Child,
    Vacation,
    Medical,
    Custom { name: String },
}

impl LifeEventKind {
    pub fn wire_tag(&self) -> &str {
        match self {
            Self::Car => "car",
            Self::Child => "child",
            Self::Vacation => "vacation",
            Self::Medical => "medical",
            Self::Custom { name } => name.as_str(),
        }
    }

    pub fn from_wire_tag(tag: &str) -> Self {
        match tag {
            "car" => Self::Car,
            "child" => Self::Child,
            "vacation" => Self::Vacation,
            "medical" => Self::Medical,
            other => Self::Custom {
                name: other.to_string(),
            },
        }
    }
}

/// A submitted life event. Sent to the backend with every state sync until a
/// full reset clears the list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LifeEvent {
    pub kind: LifeEventKind,
    pub one_time_cost: f64,
    pub yearly_cost: f64,
    /// Player age at submission.
    pub age: u32,
}

/// The full client game state. Single-writer: only the synchronizer mutates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub is_initialized: bool,
    pub age: u32,
    /// Equity time series, one entry per simulated year.
    pub equity: Vec<f64>,
    /// Current board position.
    pub square_id: u32,
    pub finances: Finances,
    pub houses: Vec<House>,
    pub active_chance: Vec<LifeEvent>,
    pub filters: FilterSet,
    /// Capital level at which the pawn last moved a square.
    pub last_square_capital: f64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            is_initialized: false,
            age: 25,
            equity: vec![10_000.0],
            square_id: 0,
            finances: Finances::default(),
            houses: Vec::new(),
            active_chance: Vec::new(),
            filters: FilterSet::default(),
            last_square_capital: 10_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_kind_tags_round_trip() {
        for kind in [
            PropertyKind::Apartment,
            PropertyKind::House,
            PropertyKind::Land,
            PropertyKind::Garage,
            PropertyKind::Office,
        ] {
            assert_eq!(PropertyKind::from_wire_tag(kind.wire_tag()), Some(kind));
        }
        assert_eq!(PropertyKind::from_wire_tag("CASTLEBUY"), None);
    }

    #[test]
    fn filter_patch_merges_only_set_fields() {
        let mut filters = FilterSet::default();
        filters.apply(FilterPatch {
            max_price: Some(300_000.0),
            city: Some("Munich".into()),
            ..Default::default()
        });

        assert_eq!(filters.max_price, 300_000.0);
        assert_eq!(filters.city, "Munich");
        // Untouched fields keep their defaults.
        assert_eq!(filters.min_price, 0.0);
        assert_eq!(filters.sort_key, SortKey::BuyingPrice);
    }

    #[test]
    fn custom_life_event_keeps_its_name() {
        let kind = LifeEventKind::from_wire_tag("sabbatical");
        assert_eq!(
            kind,
            LifeEventKind::Custom {
                name: "sabbatical".into()
            }
        );
        assert_eq!(kind.wire_tag(), "sabbatical");
    }
}
