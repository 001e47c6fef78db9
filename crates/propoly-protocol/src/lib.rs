//! Client data model and backend wire contract for the propoly life simulator.
//!
//! The backend owns all game math (aging, equity growth, mortgage search); this
//! crate defines the client-side state shape, the wire shape the backend speaks,
//! and the lossless translation between the two.

pub mod state;
pub mod translate;
pub mod wire;

pub use state::{
    FilterPatch, FilterSet, Finances, GameState, House, LifeEvent, LifeEventKind, PropertyKind,
    SortDir, SortKey,
};
pub use translate::{chance_to_wire, house_from_wire, merge_from_wire, to_wire};
pub use wire::{
    validate_house, validate_state, ChangeAgeRequest, ChangeChanceRequest, ChangeFilterRequest,
    HousesRequest, InitializeRequest, ProtocolError, WireChance, WireFilterOptions, WireFinance,
    WireHouse, WireState,
};
