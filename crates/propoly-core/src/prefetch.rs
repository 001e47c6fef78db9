//! Single-slot prefetch cache for the "advance one year" action.
//!
//! Holds at most one speculative state, computed for `current age + 1` under
//! the filters and event list that were live when the prefetch was issued. The
//! consume predicate is the correctness gate: a hit is only served if nothing
//! the backend result depends on has changed in the meantime.

use propoly_protocol::GameState;

/// The speculative result of advancing one year.
#[derive(Clone, Debug)]
pub struct PrefetchEntry {
    pub for_age: u32,
    pub state: GameState,
}

#[derive(Debug, Default)]
pub struct PrefetchCache {
    slot: Option<PrefetchEntry>,
}

impl PrefetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot. Single-slot by design: a newer speculation always
    /// replaces an older one.
    pub fn store(&mut self, entry: PrefetchEntry) {
        self.slot = Some(entry);
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Take the cached state if it is exactly the next age and the guarded
    /// fields still match the current state. Any mismatch discards the entry.
    pub fn try_consume(&mut self, current: &GameState) -> Option<GameState> {
        let entry = self.slot.take()?;
        if entry.for_age != current.age + 1 {
            return None;
        }
        let cached = &entry.state;
        let matches = cached.active_chance.len() == current.active_chance.len()
            && cached.filters.sort_key == current.filters.sort_key
            && cached.filters.sort_by == current.filters.sort_by
            && cached.filters.max_price == current.filters.max_price
            && cached.filters.city == current.filters.city
            && cached.filters.region == current.filters.region;
        if matches {
            Some(entry.state)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propoly_protocol::{LifeEvent, LifeEventKind, SortDir};

    fn entry_for(current: &GameState) -> PrefetchEntry {
        let mut next = current.clone();
        next.age += 1;
        PrefetchEntry {
            for_age: next.age,
            state: next,
        }
    }

    #[test]
    fn hit_when_nothing_changed() {
        let current = GameState::default();
        let mut cache = PrefetchCache::new();
        cache.store(entry_for(&current));

        let state = cache.try_consume(&current).expect("cache hit");
        assert_eq!(state.age, current.age + 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn miss_on_wrong_age() {
        let mut current = GameState::default();
        let mut cache = PrefetchCache::new();
        cache.store(entry_for(&current));

        // The user jumped two years since the speculation.
        current.age += 2;
        assert!(cache.try_consume(&current).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn miss_when_filters_changed_after_speculation() {
        let mut current = GameState::default();
        let mut cache = PrefetchCache::new();
        cache.store(entry_for(&current));

        current.filters.max_price = 300_000.0;
        assert!(cache.try_consume(&current).is_none());
        assert!(cache.is_empty());

        cache.store(entry_for(&current));
        current.filters.sort_by = SortDir::Desc;
        assert!(cache.try_consume(&current).is_none());

        cache.store(entry_for(&current));
        current.filters.city = "Berlin".into();
        assert!(cache.try_consume(&current).is_none());

        cache.store(entry_for(&current));
        current.filters.region = "Bayern".into();
        assert!(cache.try_consume(&current).is_none());
    }

    #[test]
    fn miss_when_life_event_arrived_after_speculation() {
        let mut current = GameState::default();
        let mut cache = PrefetchCache::new();
        cache.store(entry_for(&current));

        current.active_chance.push(LifeEvent {
            kind: LifeEventKind::Medical,
            one_time_cost: 2_000.0,
            yearly_cost: 0.0,
            age: current.age,
        });
        assert!(cache.try_consume(&current).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn local_only_min_price_does_not_gate_the_hit() {
        let mut current = GameState::default();
        let mut cache = PrefetchCache::new();
        cache.store(entry_for(&current));

        // min_price never reaches the backend, so the speculation stays valid.
        current.filters.min_price = 100_000.0;
        assert!(cache.try_consume(&current).is_some());
    }

    #[test]
    fn store_overwrites_previous_entry() {
        let current = GameState::default();
        let mut cache = PrefetchCache::new();

        let mut stale = entry_for(&current);
        stale.state.finances.capital = 1.0;
        cache.store(stale);

        let mut fresh = entry_for(&current);
        fresh.state.finances.capital = 2.0;
        cache.store(fresh);

        let state = cache.try_consume(&current).expect("cache hit");
        assert_eq!(state.finances.capital, 2.0);
    }
}
