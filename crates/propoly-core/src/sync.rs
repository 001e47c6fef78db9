//! Game-state synchronizer.
//!
//! Single authority over the client `GameState`: every mutation intent funnels
//! through one of the named operations below, and consumers only ever see
//! committed snapshots (via [`Synchronizer::state`] or the watch channel).
//!
//! Race discipline: each state-mutating operation bumps a generation counter
//! under the lock before going to the network and re-checks it at commit time.
//! A response that lost the race is discarded instead of overwriting a newer
//! commit. Opportunistic prefetch tasks carry the same counter, so a slow
//! speculative response can never repopulate the cache after the state moved on.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use propoly_protocol::{
    chance_to_wire, house_from_wire, merge_from_wire, to_wire, FilterPatch, GameState, House,
    LifeEvent, LifeEventKind,
};

use crate::gateway::{Gateway, GatewayError};
use crate::prefetch::{PrefetchCache, PrefetchEntry};

struct Inner {
    state: GameState,
    user_name: String,
    cache: PrefetchCache,
    /// Generation counter for state-mutating operations and prefetches.
    epoch: u64,
    publisher: watch::Sender<GameState>,
    prefetch_task: Option<JoinHandle<()>>,
}

impl Inner {
    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}

/// Owns the client game state and orchestrates all backend traffic.
#[derive(Clone)]
pub struct Synchronizer {
    inner: Arc<Mutex<Inner>>,
    gateway: Arc<dyn Gateway>,
    prefetch_enabled: bool,
}

impl Synchronizer {
    pub fn new(gateway: Arc<dyn Gateway>, prefetch_enabled: bool) -> Self {
        let state = GameState::default();
        let (publisher, _) = watch::channel(state.clone());
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                user_name: String::new(),
                cache: PrefetchCache::new(),
                epoch: 0,
                publisher,
                prefetch_task: None,
            })),
            gateway,
            prefetch_enabled,
        }
    }

    /// Snapshot of the current committed state.
    pub async fn state(&self) -> GameState {
        self.inner.lock().await.state.clone()
    }

    pub async fn user_name(&self) -> String {
        self.inner.lock().await.user_name.clone()
    }

    /// Subscribe to committed states. The receiver always starts at the
    /// latest commit.
    pub async fn subscribe(&self) -> watch::Receiver<GameState> {
        self.inner.lock().await.publisher.subscribe()
    }

    /// Await the outstanding prefetch task, if any. Used by the CLI before
    /// shutdown and by tests that need the speculative fetch settled.
    pub async fn flush_prefetch(&self) {
        let task = self.inner.lock().await.prefetch_task.take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// True while the prefetch slot holds a speculative state.
    pub async fn has_prefetched(&self) -> bool {
        !self.inner.lock().await.cache.is_empty()
    }

    /// Start a new game session.
    ///
    /// The initialize request carries only the starting finances; the starting
    /// age is a client-side choice and is applied after the merge. The listings
    /// refresh failing is logged but does not abort the initialization.
    #[allow(clippy::too_many_arguments)]
    pub async fn initialize(
        &self,
        name: &str,
        age: u32,
        income: f64,
        capital: f64,
        interest_rate: f64,
        desired_rate: f64,
        savings_rate: f64,
    ) -> Result<(), GatewayError> {
        let epoch = {
            let mut inner = self.inner.lock().await;
            inner.epoch += 1;
            inner.cache.invalidate();
            inner.epoch
        };

        let wire = self
            .gateway
            .initialize_game(income, capital, interest_rate, desired_rate)
            .await
            .inspect_err(|err| tracing::warn!(%err, "initialize-game failed"))?;

        let mut seed = GameState::default();
        seed.finances.savings_rate = savings_rate;

        let mut state = merge_from_wire(&wire, &seed);
        state.is_initialized = true;
        state.age = age;
        if state.equity.is_empty() {
            state.equity = vec![capital];
        }
        state.last_square_capital = capital;

        match self.gateway.houses(&to_wire(&state)).await {
            Ok(houses) => state.houses = houses.iter().map(house_from_wire).collect(),
            Err(err) => tracing::warn!(%err, "listing refresh after initialize failed"),
        }

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            tracing::debug!("discarding stale initialize response");
            return Ok(());
        }
        inner.user_name = name.to_string();
        inner.state = state;
        inner.publish();
        Ok(())
    }

    /// Advance the simulation by `delta` years.
    ///
    /// `delta == 1` first consults the prefetch cache; a hit adopts the
    /// speculative state without touching the network. Every successful
    /// single-year advance issues a new speculation for the year after.
    pub async fn advance_age(&self, delta: u32) -> Result<(), GatewayError> {
        let (epoch, current) = {
            let mut guard = self.inner.lock().await;
            guard.epoch += 1;
            let epoch = guard.epoch;
            let inner = &mut *guard;

            if delta == 1 {
                if let Some(next) = inner.cache.try_consume(&inner.state) {
                    tracing::debug!(age = next.age, "prefetch hit, adopting speculative state");
                    inner.state = next;
                    inner.publish();
                    let adopted = inner.state.clone();
                    drop(guard);
                    self.spawn_prefetch(epoch, adopted).await;
                    return Ok(());
                }
            }
            inner.cache.invalidate();
            (epoch, inner.state.clone())
        };

        let updated = self
            .gateway
            .change_age(delta as i32, &to_wire(&current))
            .await
            .inspect_err(|err| tracing::warn!(%err, delta, "change-age failed"))?;

        let mut merged = merge_from_wire(&updated, &current);
        let houses = self
            .gateway
            .houses(&to_wire(&merged))
            .await
            .inspect_err(|err| tracing::warn!(%err, "listing refresh after change-age failed"))?;
        merged.houses = houses.iter().map(house_from_wire).collect();

        if self.commit_if_current(epoch, merged.clone()).await && delta == 1 {
            self.spawn_prefetch(epoch, merged).await;
        }
        Ok(())
    }

    /// Merge a partial filter update, commit it, then refresh listings under
    /// the new filters. The filter change structurally invalidates any
    /// speculative state.
    pub async fn update_filters(&self, patch: FilterPatch) -> Result<Vec<House>, GatewayError> {
        let (epoch, current) = {
            let mut inner = self.inner.lock().await;
            inner.epoch += 1;
            inner.cache.invalidate();
            inner.state.filters.apply(patch);
            inner.publish();
            (inner.epoch, inner.state.clone())
        };

        let wire = to_wire(&current);
        let options = self
            .gateway
            .change_filter(&wire.filter_option, &wire)
            .await
            .inspect_err(|err| tracing::warn!(%err, "change-filter failed"))?;

        let mut normalized = wire;
        normalized.filter_option = options;
        let mut state = merge_from_wire(&normalized, &current);

        let houses = self
            .gateway
            .houses(&to_wire(&state))
            .await
            .inspect_err(|err| tracing::warn!(%err, "listing refresh after filter change failed"))?;
        state.houses = houses.iter().map(house_from_wire).collect();
        let listings = state.houses.clone();

        self.commit_if_current(epoch, state).await;
        Ok(listings)
    }

    /// Append a life event at the current age, sync it to the backend and
    /// refresh listings. The appended event is committed before the network
    /// round trip; the length change invalidates any speculative state.
    pub async fn submit_life_event(
        &self,
        kind: LifeEventKind,
        one_time_cost: f64,
        yearly_cost: f64,
    ) -> Result<(), GatewayError> {
        let (epoch, current, event) = {
            let mut inner = self.inner.lock().await;
            inner.epoch += 1;
            inner.cache.invalidate();
            let event = LifeEvent {
                kind,
                one_time_cost,
                yearly_cost,
                age: inner.state.age,
            };
            inner.state.active_chance.push(event.clone());
            inner.publish();
            (inner.epoch, inner.state.clone(), event)
        };

        let updated = self
            .gateway
            .change_chance(&chance_to_wire(&event), &to_wire(&current))
            .await
            .inspect_err(|err| tracing::warn!(%err, "change-chance failed"))?;

        let mut state = merge_from_wire(&updated, &current);
        let houses = self
            .gateway
            .houses(&to_wire(&state))
            .await
            .inspect_err(|err| tracing::warn!(%err, "listing refresh after life event failed"))?;
        state.houses = houses.iter().map(house_from_wire).collect();

        self.commit_if_current(epoch, state).await;
        Ok(())
    }

    /// Reset to the default state, clear the user name and the prefetch slot,
    /// then fetch a baseline listing set. Idempotent.
    pub async fn restart(&self) -> Result<(), GatewayError> {
        let (epoch, current) = {
            let mut inner = self.inner.lock().await;
            inner.epoch += 1;
            inner.cache.invalidate();
            inner.user_name.clear();
            inner.state = GameState::default();
            inner.publish();
            (inner.epoch, inner.state.clone())
        };

        let houses = self
            .gateway
            .houses(&to_wire(&current))
            .await
            .inspect_err(|err| tracing::warn!(%err, "baseline listing fetch failed"))?;

        let mut state = current;
        state.houses = houses.iter().map(house_from_wire).collect();
        self.commit_if_current(epoch, state).await;
        Ok(())
    }

    /// Refresh listings for the current state and return them.
    ///
    /// Read-refresh only: does not bump the epoch, so an outstanding prefetch
    /// stays valid, but the commit is still dropped if another operation
    /// intervened.
    pub async fn get_houses(&self) -> Result<Vec<House>, GatewayError> {
        let (epoch, current) = {
            let inner = self.inner.lock().await;
            (inner.epoch, inner.state.clone())
        };

        let houses = self
            .gateway
            .houses(&to_wire(&current))
            .await
            .inspect_err(|err| tracing::warn!(%err, "listing fetch failed"))?;

        let listings: Vec<House> = houses.iter().map(house_from_wire).collect();
        let mut state = current;
        state.houses = listings.clone();
        self.commit_if_current(epoch, state).await;
        Ok(listings)
    }

    /// Commit `state` only if no newer operation started since `epoch`.
    async fn commit_if_current(&self, epoch: u64, state: GameState) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            tracing::debug!(
                epoch,
                current = inner.epoch,
                "discarding response from a superseded operation"
            );
            return false;
        }
        inner.state = state;
        inner.publish();
        true
    }

    /// Speculatively advance one year from `base` and park the result in the
    /// cache. Runs as a background task; the result is dropped if any
    /// operation started after `epoch`.
    async fn spawn_prefetch(&self, epoch: u64, base: GameState) {
        if !self.prefetch_enabled {
            return;
        }
        let gateway = Arc::clone(&self.gateway);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let updated = match gateway.change_age(1, &to_wire(&base)).await {
                Ok(updated) => updated,
                Err(err) => {
                    tracing::debug!(%err, "prefetch change-age failed");
                    return;
                }
            };
            let mut next = merge_from_wire(&updated, &base);
            match gateway.houses(&to_wire(&next)).await {
                Ok(houses) => next.houses = houses.iter().map(house_from_wire).collect(),
                Err(err) => {
                    tracing::debug!(%err, "prefetch listing refresh failed");
                    return;
                }
            }

            let mut guard = inner.lock().await;
            if guard.epoch != epoch {
                tracing::debug!(epoch, current = guard.epoch, "discarding stale prefetch");
                return;
            }
            tracing::debug!(for_age = next.age, "prefetch stored");
            guard.cache.store(PrefetchEntry {
                for_age: next.age,
                state: next,
            });
        });
        self.inner.lock().await.prefetch_task = Some(task);
    }
}
