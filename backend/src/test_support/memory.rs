//! Deterministic in-memory implementations of every driven port.
//!
//! A single [`MemoryStore`] implements all five ports behind one mutex, so
//! each operation is atomic exactly like the database transactions it
//! stands in for. Entities keep insertion order internally; listings are
//! served newest first.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::boxes::{BoxChanges, NewBox, PokemonBox};
use crate::domain::naming::resolve_copy_name;
use crate::domain::ports::{
    BoxRepository, BoxRepositoryError, FavoriteOutcome, LeaderboardCache, LeaderboardCacheError,
    PokemonCatalog, PokemonCatalogError, RankedStatsRepository, RankedStatsRepositoryError,
    RankingRepository, RankingRepositoryError,
};
use crate::domain::ranking::{NewRanking, Ranking, RankingChanges};
use crate::domain::user::UserId;
use crate::domain::zones::validate_zones;

/// A user row as held by the in-memory store.
#[derive(Debug, Clone, Default)]
pub struct UserRecord {
    /// Display name given at registration.
    pub display_name: String,
    /// Rankings owned by the user, in insertion order.
    pub ranking_ids: Vec<Uuid>,
    /// Boxes owned by the user, in insertion order.
    pub box_ids: Vec<Uuid>,
    /// The stored derived aggregate.
    pub highest_ranked_count: u32,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, UserRecord>,
    rankings: Vec<Ranking>,
    boxes: Vec<PokemonBox>,
    catalog: Vec<Uuid>,
    cache: HashMap<String, String>,
}

/// Shared in-memory backing store implementing every driven port.
///
/// Clones share state; hand the same store (via [`Arc`]) to every service
/// under test to observe cross-entity effects.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not wedge the rest of the suite.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a user and return its id.
    pub fn add_user(&self, display_name: &str) -> UserId {
        let id = Uuid::new_v4();
        self.lock().users.insert(
            id,
            UserRecord {
                display_name: display_name.to_owned(),
                ..UserRecord::default()
            },
        );
        UserId::from_uuid(id)
    }

    /// Seed `count` catalog Pokémon and return their ids.
    pub fn add_pokemon(&self, count: usize) -> Vec<Uuid> {
        let ids: Vec<Uuid> = (0..count).map(|_| Uuid::new_v4()).collect();
        self.lock().catalog.extend(ids.iter().copied());
        ids
    }

    /// Snapshot a user row, if present.
    pub fn user(&self, id: UserId) -> Option<UserRecord> {
        self.lock().users.get(id.as_uuid()).cloned()
    }

    /// Snapshot a cached value, if present.
    pub fn cache_value(&self, key: &str) -> Option<String> {
        self.lock().cache.get(key).cloned()
    }

    /// Put a value into the cache directly, bypassing the port.
    pub fn prime_cache(&self, key: &str, value: &str) {
        self.lock().cache.insert(key.to_owned(), value.to_owned());
    }
}

#[async_trait]
impl RankingRepository for MemoryStore {
    async fn insert(&self, ranking: &NewRanking) -> Result<Ranking, RankingRepositoryError> {
        let mut state = self.lock();
        let owner = *ranking.owner.as_uuid();
        if !state.users.contains_key(&owner) {
            return Err(RankingRepositoryError::owner_missing(owner));
        }
        if state
            .rankings
            .iter()
            .any(|r| r.owner == ranking.owner && r.title == ranking.title)
        {
            return Err(RankingRepositoryError::duplicate_title(
                ranking.title.as_ref(),
            ));
        }

        let now = Utc::now();
        let created = Ranking {
            id: Uuid::new_v4(),
            owner: ranking.owner,
            title: ranking.title.clone(),
            pokemon: ranking.pokemon.clone(),
            zones: ranking.zones.clone(),
            created_at: now,
            updated_at: now,
        };
        if let Some(user) = state.users.get_mut(&owner) {
            user.ranking_ids.push(created.id);
        }
        state.rankings.push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: Uuid,
        requester: UserId,
        changes: &RankingChanges,
    ) -> Result<Ranking, RankingRepositoryError> {
        let mut state = self.lock();

        let duplicate = changes.title.as_ref().is_some_and(|new_title| {
            state
                .rankings
                .iter()
                .any(|r| r.id != id && r.owner == requester && r.title == *new_title)
        });

        let Some(ranking) = state.rankings.iter_mut().find(|r| r.id == id) else {
            return Err(RankingRepositoryError::not_found(id));
        };
        if ranking.owner != requester {
            return Err(RankingRepositoryError::not_owner(id));
        }
        if duplicate {
            if let Some(new_title) = changes.title.as_ref() {
                return Err(RankingRepositoryError::duplicate_title(new_title.as_ref()));
            }
        }

        let effective_pokemon = changes.pokemon.as_ref().unwrap_or(&ranking.pokemon);
        let effective_zones = changes.zones.as_ref().unwrap_or(&ranking.zones);
        let total = u32::try_from(effective_pokemon.len())
            .map_err(|_| RankingRepositoryError::query("list too long"))?;
        if let Err(violation) = validate_zones(effective_zones, total) {
            return Err(RankingRepositoryError::zones_rejected(violation));
        }

        if let Some(title) = changes.title.clone() {
            ranking.title = title;
        }
        if let Some(pokemon) = changes.pokemon.clone() {
            ranking.pokemon = pokemon;
        }
        if let Some(zones) = changes.zones.clone() {
            ranking.zones = zones;
        }
        ranking.updated_at = Utc::now();
        Ok(ranking.clone())
    }

    async fn delete(&self, id: Uuid, requester: UserId) -> Result<(), RankingRepositoryError> {
        let mut state = self.lock();
        let Some(position) = state.rankings.iter().position(|r| r.id == id) else {
            return Err(RankingRepositoryError::not_found(id));
        };
        let owner = match state.rankings.get(position) {
            Some(ranking) => ranking.owner,
            None => return Err(RankingRepositoryError::not_found(id)),
        };
        if owner != requester {
            return Err(RankingRepositoryError::not_owner(id));
        }

        state.rankings.remove(position);
        if let Some(user) = state.users.get_mut(owner.as_uuid()) {
            user.ranking_ids.retain(|linked| *linked != id);
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Ranking>, RankingRepositoryError> {
        Ok(self.lock().rankings.iter().find(|r| r.id == id).cloned())
    }

    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Ranking>, RankingRepositoryError> {
        Ok(self
            .lock()
            .rankings
            .iter()
            .rev()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BoxRepository for MemoryStore {
    async fn insert(&self, new_box: &NewBox) -> Result<PokemonBox, BoxRepositoryError> {
        let mut state = self.lock();
        let owner = *new_box.owner.as_uuid();
        if !state.users.contains_key(&owner) {
            return Err(BoxRepositoryError::owner_missing(owner));
        }
        if state
            .boxes
            .iter()
            .any(|b| b.owner == new_box.owner && b.name == new_box.name)
        {
            return Err(BoxRepositoryError::duplicate_name(new_box.name.as_ref()));
        }

        let now = Utc::now();
        let created = PokemonBox {
            id: Uuid::new_v4(),
            owner: new_box.owner,
            name: new_box.name.clone(),
            is_public: new_box.is_public,
            pokemon: new_box.pokemon.clone(),
            favorite_count: 0,
            created_at: now,
            updated_at: now,
        };
        if let Some(user) = state.users.get_mut(&owner) {
            user.box_ids.push(created.id);
        }
        state.boxes.push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: Uuid,
        requester: UserId,
        changes: &BoxChanges,
    ) -> Result<PokemonBox, BoxRepositoryError> {
        let mut state = self.lock();

        let duplicate = changes.name.as_ref().is_some_and(|new_name| {
            state
                .boxes
                .iter()
                .any(|b| b.id != id && b.owner == requester && b.name == *new_name)
        });

        let Some(stored) = state.boxes.iter_mut().find(|b| b.id == id) else {
            return Err(BoxRepositoryError::not_found(id));
        };
        if stored.owner != requester {
            return Err(BoxRepositoryError::not_owner(id));
        }
        if duplicate {
            if let Some(new_name) = changes.name.as_ref() {
                return Err(BoxRepositoryError::duplicate_name(new_name.as_ref()));
            }
        }

        if let Some(name) = changes.name.clone() {
            stored.name = name;
        }
        if let Some(is_public) = changes.is_public {
            stored.is_public = is_public;
        }
        if let Some(pokemon) = changes.pokemon.clone() {
            stored.pokemon = pokemon;
        }
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid, requester: UserId) -> Result<(), BoxRepositoryError> {
        let mut state = self.lock();
        let Some(position) = state.boxes.iter().position(|b| b.id == id) else {
            return Err(BoxRepositoryError::not_found(id));
        };
        let owner = match state.boxes.get(position) {
            Some(stored) => stored.owner,
            None => return Err(BoxRepositoryError::not_found(id)),
        };
        if owner != requester {
            return Err(BoxRepositoryError::not_owner(id));
        }

        state.boxes.remove(position);
        if let Some(user) = state.users.get_mut(owner.as_uuid()) {
            user.box_ids.retain(|linked| *linked != id);
        }
        Ok(())
    }

    async fn favorite(
        &self,
        source_id: Uuid,
        requester: UserId,
    ) -> Result<FavoriteOutcome, BoxRepositoryError> {
        let mut state = self.lock();

        let Some(source) = state
            .boxes
            .iter()
            .find(|b| b.id == source_id && b.is_public)
            .cloned()
        else {
            return Err(BoxRepositoryError::source_unavailable(source_id));
        };
        if source.owner == requester {
            return Err(BoxRepositoryError::self_favorite(source_id));
        }
        if !state.users.contains_key(requester.as_uuid()) {
            return Err(BoxRepositoryError::owner_missing(*requester.as_uuid()));
        }

        let copy_name = {
            let taken: Vec<&str> = state
                .boxes
                .iter()
                .filter(|b| b.owner == requester)
                .map(|b| b.name.as_ref())
                .collect();
            resolve_copy_name(source.name.as_ref(), |candidate| {
                taken.contains(&candidate)
            })
            .map_err(|err| BoxRepositoryError::copy_name_exhausted(err.base))?
        };
        let copy_name = crate::domain::boxes::BoxName::new(copy_name)
            .map_err(|err| BoxRepositoryError::query(format!("generated name rejected: {err}")))?;

        let now = Utc::now();
        let copy = PokemonBox {
            id: Uuid::new_v4(),
            owner: requester,
            name: copy_name,
            is_public: false,
            pokemon: source.pokemon.clone(),
            favorite_count: 0,
            created_at: now,
            updated_at: now,
        };

        if let Some(user) = state.users.get_mut(requester.as_uuid()) {
            user.box_ids.push(copy.id);
        }
        state.boxes.push(copy.clone());

        let Some(stored_source) = state.boxes.iter_mut().find(|b| b.id == source_id) else {
            return Err(BoxRepositoryError::source_unavailable(source_id));
        };
        stored_source.favorite_count += 1;
        let source_favorite_count = stored_source.favorite_count;

        Ok(FavoriteOutcome {
            copy,
            source_favorite_count,
        })
    }

    async fn find(&self, id: Uuid) -> Result<Option<PokemonBox>, BoxRepositoryError> {
        Ok(self.lock().boxes.iter().find(|b| b.id == id).cloned())
    }

    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<PokemonBox>, BoxRepositoryError> {
        Ok(self
            .lock()
            .boxes
            .iter()
            .rev()
            .filter(|b| b.owner == owner)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RankedStatsRepository for MemoryStore {
    async fn pokemon_counts(
        &self,
        owner: UserId,
    ) -> Result<Vec<u32>, RankedStatsRepositoryError> {
        let state = self.lock();
        state
            .rankings
            .iter()
            .filter(|r| r.owner == owner)
            .map(|r| {
                u32::try_from(r.pokemon.len())
                    .map_err(|_| RankedStatsRepositoryError::query("list too long"))
            })
            .collect()
    }

    async fn stored_highest(&self, owner: UserId) -> Result<u32, RankedStatsRepositoryError> {
        self.lock()
            .users
            .get(owner.as_uuid())
            .map(|user| user.highest_ranked_count)
            .ok_or_else(|| RankedStatsRepositoryError::owner_missing(*owner.as_uuid()))
    }

    async fn store_highest(
        &self,
        owner: UserId,
        value: u32,
    ) -> Result<(), RankedStatsRepositoryError> {
        let mut state = self.lock();
        let Some(user) = state.users.get_mut(owner.as_uuid()) else {
            return Err(RankedStatsRepositoryError::owner_missing(*owner.as_uuid()));
        };
        user.highest_ranked_count = value;
        Ok(())
    }
}

#[async_trait]
impl PokemonCatalog for MemoryStore {
    async fn all_pokemon(&self) -> Result<Vec<Uuid>, PokemonCatalogError> {
        Ok(self.lock().catalog.clone())
    }
}

#[async_trait]
impl LeaderboardCache for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LeaderboardCacheError> {
        Ok(self.lock().cache.get(key).cloned())
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        _ttl: Option<Duration>,
    ) -> Result<(), LeaderboardCacheError> {
        self.lock().cache.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), LeaderboardCacheError> {
        self.lock().cache.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::boxes::BoxName;
    use crate::domain::ranking::RankingTitle;

    #[tokio::test]
    async fn inserts_keep_the_user_arrays_in_step() {
        let store = MemoryStore::new();
        let owner = store.add_user("Ash");

        let ranking = RankingRepository::insert(
            &store,
            &NewRanking {
                owner,
                title: RankingTitle::new("Kanto favourites").expect("valid title"),
                pokemon: vec![Uuid::new_v4()],
                zones: Vec::new(),
            },
        )
        .await
        .expect("insert succeeds");

        let user = store.user(owner).expect("user exists");
        assert_eq!(user.ranking_ids, vec![ranking.id]);

        RankingRepository::delete(&store, ranking.id, owner)
            .await
            .expect("delete succeeds");
        let user = store.user(owner).expect("user exists");
        assert!(user.ranking_ids.is_empty());
    }

    #[tokio::test]
    async fn favorite_copies_and_counts_atomically() {
        let store = MemoryStore::new();
        let owner = store.add_user("Misty");
        let fan = store.add_user("Brock");

        let source = BoxRepository::insert(
            &store,
            &NewBox {
                owner,
                name: BoxName::new("Water").expect("valid name"),
                is_public: true,
                pokemon: [Uuid::new_v4()].into(),
            },
        )
        .await
        .expect("insert succeeds");

        let outcome = store.favorite(source.id, fan).await.expect("favorite succeeds");

        assert_eq!(outcome.source_favorite_count, 1);
        assert_eq!(outcome.copy.owner, fan);
        assert!(!outcome.copy.is_public);
        let fan_record = store.user(fan).expect("user exists");
        assert_eq!(fan_record.box_ids, vec![outcome.copy.id]);
    }
}
