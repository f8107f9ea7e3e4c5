//! Box domain services.
//!
//! Implements the driving ports for box mutations and the listing read. Box
//! mutations never touch the ranked-stats aggregate; the favorite flow
//! delegates its five effects to a single repository transaction and only
//! translates the outcome here.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::boxes::{BoxView, NewBox, PokemonBox};
use crate::domain::ports::{
    BoxRepository, BoxRepositoryError, BoxesCommand, BoxesQuery, CreateBoxRequest,
    DeleteBoxRequest, FavoriteBoxRequest, FavoriteBoxResponse, PokemonCatalog,
    PokemonCatalogError, UpdateBoxRequest,
};
use crate::domain::user::UserId;
use crate::domain::Error;

/// Box service implementing the driving ports.
#[derive(Clone)]
pub struct BoxesService<B, P> {
    box_repo: Arc<B>,
    catalog: Arc<P>,
}

impl<B, P> BoxesService<B, P> {
    /// Create a new service over the given repository and catalog.
    pub fn new(box_repo: Arc<B>, catalog: Arc<P>) -> Self {
        Self { box_repo, catalog }
    }
}

impl<B, P> BoxesService<B, P>
where
    B: BoxRepository,
    P: PokemonCatalog,
{
    fn map_box_error(error: BoxRepositoryError) -> Error {
        match error {
            BoxRepositoryError::OwnerMissing { owner } => {
                Error::not_found(format!("user {owner} not found"))
            }
            BoxRepositoryError::NotFound { id } => {
                Error::not_found(format!("box {id} not found"))
            }
            BoxRepositoryError::NotOwner { .. } => {
                Error::forbidden("not authorised to modify this box")
            }
            BoxRepositoryError::DuplicateName { name } => {
                Error::conflict("box name already in use").with_details(json!({
                    "code": "duplicate_name",
                    "name": name,
                }))
            }
            // A private source is indistinguishable from a missing one;
            // leaking the difference would reveal other users' private boxes.
            BoxRepositoryError::SourceUnavailable { id } => {
                Error::not_found(format!("box {id} not found"))
            }
            BoxRepositoryError::SelfFavorite { .. } => {
                Error::forbidden("cannot favorite your own box")
            }
            BoxRepositoryError::CopyNameExhausted { base } => {
                Error::conflict("no free name for the favorite copy").with_details(json!({
                    "code": "copy_name_exhausted",
                    "base": base,
                }))
            }
            BoxRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("box repository unavailable: {message}"))
            }
            BoxRepositoryError::Query { message } => {
                Error::internal(format!("box repository error: {message}"))
            }
        }
    }

    fn map_catalog_error(error: PokemonCatalogError) -> Error {
        match error {
            PokemonCatalogError::Connection { message } => {
                Error::service_unavailable(format!("pokemon catalog unavailable: {message}"))
            }
            PokemonCatalogError::Query { message } => {
                Error::internal(format!("pokemon catalog error: {message}"))
            }
        }
    }
}

#[async_trait]
impl<B, P> BoxesCommand for BoxesService<B, P>
where
    B: BoxRepository,
    P: PokemonCatalog,
{
    async fn create_box(&self, request: CreateBoxRequest) -> Result<PokemonBox, Error> {
        let draft = NewBox {
            owner: request.owner,
            name: request.name,
            is_public: request.is_public,
            pokemon: request.pokemon,
        };
        self.box_repo
            .insert(&draft)
            .await
            .map_err(Self::map_box_error)
    }

    async fn update_box(&self, request: UpdateBoxRequest) -> Result<PokemonBox, Error> {
        self.box_repo
            .update(request.id, request.requester, &request.changes)
            .await
            .map_err(Self::map_box_error)
    }

    async fn delete_box(&self, request: DeleteBoxRequest) -> Result<(), Error> {
        self.box_repo
            .delete(request.id, request.requester)
            .await
            .map_err(Self::map_box_error)
    }

    async fn favorite_box(
        &self,
        request: FavoriteBoxRequest,
    ) -> Result<FavoriteBoxResponse, Error> {
        let outcome = self
            .box_repo
            .favorite(request.source_id, request.requester)
            .await
            .map_err(Self::map_box_error)?;

        Ok(FavoriteBoxResponse {
            copy: outcome.copy,
            source_favorite_count: outcome.source_favorite_count,
        })
    }
}

#[async_trait]
impl<B, P> BoxesQuery for BoxesService<B, P>
where
    B: BoxRepository,
    P: PokemonCatalog,
{
    async fn list_boxes(&self, owner: UserId) -> Result<Vec<BoxView>, Error> {
        let catalog = self
            .catalog
            .all_pokemon()
            .await
            .map_err(Self::map_catalog_error)?;
        let stored = self
            .box_repo
            .list_for_owner(owner)
            .await
            .map_err(Self::map_box_error)?;

        let mut listing = Vec::with_capacity(stored.len() + 1);
        listing.push(BoxView::default_box(catalog));
        listing.extend(stored.into_iter().map(BoxView::from));
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use uuid::Uuid;

    use super::*;
    use crate::domain::boxes::{BoxKey, BoxName};
    use crate::domain::ports::{FavoriteOutcome, MockBoxRepository, MockPokemonCatalog};
    use crate::domain::ErrorCode;

    fn name(value: &str) -> BoxName {
        BoxName::new(value).expect("valid name")
    }

    fn sample_box(owner: UserId, box_name: &str, is_public: bool) -> PokemonBox {
        let now = chrono::Utc::now();
        PokemonBox {
            id: Uuid::new_v4(),
            owner,
            name: name(box_name),
            is_public,
            pokemon: BTreeSet::new(),
            favorite_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn make_service(
        repo: MockBoxRepository,
        catalog: MockPokemonCatalog,
    ) -> BoxesService<MockBoxRepository, MockPokemonCatalog> {
        BoxesService::new(Arc::new(repo), Arc::new(catalog))
    }

    #[tokio::test]
    async fn duplicate_name_maps_to_conflict() {
        let mut repo = MockBoxRepository::new();
        repo.expect_insert()
            .times(1)
            .return_once(|_| Err(BoxRepositoryError::duplicate_name("Water")));
        let service = make_service(repo, MockPokemonCatalog::new());

        let error = service
            .create_box(CreateBoxRequest {
                owner: UserId::random(),
                name: name("Water"),
                is_public: false,
                pokemon: BTreeSet::new(),
            })
            .await
            .expect_err("name is taken");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn favorite_returns_the_copy_and_the_new_count() {
        let requester = UserId::random();
        let copy = sample_box(requester, "Water", false);
        let copy_id = copy.id;
        let mut repo = MockBoxRepository::new();
        repo.expect_favorite().times(1).return_once(move |_, _| {
            Ok(FavoriteOutcome {
                copy,
                source_favorite_count: 2,
            })
        });
        let service = make_service(repo, MockPokemonCatalog::new());

        let response = service
            .favorite_box(FavoriteBoxRequest {
                source_id: Uuid::new_v4(),
                requester,
            })
            .await
            .expect("favorite succeeds");

        assert_eq!(response.copy.id, copy_id);
        assert_eq!(response.source_favorite_count, 2);
    }

    #[tokio::test]
    async fn favoriting_a_private_box_maps_to_not_found() {
        let source_id = Uuid::new_v4();
        let mut repo = MockBoxRepository::new();
        repo.expect_favorite()
            .times(1)
            .return_once(move |_, _| Err(BoxRepositoryError::source_unavailable(source_id)));
        let service = make_service(repo, MockPokemonCatalog::new());

        let error = service
            .favorite_box(FavoriteBoxRequest {
                source_id,
                requester: UserId::random(),
            })
            .await
            .expect_err("private sources stay hidden");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn favoriting_your_own_box_maps_to_forbidden() {
        let source_id = Uuid::new_v4();
        let mut repo = MockBoxRepository::new();
        repo.expect_favorite()
            .times(1)
            .return_once(move |_, _| Err(BoxRepositoryError::self_favorite(source_id)));
        let service = make_service(repo, MockPokemonCatalog::new());

        let error = service
            .favorite_box(FavoriteBoxRequest {
                source_id,
                requester: UserId::random(),
            })
            .await
            .expect_err("no self-favoriting");

        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn exhausted_copy_names_map_to_conflict() {
        let mut repo = MockBoxRepository::new();
        repo.expect_favorite()
            .times(1)
            .return_once(|_, _| Err(BoxRepositoryError::copy_name_exhausted("Water")));
        let service = make_service(repo, MockPokemonCatalog::new());

        let error = service
            .favorite_box(FavoriteBoxRequest {
                source_id: Uuid::new_v4(),
                requester: UserId::random(),
            })
            .await
            .expect_err("no candidates left");

        assert_eq!(error.code(), ErrorCode::Conflict);
        let details = error.details().expect("details are attached");
        assert_eq!(details["code"], "copy_name_exhausted");
    }

    #[tokio::test]
    async fn listing_prepends_the_default_box_over_the_catalog() {
        let owner = UserId::random();
        let catalog_ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let catalog_clone = catalog_ids.clone();
        let mut catalog = MockPokemonCatalog::new();
        catalog
            .expect_all_pokemon()
            .times(1)
            .return_once(move || Ok(catalog_clone));

        let stored = sample_box(owner, "Water", true);
        let mut repo = MockBoxRepository::new();
        repo.expect_list_for_owner()
            .times(1)
            .return_once(move |_| Ok(vec![stored]));

        let service = make_service(repo, catalog);
        let listing = service.list_boxes(owner).await.expect("list succeeds");

        assert_eq!(listing.len(), 2);
        let default = listing.first().expect("default box leads");
        assert_eq!(default.key, BoxKey::Default);
        assert_eq!(default.pokemon.len(), catalog_ids.len());
        assert_eq!(default.favorite_count, 0);
        assert!(matches!(
            listing.get(1),
            Some(view) if view.name == "Water"
        ));
    }
}
