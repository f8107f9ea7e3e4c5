//! Read-only port over the Pokémon catalog.
//!
//! Catalog administration is out of scope; the only consumer is the
//! default-box synthesis, which needs every catalog id on each listing read.

use async_trait::async_trait;
use uuid::Uuid;

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalog adapters.
    pub enum PokemonCatalogError {
        /// Catalog connection could not be established.
        Connection { message: String } =>
            "pokemon catalog connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "pokemon catalog query failed: {message}",
    }
}

/// Port for enumerating the system's Pokémon.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PokemonCatalog: Send + Sync {
    /// Every Pokémon id in the system.
    async fn all_pokemon(&self) -> Result<Vec<Uuid>, PokemonCatalogError>;
}

/// Fixture catalog with no Pokémon at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePokemonCatalog;

#[async_trait]
impl PokemonCatalog for FixturePokemonCatalog {
    async fn all_pokemon(&self) -> Result<Vec<Uuid>, PokemonCatalogError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_catalog_is_empty() {
        let catalog = FixturePokemonCatalog;
        assert!(catalog
            .all_pokemon()
            .await
            .expect("catalog read succeeds")
            .is_empty());
    }
}
