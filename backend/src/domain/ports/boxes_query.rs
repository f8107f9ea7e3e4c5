//! Driving port for box reads.

use async_trait::async_trait;

use crate::domain::boxes::BoxView;
use crate::domain::user::UserId;
use crate::domain::Error;

/// Driving port covering box reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoxesQuery: Send + Sync {
    /// List a user's boxes, the synthesized default box first, then the
    /// persisted boxes newest first.
    async fn list_boxes(&self, owner: UserId) -> Result<Vec<BoxView>, Error>;
}

/// Fixture query implementation exposing only an empty default box.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBoxesQuery;

#[async_trait]
impl BoxesQuery for FixtureBoxesQuery {
    async fn list_boxes(&self, _owner: UserId) -> Result<Vec<BoxView>, Error> {
        Ok(vec![BoxView::default_box(Vec::new())])
    }
}
