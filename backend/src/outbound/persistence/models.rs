//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations; the repository files own the
//! row-to-domain conversions.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{boxes, rankings};

/// Row struct for reading from the rankings table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = rankings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RankingRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub pokemon_ids: Vec<Uuid>,
    pub zones: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new ranking records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = rankings)]
pub(crate) struct NewRankingRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: &'a str,
    pub pokemon_ids: &'a [Uuid],
    pub zones: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct for partially updating ranking records.
///
/// `None` fields are skipped by Diesel and keep their stored value.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = rankings)]
pub(crate) struct RankingUpdate<'a> {
    pub title: Option<&'a str>,
    pub pokemon_ids: Option<&'a [Uuid]>,
    pub zones: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the boxes table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = boxes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BoxRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub is_public: bool,
    pub pokemon_ids: Vec<Uuid>,
    pub favorite_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new box records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = boxes)]
pub(crate) struct NewBoxRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: &'a str,
    pub is_public: bool,
    pub pokemon_ids: Vec<Uuid>,
    pub favorite_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct for partially updating box records.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = boxes)]
pub(crate) struct BoxUpdate<'a> {
    pub name: Option<&'a str>,
    pub is_public: Option<bool>,
    pub pokemon_ids: Option<Vec<Uuid>>,
    pub updated_at: DateTime<Utc>,
}
