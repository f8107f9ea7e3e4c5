//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// User accounts table.
    ///
    /// Stores registered users together with their denormalised owned-entity
    /// reference arrays and the derived highest-ranked-count aggregate. The
    /// arrays mirror the `owner_id` columns on `rankings` and `boxes`; the
    /// repositories maintain both sides inside one transaction.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Human-readable display name (max 32 characters).
        display_name -> Varchar,
        /// Ids of rankings owned by this user, in no particular order.
        ranking_ids -> Array<Uuid>,
        /// Ids of boxes owned by this user, in no particular order.
        box_ids -> Array<Uuid>,
        /// Largest Pokémon count across this user's rankings.
        highest_ranked_count -> Int4,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Rankings table.
    ///
    /// One row per ranking. `(owner_id, title)` carries a unique index; the
    /// index is the commit-time backstop behind the in-transaction
    /// uniqueness probe.
    rankings (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning user; immutable after creation.
        owner_id -> Uuid,
        /// Title, unique per owner (max 100 characters).
        #[max_length = 100]
        title -> Varchar,
        /// Ranked Pokémon; array position is the rank.
        pokemon_ids -> Array<Uuid>,
        /// Embedded zone value objects.
        zones -> Jsonb,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Boxes table.
    ///
    /// One row per persisted box; the virtual default box is synthesized on
    /// read and never stored here. `(owner_id, name)` carries a unique
    /// index.
    boxes (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning user.
        owner_id -> Uuid,
        /// Name, unique per owner (max 100 characters).
        #[max_length = 100]
        name -> Varchar,
        /// Whether other users may see and favorite this box.
        is_public -> Bool,
        /// Unordered Pokémon membership.
        pokemon_ids -> Array<Uuid>,
        /// Monotone favorite counter.
        favorite_count -> Int8,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Pokémon catalog table.
    ///
    /// Read-only from this crate's perspective; administration happens in
    /// another subsystem.
    pokemon (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// National dex number.
        dex_number -> Int4,
        /// Species name.
        name -> Varchar,
    }
}

diesel::joinable!(rankings -> users (owner_id));
diesel::joinable!(boxes -> users (owner_id));

diesel::allow_tables_to_appear_in_same_query!(users, rankings, boxes, pokemon);
