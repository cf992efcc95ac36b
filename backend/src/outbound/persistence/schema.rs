//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts with their points balance.
    users (id) {
        id -> Uuid,
        /// Unique lowercase login handle.
        username -> Varchar,
        display_name -> Varchar,
        /// `user` or `admin`.
        role -> Varchar,
        /// Non-negative balance, guarded by a CHECK constraint.
        points -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Garment listings.
    items (id) {
        id -> Uuid,
        owner_id -> Uuid,
        title -> Varchar,
        description -> Varchar,
        category -> Varchar,
        garment_type -> Varchar,
        size -> Varchar,
        condition -> Varchar,
        points_value -> Int4,
        status -> Varchar,
        is_available -> Bool,
        brand -> Nullable<Varchar>,
        colour -> Nullable<Varchar>,
        material -> Nullable<Varchar>,
        location -> Nullable<Varchar>,
        tags -> Array<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Swap proposals. A partial unique index allows one pending request per
    /// requester and target item.
    swap_requests (id) {
        id -> Uuid,
        requester_id -> Uuid,
        item_requested_id -> Uuid,
        item_offered_id -> Nullable<Uuid>,
        points_offered -> Nullable<Int4>,
        swap_type -> Varchar,
        status -> Varchar,
        message -> Nullable<Varchar>,
        completed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(items -> users (owner_id));
diesel::joinable!(swap_requests -> users (requester_id));

diesel::allow_tables_to_appear_in_same_query!(items, swap_requests, users);
