//! Diesel table definitions for the identity store.
//!
//! Must match `backend/migrations`. Regenerate with `diesel print-schema`
//! after changing a migration.

diesel::table! {
    /// DNS domains; `name` is globally unique.
    domains (id) {
        id -> Uuid,
        name -> Text,
        comment -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Hosts; `(domain_id, name)` is unique.
    hosts (id) {
        id -> Uuid,
        domain_id -> Uuid,
        name -> Text,
        comment -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Key-holding users; `(host_id, name)` is unique.
    users (id) {
        id -> Uuid,
        host_id -> Uuid,
        name -> Text,
        pub_key -> Text,
        comment -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Authorization edges; `(owner_id, authed_user_id)` is unique and `id`
    /// increases with insertion order.
    authorized_keys (id) {
        id -> Int8,
        owner_id -> Uuid,
        authed_user_id -> Uuid,
        options -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(hosts -> domains (domain_id));
diesel::joinable!(users -> hosts (host_id));

diesel::allow_tables_to_appear_in_same_query!(domains, hosts, users, authorized_keys);
