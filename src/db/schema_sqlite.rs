// Mirrors schema.rs with SQLite-compatible types; timestamps are RFC 3339 text.

diesel::table! {
    subreddit_watch_items (id) {
        id -> Integer,
        guild_id -> Text,
        item_id -> Integer,
        subreddit -> Text,
        channel_id -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    cp_log_entries (id) {
        id -> Integer,
        guild_id -> Text,
        actor_id -> Text,
        actor_name -> Text,
        action -> Text,
        created_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(subreddit_watch_items, cp_log_entries);
