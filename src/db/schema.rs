diesel::table! {
    subreddit_watch_items (id) {
        id -> Integer,
        guild_id -> Text,
        item_id -> Integer,
        subreddit -> Text,
        channel_id -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    cp_log_entries (id) {
        id -> BigInt,
        guild_id -> Text,
        actor_id -> Text,
        actor_name -> Text,
        action -> Text,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(subreddit_watch_items, cp_log_entries);
