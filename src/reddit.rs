use crate::db::WatchItem;

/// Logical key of a guild's watch list, used to tag log lines.
pub fn watch_config_key(guild_id: &str) -> String {
    format!("guild_subreddit_watch:{guild_id}")
}

pub fn find_watch_item(items: &[WatchItem], id: i32) -> Option<&WatchItem> {
    items.iter().find(|item| item.id == id)
}

/// Drops every item with `id`, keeping the rest in their original order.
pub fn remove_watch_item(items: Vec<WatchItem>, id: i32) -> Vec<WatchItem> {
    items.into_iter().filter(|item| item.id != id).collect()
}

/// Whether `submitted` names a different subreddit than `current`. Case does not count.
pub fn subreddit_changed(current: &str, submitted: &str) -> bool {
    current.trim().to_lowercase() != submitted.trim().to_lowercase()
}

pub fn normalize_subreddit(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn item(id: i32, subreddit: &str) -> WatchItem {
        WatchItem {
            id,
            subreddit: subreddit.to_string(),
            channel: "c1".to_string(),
            guild: "guild-1".to_string(),
        }
    }

    #[test]
    fn watch_config_key_is_guild_scoped() {
        assert_eq!(watch_config_key("1234"), "guild_subreddit_watch:1234");
    }

    #[test]
    fn find_watch_item_matches_on_id() {
        let items = vec![item(1, "funny"), item(3, "pics")];

        assert_eq!(find_watch_item(&items, 3).map(|i| i.subreddit.as_str()), Some("pics"));
        assert!(find_watch_item(&items, 2).is_none());
    }

    #[test]
    fn remove_watch_item_preserves_order_of_remaining_items() {
        let items = vec![item(1, "funny"), item(3, "pics"), item(4, "gifs"), item(9, "aww")];

        let remaining = remove_watch_item(items, 4);

        let ids: Vec<i32> = remaining.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3, 9]);
    }

    #[test]
    fn remove_watch_item_with_unknown_id_is_a_no_op() {
        let items = vec![item(1, "funny"), item(3, "pics")];

        assert_eq!(remove_watch_item(items.clone(), 5), items);
    }

    #[test_case("funny", "FUNNY", false ; "case only")]
    #[test_case("funny", "  funny ", false ; "surrounding whitespace")]
    #[test_case("funny", "pics", true ; "different name")]
    #[test_case("funny", "funny2", true ; "suffix")]
    fn subreddit_changed_ignores_case_and_padding(current: &str, submitted: &str, changed: bool) {
        assert_eq!(subreddit_changed(current, submitted), changed);
    }

    #[test]
    fn normalize_subreddit_trims_and_lowercases() {
        assert_eq!(normalize_subreddit("  RustLang \n"), "rustlang");
    }
}
