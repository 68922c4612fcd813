use serde::Serialize;

use crate::db::WatchItem;
use crate::discord::DiscordChannel;

pub const REDDIT_TEMPLATE: &str = "cp_reddit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            message: message.into(),
        }
    }
}

/// Values handed to the `cp_reddit` template.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateData {
    pub template: &'static str,
    pub visible_url: String,
    pub guild_id: String,
    pub channels: Vec<DiscordChannel>,
    pub reddit_config: Vec<WatchItem>,
    pub alerts: Vec<Alert>,
}

impl TemplateData {
    pub fn new(
        cp_prefix: &str,
        guild_id: &str,
        channels: Vec<DiscordChannel>,
        reddit_config: Vec<WatchItem>,
    ) -> Self {
        Self {
            template: REDDIT_TEMPLATE,
            visible_url: format!("{}/{}/reddit/", cp_prefix.trim_end_matches('/'), guild_id),
            guild_id: guild_id.to_string(),
            channels,
            reddit_config,
            alerts: Vec::new(),
        }
    }

    pub fn add_alert(&mut self, alert: Alert) -> &mut Self {
        self.alerts.push(alert);
        self
    }

    pub fn with_alert(mut self, alert: Alert) -> Self {
        self.alerts.push(alert);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Alert, TemplateData};

    #[test]
    fn visible_url_points_at_guild_reddit_page() {
        let data = TemplateData::new("/cp/", "1234", Vec::new(), Vec::new());
        assert_eq!(data.visible_url, "/cp/1234/reddit/");
    }

    #[test]
    fn alerts_serialize_with_lowercase_kind() {
        let data = TemplateData::new("/cp", "1234", Vec::new(), Vec::new())
            .with_alert(Alert::error("Unknown id"));

        let value = serde_json::to_value(&data).expect("serialize");
        assert_eq!(value["template"], json!("cp_reddit"));
        assert_eq!(value["alerts"], json!([{ "kind": "error", "message": "Unknown id" }]));
    }
}
