use serde::Deserialize;
use thiserror::Error;

use crate::discord::DiscordChannel;

/// Fields posted by the reddit feed forms.
///
/// `subreddit` is kept exactly as submitted; handlers trim it where needed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchForm {
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("subreddit must be between 1 and {max} characters")]
    SubredditLength { max: usize },
    #[error("channel {0} is not a channel in this server")]
    UnknownChannel(String),
    #[error("id is required")]
    MissingId,
}

impl WatchForm {
    /// Checks every constraint and reports all that failed.
    pub fn validate(
        &self,
        channels: &[DiscordChannel],
        max_subreddit_length: usize,
        require_id: bool,
    ) -> Result<(), Vec<FormError>> {
        let mut errors = Vec::new();

        let length = self.subreddit.trim().chars().count();
        if length == 0 || length > max_subreddit_length {
            errors.push(FormError::SubredditLength {
                max: max_subreddit_length,
            });
        }

        if !self.channel.is_empty() && !channels.iter().any(|channel| channel.id == self.channel) {
            errors.push(FormError::UnknownChannel(self.channel.clone()));
        }

        if require_id && self.id.is_none() {
            errors.push(FormError::MissingId);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

pub fn invalid_form_message(errors: &[FormError]) -> String {
    let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!("Invalid form: {}", details.join("; "))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::{FormError, WatchForm, invalid_form_message};
    use crate::discord::DiscordChannel;

    fn channels() -> Vec<DiscordChannel> {
        vec![DiscordChannel {
            id: "c1".to_string(),
            name: "general".to_string(),
            guild_id: "1234".to_string(),
        }]
    }

    fn form(subreddit: &str, channel: &str, id: Option<i32>) -> WatchForm {
        WatchForm {
            subreddit: subreddit.to_string(),
            channel: channel.to_string(),
            id,
        }
    }

    #[test_case("gifs", "c1" ; "known channel")]
    #[test_case(" gifs ", "" ; "empty channel")]
    fn valid_forms_pass(subreddit: &str, channel: &str) {
        assert_eq!(form(subreddit, channel, None).validate(&channels(), 100, false), Ok(()));
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "whitespace only")]
    fn blank_subreddit_is_rejected(subreddit: &str) {
        let errors = form(subreddit, "c1", None)
            .validate(&channels(), 100, false)
            .expect_err("blank subreddit");
        assert_eq!(errors, vec![FormError::SubredditLength { max: 100 }]);
    }

    #[test]
    fn overlong_subreddit_is_rejected() {
        let long = "a".repeat(101);
        let errors = form(&long, "c1", None)
            .validate(&channels(), 100, false)
            .expect_err("overlong subreddit");
        assert_eq!(errors, vec![FormError::SubredditLength { max: 100 }]);
    }

    #[test]
    fn every_failed_constraint_is_reported() {
        let errors = form("", "c404", None)
            .validate(&channels(), 100, true)
            .expect_err("invalid form");

        assert_eq!(
            errors,
            vec![
                FormError::SubredditLength { max: 100 },
                FormError::UnknownChannel("c404".to_string()),
                FormError::MissingId,
            ]
        );
        assert_eq!(
            invalid_form_message(&errors),
            "Invalid form: subreddit must be between 1 and 100 characters; \
             channel c404 is not a channel in this server; id is required"
        );
    }
}
