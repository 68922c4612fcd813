use salvo::prelude::*;
use secrecy::ExposeSecret;
use tracing::{debug, error, warn};

use crate::discord::{DiscordChannel, DiscordUser};
use crate::web::handlers::{
    health::health_check,
    logs::list_log_entries,
    metrics::metrics,
    reddit::{create_feed, delete_feed, list_feeds, update_feed},
};
use crate::web::middleware::watch_config::load_watch_config;
use crate::web::{PanelState, render_error};

pub const USER_ID_HEADER: &str = "x-discord-user-id";
pub const USER_NAME_HEADER: &str = "x-discord-user-name";

/// The guild a control-panel request operates on.
#[derive(Debug, Clone)]
pub struct ActiveGuild {
    pub id: String,
    pub channels: Vec<DiscordChannel>,
}

pub fn create_router(state: PanelState) -> Router {
    Router::new()
        .hoop(InjectState(state))
        .push(Router::with_path("health").get(health_check))
        .push(Router::with_path("metrics").get(metrics))
        .push(
            Router::with_path("cp/{guild}")
                .hoop(require_guild_access)
                .push(Router::with_path("logs").get(list_log_entries))
                .push(
                    Router::with_path("reddit")
                        .hoop(load_watch_config)
                        .get(list_feeds)
                        .post(create_feed)
                        .push(Router::with_path("{id}/update").post(update_feed))
                        .push(Router::with_path("{id}/delete").post(delete_feed)),
                ),
        )
}

struct InjectState(PanelState);

#[handler]
impl InjectState {
    async fn handle(&self, depot: &mut Depot) {
        depot.inject(self.0.clone());
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    req.header::<String>("authorization")
        .and_then(|value| value.strip_prefix("Bearer ").map(str::to_string))
}

/// Compares without short-circuiting so response timing does not leak a matching prefix.
fn tokens_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    if given.len() != expected.len() {
        return false;
    }
    given
        .iter()
        .zip(expected)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Authenticates the caller and loads the guild's channels.
///
/// The host frontend owns sessions; it forwards the acting Discord user in
/// `x-discord-user-id` / `x-discord-user-name` and proves itself with the
/// shared access token.
#[handler]
pub async fn require_guild_access(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Ok(state) = depot.obtain::<PanelState>().cloned() else {
        render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "panel state missing");
        ctrl.skip_rest();
        return;
    };

    let authorized = bearer_token(req)
        .is_some_and(|token| tokens_match(&token, state.access_token.expose_secret()));
    if !authorized {
        render_error(res, StatusCode::UNAUTHORIZED, "missing or invalid access token");
        ctrl.skip_rest();
        return;
    }

    let Some(user_id) = req
        .header::<String>(USER_ID_HEADER)
        .filter(|id| !id.trim().is_empty())
    else {
        render_error(res, StatusCode::UNAUTHORIZED, "missing acting user");
        ctrl.skip_rest();
        return;
    };
    let username = req
        .header::<String>(USER_NAME_HEADER)
        .unwrap_or_else(|| user_id.clone());

    let guild_id = req.param::<String>("guild").unwrap_or_default();

    match state.directory.is_member(&guild_id, &user_id).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(guild_id = %guild_id, user_id = %user_id, "control panel access denied");
            render_error(res, StatusCode::FORBIDDEN, "not a member of this guild");
            ctrl.skip_rest();
            return;
        }
        Err(e) => {
            error!(guild_id = %guild_id, user_id = %user_id, error = %e, "membership check failed");
            render_error(res, StatusCode::BAD_GATEWAY, "failed checking guild membership");
            ctrl.skip_rest();
            return;
        }
    }

    let channels = match state.directory.guild_channels(&guild_id).await {
        Ok(channels) => channels,
        Err(e) => {
            error!(guild_id = %guild_id, error = %e, "failed retrieving guild channels");
            render_error(res, StatusCode::BAD_GATEWAY, "failed retrieving guild channels");
            ctrl.skip_rest();
            return;
        }
    };

    debug!(guild_id = %guild_id, user_id = %user_id, "control panel access granted");
    depot.inject(ActiveGuild {
        id: guild_id,
        channels,
    });
    depot.inject(DiscordUser {
        id: user_id,
        username,
    });
}
