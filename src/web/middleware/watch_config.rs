use salvo::prelude::*;
use tracing::error;

use crate::db::WatchItem;
use crate::reddit::watch_config_key;
use crate::web::metrics::Metrics;
use crate::web::middleware::auth::ActiveGuild;
use crate::web::template::{Alert, TemplateData};
use crate::web::{PanelState, render_error};

pub const LOAD_FAILED_MESSAGE: &str = "Failed retrieving config, contact support";

/// The active guild's watch list as loaded at the start of the request.
#[derive(Debug, Clone, Default)]
pub struct WatchConfig(pub Vec<WatchItem>);

#[handler]
pub async fn load_watch_config(depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
    let (Ok(state), Ok(guild)) = (
        depot.obtain::<PanelState>().cloned(),
        depot.obtain::<ActiveGuild>().cloned(),
    ) else {
        render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "request context missing");
        ctrl.skip_rest();
        return;
    };

    match state.watch_store.list_watch_items(&guild.id).await {
        Ok(items) => {
            depot.inject(WatchConfig(items));
        }
        Err(e) => {
            Metrics::store_failure();
            error!(
                guild_id = %guild.id,
                key = %watch_config_key(&guild.id),
                error = %e,
                "failed retrieving watch config"
            );
            let data = TemplateData::new(&state.cp_prefix, &guild.id, guild.channels, Vec::new())
                .with_alert(Alert::error(LOAD_FAILED_MESSAGE));
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            res.render(Json(data));
            ctrl.skip_rest();
        }
    }
}
