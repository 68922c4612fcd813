use salvo::prelude::*;
use serde_json::json;
use tracing::error;

use crate::web::middleware::auth::ActiveGuild;
use crate::web::{PanelState, render_error};

pub const LIST_FAILED_MESSAGE: &str = "Failed retrieving audit log";

#[handler]
pub async fn list_log_entries(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let limit = req.query::<i64>("limit").unwrap_or(50).clamp(1, 500);

    let (Ok(state), Ok(guild)) = (depot.obtain::<PanelState>(), depot.obtain::<ActiveGuild>())
    else {
        render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "request context missing");
        return;
    };

    match state.audit_store.list_log_entries(&guild.id, limit).await {
        Ok(entries) => {
            res.render(Json(json!({
                "guild_id": guild.id,
                "entries": entries,
                "count": entries.len(),
                "limit": limit,
            })));
        }
        Err(err) => {
            error!(guild_id = %guild.id, error = %err, "failed listing audit log");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, LIST_FAILED_MESSAGE);
        }
    }
}
