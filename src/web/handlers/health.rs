use salvo::prelude::*;
use serde_json::json;

use crate::web::{PanelState, render_error};

#[handler]
pub async fn health_check(depot: &mut Depot, res: &mut Response) {
    let Ok(state) = depot.obtain::<PanelState>() else {
        render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "panel state missing");
        return;
    };

    res.render(Json(json!({
        "status": "ok",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    })));
}
