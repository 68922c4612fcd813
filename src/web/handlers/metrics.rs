use salvo::prelude::*;

use crate::web::metrics::format_prometheus;
use crate::web::{PanelState, render_error};

#[handler]
pub async fn metrics(depot: &mut Depot, res: &mut Response) {
    let Ok(state) = depot.obtain::<PanelState>() else {
        render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "panel state missing");
        return;
    };

    res.render(Text::Plain(format_prometheus(
        state.started_at.elapsed().as_secs(),
    )));
}
