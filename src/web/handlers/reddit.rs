//! Reddit feed pages of the control panel.
//!
//! Each action works on the watch list loaded by
//! [`load_watch_config`](crate::web::middleware::watch_config::load_watch_config),
//! applies at most one change to the store and answers with the updated
//! `cp_reddit` template data.

use salvo::prelude::*;
use tracing::{error, info};

use crate::audit::log_entry;
use crate::db::{DatabaseError, NewWatchItem, WatchItem};
use crate::discord::DiscordUser;
use crate::reddit::{
    find_watch_item, normalize_subreddit, remove_watch_item, subreddit_changed, watch_config_key,
};
use crate::web::form::{WatchForm, invalid_form_message};
use crate::web::metrics::Metrics;
use crate::web::middleware::auth::ActiveGuild;
use crate::web::middleware::watch_config::WatchConfig;
use crate::web::template::{Alert, TemplateData};
use crate::web::{PanelState, render_error};

const UNKNOWN_ID: &str = "Unknown id";
const FAILED_SAVING: &str = "Failed saving item :'(";
const FAILED_REMOVING: &str = "Failed removing item :'(";

/// Everything a reddit handler needs about the current request.
pub struct CpContext<'a> {
    pub state: &'a PanelState,
    pub guild: &'a ActiveGuild,
    pub user: &'a DiscordUser,
}

impl<'a> CpContext<'a> {
    fn from_depot(depot: &'a Depot) -> Option<Self> {
        Some(Self {
            state: depot.obtain::<PanelState>().ok()?,
            guild: depot.obtain::<ActiveGuild>().ok()?,
            user: depot.obtain::<DiscordUser>().ok()?,
        })
    }

    fn template_data(&self, items: Vec<WatchItem>) -> TemplateData {
        TemplateData::new(
            &self.state.cp_prefix,
            &self.guild.id,
            self.guild.channels.clone(),
            items,
        )
    }

    fn store_error_alert(&self, err: &DatabaseError, fallback: &str, subreddit: &str) -> Alert {
        Metrics::store_failure();
        error!(
            guild_id = %self.guild.id,
            key = %watch_config_key(&self.guild.id),
            subreddit = %subreddit,
            error = %err,
            "{}",
            fallback
        );
        match err {
            DatabaseError::Conflict(_) => Alert::error(format!("Already watching /r/{subreddit}")),
            _ => Alert::error(fallback),
        }
    }
}

pub fn handle_list(cx: &CpContext<'_>, items: Vec<WatchItem>) -> TemplateData {
    cx.template_data(items)
}

pub async fn handle_new(cx: &CpContext<'_>, items: Vec<WatchItem>, form: WatchForm) -> TemplateData {
    let mut data = cx.template_data(items);
    let limits = &cx.state.limits;

    if let Err(errors) = form.validate(&cx.guild.channels, limits.max_subreddit_length, false) {
        Metrics::form_rejected();
        return data.with_alert(Alert::error(invalid_form_message(&errors)));
    }

    if data.reddit_config.len() >= limits.max_watch_items {
        return data.with_alert(Alert::error(format!(
            "Max {} items allowed",
            limits.max_watch_items
        )));
    }

    let new_item = NewWatchItem {
        guild: cx.guild.id.clone(),
        subreddit: form.subreddit.trim().to_string(),
        channel: form.channel.clone(),
    };

    let created = match cx.state.watch_store.create_watch_item(&new_item).await {
        Ok(created) => created,
        Err(e) => {
            let alert = cx.store_error_alert(&e, FAILED_SAVING, &new_item.subreddit);
            return data.with_alert(alert);
        }
    };

    Metrics::watch_item_created();
    info!(guild_id = %cx.guild.id, id = created.id, subreddit = %created.subreddit, "added reddit feed");
    data.add_alert(Alert::success(format!(
        "Successfully added subreddit feed for /r/{}",
        created.subreddit
    )));
    data.reddit_config.push(created);

    cx.state.audit.enqueue(log_entry(
        cx.user,
        &cx.guild.id,
        format!("Added reddit feed from /r/{}", form.subreddit),
    ));
    data
}

pub async fn handle_modify(
    cx: &CpContext<'_>,
    items: Vec<WatchItem>,
    form: WatchForm,
) -> TemplateData {
    let mut data = cx.template_data(items);

    if let Err(errors) =
        form.validate(&cx.guild.channels, cx.state.limits.max_subreddit_length, true)
    {
        Metrics::form_rejected();
        return data.with_alert(Alert::error(invalid_form_message(&errors)));
    }

    let Some(current) = form
        .id
        .and_then(|id| find_watch_item(&data.reddit_config, id))
        .cloned()
    else {
        return data.with_alert(Alert::error(UNKNOWN_ID));
    };

    let mut updated = current.clone();
    updated.channel = form.channel.clone();

    let target = if subreddit_changed(&current.subreddit, &form.subreddit) {
        normalize_subreddit(&form.subreddit)
    } else {
        current.subreddit.clone()
    };
    let result = if target == current.subreddit {
        cx.state.watch_store.save_watch_item(&updated).await
    } else {
        cx.state.watch_store.rename_watch_item(&updated, &target).await
    };

    if let Err(e) = result {
        let alert = cx.store_error_alert(&e, FAILED_SAVING, &target);
        return data.with_alert(alert);
    }
    updated.subreddit = target;

    if let Some(slot) = data
        .reddit_config
        .iter_mut()
        .find(|item| item.id == updated.id)
    {
        *slot = updated.clone();
    }

    Metrics::watch_item_updated();
    info!(guild_id = %cx.guild.id, id = updated.id, subreddit = %updated.subreddit, "updated reddit feed");
    data.add_alert(Alert::success("Successfully updated reddit feed! :D"));

    cx.state
        .audit
        .record(log_entry(
            cx.user,
            &cx.guild.id,
            format!("Modified a feed to /r/{}", form.subreddit),
        ))
        .await;
    data
}

pub async fn handle_remove(cx: &CpContext<'_>, items: Vec<WatchItem>, raw_id: &str) -> TemplateData {
    let mut data = cx.template_data(items);

    let id = match raw_id.parse::<i32>() {
        Ok(id) => id,
        Err(e) => return data.with_alert(Alert::error(format!("Failed parsing id: {e}"))),
    };

    let Some(item) = find_watch_item(&data.reddit_config, id).cloned() else {
        return data.with_alert(Alert::error(UNKNOWN_ID));
    };

    if let Err(e) = cx.state.watch_store.delete_watch_item(&item).await {
        let alert = cx.store_error_alert(&e, FAILED_REMOVING, &item.subreddit);
        return data.with_alert(alert);
    }

    Metrics::watch_item_deleted();
    info!(guild_id = %cx.guild.id, id = item.id, subreddit = %item.subreddit, "removed reddit feed");
    data.add_alert(Alert::success(format!(
        "Successfully removed subreddit feed for /r/{} :')",
        item.subreddit
    )));
    data.reddit_config = remove_watch_item(std::mem::take(&mut data.reddit_config), id);

    cx.state.audit.enqueue(log_entry(
        cx.user,
        &cx.guild.id,
        format!("Removed feed from /r/{}", item.subreddit),
    ));
    data
}

fn current_config(depot: &Depot) -> Vec<WatchItem> {
    depot
        .obtain::<WatchConfig>()
        .map(|config| config.0.clone())
        .unwrap_or_default()
}

fn missing_context(res: &mut Response) {
    render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "request context missing");
}

#[handler]
pub async fn list_feeds(depot: &mut Depot, res: &mut Response) {
    let Some(cx) = CpContext::from_depot(depot) else {
        return missing_context(res);
    };
    res.render(Json(handle_list(&cx, current_config(depot))));
}

#[handler]
pub async fn create_feed(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let form = req.parse_form::<WatchForm>().await;
    let Some(cx) = CpContext::from_depot(depot) else {
        return missing_context(res);
    };
    let items = current_config(depot);

    let data = match form {
        Ok(form) => handle_new(&cx, items, form).await,
        Err(e) => {
            Metrics::form_rejected();
            cx.template_data(items)
                .with_alert(Alert::error(format!("Invalid form: {e}")))
        }
    };
    res.render(Json(data));
}

#[handler]
pub async fn update_feed(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let form = req.parse_form::<WatchForm>().await;
    let Some(cx) = CpContext::from_depot(depot) else {
        return missing_context(res);
    };
    let items = current_config(depot);

    let data = match form {
        Ok(form) => handle_modify(&cx, items, form).await,
        Err(e) => {
            Metrics::form_rejected();
            cx.template_data(items)
                .with_alert(Alert::error(format!("Invalid form: {e}")))
        }
    };
    res.render(Json(data));
}

#[handler]
pub async fn delete_feed(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let raw_id = req.param::<String>("id").unwrap_or_default();
    let Some(cx) = CpContext::from_depot(depot) else {
        return missing_context(res);
    };
    let items = current_config(depot);

    res.render(Json(handle_remove(&cx, items, &raw_id).await));
}
