use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::event_stream;
use crate::realtime::{Scope, Table};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EventsParams {
    pub table: Option<Table>,
}

impl EventsParams {
    fn scope(&self) -> Scope {
        self.table.map_or(Scope::All, Scope::Table)
    }
}

/// GET /events
///
/// Server-Sent Events for every write, or for one table with `?table=`.
/// List screens use it to refresh.
#[utoipa::path(
    get,
    path = "/events",
    params(("table" = Option<String>, Query, description = "Table name, e.g. `orders` or `customers`")),
    responses((status = 200, description = "text/event-stream of change events")),
    tag = "events"
)]
pub async fn all_events(
    state: web::Data<AppState>,
    query: web::Query<EventsParams>,
) -> HttpResponse {
    event_stream(&state.feed, query.scope())
}
