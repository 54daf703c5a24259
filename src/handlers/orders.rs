use actix_web::{web, HttpResponse};
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    default_limit, default_page, double_option, event_stream, money_string, parse_decimal,
    CreatedResponse,
};
use crate::domain::customer::{Address, CustomerSummary};
use crate::domain::order::{
    LineItemView, NewOrder, Note, OrderPatch, OrderQuery, OrderSummary, OrderView, PaymentMethod,
};
use crate::domain::totals::OrderTotals;
use crate::domain::Pagination;
use crate::errors::AppError;
use crate::realtime::Scope;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Defaults to the first configured order status.
    pub status: Option<String>,
    #[serde(default)]
    pub urgent: bool,
    pub customer_id: Option<Uuid>,
    #[schema(value_type = Option<String>, example = "card")]
    pub payment_method: Option<PaymentMethod>,
    /// Decimal percentage as a string, e.g. "10". Defaults to 0.
    pub discount_percent: Option<String>,
}

/// Partial order update. Omitted fields are left alone; `null` clears a
/// nullable field.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub urgent: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub customer_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub pickup_address_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub delivery_address_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub payment_method: Option<Option<PaymentMethod>>,
    pub discount_percent: Option<String>,
}

impl UpdateOrderRequest {
    fn into_patch(self) -> Result<OrderPatch, AppError> {
        Ok(OrderPatch {
            status: self.status,
            urgent: self.urgent,
            customer_id: self.customer_id,
            pickup_address_id: self.pickup_address_id,
            delivery_address_id: self.delivery_address_id,
            payment_method: self.payment_method,
            discount_percent: self
                .discount_percent
                .as_deref()
                .map(|d| parse_decimal("discount_percent", d))
                .transpose()?,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddLineRequest {
    pub service_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLineRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub status: Option<String>,
    pub urgent: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TotalsResponse {
    pub subtotal: String,
    pub discount_percent: String,
    pub discount_amount: String,
    pub total: String,
}

impl From<&OrderTotals> for TotalsResponse {
    fn from(t: &OrderTotals) -> Self {
        Self {
            subtotal: money_string(&t.subtotal),
            discount_percent: t.discount_percent.to_string(),
            discount_amount: money_string(&t.discount_amount),
            total: money_string(&t.total),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerSummaryResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<CustomerSummary> for CustomerSummaryResponse {
    fn from(c: CustomerSummary) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderAddressResponse {
    pub id: Uuid,
    pub address: String,
    pub details: Option<String>,
}

impl From<Address> for OrderAddressResponse {
    fn from(a: Address) -> Self {
        Self {
            id: a.id,
            address: a.address,
            details: a.details,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LineItemResponse {
    pub id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub subtotal: String,
}

impl From<LineItemView> for LineItemResponse {
    fn from(l: LineItemView) -> Self {
        Self {
            id: l.id,
            service_id: l.service_id,
            service_name: l.service_name,
            quantity: l.quantity,
            unit_price: money_string(&l.unit_price),
            subtotal: money_string(&l.subtotal),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteResponse {
    pub title: String,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(n: Note) -> Self {
        Self {
            title: n.title,
            note: n.note,
            timestamp: n.timestamp,
        }
    }
}

fn notes_response(notes: Vec<Note>) -> Vec<NoteResponse> {
    notes.into_iter().map(NoteResponse::from).collect()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub status: String,
    pub urgent: bool,
    #[schema(value_type = Option<String>)]
    pub payment_method: Option<PaymentMethod>,
    pub customer: Option<CustomerSummaryResponse>,
    pub pickup_address: Option<OrderAddressResponse>,
    pub delivery_address: Option<OrderAddressResponse>,
    pub lines: Vec<LineItemResponse>,
    pub notes: Vec<NoteResponse>,
    pub totals: TotalsResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderView> for OrderResponse {
    fn from(v: OrderView) -> Self {
        let totals = TotalsResponse::from(&v.totals);
        Self {
            id: v.order.id,
            status: v.order.status,
            urgent: v.order.urgent,
            payment_method: v.order.payment_method,
            customer: v.customer.map(Into::into),
            pickup_address: v.pickup_address.map(Into::into),
            delivery_address: v.delivery_address.map(Into::into),
            lines: v.lines.into_iter().map(Into::into).collect(),
            notes: notes_response(v.order.notes),
            totals,
            created_at: v.order.created_at,
            updated_at: v.order.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummaryResponse {
    pub id: Uuid,
    pub status: String,
    pub urgent: bool,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub total: String,
    pub created_at: DateTime<Utc>,
}

impl From<OrderSummary> for OrderSummaryResponse {
    fn from(o: OrderSummary) -> Self {
        Self {
            id: o.id,
            status: o.status,
            urgent: o.urgent,
            customer_id: o.customer_id,
            customer_name: o.customer_name,
            total: money_string(&o.total),
            created_at: o.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderSummaryResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = CreatedResponse),
        (status = 400, description = "Unknown status or customer, or invalid discount"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let order = NewOrder {
        status: body.status,
        urgent: body.urgent,
        customer_id: body.customer_id,
        payment_method: body.payment_method,
        discount_percent: match body.discount_percent.as_deref() {
            Some(d) => parse_decimal("discount_percent", d)?,
            None => BigDecimal::zero(),
        },
    };

    let id = web::block(move || state.orders.create_order(order)).await??;
    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// GET /orders/{id}
///
/// Returns the whole order aggregate: customer, addresses, lines, notes and
/// totals.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let view = web::block(move || state.orders.get_order(id)).await??;

    match view {
        Some(view) => Ok(HttpResponse::Ok().json(OrderResponse::from(view))),
        None => Err(AppError::NotFound),
    }
}

/// GET /orders
///
/// Newest first. `search` matches the customer's name, email or phone,
/// ignoring case and accents.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("status" = Option<String>, Query, description = "Only orders in this status"),
        ("urgent" = Option<bool>, Query, description = "Filter on the urgent flag"),
        ("search" = Option<String>, Query, description = "Customer search text"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let query = OrderQuery {
        pagination: Pagination::new(params.page, params.limit),
        status: params.status,
        urgent: params.urgent,
        search: params.search,
    };
    let page = query.pagination;

    let result = web::block(move || state.orders.list_orders(&query)).await??;
    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page: page.page,
        limit: page.limit,
    }))
}

/// PATCH /orders/{id}
#[utoipa::path(
    patch,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 204, description = "Order updated"),
        (status = 400, description = "Invalid field value"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let patch = body.into_inner().into_patch()?;

    web::block(move || state.orders.update_order(id, patch)).await??;
    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /orders/{id}
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 204, description = "Order deleted with its lines"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.orders.delete_order(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /orders/{id}/lines
#[utoipa::path(
    post,
    path = "/orders/{id}/lines",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = AddLineRequest,
    responses(
        (status = 201, description = "Line added, totals recomputed", body = CreatedResponse),
        (status = 400, description = "Unknown service or quantity below 1"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn add_line(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<AddLineRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let AddLineRequest {
        service_id,
        quantity,
    } = body.into_inner();

    let id = web::block(move || state.orders.add_line(order_id, service_id, quantity)).await??;
    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// PATCH /orders/{id}/lines/{line_id}
#[utoipa::path(
    patch,
    path = "/orders/{id}/lines/{line_id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("line_id" = Uuid, Path, description = "Line item UUID"),
    ),
    request_body = UpdateLineRequest,
    responses(
        (status = 204, description = "Quantity changed, totals recomputed"),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "Order or line not found"),
    ),
    tag = "orders"
)]
pub async fn update_line(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdateLineRequest>,
) -> Result<HttpResponse, AppError> {
    let (order_id, line_id) = path.into_inner();
    let quantity = body.quantity;

    web::block(move || state.orders.update_line_quantity(order_id, line_id, quantity)).await??;
    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /orders/{id}/lines/{line_id}
#[utoipa::path(
    delete,
    path = "/orders/{id}/lines/{line_id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("line_id" = Uuid, Path, description = "Line item UUID"),
    ),
    responses(
        (status = 204, description = "Line removed, totals recomputed"),
        (status = 404, description = "Order or line not found"),
    ),
    tag = "orders"
)]
pub async fn delete_line(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (order_id, line_id) = path.into_inner();
    web::block(move || state.orders.remove_line(order_id, line_id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /orders/{id}/notes
#[utoipa::path(
    post,
    path = "/orders/{id}/notes",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = AddNoteRequest,
    responses(
        (status = 201, description = "Note appended; returns all notes", body = [NoteResponse]),
        (status = 400, description = "Empty note"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn add_note(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<AddNoteRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let AddNoteRequest { title, note } = body.into_inner();

    let notes = web::block(move || state.orders.add_note(order_id, &title, &note)).await??;
    Ok(HttpResponse::Created().json(notes_response(notes)))
}

/// DELETE /orders/{id}/notes/{index}
#[utoipa::path(
    delete,
    path = "/orders/{id}/notes/{index}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("index" = usize, Path, description = "Zero-based position of the note"),
    ),
    responses(
        (status = 200, description = "Note removed; returns the remaining notes", body = [NoteResponse]),
        (status = 404, description = "Order or note not found"),
    ),
    tag = "orders"
)]
pub async fn delete_note(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, usize)>,
) -> Result<HttpResponse, AppError> {
    let (order_id, index) = path.into_inner();
    let notes = web::block(move || state.orders.remove_note(order_id, index)).await??;
    Ok(HttpResponse::Ok().json(notes_response(notes)))
}

/// GET /orders/{id}/totals
///
/// Stands in for the `get_order_totals` procedure.
#[utoipa::path(
    get,
    path = "/orders/{id}/totals",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Totals from the current lines and discount", body = TotalsResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order_totals(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let totals = web::block(move || state.orders.order_totals(id)).await??;
    Ok(HttpResponse::Ok().json(TotalsResponse::from(&totals)))
}

/// PUT /orders/{id}/autosave
///
/// Queues the patch and answers immediately. Patches for the same order are
/// merged and written once the form has been quiet for the debounce
/// interval; a failed write is logged and dropped.
#[utoipa::path(
    put,
    path = "/orders/{id}/autosave",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 202, description = "Patch queued"),
        (status = 400, description = "Malformed field value"),
    ),
    tag = "orders"
)]
pub async fn autosave_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let patch = body.into_inner().into_patch()?;

    state.autosave.submit(id, patch);
    Ok(HttpResponse::Accepted().json(serde_json::json!({
        "debounce_ms": debounce_millis(state.autosave.delay())
    })))
}

fn debounce_millis(delay: std::time::Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// GET /orders/{id}/events
///
/// Server-Sent Events for the order row and its line items.
#[utoipa::path(
    get,
    path = "/orders/{id}/events",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "text/event-stream of change events"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn order_events(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let orders = state.orders.clone();
    if web::block(move || orders.get_order(id)).await??.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(event_stream(&state.feed, Scope::Order(id)))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn update_request_distinguishes_null_from_missing() {
        let body: UpdateOrderRequest = serde_json::from_str(
            r#"{"customer_id": null, "payment_method": "bank_transfer", "discount_percent": "15"}"#,
        )
        .expect("json");
        let patch = body.into_patch().expect("patch");

        assert_eq!(patch.customer_id, Some(None));
        assert_eq!(patch.pickup_address_id, None);
        assert_eq!(patch.payment_method, Some(Some(PaymentMethod::BankTransfer)));
        assert_eq!(patch.discount_percent, Some(BigDecimal::from(15)));
        assert_eq!(patch.status, None);
    }

    #[test]
    fn malformed_discount_is_a_bad_request() {
        let body = UpdateOrderRequest {
            discount_percent: Some("dieci".into()),
            ..Default::default()
        };
        assert!(matches!(body.into_patch(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn totals_are_rendered_with_cents() {
        let totals = OrderTotals {
            subtotal: BigDecimal::from_str("32").expect("dec"),
            discount_percent: BigDecimal::from(10),
            discount_amount: BigDecimal::from_str("3.2").expect("dec"),
            total: BigDecimal::from_str("28.8").expect("dec"),
        };
        let json = serde_json::to_value(TotalsResponse::from(&totals)).expect("json");
        assert_eq!(json["subtotal"], "32.00");
        assert_eq!(json["discount_amount"], "3.20");
        assert_eq!(json["total"], "28.80");
    }

    #[test]
    fn list_params_default_paging() {
        let params = web::Query::<ListOrdersParams>::from_query("urgent=true&search=rossi")
            .expect("query")
            .into_inner();
        assert_eq!((params.page, params.limit), (1, 20));
        assert_eq!(params.urgent, Some(true));
        assert_eq!(params.search.as_deref(), Some("rossi"));
    }

    #[test]
    fn debounce_millis_saturates() {
        use std::time::Duration;

        assert_eq!(debounce_millis(Duration::from_millis(800)), 800);
        assert_eq!(debounce_millis(Duration::MAX), u64::MAX);
    }
}
