use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{double_option, parse_decimal, CreatedResponse};
use crate::domain::settings::{
    Discount, DiscountPatch, MoveDirection, NewDiscount, NewOrderStatus, OrderStatus,
    OrderStatusPatch,
};
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDiscountRequest {
    pub name: String,
    /// Decimal percentage as a string, e.g. "10".
    pub percentage: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDiscountRequest {
    pub name: Option<String>,
    pub percentage: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscountResponse {
    pub id: Uuid,
    pub name: String,
    pub percentage: String,
    pub created_at: DateTime<Utc>,
}

impl From<Discount> for DiscountResponse {
    fn from(d: Discount) -> Self {
        Self {
            id: d.id,
            name: d.name,
            percentage: d.percentage.to_string(),
            created_at: d.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStatusRequest {
    pub name: String,
    #[schema(example = "#22c55e")]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub color: Option<Option<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveStatusRequest {
    #[schema(value_type = String, example = "up")]
    pub direction: MoveDirection,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl From<OrderStatus> for StatusResponse {
    fn from(s: OrderStatus) -> Self {
        Self {
            id: s.id,
            name: s.name,
            color: s.color,
            position: s.position,
            created_at: s.created_at,
        }
    }
}

fn statuses_response(statuses: Vec<OrderStatus>) -> Vec<StatusResponse> {
    statuses.into_iter().map(Into::into).collect()
}

// ── Discounts ────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/discounts",
    responses((status = 200, description = "Discount presets by percentage", body = [DiscountResponse])),
    tag = "settings"
)]
pub async fn list_discounts(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let discounts = web::block(move || state.settings.discounts()).await??;
    let body: Vec<DiscountResponse> = discounts.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/discounts",
    request_body = CreateDiscountRequest,
    responses(
        (status = 201, description = "Discount created", body = CreatedResponse),
        (status = 400, description = "Percentage outside 0..=100"),
    ),
    tag = "settings"
)]
pub async fn create_discount(
    state: web::Data<AppState>,
    body: web::Json<CreateDiscountRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let discount = NewDiscount {
        percentage: parse_decimal("percentage", &body.percentage)?,
        name: body.name,
    };
    let id = web::block(move || state.settings.create_discount(discount)).await??;
    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

#[utoipa::path(
    patch,
    path = "/discounts/{id}",
    params(("id" = Uuid, Path, description = "Discount UUID")),
    request_body = UpdateDiscountRequest,
    responses(
        (status = 200, description = "Updated discount", body = DiscountResponse),
        (status = 400, description = "Percentage outside 0..=100"),
        (status = 404, description = "Discount not found"),
    ),
    tag = "settings"
)]
pub async fn update_discount(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateDiscountRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let patch = DiscountPatch {
        percentage: body
            .percentage
            .as_deref()
            .map(|p| parse_decimal("percentage", p))
            .transpose()?,
        name: body.name,
    };
    let discount = web::block(move || state.settings.update_discount(id, patch)).await??;
    Ok(HttpResponse::Ok().json(DiscountResponse::from(discount)))
}

#[utoipa::path(
    delete,
    path = "/discounts/{id}",
    params(("id" = Uuid, Path, description = "Discount UUID")),
    responses(
        (status = 204, description = "Discount deleted"),
        (status = 404, description = "Discount not found"),
    ),
    tag = "settings"
)]
pub async fn delete_discount(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.settings.delete_discount(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

// ── Order statuses ───────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/order-statuses",
    responses((status = 200, description = "Statuses in display order", body = [StatusResponse])),
    tag = "settings"
)]
pub async fn list_statuses(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let statuses = web::block(move || state.settings.statuses()).await??;
    Ok(HttpResponse::Ok().json(statuses_response(statuses)))
}

#[utoipa::path(
    post,
    path = "/order-statuses",
    request_body = CreateStatusRequest,
    responses(
        (status = 201, description = "Status appended after the last one", body = CreatedResponse),
        (status = 400, description = "Empty name"),
        (status = 409, description = "Name already used"),
    ),
    tag = "settings"
)]
pub async fn create_status(
    state: web::Data<AppState>,
    body: web::Json<CreateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let CreateStatusRequest { name, color } = body.into_inner();
    let id =
        web::block(move || state.settings.create_status(NewOrderStatus { name, color })).await??;
    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

#[utoipa::path(
    patch,
    path = "/order-statuses/{id}",
    params(("id" = Uuid, Path, description = "Status UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated status", body = StatusResponse),
        (status = 404, description = "Status not found"),
        (status = 409, description = "Name already used"),
    ),
    tag = "settings"
)]
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let UpdateStatusRequest { name, color } = body.into_inner();
    let status =
        web::block(move || state.settings.update_status(id, OrderStatusPatch { name, color }))
            .await??;
    Ok(HttpResponse::Ok().json(StatusResponse::from(status)))
}

#[utoipa::path(
    delete,
    path = "/order-statuses/{id}",
    params(("id" = Uuid, Path, description = "Status UUID")),
    responses(
        (status = 204, description = "Status deleted"),
        (status = 404, description = "Status not found"),
    ),
    tag = "settings"
)]
pub async fn delete_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.settings.delete_status(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /order-statuses/{id}/move
///
/// Swaps the status with its neighbour in one transaction. Moving the first
/// status up or the last one down changes nothing.
#[utoipa::path(
    post,
    path = "/order-statuses/{id}/move",
    params(("id" = Uuid, Path, description = "Status UUID")),
    request_body = MoveStatusRequest,
    responses(
        (status = 200, description = "Statuses in their new order", body = [StatusResponse]),
        (status = 404, description = "Status not found"),
    ),
    tag = "settings"
)]
pub async fn move_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<MoveStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let direction = body.direction;
    let statuses = web::block(move || state.settings.move_status(id, direction)).await??;
    Ok(HttpResponse::Ok().json(statuses_response(statuses)))
}
