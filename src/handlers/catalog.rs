use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{double_option, money_string, parse_decimal, CreatedResponse};
use crate::domain::catalog::{
    Category, NewService, Service, ServicePatch, ServiceQuery, ServiceType,
};
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NamedResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for NamedResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            created_at: c.created_at,
        }
    }
}

impl From<ServiceType> for NamedResponse {
    fn from(t: ServiceType) -> Self {
        Self {
            id: t.id,
            name: t.name,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateServiceRequest {
    pub name: String,
    pub category_id: Option<Uuid>,
    pub service_type_id: Option<Uuid>,
    /// Decimal price as a string, e.g. "3.50".
    pub price: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub service_type_id: Option<Option<Uuid>>,
    pub price: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListServicesParams {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceResponse {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub service_type_id: Option<Uuid>,
    pub price: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Service> for ServiceResponse {
    fn from(s: Service) -> Self {
        Self {
            id: s.id,
            name: s.name,
            category_id: s.category_id,
            service_type_id: s.service_type_id,
            price: money_string(&s.price),
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

// ── Categories ───────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/catalog/categories",
    responses((status = 200, description = "Categories by name", body = [NamedResponse])),
    tag = "catalog"
)]
pub async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let categories = web::block(move || state.catalog.categories()).await??;
    let body: Vec<NamedResponse> = categories.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/catalog/categories",
    request_body = NameRequest,
    responses(
        (status = 201, description = "Category created", body = CreatedResponse),
        (status = 400, description = "Empty name"),
    ),
    tag = "catalog"
)]
pub async fn create_category(
    state: web::Data<AppState>,
    body: web::Json<NameRequest>,
) -> Result<HttpResponse, AppError> {
    let name = body.into_inner().name;
    let id = web::block(move || state.catalog.create_category(&name)).await??;
    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

#[utoipa::path(
    patch,
    path = "/catalog/categories/{id}",
    params(("id" = Uuid, Path, description = "Category UUID")),
    request_body = NameRequest,
    responses(
        (status = 204, description = "Category renamed"),
        (status = 404, description = "Category not found"),
    ),
    tag = "catalog"
)]
pub async fn rename_category(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<NameRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let name = body.into_inner().name;
    web::block(move || state.catalog.rename_category(id, &name)).await??;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/catalog/categories/{id}",
    params(("id" = Uuid, Path, description = "Category UUID")),
    responses(
        (status = 204, description = "Category deleted; its services become uncategorised"),
        (status = 404, description = "Category not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_category(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.catalog.delete_category(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

// ── Service types ────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/catalog/service-types",
    responses((status = 200, description = "Service types by name", body = [NamedResponse])),
    tag = "catalog"
)]
pub async fn list_service_types(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let types = web::block(move || state.catalog.service_types()).await??;
    let body: Vec<NamedResponse> = types.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/catalog/service-types",
    request_body = NameRequest,
    responses(
        (status = 201, description = "Service type created", body = CreatedResponse),
        (status = 400, description = "Empty name"),
    ),
    tag = "catalog"
)]
pub async fn create_service_type(
    state: web::Data<AppState>,
    body: web::Json<NameRequest>,
) -> Result<HttpResponse, AppError> {
    let name = body.into_inner().name;
    let id = web::block(move || state.catalog.create_service_type(&name)).await??;
    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

#[utoipa::path(
    delete,
    path = "/catalog/service-types/{id}",
    params(("id" = Uuid, Path, description = "Service type UUID")),
    responses(
        (status = 204, description = "Service type deleted"),
        (status = 404, description = "Service type not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_service_type(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.catalog.delete_service_type(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

// ── Services ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/catalog/services",
    params(
        ("category_id" = Option<Uuid>, Query, description = "Only services in this category"),
        ("search" = Option<String>, Query, description = "Name search, ignoring case and accents"),
    ),
    responses((status = 200, description = "Services by name", body = [ServiceResponse])),
    tag = "catalog"
)]
pub async fn list_services(
    state: web::Data<AppState>,
    query: web::Query<ListServicesParams>,
) -> Result<HttpResponse, AppError> {
    let ListServicesParams {
        category_id,
        search,
    } = query.into_inner();
    let query = ServiceQuery {
        category_id,
        search,
    };

    let services = web::block(move || state.catalog.list_services(&query)).await??;
    let body: Vec<ServiceResponse> = services.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/catalog/services/{id}",
    params(("id" = Uuid, Path, description = "Service UUID")),
    responses(
        (status = 200, description = "Service found", body = ServiceResponse),
        (status = 404, description = "Service not found"),
    ),
    tag = "catalog"
)]
pub async fn get_service(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    match web::block(move || state.catalog.get_service(id)).await?? {
        Some(service) => Ok(HttpResponse::Ok().json(ServiceResponse::from(service))),
        None => Err(AppError::NotFound),
    }
}

#[utoipa::path(
    post,
    path = "/catalog/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service created", body = CreatedResponse),
        (status = 400, description = "Empty name or negative price"),
        (status = 409, description = "Unknown category or service type"),
    ),
    tag = "catalog"
)]
pub async fn create_service(
    state: web::Data<AppState>,
    body: web::Json<CreateServiceRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let service = NewService {
        price: parse_decimal("price", &body.price)?,
        name: body.name,
        category_id: body.category_id,
        service_type_id: body.service_type_id,
    };

    let id = web::block(move || state.catalog.create_service(service)).await??;
    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

#[utoipa::path(
    patch,
    path = "/catalog/services/{id}",
    params(("id" = Uuid, Path, description = "Service UUID")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Updated service", body = ServiceResponse),
        (status = 400, description = "Empty name or negative price"),
        (status = 404, description = "Service not found"),
    ),
    tag = "catalog"
)]
pub async fn update_service(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateServiceRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let patch = ServicePatch {
        price: body
            .price
            .as_deref()
            .map(|p| parse_decimal("price", p))
            .transpose()?,
        name: body.name,
        category_id: body.category_id,
        service_type_id: body.service_type_id,
    };

    let service = web::block(move || state.catalog.update_service(id, patch)).await??;
    Ok(HttpResponse::Ok().json(ServiceResponse::from(service)))
}

#[utoipa::path(
    delete,
    path = "/catalog/services/{id}",
    params(("id" = Uuid, Path, description = "Service UUID")),
    responses(
        (status = 204, description = "Service deleted"),
        (status = 404, description = "Service not found"),
        (status = 409, description = "Service is used by order lines"),
    ),
    tag = "catalog"
)]
pub async fn delete_service(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.catalog.delete_service(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use chrono::Utc;

    use super::*;

    #[test]
    fn update_distinguishes_null_from_missing_category() {
        let cleared: UpdateServiceRequest =
            serde_json::from_str(r#"{"category_id": null}"#).expect("json");
        assert_eq!(cleared.category_id, Some(None));
        assert_eq!(cleared.service_type_id, None);

        let untouched: UpdateServiceRequest =
            serde_json::from_str(r#"{"name": "Duvet"}"#).expect("json");
        assert_eq!(untouched.category_id, None);
    }

    #[test]
    fn service_price_is_rendered_with_cents() {
        let now = Utc::now();
        let response = ServiceResponse::from(Service {
            id: Uuid::new_v4(),
            name: "Shirt wash".into(),
            category_id: None,
            service_type_id: None,
            price: "3.5".parse::<BigDecimal>().expect("decimal"),
            created_at: now,
            updated_at: now,
        });
        assert_eq!(response.price, "3.50");
    }
}
