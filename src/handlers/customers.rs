use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{default_limit, default_page, double_option, event_stream, CreatedResponse};
use crate::domain::customer::{
    Address, AddressPatch, Customer, CustomerPatch, CustomerQuery, NewAddress, NewCustomer,
};
use crate::domain::Pagination;
use crate::errors::AppError;
use crate::realtime::Scope;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub marketing_email: bool,
    #[serde(default)]
    pub marketing_sms: bool,
}

impl From<CreateCustomerRequest> for NewCustomer {
    fn from(r: CreateCustomerRequest) -> Self {
        Self {
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            phone: r.phone,
            marketing_email: r.marketing_email,
            marketing_sms: r.marketing_sms,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub phone: Option<Option<String>>,
    pub marketing_email: Option<bool>,
    pub marketing_sms: Option<bool>,
}

impl From<UpdateCustomerRequest> for CustomerPatch {
    fn from(r: UpdateCustomerRequest) -> Self {
        Self {
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            phone: r.phone,
            marketing_email: r.marketing_email,
            marketing_sms: r.marketing_sms,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressRequest {
    pub address: String,
    pub details: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAddressRequest {
    pub address: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub details: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListCustomersParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub marketing_email: bool,
    pub marketing_sms: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            display_name: c.display_name(),
            id: c.id,
            first_name: c.first_name,
            last_name: c.last_name,
            email: c.email,
            phone: c.phone,
            marketing_email: c.marketing_email,
            marketing_sms: c.marketing_sms,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListCustomersResponse {
    pub items: Vec<CustomerResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub address: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Address> for AddressResponse {
    fn from(a: Address) -> Self {
        Self {
            id: a.id,
            customer_id: a.customer_id,
            address: a.address,
            details: a.details,
            created_at: a.created_at,
        }
    }
}

async fn list_page(
    state: web::Data<AppState>,
    params: ListCustomersParams,
) -> Result<ListCustomersResponse, AppError> {
    let query = CustomerQuery {
        pagination: Pagination::new(params.page, params.limit),
        search: params.search,
    };
    let page = query.pagination;

    let result = web::block(move || state.customers.list_customers(&query)).await??;
    Ok(ListCustomersResponse {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page: page.page,
        limit: page.limit,
    })
}

#[utoipa::path(
    post,
    path = "/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CreatedResponse),
        (status = 400, description = "Customer has no name"),
    ),
    tag = "customers"
)]
pub async fn create_customer(
    state: web::Data<AppState>,
    body: web::Json<CreateCustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let customer = NewCustomer::from(body.into_inner());
    let id = web::block(move || state.customers.create_customer(customer)).await??;
    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

#[utoipa::path(
    get,
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Customer found", body = CustomerResponse),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn get_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    match web::block(move || state.customers.get_customer(id)).await?? {
        Some(customer) => Ok(HttpResponse::Ok().json(CustomerResponse::from(customer))),
        None => Err(AppError::NotFound),
    }
}

/// GET /customers
///
/// Sorted by last name. `search` matches name, email and phone, ignoring
/// case and accents; every word must match.
#[utoipa::path(
    get,
    path = "/customers",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("search" = Option<String>, Query, description = "Search text"),
    ),
    responses((status = 200, description = "Paginated customers", body = ListCustomersResponse)),
    tag = "customers"
)]
pub async fn list_customers(
    state: web::Data<AppState>,
    query: web::Query<ListCustomersParams>,
) -> Result<HttpResponse, AppError> {
    let page = list_page(state, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/clienti
///
/// The customer list under the route the front office already calls.
#[utoipa::path(
    get,
    path = "/api/clienti",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("search" = Option<String>, Query, description = "Search text"),
    ),
    responses((status = 200, description = "Paginated customers", body = ListCustomersResponse)),
    tag = "customers"
)]
pub async fn list_clienti(
    state: web::Data<AppState>,
    query: web::Query<ListCustomersParams>,
) -> Result<HttpResponse, AppError> {
    let page = list_page(state, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    patch,
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Updated customer", body = CustomerResponse),
        (status = 400, description = "Customer would have no name"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn update_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let patch = CustomerPatch::from(body.into_inner());
    let customer = web::block(move || state.customers.update_customer(id, patch)).await??;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}

#[utoipa::path(
    delete,
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 204, description = "Customer and addresses deleted"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn delete_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.customers.delete_customer(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/customers/{id}/addresses",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Addresses, oldest first", body = [AddressResponse]),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn list_addresses(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let addresses = web::block(move || state.customers.addresses(id)).await??;
    let body: Vec<AddressResponse> = addresses.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/customers/{id}/addresses",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    request_body = AddressRequest,
    responses(
        (status = 201, description = "Address created", body = CreatedResponse),
        (status = 400, description = "Empty address"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn create_address(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<AddressRequest>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let AddressRequest { address, details } = body.into_inner();
    let address = NewAddress { address, details };

    let id = web::block(move || state.customers.create_address(customer_id, address)).await??;
    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

#[utoipa::path(
    patch,
    path = "/customers/{id}/addresses/{address_id}",
    params(
        ("id" = Uuid, Path, description = "Customer UUID"),
        ("address_id" = Uuid, Path, description = "Address UUID"),
    ),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Updated address", body = AddressResponse),
        (status = 404, description = "Address not found for this customer"),
    ),
    tag = "customers"
)]
pub async fn update_address(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdateAddressRequest>,
) -> Result<HttpResponse, AppError> {
    let (customer_id, address_id) = path.into_inner();
    let UpdateAddressRequest { address, details } = body.into_inner();
    let patch = AddressPatch { address, details };

    let address =
        web::block(move || state.customers.update_address(customer_id, address_id, patch))
            .await??;
    Ok(HttpResponse::Ok().json(AddressResponse::from(address)))
}

#[utoipa::path(
    delete,
    path = "/customers/{id}/addresses/{address_id}",
    params(
        ("id" = Uuid, Path, description = "Customer UUID"),
        ("address_id" = Uuid, Path, description = "Address UUID"),
    ),
    responses(
        (status = 204, description = "Address deleted; orders using it lose the reference"),
        (status = 404, description = "Address not found for this customer"),
    ),
    tag = "customers"
)]
pub async fn delete_address(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (customer_id, address_id) = path.into_inner();
    web::block(move || state.customers.delete_address(customer_id, address_id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /customers/{id}/events
///
/// Server-Sent Events for the customer row and its addresses.
#[utoipa::path(
    get,
    path = "/customers/{id}/events",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "text/event-stream of change events"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn customer_events(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let lookup = state.clone();
    if web::block(move || lookup.customers.get_customer(id))
        .await??
        .is_none()
    {
        return Err(AppError::NotFound);
    }
    Ok(event_stream(&state.feed, Scope::Customer(id)))
}
