use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::geocoding::AddressSuggestion;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuggestionResponse {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<AddressSuggestion> for SuggestionResponse {
    fn from(s: AddressSuggestion) -> Self {
        Self {
            label: s.label,
            lat: s.lat,
            lon: s.lon,
        }
    }
}

/// GET /addresses/autocomplete
///
/// Queries shorter than three characters answer an empty list without
/// calling the geocoder.
#[utoipa::path(
    get,
    path = "/addresses/autocomplete",
    params(("q" = String, Query, description = "Partial address")),
    responses(
        (status = 200, description = "Address suggestions", body = [SuggestionResponse]),
        (status = 502, description = "Geocoding service unavailable"),
    ),
    tag = "addresses"
)]
pub async fn autocomplete(
    state: web::Data<AppState>,
    query: web::Query<AutocompleteParams>,
) -> Result<HttpResponse, AppError> {
    let suggestions = state.geocoder.suggest(&query.q).await?;
    let body: Vec<SuggestionResponse> = suggestions.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}
