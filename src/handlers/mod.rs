pub mod addresses;
pub mod catalog;
pub mod customers;
pub mod events;
pub mod orders;
pub mod settings;
pub mod users;

use std::str::FromStr;

use actix_web::http::header;
use actix_web::HttpResponse;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::DEFAULT_PAGE_LIMIT;
use crate::errors::AppError;
use crate::realtime::{ChangeFeed, Scope};

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: Uuid,
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Parses a decimal amount sent as a string, e.g. "9.99".
pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(value.trim())
        .map_err(|e| AppError::BadRequest(format!("invalid {field} '{value}': {e}")))
}

/// Money leaves the service as a decimal string with cent precision.
pub(crate) fn money_string(value: &BigDecimal) -> String {
    value
        .with_scale_round(crate::domain::totals::MONEY_SCALE, bigdecimal::RoundingMode::HalfUp)
        .to_string()
}

/// Server-Sent Events response streaming the feed's events for `scope`.
pub(crate) fn event_stream(feed: &ChangeFeed, scope: Scope) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(feed.sse_stream(scope))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct PatchBody {
        #[serde(default, deserialize_with = "double_option")]
        customer_id: Option<Option<Uuid>>,
    }

    #[test]
    fn double_option_tells_null_from_missing() {
        let missing: PatchBody = serde_json::from_str("{}").expect("json");
        assert_eq!(missing.customer_id, None);

        let null: PatchBody = serde_json::from_str(r#"{"customer_id": null}"#).expect("json");
        assert_eq!(null.customer_id, Some(None));

        let id = Uuid::new_v4();
        let set: PatchBody =
            serde_json::from_str(&format!(r#"{{"customer_id": "{id}"}}"#)).expect("json");
        assert_eq!(set.customer_id, Some(Some(id)));
    }

    #[test]
    fn decimals_parse_and_format() {
        let price = parse_decimal("price", " 3.5 ").expect("valid");
        assert_eq!(money_string(&price), "3.50");
        assert_eq!(money_string(&BigDecimal::from(18)), "18.00");
        assert!(matches!(
            parse_decimal("price", "tre euro"),
            Err(AppError::BadRequest(_))
        ));
    }
}
