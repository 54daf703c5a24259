pub mod catalog_service;
pub mod customer_service;
pub mod order_service;
pub mod settings_service;
pub mod user_service;

pub use catalog_service::CatalogService;
pub use customer_service::CustomerService;
pub use order_service::OrderService;
pub use settings_service::SettingsService;
pub use user_service::UserService;

/// Trims an optional text field, mapping blank input to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::non_blank;

    #[test]
    fn blank_text_becomes_none() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" 333 ".into())), Some("333".into()));
        assert_eq!(non_blank(None), None);
    }
}
