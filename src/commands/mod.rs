pub mod create_order;
pub mod profit_share;

/// Endpoints served by the API, for startup logging
pub fn register_endpoints() -> Vec<(&'static str, &'static str)> {
    vec![
        (create_order::ROUTE, create_order::DESCRIPTION),
        (profit_share::ROUTE, profit_share::DESCRIPTION),
    ]
}
