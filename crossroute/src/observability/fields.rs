//! Canonical structured field keys and value-format helpers.

use crate::exchange::Exchange;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const URI: &str = "uri";
pub const ROUTE_ID: &str = "route_id";
pub const EXCHANGE_ID: &str = "exchange_id";
pub const REF_COUNT: &str = "ref_count";
pub const ERR: &str = "err";

pub const NONE: &str = "none";

pub fn format_exchange_id(exchange: &Exchange) -> String {
    exchange.id().to_string()
}

pub fn format_failure(exchange: &Exchange) -> String {
    exchange
        .failure()
        .map(|failure| failure.message().to_string())
        .unwrap_or_else(|| NONE.to_string())
}
