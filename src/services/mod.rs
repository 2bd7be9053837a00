pub mod order_watch_service;

pub use order_watch_service::{OrderWatch, OrderWatchService, DEFAULT_POLL_INTERVAL};
