use crate::commands::create_order::{self, create_order};
use crate::commands::profit_share::{self, profit_share};
use crate::interactor::order_interactor::OrderInteractor;
use crate::interactor::profit_share_interactor::ProfitShareInteractor;
use axum::routing::{get, post};
use std::sync::Arc;

pub mod auth;

pub use auth::{AuthError, Claims, TokenVerifier};

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct ApiState {
    pub order_interactor: Arc<dyn OrderInteractor>,
    pub profit_share_interactor: Arc<dyn ProfitShareInteractor>,
    pub token_verifier: Arc<TokenVerifier>,
}

// Base router trait
pub trait Router: Send + Sync {
    fn setup_handlers(&self) -> axum::Router;
}

pub struct ApiRouter {
    state: ApiState,
}

impl ApiRouter {
    pub fn new(state: ApiState) -> Self {
        Self { state }
    }
}

impl Router for ApiRouter {
    fn setup_handlers(&self) -> axum::Router {
        axum::Router::new()
            .route(create_order::ROUTE, post(create_order))
            .route(profit_share::ROUTE, get(profit_share).post(profit_share))
            .with_state(self.state.clone())
    }
}
