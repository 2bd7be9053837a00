pub mod bity;
pub mod commands;
pub mod di;
pub mod entity;
pub mod ethereum;
pub mod interactor;
pub mod presenter;
pub mod router;
pub mod services;
pub mod settings;
pub mod utils;
pub mod view;

// Re-export commonly used items
pub use commands::*;
pub use di::*;
pub use entity::*;
pub use interactor::*;
pub use presenter::*;
pub use router::*;
pub use services::*;
pub use settings::Settings;
pub use utils::*;
pub use view::*;

use ethereum::AlloyClient;
use sqlx::PgPool;
use std::sync::Arc;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wire the service container and the HTTP router on top of it
pub fn create_application(
    settings: &Settings,
    db_pool: Arc<PgPool>,
    ethereum_client: Arc<AlloyClient>,
) -> anyhow::Result<(ApiRouter, Arc<ServiceContainer>)> {
    let service_container = Arc::new(ServiceContainer::new(settings, db_pool, ethereum_client)?);
    let router = ApiRouter::new(service_container.api_state());
    Ok((router, service_container))
}
