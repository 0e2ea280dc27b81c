use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::storage::ImageStore;

/// Per-worker state. Each worker owns its own database pool and store
/// handle; nothing here is shared across workers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub store: ImageStore,
    pub config: Arc<AppConfig>,
}
