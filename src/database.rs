use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};

use crate::config::DatabaseConfig;
use crate::entity::image;

/// Connects to the configured endpoint (PgBouncer or direct PostgreSQL)
/// and makes sure the schema exists.
pub async fn init_db(cfg: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(cfg.url());

    opt.max_connections(cfg.pool.max_connections)
        .min_connections(cfg.pool.min_connections)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    ensure_schema(&db).await?;

    Ok(db)
}

/// Creates the `images` table (with its unique filename index) and the
/// `upload_time` index backing the list sort. Idempotent, so every worker
/// can run it at startup.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(image::Entity);
    table.if_not_exists();
    db.execute(backend.build(&table)).await?;

    let mut index = Index::create();
    index
        .name("idx_images_upload_time")
        .table(image::Entity)
        .col(image::Column::UploadTime)
        .if_not_exists();
    db.execute(backend.build(&index)).await?;

    Ok(())
}
