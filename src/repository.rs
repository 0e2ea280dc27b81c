use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use thiserror::Error;

use crate::entity::image::{self, ImageFormat};
use crate::models::pagination::{PageRequest, Pagination, SortOrder};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The generated filename collided with an existing row. Retryable:
    /// the caller regenerates the name and tries again.
    #[error("filename already exists: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Metadata for a row about to be inserted; `id` is assigned by the database.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub original_name: String,
    pub size: i64,
    pub file_type: ImageFormat,
    pub upload_time: DateTime<Utc>,
}

/// Sole owner of reads and writes to the `images` table. Each operation
/// runs a single statement on a pooled connection; the pool checks the
/// connection back in when the statement finishes, error or not.
pub struct ImageRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ImageRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn insert(&self, new: NewImage) -> Result<image::Model, RepositoryError> {
        let filename = new.filename.clone();
        let model = image::ActiveModel {
            filename: Set(new.filename),
            original_name: Set(new.original_name),
            size: Set(new.size),
            file_type: Set(new.file_type),
            upload_time: Set(new.upload_time),
            ..Default::default()
        };

        model
            .insert(self.db)
            .await
            .map_err(|err| classify_insert_error(err, &filename))
    }

    pub async fn find_by_filename(
        &self,
        filename: &str,
    ) -> Result<Option<image::Model>, RepositoryError> {
        let found = image::Entity::find()
            .filter(image::Column::Filename.eq(filename))
            .one(self.db)
            .await?;
        Ok(found)
    }

    /// Returns the number of rows removed: 0 when no such filename existed,
    /// which callers treat as "not found" rather than an error.
    pub async fn delete_by_filename(&self, filename: &str) -> Result<u64, RepositoryError> {
        let res = image::Entity::delete_many()
            .filter(image::Column::Filename.eq(filename))
            .exec(self.db)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        let total = image::Entity::find().count(self.db).await?;
        Ok(total)
    }

    pub async fn list(
        &self,
        offset: u64,
        limit: u64,
        order: SortOrder,
    ) -> Result<Vec<image::Model>, RepositoryError> {
        let items = image::Entity::find()
            .order_by(image::Column::UploadTime, order.into())
            .offset(Some(offset))
            .limit(Some(limit))
            .all(self.db)
            .await?;
        Ok(items)
    }

    /// Pagination engine: counts, clamps the request against the total, and
    /// fetches the ordered slice. Never fails for out-of-range input.
    pub async fn paginate(
        &self,
        req: PageRequest,
    ) -> Result<(Vec<image::Model>, Pagination), RepositoryError> {
        let total = self.count().await?;
        let plan = req.plan(total);

        let items = if total == 0 {
            Vec::new()
        } else {
            self.list(plan.offset, req.per_page, req.order).await?
        };

        Ok((
            items,
            Pagination {
                page: plan.page,
                per_page: req.per_page,
                total,
                total_pages: plan.total_pages,
            },
        ))
    }
}

fn classify_insert_error(err: sea_orm::DbErr, filename: &str) -> RepositoryError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            RepositoryError::Conflict(filename.to_string())
        }
        _ => RepositoryError::Database(err),
    }
}
