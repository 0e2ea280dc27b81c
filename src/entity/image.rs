use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per stored image file. Rows are immutable; the only lifecycle
/// transitions are insert (upload) and delete.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Name of the file on disk; the sole stable external lookup key.
    #[sea_orm(unique)]
    pub filename: String,

    /// Client-supplied name, informational only.
    pub original_name: String,

    /// File size in bytes, always > 0.
    pub size: i64,

    /// Creation timestamp; the sole sort key for listings.
    pub upload_time: DateTimeUtc,

    pub file_type: ImageFormat,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Accepted image formats, stored in the database as the file extension.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum ImageFormat {
    #[sea_orm(string_value = ".jpg")]
    #[serde(rename = ".jpg")]
    Jpeg,
    #[sea_orm(string_value = ".png")]
    #[serde(rename = ".png")]
    Png,
    #[sea_orm(string_value = ".gif")]
    #[serde(rename = ".gif")]
    Gif,
}

impl ImageFormat {
    /// Maps a declared multipart content type to a format.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// File extension, dot included.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => ".jpg",
            Self::Png => ".png",
            Self::Gif => ".gif",
        }
    }
}
