use common::Category;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "portfolio")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Legacy filename or URL. Read-only.
    pub image: Option<String>,
    /// `image_file.id` of an uploaded image.
    pub image_id: Option<Uuid>,
    /// Inline `data:image/...;base64,...` URI.
    #[sea_orm(column_type = "Text", nullable)]
    pub image_base64: Option<String>,

    pub url: Option<String>,
    pub category: Category,
    /// Insertion order is preserved; duplicates are allowed.
    pub tags: Vec<String>,
    #[sea_orm(default_value = false)]
    pub featured: bool,
    #[sea_orm(default_value = 0)]
    pub views: i64,
    #[sea_orm(default_value = 0)]
    pub likes: i64,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
