use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A reference from a portfolio entry to bytes in the blob store.
///
/// Several rows may share one `content_hash`; the blob is released when the
/// last of them is deleted.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image_file")]
pub struct Model {
    /// UUIDv7 primary key, exposed as `imageId`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub portfolio_id: Uuid,

    pub content_hash: String,

    /// Original upload filename.
    pub filename: String,
    pub content_type: String,
    pub size: i64,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
