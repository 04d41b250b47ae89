use axum::body::Bytes;
use chrono::Utc;
use common::image::is_image_mime;
use common::storage::{BlobStore, BoxReader, ContentHash};
use common::{ImageSource, InlineImage};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, Set, Statement, TransactionSession, TransactionTrait,
};
use tracing::warn;
use uuid::Uuid;

use crate::entity::image_file;
use crate::error::AppError;

/// A binary image part received with a create or update request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    /// Content type declared by the multipart part, if any.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// The declared content type, or a guess from the filename when the part
    /// carries none (or only the generic octet-stream type).
    pub fn resolved_content_type(&self) -> Option<String> {
        match self.content_type.as_deref().map(str::trim) {
            Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => Some(ct.to_string()),
            _ => mime_guess::from_path(&self.filename)
                .first()
                .map(|m| m.to_string()),
        }
    }
}

/// The image operation a request asks for.
#[derive(Debug)]
pub enum ImageChange {
    Keep,
    Upload {
        upload: ImageUpload,
        content_type: String,
    },
    Inline(InlineImage),
}

impl ImageChange {
    /// Validate the image inputs of one request.
    ///
    /// Sending both a file and an inline payload is ambiguous and rejected.
    /// Create requests drop the inline payload when a file is present.
    pub fn from_request(
        upload: Option<ImageUpload>,
        image_base64: Option<&str>,
        max_size: u64,
    ) -> Result<Self, String> {
        match (upload, image_base64) {
            (Some(_), Some(_)) => {
                Err("Provide either an image file or imageBase64, not both".to_string())
            }
            (Some(upload), None) => {
                let content_type = upload
                    .resolved_content_type()
                    .filter(|ct| is_image_mime(ct))
                    .ok_or_else(|| "Only image files are allowed".to_string())?;
                if upload.bytes.len() as u64 > max_size {
                    return Err(format!("Image must be at most {max_size} bytes"));
                }
                Ok(Self::Upload {
                    upload,
                    content_type,
                })
            }
            (None, Some(uri)) => InlineImage::parse(uri, max_size)
                .map(Self::Inline)
                .map_err(|e| e.to_string()),
            (None, None) => Ok(Self::Keep),
        }
    }
}

/// Result of writing a requested image change.
#[derive(Debug)]
pub struct AppliedImage {
    /// The entry's new authoritative image.
    pub source: ImageSource,
    /// Blob reference the entry held before, to release once the entry is saved.
    pub superseded: Option<Uuid>,
}

/// Persist the bytes of an image change. Returns `None` when nothing changes.
pub async fn apply<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    blobs: &dyn BlobStore,
    portfolio_id: Uuid,
    current: &ImageSource,
    change: ImageChange,
) -> Result<Option<AppliedImage>, AppError> {
    let source = match change {
        ImageChange::Keep => return Ok(None),
        ImageChange::Upload {
            upload,
            content_type,
        } => {
            let id = store_upload(db, blobs, portfolio_id, &upload, &content_type).await?;
            ImageSource::Blob(id)
        }
        ImageChange::Inline(inline) => {
            tracing::debug!(
                %portfolio_id,
                media_type = inline.media_type(),
                "Storing inline image"
            );
            inline.into_source()
        }
    };

    Ok(Some(AppliedImage {
        source,
        superseded: current.blob_id(),
    }))
}

/// Take a transaction-scoped advisory lock on a content hash.
///
/// Writing a reference and releasing the last one for the same bytes must not
/// interleave, or the release could delete bytes a new row points at.
async fn lock_hash<T: ConnectionTrait>(txn: &T, hash: &ContentHash) -> Result<(), AppError> {
    txn.execute_raw(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock(hashtext($1))",
        [hash.to_hex().into()],
    ))
    .await?;
    Ok(())
}

/// Write uploaded bytes to the blob store and record an `image_file` reference.
pub async fn store_upload<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    blobs: &dyn BlobStore,
    portfolio_id: Uuid,
    upload: &ImageUpload,
    content_type: &str,
) -> Result<Uuid, AppError> {
    let hash = ContentHash::compute(&upload.bytes);
    let txn = db.begin().await?;
    lock_hash(&txn, &hash).await?;

    blobs.put(&upload.bytes).await?;

    let id = Uuid::now_v7();
    image_file::ActiveModel {
        id: Set(id),
        portfolio_id: Set(portfolio_id),
        content_hash: Set(hash.to_hex()),
        filename: Set(upload.filename.clone()),
        content_type: Set(content_type.to_string()),
        size: Set(i64::try_from(upload.bytes.len()).unwrap_or(i64::MAX)),
        created_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::debug!(%id, hash = %hash, bucket = blobs.bucket(), "Stored image");
    Ok(id)
}

/// Release a blob reference. Failures are logged and never propagated.
pub async fn release<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    blobs: &dyn BlobStore,
    image_id: Uuid,
) {
    if let Err(e) = try_release(db, blobs, image_id).await {
        warn!(%image_id, error = ?e, "Failed to release image storage");
    }
}

async fn try_release<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    blobs: &dyn BlobStore,
    image_id: Uuid,
) -> Result<(), AppError> {
    let Some(file) = image_file::Entity::find_by_id(image_id).one(db).await? else {
        return Ok(());
    };
    let hash = ContentHash::from_hex(&file.content_hash)?;

    let txn = db.begin().await?;
    lock_hash(&txn, &hash).await?;

    image_file::Entity::delete_by_id(image_id).exec(&txn).await?;
    let remaining = image_file::Entity::find()
        .filter(image_file::Column::ContentHash.eq(&file.content_hash))
        .count(&txn)
        .await?;
    if remaining == 0 {
        // Row removal commits even when the bytes cannot be deleted.
        if let Err(e) = blobs.delete(&hash).await {
            warn!(%image_id, hash = %hash, error = %e, "Failed to delete image bytes");
        }
    }
    txn.commit().await?;
    Ok(())
}

/// A stored image ready to be streamed to a client.
pub struct StoredImage {
    pub content_type: String,
    pub size: i64,
    pub reader: BoxReader,
}

/// Open a blob-backed image. Any failure to locate or read it is a 404.
pub async fn open<C: ConnectionTrait>(
    db: &C,
    blobs: &dyn BlobStore,
    image_id: Uuid,
) -> Result<StoredImage, AppError> {
    let not_found = || AppError::NotFound("Image not found".into());

    let file = image_file::Entity::find_by_id(image_id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    let hash = ContentHash::from_hex(&file.content_hash).map_err(|_| not_found())?;
    let reader = blobs.get_stream(&hash).await.map_err(|e| {
        if !e.is_not_found() {
            warn!(%image_id, error = %e, "Failed to read image from blob store");
        }
        not_found()
    })?;

    Ok(StoredImage {
        content_type: file.content_type,
        size: file.size,
        reader,
    })
}

/// Reduce a client-supplied filename to a safe base name.
pub fn sanitize_filename(raw: Option<&str>) -> String {
    let base = raw
        .unwrap_or_default()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string();

    if cleaned.is_empty() || cleaned.starts_with('.') {
        "image".to_string()
    } else {
        cleaned
    }
}
