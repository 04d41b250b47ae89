use axum::extract::multipart::Field;
use axum::extract::{FromRef, FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;

use crate::error::AppError;
use crate::extractors::json::AppJson;
use crate::models::portfolio::{PortfolioFields, split_tags};
use crate::utils::image::{ImageUpload, sanitize_filename};

/// Body of a create or update request: either `multipart/form-data` with an
/// optional `image` file part, or a JSON object.
#[derive(Debug)]
pub struct PortfolioPayload {
    pub fields: PortfolioFields,
    pub upload: Option<ImageUpload>,
}

/// Largest image, in bytes, a request may carry (`storage.max_image_size`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLimit(pub u64);

impl<S> FromRequest<S> for PortfolioPayload
where
    S: Send + Sync,
    ImageLimit: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ImageLimit(max_image_size) = ImageLimit::from_ref(state);
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.trim_start().starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            read_multipart(multipart, max_image_size).await
        } else {
            let AppJson(fields) = AppJson::<PortfolioFields>::from_request(req, state).await?;
            Ok(Self {
                fields,
                upload: None,
            })
        }
    }
}

async fn read_multipart(
    mut multipart: Multipart,
    max_image_size: u64,
) -> Result<PortfolioPayload, AppError> {
    let mut fields = PortfolioFields::default();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => upload = read_image(field, max_image_size).await?,
            "title" => fields.title = Some(text(field).await?),
            "description" => fields.description = Some(text(field).await?),
            "url" => fields.url = Some(text(field).await?),
            "category" => fields.category = Some(text(field).await?),
            "tags" => fields.tags = Some(parse_tags(&text(field).await?)?),
            "featured" => fields.featured = parse_featured(&text(field).await?)?,
            "imageBase64" => fields.image_base64 = Some(text(field).await?),
            _ => {} // Ignore unknown fields.
        }
    }

    Ok(PortfolioPayload { fields, upload })
}

async fn text(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

/// Buffer the `image` part, stopping as soon as it exceeds the size cap.
/// An empty part without a filename means no file was chosen.
async fn read_image(
    mut field: Field<'_>,
    max_image_size: u64,
) -> Result<Option<ImageUpload>, AppError> {
    let filename = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);

    let mut buf = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (buf.len() + chunk.len()) as u64 > max_image_size {
            return Err(AppError::Validation(format!(
                "Image must be at most {max_image_size} bytes"
            )));
        }
        buf.extend_from_slice(&chunk);
    }

    if buf.is_empty() && filename.as_deref().is_none_or(str::is_empty) {
        return Ok(None);
    }

    Ok(Some(ImageUpload {
        filename: sanitize_filename(filename.as_deref()),
        content_type,
        bytes: buf.into(),
    }))
}

/// Tags arrive as a JSON array or a comma-separated list.
fn parse_tags(raw: &str) -> Result<Vec<String>, AppError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|_| {
            AppError::Validation(
                "Tags must be a JSON array of strings or a comma-separated list".into(),
            )
        })
    } else {
        Ok(split_tags(trimmed))
    }
}

fn parse_featured(raw: &str) -> Result<Option<bool>, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" | "on" => Ok(Some(true)),
        "false" | "0" | "off" => Ok(Some(false)),
        _ => Err(AppError::Validation("Featured must be true or false".into())),
    }
}
