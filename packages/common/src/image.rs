//! Image representations of a portfolio entry.
//!
//! An entry stores its image in one of three columns: a blob reference, an
//! inline data URI, or a legacy filename/URL. [`ImageSource`] is the single
//! value those columns collapse into, so callers never have to reason about
//! more than one of them at a time.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use uuid::Uuid;

/// Route under which blob-backed images are served.
pub const IMAGE_ROUTE_PREFIX: &str = "/portfolio/image";

/// Default upper bound for uploaded and inline images (5 MiB).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// The authoritative image of an entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ImageSource {
    #[default]
    None,
    /// Bytes held in the blob store, referenced by an `image_file` row.
    Blob(Uuid),
    /// A `data:image/...;base64,...` URI stored on the entry.
    Inline(String),
    /// Pre-existing filename or URL. Never written by the API.
    Legacy(String),
}

/// Column values that persist an [`ImageSource`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageColumns {
    pub image: Option<String>,
    pub image_id: Option<Uuid>,
    pub image_base64: Option<String>,
}

impl ImageSource {
    /// Collapse the stored columns using the resolution precedence:
    /// inline first, then blob reference, then legacy value.
    pub fn from_columns(
        image_base64: Option<&str>,
        image_id: Option<Uuid>,
        image: Option<&str>,
    ) -> Self {
        if let Some(inline) = image_base64.filter(|s| !s.is_empty()) {
            return Self::Inline(inline.to_string());
        }
        if let Some(id) = image_id {
            return Self::Blob(id);
        }
        match image.filter(|s| !s.is_empty()) {
            Some(legacy) => Self::Legacy(legacy.to_string()),
            None => Self::None,
        }
    }

    /// Column values with every non-authoritative column cleared.
    pub fn to_columns(&self) -> ImageColumns {
        match self {
            Self::None => ImageColumns::default(),
            Self::Blob(id) => ImageColumns {
                image_id: Some(*id),
                ..Default::default()
            },
            Self::Inline(uri) => ImageColumns {
                image_base64: Some(uri.clone()),
                ..Default::default()
            },
            Self::Legacy(value) => ImageColumns {
                image: Some(value.clone()),
                ..Default::default()
            },
        }
    }

    /// A reference a client can put in an `<img src>`; empty when there is no image.
    pub fn display_url(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Blob(id) => format!("{IMAGE_ROUTE_PREFIX}/{id}"),
            Self::Inline(uri) => uri.clone(),
            Self::Legacy(value) => value.clone(),
        }
    }

    pub fn blob_id(&self) -> Option<Uuid> {
        match self {
            Self::Blob(id) => Some(*id),
            _ => None,
        }
    }
}

/// Returns true for MIME types the image routes accept.
pub fn is_image_mime(content_type: &str) -> bool {
    content_type.trim().to_ascii_lowercase().starts_with("image/")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InlineImageError {
    #[error("imageBase64 must be a data URI (data:image/<type>;base64,<data>)")]
    NotDataUri,
    #[error("imageBase64 must have an image/* media type, got '{0}'")]
    NotImage(String),
    #[error("imageBase64 payload is not valid base64")]
    InvalidBase64,
    #[error("imageBase64 payload exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

/// A validated inline image. Keeps the original URI verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineImage {
    uri: String,
    media_type: String,
}

impl InlineImage {
    /// Validate a `data:image/<type>;base64,<data>` URI whose decoded payload
    /// is at most `max_size` bytes.
    pub fn parse(uri: &str, max_size: u64) -> Result<Self, InlineImageError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or(InlineImageError::NotDataUri)?;
        let (meta, payload) = rest.split_once(',').ok_or(InlineImageError::NotDataUri)?;
        let media_type = meta
            .strip_suffix(";base64")
            .ok_or(InlineImageError::NotDataUri)?;

        if !is_image_mime(media_type) {
            return Err(InlineImageError::NotImage(media_type.to_string()));
        }

        // Decoded length is at most 3/4 of the encoded length.
        if (payload.len() as u64 / 4) * 3 > max_size.saturating_add(2) {
            return Err(InlineImageError::TooLarge { limit: max_size });
        }
        let decoded = STANDARD
            .decode(payload.trim())
            .map_err(|_| InlineImageError::InvalidBase64)?;
        if decoded.len() as u64 > max_size {
            return Err(InlineImageError::TooLarge { limit: max_size });
        }

        Ok(Self {
            uri: uri.to_string(),
            media_type: media_type.to_string(),
        })
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn into_source(self) -> ImageSource {
        ImageSource::Inline(self.uri)
    }
}
