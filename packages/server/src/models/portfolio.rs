use std::borrow::Cow;

use chrono::{DateTime, Utc};
use common::{Category, ImageSource};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidateUrl, ValidationError};

use crate::entity::portfolio;
use crate::error::validation_messages;

pub const MAX_TAG_CHARS: usize = 50;

/// Writable fields of a portfolio entry, shared by create and update.
///
/// Every field is optional so the same shape serves as a partial patch.
/// `views`, `likes` and timestamps are not part of it and are ignored when sent.
#[derive(Debug, Clone, Default, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioFields {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    #[schema(example = "AI Customer Support Chatbot")]
    pub title: Option<String>,
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Description must be 1-2000 characters"
    ))]
    pub description: Option<String>,
    /// Project link. An empty string clears it on update.
    #[validate(custom(function = "validate_project_url"))]
    #[schema(example = "https://example.com")]
    pub url: Option<String>,
    #[validate(custom(function = "validate_category"))]
    #[schema(example = "AI/ML")]
    pub category: Option<String>,
    /// Accepts a JSON array or a comma-separated string.
    #[serde(default, deserialize_with = "deserialize_tags")]
    #[validate(custom(function = "validate_tags"))]
    #[schema(value_type = Option<Vec<String>>, example = json!(["Rust", "NLP"]))]
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
    /// Inline image as `data:image/<type>;base64,<data>`.
    pub image_base64: Option<String>,
}

impl PortfolioFields {
    /// Trim text inputs and drop empty tags and empty inline images.
    pub fn normalize(&mut self) {
        for field in [&mut self.title, &mut self.description, &mut self.url, &mut self.category] {
            if let Some(value) = field {
                let trimmed = value.trim();
                if trimmed.len() != value.len() {
                    *value = trimmed.to_string();
                }
            }
        }
        if let Some(tags) = &mut self.tags {
            *tags = tags
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        if self.image_base64.as_deref().is_some_and(|s| s.trim().is_empty()) {
            self.image_base64 = None;
        }
    }

    /// All failures of a create request: missing required fields first, then format errors.
    pub fn create_errors(&self) -> Vec<String> {
        let mut details = Vec::new();
        if self.title.as_deref().is_none_or(str::is_empty) {
            details.push("Title is required".to_string());
        }
        if self.description.as_deref().is_none_or(str::is_empty) {
            details.push("Description is required".to_string());
        }
        if self.category.as_deref().is_none_or(str::is_empty) {
            details.push("Category is required".to_string());
        }

        if let Err(errors) = self.validate() {
            let missing = details.len();
            for msg in validation_messages(&errors) {
                // An empty required field already reported as missing.
                let redundant = missing > 0
                    && ((msg.starts_with("Title") && self.title.as_deref() == Some(""))
                        || (msg.starts_with("Description")
                            && self.description.as_deref() == Some(""))
                        || (msg.starts_with("Category") && self.category.as_deref() == Some("")));
                if !redundant {
                    details.push(msg);
                }
            }
        }
        details
    }

    /// All failures of an update request. Absent fields are not checked.
    pub fn update_errors(&self) -> Vec<String> {
        let mut details = Vec::new();
        if self.category.as_deref() == Some("") {
            details.push("Category cannot be empty".to_string());
        }
        if let Err(errors) = self.validate() {
            details.extend(validation_messages(&errors));
        }
        details
    }

    pub fn parsed_category(&self) -> Option<Category> {
        self.category.as_deref().and_then(|c| c.parse().ok())
    }

    /// The URL to store: `None` for absent or empty input.
    pub fn stored_url(&self) -> Option<String> {
        self.url.clone().filter(|u| !u.is_empty())
    }

    /// True when the request carries no writable field.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.url.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.featured.is_none()
            && self.image_base64.is_none()
    }
}

fn message(code: &'static str, msg: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(msg.into())
}

fn validate_project_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() || url.validate_url() {
        Ok(())
    } else {
        Err(message("url", "URL must be a valid URL"))
    }
}

fn validate_category(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.parse::<Category>().is_ok() {
        return Ok(());
    }
    Err(message(
        "category",
        format!("Category must be one of: {}", Category::labels()),
    ))
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|t| t.chars().count() > MAX_TAG_CHARS) {
        return Err(message(
            "tags",
            format!("Each tag must be at most {MAX_TAG_CHARS} characters"),
        ));
    }
    Ok(())
}

/// Split a comma-separated tag list.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TagsInput {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Option::<TagsInput>::deserialize(deserializer)? {
        Some(TagsInput::List(tags)) => Some(tags),
        Some(TagsInput::Csv(raw)) => Some(split_tags(&raw)),
        None => None,
    })
}

/// Response DTO for a single portfolio entry.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    /// Entry ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    pub title: String,
    pub description: String,
    /// Legacy filename or URL.
    pub image: Option<String>,
    pub image_id: Option<String>,
    pub image_base64: Option<String>,
    /// Resolved image reference; empty when the entry has no image.
    #[schema(example = "/portfolio/image/01936f0e-1234-7abc-8000-000000000002")]
    pub image_url: String,
    pub url: Option<String>,
    pub category: Category,
    pub tags: Vec<String>,
    pub featured: bool,
    pub views: i64,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The authoritative image of a stored entry.
pub fn image_source(model: &portfolio::Model) -> ImageSource {
    ImageSource::from_columns(
        model.image_base64.as_deref(),
        model.image_id,
        model.image.as_deref(),
    )
}

impl From<portfolio::Model> for PortfolioResponse {
    fn from(model: portfolio::Model) -> Self {
        let image_url = image_source(&model).display_url();
        Self {
            id: model.id.to_string(),
            title: model.title,
            description: model.description,
            image: model.image,
            image_id: model.image_id.map(|id| id.to_string()),
            image_base64: model.image_base64,
            image_url,
            url: model.url,
            category: model.category,
            tags: model.tags,
            featured: model.featured,
            views: model.views,
            likes: model.likes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Query parameters for `GET /portfolio`.
///
/// Values are kept as raw strings: unrecognized values disable their filter
/// instead of failing the request.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PortfolioListQuery {
    /// Exact category label.
    pub category: Option<String>,
    /// Comma-separated tags; matches entries carrying any of them.
    pub tags: Option<String>,
    /// Full-text search over title and description, plus exact tag match.
    pub search: Option<String>,
    /// `true` or `false`.
    pub featured: Option<String>,
    /// `newest` (default), `popularity`, `name` or `views`.
    pub sort: Option<String>,
    /// Page number (1-based, default 1).
    pub page: Option<String>,
    /// Items per page (default 12, max 100).
    pub limit: Option<String>,
}

/// Response body for `GET /portfolio`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PortfolioListResponse {
    pub success: bool,
    pub data: Vec<PortfolioResponse>,
    pub pagination: crate::models::shared::Pagination,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LikeRequest {
    /// `true` adds a like, `false` removes one. Defaults to `true`.
    #[serde(default = "default_increment")]
    pub increment: bool,
}

impl Default for LikeRequest {
    fn default() -> Self {
        Self { increment: true }
    }
}

fn default_increment() -> bool {
    true
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LikeResponse {
    #[schema(example = 7)]
    pub likes: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeletedResponse {
    pub id: String,
}
