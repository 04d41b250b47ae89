use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

/// Success envelope shared by every JSON endpoint.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApiResponse<T> {
    /// Always `true`.
    pub success: bool,
    pub data: T,
    /// Human-readable confirmation for mutations.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Portfolio created successfully")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// Pagination metadata included in list responses.
#[derive(Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub current_page: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 27)]
    pub total_items: u64,
    /// Number of items per page.
    #[schema(example = 12)]
    pub items_per_page: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = total.div_ceil(per_page.max(1));
        Self {
            current_page: page,
            total_pages,
            total_items: total,
            items_per_page: per_page,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Parse a path identifier, rejecting anything that is not a UUID.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId)
}
