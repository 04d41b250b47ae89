use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::ImageSource;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::entity::portfolio;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::JsonOrDefault;
use crate::extractors::payload::PortfolioPayload;
use crate::models::portfolio::{
    DeletedResponse, LikeRequest, LikeResponse, PortfolioFields, PortfolioListQuery,
    PortfolioListResponse, PortfolioResponse, image_source,
};
use crate::models::shared::{ApiResponse, parse_id};
use crate::state::AppState;
use crate::utils::image::{self, AppliedImage, ImageChange};
use crate::utils::query::PortfolioQuery;

#[utoipa::path(
    get,
    path = "/portfolio",
    tag = "Portfolio",
    operation_id = "listPortfolios",
    summary = "List portfolio entries",
    description = "Filters by category, tags, featured flag and free-text search, then sorts \
        featured entries first. Unrecognized filter values are ignored.",
    params(PortfolioListQuery),
    responses(
        (status = 200, description = "Page of entries", body = PortfolioListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_portfolios(
    State(state): State<AppState>,
    Query(params): Query<PortfolioListQuery>,
) -> Result<Json<PortfolioListResponse>, AppError> {
    let query = PortfolioQuery::from_params(&params);
    let (items, pagination) = query.fetch(&state.db).await?;

    Ok(Json(PortfolioListResponse {
        success: true,
        data: items.into_iter().map(PortfolioResponse::from).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/portfolio/{id}",
    tag = "Portfolio",
    operation_id = "getPortfolio",
    summary = "Get a portfolio entry",
    description = "Returns the entry and counts the read: `views` is incremented atomically \
        and the response carries the incremented value.",
    params(("id" = String, Path, description = "Portfolio ID (UUID)")),
    responses(
        (status = 200, description = "Entry found", body = ApiResponse<PortfolioResponse>),
        (status = 400, description = "Malformed ID (INVALID_ID)", body = ErrorBody),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id = %id))]
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PortfolioResponse>>, AppError> {
    let id = parse_id(&id)?;

    let model = portfolio::Entity::update_many()
        .col_expr(portfolio::Column::Views, Expr::cust("\"views\" + 1"))
        .col_expr(portfolio::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(portfolio::Column::Id.eq(id))
        .exec_with_returning(&state.db)
        .await?
        .into_iter()
        .next()
        .ok_or_else(not_found)?;

    Ok(Json(ApiResponse::ok(model.into())))
}

#[utoipa::path(
    post,
    path = "/portfolio",
    tag = "Portfolio",
    operation_id = "createPortfolio",
    summary = "Create a portfolio entry",
    description = "Accepts `multipart/form-data` (with an optional `image` file part) or JSON \
        (with an optional `imageBase64` data URI). An uploaded file takes precedence over \
        `imageBase64`. \
        All field errors are reported together in `details`.",
    request_body(content = PortfolioFields, description = "Entry fields"),
    responses(
        (status = 201, description = "Entry created", body = ApiResponse<PortfolioResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_portfolio(
    State(state): State<AppState>,
    payload: PortfolioPayload,
) -> Result<impl IntoResponse, AppError> {
    let PortfolioPayload { mut fields, upload } = payload;
    fields.normalize();
    if upload.is_some() && fields.image_base64.take().is_some() {
        debug!("Ignoring imageBase64 in favor of the uploaded file");
    }

    let mut details = fields.create_errors();
    let change = image_change(&state, &fields, upload, &mut details);
    if !details.is_empty() {
        return Err(AppError::InvalidFields(details));
    }
    let category = fields
        .parsed_category()
        .ok_or_else(|| AppError::Validation("Category is required".into()))?;

    let id = Uuid::now_v7();
    let applied = image::apply(
        &state.db,
        &*state.blob_store,
        id,
        &ImageSource::None,
        change,
    )
    .await?;
    let columns = applied
        .as_ref()
        .map(|a| a.source.to_columns())
        .unwrap_or_default();

    let now = Utc::now();
    let active = portfolio::ActiveModel {
        id: Set(id),
        title: Set(fields.title.clone().unwrap_or_default()),
        description: Set(fields.description.clone().unwrap_or_default()),
        image: Set(None),
        image_id: Set(columns.image_id),
        image_base64: Set(columns.image_base64),
        url: Set(fields.stored_url()),
        category: Set(category),
        tags: Set(fields.tags.clone().unwrap_or_default()),
        featured: Set(fields.featured.unwrap_or(false)),
        views: Set(0),
        likes: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let model = match active.insert(&state.db).await {
        Ok(model) => model,
        Err(e) => {
            discard_new_blob(&state, applied.as_ref()).await;
            return Err(e.into());
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            PortfolioResponse::from(model),
            "Portfolio created successfully",
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/portfolio/{id}",
    tag = "Portfolio",
    operation_id = "updatePortfolio",
    summary = "Update a portfolio entry",
    description = "Partial update: only fields present in the request change. `url: \"\"` \
        clears the link. A new image replaces the previous one, whose blob is released \
        after the entry is saved. Sending both an image file and `imageBase64` is rejected.",
    params(("id" = String, Path, description = "Portfolio ID (UUID)")),
    request_body(content = PortfolioFields, description = "Fields to change"),
    responses(
        (status = 200, description = "Entry updated", body = ApiResponse<PortfolioResponse>),
        (status = 400, description = "Malformed ID or validation error (INVALID_ID, VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id = %id))]
pub async fn update_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: PortfolioPayload,
) -> Result<Json<ApiResponse<PortfolioResponse>>, AppError> {
    let id = parse_id(&id)?;
    let PortfolioPayload { mut fields, upload } = payload;
    fields.normalize();

    let mut details = fields.update_errors();
    let change = image_change(&state, &fields, upload, &mut details);
    if !details.is_empty() {
        return Err(AppError::InvalidFields(details));
    }

    let existing = find_portfolio(&state.db, id).await?;
    if fields.is_empty() && matches!(change, ImageChange::Keep) {
        return Ok(Json(ApiResponse::with_message(
            existing.into(),
            "Portfolio updated successfully",
        )));
    }

    let current = image_source(&existing);
    let applied = image::apply(&state.db, &*state.blob_store, id, &current, change).await?;

    let mut active: portfolio::ActiveModel = existing.into();
    apply_fields(&mut active, &fields);
    if let Some(applied) = &applied {
        let columns = applied.source.to_columns();
        active.image = Set(columns.image);
        active.image_id = Set(columns.image_id);
        active.image_base64 = Set(columns.image_base64);
    }
    active.updated_at = Set(Utc::now());

    let model = match active.update(&state.db).await {
        Ok(model) => model,
        Err(e) => {
            discard_new_blob(&state, applied.as_ref()).await;
            return Err(e.into());
        }
    };

    if let Some(old) = applied.and_then(|a| a.superseded) {
        image::release(&state.db, &*state.blob_store, old).await;
    }

    Ok(Json(ApiResponse::with_message(
        model.into(),
        "Portfolio updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/portfolio/{id}",
    tag = "Portfolio",
    operation_id = "deletePortfolio",
    summary = "Delete a portfolio entry",
    description = "Removes the entry, then releases its uploaded image. Failure to release \
        the image is logged and does not fail the request.",
    params(("id" = String, Path, description = "Portfolio ID (UUID)")),
    responses(
        (status = 200, description = "Entry deleted", body = ApiResponse<DeletedResponse>),
        (status = 400, description = "Malformed ID (INVALID_ID)", body = ErrorBody),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id = %id))]
pub async fn delete_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedResponse>>, AppError> {
    let id = parse_id(&id)?;
    let existing = find_portfolio(&state.db, id).await?;

    portfolio::Entity::delete_by_id(id).exec(&state.db).await?;

    if let Some(blob) = image_source(&existing).blob_id() {
        image::release(&state.db, &*state.blob_store, blob).await;
    }

    Ok(Json(ApiResponse::with_message(
        DeletedResponse { id: id.to_string() },
        "Portfolio deleted successfully",
    )))
}

#[utoipa::path(
    post,
    path = "/portfolio/{id}/like",
    tag = "Portfolio",
    operation_id = "likePortfolio",
    summary = "Like or unlike a portfolio entry",
    description = "Moves `likes` by one in the requested direction. The count never drops \
        below zero. An empty body counts as `{\"increment\": true}`.",
    params(("id" = String, Path, description = "Portfolio ID (UUID)")),
    request_body(content = LikeRequest, description = "Like direction"),
    responses(
        (status = 200, description = "Updated like count", body = ApiResponse<LikeResponse>),
        (status = 400, description = "Malformed ID (INVALID_ID)", body = ErrorBody),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, body), fields(id = %id))]
pub async fn like_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonOrDefault(body): JsonOrDefault<LikeRequest>,
) -> Result<Json<ApiResponse<LikeResponse>>, AppError> {
    let id = parse_id(&id)?;

    let likes = if body.increment {
        Expr::cust("\"likes\" + 1")
    } else {
        Expr::cust("GREATEST(\"likes\" - 1, 0)")
    };

    let model = portfolio::Entity::update_many()
        .col_expr(portfolio::Column::Likes, likes)
        .col_expr(portfolio::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(portfolio::Column::Id.eq(id))
        .exec_with_returning(&state.db)
        .await?
        .into_iter()
        .next()
        .ok_or_else(not_found)?;

    let message = if body.increment { "Liked" } else { "Unliked" };
    Ok(Json(ApiResponse::with_message(
        LikeResponse { likes: model.likes },
        message,
    )))
}

fn not_found() -> AppError {
    AppError::NotFound("Portfolio not found".into())
}

async fn find_portfolio<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<portfolio::Model, AppError> {
    portfolio::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(not_found)
}

/// Validate the image inputs, appending any failure to `details`.
fn image_change(
    state: &AppState,
    fields: &PortfolioFields,
    upload: Option<image::ImageUpload>,
    details: &mut Vec<String>,
) -> ImageChange {
    ImageChange::from_request(
        upload,
        fields.image_base64.as_deref(),
        state.config.storage.max_image_size,
    )
    .unwrap_or_else(|msg| {
        details.push(msg);
        ImageChange::Keep
    })
}

/// Copy the present fields of a patch onto the active model.
fn apply_fields(active: &mut portfolio::ActiveModel, fields: &PortfolioFields) {
    if let Some(title) = &fields.title {
        active.title = Set(title.clone());
    }
    if let Some(description) = &fields.description {
        active.description = Set(description.clone());
    }
    if fields.url.is_some() {
        active.url = Set(fields.stored_url());
    }
    if let Some(category) = fields.parsed_category() {
        active.category = Set(category);
    }
    if let Some(tags) = &fields.tags {
        active.tags = Set(tags.clone());
    }
    if let Some(featured) = fields.featured {
        active.featured = Set(featured);
    }
}

/// Release a blob stored for a write that did not commit.
async fn discard_new_blob(state: &AppState, applied: Option<&AppliedImage>) {
    if let Some(blob) = applied.and_then(|a| a.source.blob_id()) {
        image::release(&state.db, &*state.blob_store, blob).await;
    }
}
