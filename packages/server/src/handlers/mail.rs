use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::mail::{ContactRequest, MailSentResponse};
use crate::models::shared::ApiResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/send-email",
    tag = "Contact",
    operation_id = "sendEmail",
    summary = "Relay a contact-form inquiry",
    description = "Sends one notification mail through the configured provider with \
        `reply_to` set to the caller's address. Caller-supplied text is HTML-escaped.",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Mail accepted by the provider", body = ApiResponse<MailSentResponse>),
        (status = 400, description = "Malformed body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Mail not configured or provider failure (CONFIGURATION_ERROR, UPSTREAM_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, request))]
pub async fn send_email(
    State(state): State<AppState>,
    AppJson(request): AppJson<ContactRequest>,
) -> Result<Json<ApiResponse<MailSentResponse>>, AppError> {
    let id = state.mailer.send_contact(&request).await?;
    Ok(Json(ApiResponse::with_message(
        MailSentResponse { id },
        "Email sent successfully",
    )))
}
