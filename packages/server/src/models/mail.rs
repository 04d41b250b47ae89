use serde::{Deserialize, Serialize};

/// Contact-form submission relayed by `POST /send-email`.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct ContactRequest {
    #[schema(example = "Acme Corp")]
    pub company: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "010-1234-5678")]
    pub phone: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "Web Development")]
    pub project_type: String,
    pub message: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MailSentResponse {
    /// Provider-assigned message ID, when the provider returns one.
    pub id: Option<String>,
}
