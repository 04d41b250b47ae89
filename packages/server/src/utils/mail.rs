use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::MailConfig;
use crate::error::AppError;
use crate::models::mail::ContactRequest;

/// Client for the transactional mail HTTP API.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    config: MailConfig,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Deserialize)]
struct SendResponse {
    id: Option<String>,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Credentials in use: `(api_key, sender)`.
    fn credentials(&self) -> Result<(&str, &str), AppError> {
        let api_key = self.config.api_key.as_deref().filter(|s| !s.is_empty());
        let sender = self.config.sender.as_deref().filter(|s| !s.is_empty());
        match (api_key, sender) {
            (Some(key), Some(sender)) => Ok((key, sender)),
            _ => Err(AppError::Configuration(
                "mail.api_key and mail.sender must both be set".into(),
            )),
        }
    }

    /// Relay a contact-form submission. Returns the provider's message ID.
    pub async fn send_contact(&self, request: &ContactRequest) -> Result<Option<String>, AppError> {
        let (api_key, sender) = self.credentials()?;
        let recipient = self
            .config
            .recipient
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(sender);
        let reply_to = Some(request.email.trim()).filter(|s| !s.is_empty());

        let body = SendRequest {
            from: sender,
            to: [recipient],
            subject: contact_subject(request),
            html: render_contact_html(request),
            reply_to,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("mail request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "mail provider returned {status}: {text}"
            )));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("unreadable mail provider response: {e}")))?;
        info!(id = ?sent.id, "Contact mail sent");
        Ok(sent.id)
    }
}

/// Escape text for interpolation into HTML element content or attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn contact_subject(request: &ContactRequest) -> String {
    let company = request.company.trim();
    let name = request.name.trim();
    match (company.is_empty(), name.is_empty()) {
        (false, false) => format!("[Portfolio] New inquiry from {name} ({company})"),
        (true, false) => format!("[Portfolio] New inquiry from {name}"),
        (false, true) => format!("[Portfolio] New inquiry from {company}"),
        (true, true) => "[Portfolio] New inquiry".to_string(),
    }
}

/// Render the notification mail. Every field is escaped; message newlines
/// become `<br>`.
pub fn render_contact_html(request: &ContactRequest) -> String {
    let row = |label: &str, value: &str| {
        format!(
            "<tr><th align=\"left\" style=\"padding:4px 12px 4px 0\">{label}</th>\
             <td style=\"padding:4px 0\">{}</td></tr>",
            escape_html(value)
        )
    };
    let message = escape_html(&request.message)
        .replace("\r\n", "\n")
        .replace('\n', "<br>");

    format!(
        "<h2>New project inquiry</h2>\
         <table>{}{}{}{}{}</table>\
         <h3>Message</h3><p>{message}</p>",
        row("Company", &request.company),
        row("Name", &request.name),
        row("Phone", &request.phone),
        row("Email", &request.email),
        row("Project type", &request.project_type),
    )
}
