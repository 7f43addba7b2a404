// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report email delivery.
//!
//! Two transports:
//! - Brevo transactional API (`POST /smtp/email`) over HTTPS
//! - SMTP with STARTTLS via `lettre`
//!
//! The transport is chosen from config: Brevo when an API key is present,
//! otherwise SMTP when a host is set, otherwise delivery is disabled.

use crate::config::{MailConfig, SmtpConfig};
use crate::error::{truncate_body, DeliveryError, LOG_BODY_LIMIT};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Display name used as sender.
const SENDER_NAME: &str = "Eventix Daily Report";

/// A file attached to a message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub name: String,
    pub content: Vec<u8>,
}

impl Attachment {
    /// Read a file from disk, named after its file name.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        Ok(Self {
            name,
            content: std::fs::read(path)?,
        })
    }
}

/// A plain-text message; the HTML part is derived from it.
#[derive(Debug, Clone)]
pub struct Email {
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// Body as minimal HTML (line breaks only).
    pub fn html_body(&self) -> String {
        self.body.replace('\n', "<br>")
    }
}

/// Configured mail transport.
pub enum Mailer {
    Brevo(BrevoMailer),
    Smtp(SmtpMailer),
    Disabled,
}

impl Mailer {
    /// Pick a transport from config.
    pub fn from_config(config: &MailConfig, timeout: Duration) -> Result<Self, DeliveryError> {
        if let Some(api_key) = &config.brevo_api_key {
            return Ok(Mailer::Brevo(BrevoMailer::new(
                config.brevo_api_url.clone(),
                api_key.clone(),
                config.from.clone(),
                config.to.clone(),
                timeout,
            )?));
        }
        if let Some(smtp) = &config.smtp {
            return Ok(Mailer::Smtp(SmtpMailer::new(
                smtp.clone(),
                config.from.clone(),
                config.to.clone(),
            )));
        }
        tracing::warn!("No mail transport configured (BREVO_API_KEY or SMTP_HOST)");
        Ok(Mailer::Disabled)
    }

    /// Send `email` to the configured recipients.
    pub async fn send(&self, email: &Email) -> Result<(), DeliveryError> {
        match self {
            Mailer::Brevo(m) => m.send(email).await,
            Mailer::Smtp(m) => m.send(email).await,
            Mailer::Disabled => Err(DeliveryError::NotConfigured),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Brevo
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct BrevoContact<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct BrevoAttachment<'a> {
    content: String,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoMessage<'a> {
    sender: BrevoContact<'a>,
    to: Vec<BrevoContact<'a>>,
    subject: &'a str,
    html_content: String,
    text_content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachment: Vec<BrevoAttachment<'a>>,
}

/// Brevo (Sendinblue) transactional email client.
pub struct BrevoMailer {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
    to: Vec<String>,
}

impl BrevoMailer {
    pub fn new(
        base_url: String,
        api_key: String,
        from: String,
        to: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            from,
            to,
        })
    }

    pub async fn send(&self, email: &Email) -> Result<(), DeliveryError> {
        let message = BrevoMessage {
            sender: BrevoContact {
                email: &self.from,
                name: Some(SENDER_NAME),
            },
            to: self
                .to
                .iter()
                .map(|email| BrevoContact { email, name: None })
                .collect(),
            subject: &email.subject,
            html_content: email.html_body(),
            text_content: &email.body,
            attachment: email
                .attachments
                .iter()
                .map(|a| BrevoAttachment {
                    content: BASE64.encode(&a.content),
                    name: &a.name,
                })
                .collect(),
        };

        let response = self
            .http
            .post(format!("{}/smtp/email", self.base_url))
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&message)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: truncate_body(&body, LOG_BODY_LIMIT),
            });
        }

        let message_id = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("messageId").and_then(|id| id.as_str()).map(String::from));
        tracing::info!(
            message_id = message_id.as_deref().unwrap_or(""),
            recipients = self.to.len(),
            "Email sent via Brevo"
        );
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SMTP
// ─────────────────────────────────────────────────────────────────────────────

/// SMTP client (STARTTLS relay).
pub struct SmtpMailer {
    config: SmtpConfig,
    from: String,
    to: Vec<String>,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig, from: String, to: Vec<String>) -> Self {
        Self { config, from, to }
    }

    /// Assemble the MIME message without sending it.
    pub fn build_message(&self, email: &Email) -> Result<lettre::Message, DeliveryError> {
        use lettre::message::{header::ContentType, Attachment as MimeAttachment, Mailbox};
        use lettre::message::{MultiPart, SinglePart};

        let from: Mailbox = format!("{} <{}>", SENDER_NAME, self.from)
            .parse()
            .map_err(|e: lettre::address::AddressError| DeliveryError::Address(e.to_string()))?;

        let mut builder = lettre::Message::builder()
            .from(from)
            .subject(email.subject.clone());
        for recipient in &self.to {
            let mailbox: Mailbox = recipient.parse().map_err(
                |e: lettre::address::AddressError| DeliveryError::Address(e.to_string()),
            )?;
            builder = builder.to(mailbox);
        }

        let csv_type = ContentType::parse("text/csv")
            .map_err(|e| DeliveryError::Build(e.to_string()))?;

        let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(email.body.clone()));
        for attachment in &email.attachments {
            parts = parts.singlepart(
                MimeAttachment::new(attachment.name.clone())
                    .body(attachment.content.clone(), csv_type.clone()),
            );
        }

        builder
            .multipart(parts)
            .map_err(|e| DeliveryError::Build(e.to_string()))
    }

    pub async fn send(&self, email: &Email) -> Result<(), DeliveryError> {
        use lettre::{
            transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport,
            Tokio1Executor,
        };

        let message = self.build_message(email)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .map_err(|e| DeliveryError::Transport(e.to_string()))?
                .port(self.config.port);

        if let (Some(user), Some(pass)) = (&self.config.user, &self.config.password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport_builder
            .build()
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        tracing::info!(recipients = self.to.len(), "Email sent via SMTP");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_mailer(to: &str) -> SmtpMailer {
        SmtpMailer::new(
            SmtpConfig {
                host: "smtp.example.com".to_string(),
                port: 587,
                user: None,
                password: None,
            },
            "report@example.com".to_string(),
            vec![to.to_string()],
        )
    }

    fn email() -> Email {
        Email {
            subject: "Verkooprapport".to_string(),
            body: "regel 1\nregel 2".to_string(),
            attachments: vec![Attachment {
                name: "sales_2025-01-01.csv".to_string(),
                content: b"order_id,total\n".to_vec(),
            }],
        }
    }

    #[test]
    fn test_html_body_breaks_lines() {
        assert_eq!(email().html_body(), "regel 1<br>regel 2");
    }

    #[test]
    fn test_smtp_message_carries_attachment() {
        let message = smtp_mailer("ops@example.com").build_message(&email()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("sales_2025-01-01.csv"));
        assert!(raw.contains("text/csv"));
    }

    #[test]
    fn test_smtp_rejects_bad_recipient() {
        let result = smtp_mailer("not an address").build_message(&email());
        assert!(matches!(result, Err(DeliveryError::Address(_))));
    }

    #[tokio::test]
    async fn test_disabled_mailer_reports_not_configured() {
        let result = Mailer::Disabled.send(&email()).await;
        assert!(matches!(result, Err(DeliveryError::NotConfigured)));
    }
}
