use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::error::ServiceError;
use crate::config::SmtpConfig;

/// Delivers verification codes.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_verification_code(
        &self,
        to_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), ServiceError>;
}

#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl EmailService {
    pub fn new(config: &SmtpConfig) -> Result<Self, ServiceError> {
        let mut builder = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| ServiceError::Email(e.to_string()))?
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)));

        if !config.user.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.user.clone(),
                config.password.expose().to_string(),
            ));
        }

        tracing::info!(host = %config.host, port = config.port, "Email service initialized");

        Ok(Self {
            mailer: builder.build(),
            from_email: config.from.clone(),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: String,
    ) -> Result<(), ServiceError> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| ServiceError::Email(e.to_string()))?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| ServiceError::Email(e.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(plain_body)
            .map_err(|e| ServiceError::Email(e.to_string()))?;

        // SmtpTransport is blocking
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| ServiceError::Internal(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %to_email, "Failed to send email");
                Err(ServiceError::Email(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl EmailProvider for EmailService {
    async fn send_verification_code(
        &self,
        to_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), ServiceError> {
        let body = format!(
            "Your verification code is {}\n\n\
             It expires in {} minutes. If you did not request it, you can ignore this email.",
            code, ttl_minutes
        );

        self.send_email(to_email, "Your verification code", body).await
    }
}

/// Records codes instead of sending them.
#[derive(Default)]
pub struct MockEmailService {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every send fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// (email, code) pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code)
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_verification_code(
        &self,
        to_email: &str,
        code: &str,
        _ttl_minutes: i64,
    ) -> Result<(), ServiceError> {
        if self.fail {
            return Err(ServiceError::Email("mock transport failure".to_string()));
        }
        tracing::info!(to = %to_email, "Mock: verification code recorded");
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((to_email.to_string(), code.to_string()));
        Ok(())
    }
}
