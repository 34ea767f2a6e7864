//! Registration by emailed code, and password login.
//!
//! Per email: no pending code -> code issued -> consumed, superseded by a
//! newer request, or expired. Only the most recent code for an email can be
//! redeemed, and it can be redeemed once.

use chrono::{Duration, Utc};
use rand::{rngs::OsRng, Rng};
use std::sync::Arc;
use validator::ValidateEmail;

use super::{
    email::EmailProvider,
    error::ServiceError,
    jwt::JwtService,
    store::{BlogStore, StoreError},
};
use crate::{
    models::{Author, NewAuthor},
    utils::{hash_password, password::verify_against_dummy, verify_password, Password, PasswordHashString},
};

pub const CODE_LENGTH: usize = 6;
pub const MAX_EMAIL_CHARS: usize = 255;
pub const MAX_NAME_CHARS: usize = 255;
pub const MAX_CODE_CHARS: usize = 10;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 128;

/// How a freshly generated code reaches the user.
#[derive(Clone)]
pub enum CodeDelivery {
    Email(Arc<dyn EmailProvider>),
    /// Hand the code back to the caller. Development only.
    Echo,
}

/// Result of a code request. `dev_code` is set only for [`CodeDelivery::Echo`].
#[derive(Debug, Clone)]
pub struct CodeRequested {
    pub email: String,
    pub dev_code: Option<String>,
}

/// An authenticated author and their bearer token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub author: Author,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn BlogStore>,
    delivery: CodeDelivery,
    jwt: JwtService,
    code_ttl: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn BlogStore>,
        delivery: CodeDelivery,
        jwt: JwtService,
        code_ttl: Duration,
    ) -> Self {
        Self {
            store,
            delivery,
            jwt,
            code_ttl,
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub async fn request_verification(&self, email: &str) -> Result<CodeRequested, ServiceError> {
        let email = normalize_email(email);
        validate_email(&email)?;

        let code = generate_code();

        // Replaces any outstanding code for this email
        self.store.put_code(&email, &code, self.code_ttl).await?;

        let dev_code = match &self.delivery {
            CodeDelivery::Email(provider) => {
                if let Err(e) = provider
                    .send_verification_code(&email, &code, self.code_ttl.num_minutes())
                    .await
                {
                    tracing::error!(email = %email, error = %e, "Verification code delivery failed");
                }
                None
            }
            CodeDelivery::Echo => {
                tracing::info!(email = %email, code = %code, "Verification code issued (dev echo)");
                Some(code)
            }
        };

        tracing::info!(email = %email, "Verification code requested");

        Ok(CodeRequested { email, dev_code })
    }

    pub async fn verify_and_register(
        &self,
        email: &str,
        code: &str,
        name: &str,
        password: Password,
    ) -> Result<AuthSession, ServiceError> {
        let email = normalize_email(email);
        let code = code.trim();
        let name = name.trim();

        validate_email(&email)?;
        if code.is_empty() {
            return Err(ServiceError::validation("code is required"));
        }
        if code.chars().count() > MAX_CODE_CHARS {
            return Err(ServiceError::validation(format!(
                "code must be at most {} characters",
                MAX_CODE_CHARS
            )));
        }
        validate_name(name)?;
        validate_password(&password)?;

        self.store
            .find_valid_code(&email, code)
            .await?
            .ok_or(ServiceError::InvalidOrExpiredCode)?;

        // Consume before anything else can fail so the code is single-use
        self.store.delete_codes_for(&email).await?;

        if self.store.find_author_by_email(&email).await?.is_some() {
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let password_hash = hash_password(&password)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        let author = self
            .store
            .insert_author(NewAuthor {
                name: name.to_string(),
                email: Some(email.clone()),
                password_hash: Some(password_hash.into_string()),
                avatar_path: None,
                email_verified_at: Some(Utc::now()),
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => ServiceError::EmailAlreadyRegistered,
                other => ServiceError::Store(other),
            })?;

        tracing::info!(author_id = author.id, "Author registered");

        let token = self.jwt.issue_token(author.id).map_err(|e| {
            tracing::error!(
                author_id = author.id,
                error = %e,
                "Token issuance failed after registration; author may log in"
            );
            ServiceError::Internal(e)
        })?;

        Ok(AuthSession { author, token })
    }

    pub async fn login(&self, email: &str, password: Password) -> Result<AuthSession, ServiceError> {
        let email = normalize_email(email);
        if email.is_empty() || password.as_str().is_empty() {
            return Err(ServiceError::validation("email and password are required"));
        }

        let author = self.store.find_author_by_email(&email).await?;

        let author = match author {
            Some(author) => match author
                .password_hash
                .as_deref()
                .map(|hash| verify_password(&password, &PasswordHashString::new(hash.to_string())))
            {
                Some(true) => author,
                Some(false) => {
                    tracing::info!(author_id = author.id, "Login failed: wrong password");
                    return Err(ServiceError::InvalidCredentials);
                }
                None => {
                    verify_against_dummy(&password);
                    tracing::info!(author_id = author.id, "Login failed: account has no password");
                    return Err(ServiceError::InvalidCredentials);
                }
            },
            None => {
                verify_against_dummy(&password);
                tracing::info!("Login failed: unknown email");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let token = self.jwt.issue_token(author.id)?;

        tracing::info!(author_id = author.id, "Author logged in");

        Ok(AuthSession { author, token })
    }

    /// Delete verification rows whose expiry has passed.
    pub async fn reap_expired_codes(&self) -> Result<u64, ServiceError> {
        let removed = self.store.delete_expired_codes().await?;
        if removed > 0 {
            tracing::info!(removed, "Expired verification codes removed");
        }
        Ok(removed)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), ServiceError> {
    if email.is_empty() {
        return Err(ServiceError::validation("email is required"));
    }
    if email.chars().count() > MAX_EMAIL_CHARS {
        return Err(ServiceError::validation(format!(
            "email must be at most {} characters",
            MAX_EMAIL_CHARS
        )));
    }
    if !email.validate_email() {
        return Err(ServiceError::validation("email is not a valid address"));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name.is_empty() {
        return Err(ServiceError::validation("name is required"));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ServiceError::validation(format!(
            "name must be at most {} characters",
            MAX_NAME_CHARS
        )));
    }
    Ok(())
}

fn validate_password(password: &Password) -> Result<(), ServiceError> {
    let len = password.char_len();
    if len == 0 {
        return Err(ServiceError::validation("password is required"));
    }
    if len < MIN_PASSWORD_CHARS {
        return Err(ServiceError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    if len > MAX_PASSWORD_CHARS {
        return Err(ServiceError::validation(format!(
            "password must be at most {} characters",
            MAX_PASSWORD_CHARS
        )));
    }
    Ok(())
}

/// Six digits, each drawn uniformly from the OS random source.
fn generate_code() -> String {
    let mut rng = OsRng;
    (0..CODE_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
