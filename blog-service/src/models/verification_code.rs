//! Verification code model - single-use registration code sent by email.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Outstanding code for an email. At most one row exists per email.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub id: i64,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Check if the code has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn matches(&self, email: &str, code: &str, now: DateTime<Utc>) -> bool {
        self.email == email && self.code == code && !self.is_expired_at(now)
    }
}
