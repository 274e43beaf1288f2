//! Shared record types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{macros::format_description, Date, OffsetDateTime};

/// A registered user as stored in the database.
///
/// The password hash never leaves the server; it is skipped during
/// serialization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub password_hash: String,
    pub dob: Date,
}

/// A post on the board.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub content: String,
    pub created_at: OffsetDateTime,
}

/// Parse a date of birth submitted as `YYYY-MM-DD`.
///
/// Kept as an explicit step rather than folded into body deserialization so
/// a bad date surfaces as a validation error the caller can map to a 400.
pub fn parse_birth_date(input: &str) -> Result<Date, DateParseError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(input, &format).map_err(|_| DateParseError::Invalid(input.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum DateParseError {
    #[error("invalid date: {0} (expected YYYY-MM-DD)")]
    Invalid(String),
}
