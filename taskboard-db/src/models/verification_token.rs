/// VerificationToken model
///
/// Identifier/token pairs for out-of-band flows such as email confirmation
/// or magic-link sign-in. The table has no surrogate key: a token is unique
/// on its own and together with its identifier.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE verification_tokens (
///     identifier TEXT NOT NULL,
///     token TEXT NOT NULL UNIQUE,
///     expires TIMESTAMPTZ NOT NULL,
///     UNIQUE (identifier, token)
/// );
/// ```
///
/// Tokens are consumed by deleting them: `delete` returns the row, so the
/// caller can check `is_expired` on what it removed.
///
/// [`CreateVerificationToken::issue`] stores only the SHA-256 digest of the
/// token and hands back the plaintext to send out; look such rows up with
/// [`VerificationTokenUnique::from_plaintext`].
///
/// ```no_run
/// use chrono::Duration;
/// use taskboard_db::client::Client;
/// use taskboard_db::models::verification_token::{CreateVerificationToken, VerificationTokenUnique};
///
/// # async fn example(client: Client) -> Result<(), Box<dyn std::error::Error>> {
/// let (input, link_token) = CreateVerificationToken::issue("a@example.com", Duration::hours(1));
/// client.verification_token().create(input).await?;
///
/// // later, when the link is followed
/// let consumed = client
///     .verification_token()
///     .delete(VerificationTokenUnique::from_plaintext("a@example.com", &link_token))
///     .await?;
/// assert!(!consumed.is_expired());
/// # Ok(())
/// # }
/// ```

use super::{assign, CreateInput, Model, UniqueKey, UpdateInput};
use crate::auth::token::{generate_token, hash_token, verify_token};
use crate::query::{Field, IntoValue, Value};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VerificationToken {
    /// What is being verified, usually an email address
    pub identifier: String,
    pub token: String,
    pub expires: DateTime<Utc>,
}

impl VerificationToken {
    pub fn is_expired(&self) -> bool {
        self.expires <= Utc::now()
    }

    /// True when `plaintext` is the token this row stores the digest of
    pub fn matches(&self, plaintext: &str) -> bool {
        verify_token(plaintext, &self.token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateVerificationToken {
    #[validate(length(min = 1, message = "Identifier must not be empty"))]
    pub identifier: String,

    #[validate(length(min = 16, message = "Token must be at least 16 characters"))]
    pub token: String,

    pub expires: DateTime<Utc>,
}

impl CreateVerificationToken {
    /// A fresh random token for `identifier`, valid for `ttl`
    pub fn new(identifier: impl Into<String>, ttl: Duration) -> Self {
        Self {
            identifier: identifier.into(),
            token: generate_token(),
            expires: Utc::now() + ttl,
        }
    }

    /// Like `new`, but the row keeps only the token's digest. Returns the
    /// input and the plaintext token to deliver.
    pub fn issue(identifier: impl Into<String>, ttl: Duration) -> (Self, String) {
        let plaintext = generate_token();
        let input = Self {
            identifier: identifier.into(),
            token: hash_token(&plaintext),
            expires: Utc::now() + ttl,
        };
        (input, plaintext)
    }
}

impl CreateInput for CreateVerificationToken {
    fn validate_input(&self) -> crate::error::DbResult<()> {
        Ok(self.validate()?)
    }

    fn into_values(self) -> Vec<(&'static str, Value)> {
        vec![
            ("identifier", self.identifier.into_value()),
            ("token", self.token.into_value()),
            ("expires", self.expires.into_value()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVerificationToken {
    pub expires: Option<DateTime<Utc>>,
}

impl UpdateInput for UpdateVerificationToken {
    fn into_assignments(self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "expires", self.expires);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationTokenUnique {
    Token(String),
    IdentifierToken { identifier: String, token: String },
}

impl VerificationTokenUnique {
    /// Key of a row created with [`CreateVerificationToken::issue`]
    pub fn from_plaintext(identifier: impl Into<String>, plaintext: &str) -> Self {
        VerificationTokenUnique::IdentifierToken {
            identifier: identifier.into(),
            token: hash_token(plaintext),
        }
    }
}

impl UniqueKey for VerificationTokenUnique {
    fn columns(&self) -> Vec<(&'static str, Value)> {
        match self {
            VerificationTokenUnique::Token(token) => vec![("token", token.clone().into_value())],
            VerificationTokenUnique::IdentifierToken { identifier, token } => vec![
                ("identifier", identifier.clone().into_value()),
                ("token", token.clone().into_value()),
            ],
        }
    }
}

impl Model for VerificationToken {
    const NAME: &'static str = "VerificationToken";
    const TABLE: &'static str = "verification_tokens";
    const PRIMARY_KEY: &'static [&'static str] = &["token"];

    type Unique = VerificationTokenUnique;
    type Create = CreateVerificationToken;
    type Update = UpdateVerificationToken;
}

pub mod fields {
    use super::*;

    pub const IDENTIFIER: Field<VerificationToken, String> = Field::new("identifier");
    pub const TOKEN: Field<VerificationToken, String> = Field::new("token");
    pub const EXPIRES: Field<VerificationToken, DateTime<Utc>> = Field::new("expires");
}
