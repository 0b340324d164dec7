/// Account model
///
/// Links a user to an external authentication provider (OAuth or similar).
/// A provider account can be linked to exactly one user.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     type TEXT NOT NULL,
///     provider TEXT NOT NULL,
///     provider_account_id TEXT NOT NULL,
///     refresh_token TEXT,
///     access_token TEXT,
///     expires_at INTEGER,
///     token_type TEXT,
///     scope TEXT,
///     id_token TEXT,
///     session_state TEXT,
///     UNIQUE (provider, provider_account_id)
/// );
/// ```

use super::{assign, CreateInput, Model, UniqueKey, UpdateInput};
use crate::query::{Field, IntoValue, Value};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A provider account linked to a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Account kind, e.g. "oauth" or "oidc"
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,

    pub provider: String,
    pub provider_account_id: String,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,

    /// Access token expiry as a Unix timestamp in seconds
    pub expires_at: Option<i32>,

    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    pub session_state: Option<String>,
}

impl Account {
    /// Access token expiry, if the provider reported one
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|secs| Utc.timestamp_opt(i64::from(secs), 0).single())
    }

    /// True when the access token has expired; tokens without expiry never do
    pub fn is_access_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires().is_some_and(|expires| expires <= now)
    }
}

/// Input for linking a provider account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAccount {
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub kind: String,
    pub provider: String,
    pub provider_account_id: String,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    pub expires_at: Option<i32>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    pub session_state: Option<String>,
}

impl CreateInput for CreateAccount {
    fn into_values(self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.unwrap_or_else(Uuid::new_v4).into_value()),
            ("user_id", self.user_id.into_value()),
            ("type", self.kind.into_value()),
            ("provider", self.provider.into_value()),
            ("provider_account_id", self.provider_account_id.into_value()),
            ("refresh_token", self.refresh_token.into_value()),
            ("access_token", self.access_token.into_value()),
            ("expires_at", self.expires_at.into_value()),
            ("token_type", self.token_type.into_value()),
            ("scope", self.scope.into_value()),
            ("id_token", self.id_token.into_value()),
            ("session_state", self.session_state.into_value()),
        ]
    }
}

/// Input for updating an account, typically after a token refresh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAccount {
    pub user_id: Option<Uuid>,
    pub refresh_token: Option<Option<String>>,
    pub access_token: Option<Option<String>>,
    pub expires_at: Option<Option<i32>>,
    pub token_type: Option<Option<String>>,
    pub scope: Option<Option<String>>,
    pub id_token: Option<Option<String>>,
    pub session_state: Option<Option<String>>,
}

impl UpdateInput for UpdateAccount {
    fn into_assignments(self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "user_id", self.user_id);
        assign(&mut out, "refresh_token", self.refresh_token);
        assign(&mut out, "access_token", self.access_token);
        assign(&mut out, "expires_at", self.expires_at);
        assign(&mut out, "token_type", self.token_type);
        assign(&mut out, "scope", self.scope);
        assign(&mut out, "id_token", self.id_token);
        assign(&mut out, "session_state", self.session_state);
        out
    }
}

/// Unique keys of accounts
#[derive(Debug, Clone, PartialEq)]
pub enum AccountUnique {
    Id(Uuid),
    ProviderAccount {
        provider: String,
        provider_account_id: String,
    },
}

impl UniqueKey for AccountUnique {
    fn columns(&self) -> Vec<(&'static str, Value)> {
        match self {
            AccountUnique::Id(id) => vec![("id", (*id).into_value())],
            AccountUnique::ProviderAccount {
                provider,
                provider_account_id,
            } => vec![
                ("provider", provider.clone().into_value()),
                ("provider_account_id", provider_account_id.clone().into_value()),
            ],
        }
    }
}

impl Model for Account {
    const NAME: &'static str = "Account";
    const TABLE: &'static str = "accounts";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    type Unique = AccountUnique;
    type Create = CreateAccount;
    type Update = UpdateAccount;
}

pub mod fields {
    use super::*;

    pub const ID: Field<Account, Uuid> = Field::new("id");
    pub const USER_ID: Field<Account, Uuid> = Field::new("user_id");
    pub const KIND: Field<Account, String> = Field::new("type");
    pub const PROVIDER: Field<Account, String> = Field::new("provider");
    pub const PROVIDER_ACCOUNT_ID: Field<Account, String> = Field::new("provider_account_id");
    pub const REFRESH_TOKEN: Field<Account, Option<String>> = Field::new("refresh_token");
    pub const ACCESS_TOKEN: Field<Account, Option<String>> = Field::new("access_token");
    pub const EXPIRES_AT: Field<Account, Option<i32>> = Field::new("expires_at");
    pub const TOKEN_TYPE: Field<Account, Option<String>> = Field::new("token_type");
    pub const SCOPE: Field<Account, Option<String>> = Field::new("scope");
    pub const ID_TOKEN: Field<Account, Option<String>> = Field::new("id_token");
    pub const SESSION_STATE: Field<Account, Option<String>> = Field::new("session_state");
}

pub mod relations {
    use super::Account;
    use crate::models::user::User;
    use crate::query::Relation;

    pub const USER: Relation<Account, User> = Relation::new("user_id", "id");
}
