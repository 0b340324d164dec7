//! Runtime values for query parameters.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::Arguments;
use uuid::Uuid;

/// A runtime SQL value.
///
/// Every variant carries an `Option` so that a NULL parameter keeps its
/// Postgres type; binding an untyped NULL into a `uuid` or enum column would
/// be rejected by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// BOOLEAN
    Bool(Option<bool>),

    /// INTEGER
    Int(Option<i32>),

    /// BIGINT
    BigInt(Option<i64>),

    /// DOUBLE PRECISION
    Float(Option<f64>),

    /// TEXT
    Text(Option<String>),

    /// UUID
    Uuid(Option<Uuid>),

    /// TIMESTAMPTZ
    Timestamp(Option<DateTime<Utc>>),

    /// JSONB
    Json(Option<serde_json::Value>),

    /// A label of a Postgres enum type, bound as text and cast to `type_name`
    Enum {
        type_name: &'static str,
        label: Option<&'static str>,
    },

    /// The column default; only meaningful inside INSERT value lists
    Default,
}

impl Value {
    /// Returns true if this is a NULL value.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Bool(v) => v.is_none(),
            Value::Int(v) => v.is_none(),
            Value::BigInt(v) => v.is_none(),
            Value::Float(v) => v.is_none(),
            Value::Text(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::Json(v) => v.is_none(),
            Value::Enum { label, .. } => label.is_none(),
            Value::Default => false,
        }
    }

    /// Returns true for the column-default marker.
    pub fn is_default(&self) -> bool {
        matches!(self, Value::Default)
    }

    /// The cast appended to the placeholder, if the type needs one.
    pub(crate) fn cast(&self) -> Option<&'static str> {
        match self {
            Value::Enum { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    fn add_to(self, args: &mut PgArguments) {
        match self {
            Value::Bool(v) => args.add(v),
            Value::Int(v) => args.add(v),
            Value::BigInt(v) => args.add(v),
            Value::Float(v) => args.add(v),
            Value::Text(v) => args.add(v),
            Value::Uuid(v) => args.add(v),
            Value::Timestamp(v) => args.add(v),
            Value::Json(v) => args.add(v.map(sqlx::types::Json)),
            Value::Enum { label, .. } => args.add(label.map(str::to_owned)),
            Value::Default => {}
        }
    }
}

/// Packs parameters into sqlx arguments, in placeholder order.
pub(crate) fn into_arguments(params: Vec<Value>) -> PgArguments {
    let mut args = PgArguments::default();
    for value in params {
        value.add_to(&mut args);
    }
    args
}

/// Conversion of Rust column types into [`Value`].
///
/// `null_value` produces the typed NULL used when an `Option<Self>` is `None`.
pub trait IntoValue {
    fn into_value(self) -> Value;

    fn null_value() -> Value;
}

macro_rules! impl_into_value {
    ($ty:ty, $variant:ident) => {
        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(Some(self))
            }

            fn null_value() -> Value {
                Value::$variant(None)
            }
        }
    };
}

impl_into_value!(bool, Bool);
impl_into_value!(i32, Int);
impl_into_value!(i64, BigInt);
impl_into_value!(f64, Float);
impl_into_value!(String, Text);
impl_into_value!(Uuid, Uuid);
impl_into_value!(DateTime<Utc>, Timestamp);
impl_into_value!(serde_json::Value, Json);

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(Some(self.to_owned()))
    }

    fn null_value() -> Value {
        Value::Text(None)
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => T::null_value(),
        }
    }

    fn null_value() -> Value {
        T::null_value()
    }
}

/// A Rust enum mirrored by a Postgres enum type.
pub trait DbEnum: Copy {
    /// Name of the Postgres type
    const TYPE_NAME: &'static str;

    /// Label stored in the database
    fn label(&self) -> &'static str;
}

/// Implements [`IntoValue`] and the aggregate markers for a [`DbEnum`].
#[macro_export]
macro_rules! impl_db_enum_value {
    ($ty:ty) => {
        impl $crate::query::IntoValue for $ty {
            fn into_value(self) -> $crate::query::Value {
                $crate::query::Value::Enum {
                    type_name: <$ty as $crate::query::DbEnum>::TYPE_NAME,
                    label: Some($crate::query::DbEnum::label(&self)),
                }
            }

            fn null_value() -> $crate::query::Value {
                $crate::query::Value::Enum {
                    type_name: <$ty as $crate::query::DbEnum>::TYPE_NAME,
                    label: None,
                }
            }
        }

        impl $crate::query::Ordered for $ty {
            type Inner = $ty;
        }
    };
}
