use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values that can be stored in a database row or used as query parameters.
///
/// The same enum is used for every driver so helper code never branches on
/// driver types:
/// ```rust
/// use sql_dbal::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<u32> for RowValues {
    fn from(value: u32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<JsonValue> for RowValues {
    fn from(value: JsonValue) -> Self {
        RowValues::JSON(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// The database type a driver speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `MySQL` / `MariaDB`; no driver is bundled, hosts supply one
    Mysql,
    /// `SQLite` database
    Sqlite,
}

/// Normalizes the accepted parameter forms into one ordered list.
///
/// A statement's parameters may be passed as one sequence (slice, `Vec`,
/// array) or positionally as a tuple of values convertible into
/// [`RowValues`]:
/// ```rust
/// use sql_dbal::prelude::*;
///
/// let as_sequence = vec![RowValues::Int(1), RowValues::Text("a".into())].into_params();
/// let positional = (1_i64, "a").into_params();
/// assert_eq!(as_sequence, positional);
/// ```
pub trait IntoParams {
    fn into_params(self) -> Vec<RowValues>;
}

impl IntoParams for () {
    fn into_params(self) -> Vec<RowValues> {
        Vec::new()
    }
}

impl IntoParams for Vec<RowValues> {
    fn into_params(self) -> Vec<RowValues> {
        self
    }
}

impl IntoParams for &Vec<RowValues> {
    fn into_params(self) -> Vec<RowValues> {
        self.clone()
    }
}

impl IntoParams for &[RowValues] {
    fn into_params(self) -> Vec<RowValues> {
        self.to_vec()
    }
}

impl<const N: usize> IntoParams for [RowValues; N] {
    fn into_params(self) -> Vec<RowValues> {
        self.into()
    }
}

impl<const N: usize> IntoParams for &[RowValues; N] {
    fn into_params(self) -> Vec<RowValues> {
        self.to_vec()
    }
}

macro_rules! impl_into_params_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<RowValues>),+> IntoParams for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_params(self) -> Vec<RowValues> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

impl_into_params_for_tuple!(A);
impl_into_params_for_tuple!(A, B);
impl_into_params_for_tuple!(A, B, C);
impl_into_params_for_tuple!(A, B, C, D);
impl_into_params_for_tuple!(A, B, C, D, E);
impl_into_params_for_tuple!(A, B, C, D, E, F);
impl_into_params_for_tuple!(A, B, C, D, E, F, G);
impl_into_params_for_tuple!(A, B, C, D, E, F, G, H);

/// Build a `Vec<RowValues>` from values convertible into [`RowValues`].
///
/// ```rust
/// use sql_dbal::params;
/// use sql_dbal::prelude::*;
///
/// let p = params![1_i64, "bob", None::<i64>];
/// assert_eq!(p[2], RowValues::Null);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::types::RowValues>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::types::RowValues::from($value)),+]
    };
}
