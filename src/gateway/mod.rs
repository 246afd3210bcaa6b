//! Generic persistence primitives over one entity type.
//!
//! The gateway knows tables, columns and values. It knows nothing about
//! business rules; those live in the services built on top of it.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow};
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryGateway;
pub use postgres::PgGateway;

/// Primary key column shared by every entity.
pub const ID_COLUMN: &str = "id";

/// A single column value as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

/// Ordered column -> value map used for inserts and partial updates.
///
/// Only the columns present in the map are written; absent columns keep
/// their stored value (or the storage default on insert).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(Vec<(&'static str, Value)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Sets `column`, replacing an earlier value for the same column.
    pub fn insert(&mut self, column: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.0.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.0.iter().map(|(c, v)| (*c, v))
    }
}

impl IntoIterator for Fields {
    type Item = (&'static str, Value);
    type IntoIter = std::vec::IntoIter<(&'static str, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Equality constraint on one field. Field names the entity does not know
/// are ignored by every gateway rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unknown or read-only field `{0}`")]
    UnknownField(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` has the wrong type")]
    TypeMismatch(&'static str),

    #[error("unique constraint `{constraint}` violated")]
    UniqueViolation { constraint: String },

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return GatewayError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or("unique").to_string(),
                };
            }
        }
        GatewayError::Database(err)
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// A persisted record type the gateways can store.
pub trait Entity: Clone + Send + Sync + Unpin + for<'r> FromRow<'r, PgRow> + 'static {
    const TABLE: &'static str;
    /// Writable columns, in select order. `id` is implied and never writable.
    const COLUMNS: &'static [&'static str];
    /// Columns whose values must not repeat across rows.
    const UNIQUE: &'static [&'static str];

    fn id(&self) -> i64;

    /// Current value of `column`, `None` for unknown columns.
    fn get(&self, column: &str) -> Option<Value>;

    fn set(&mut self, column: &'static str, value: Value) -> GatewayResult<()>;

    /// Builds a fresh row; columns absent from `fields` take their defaults.
    fn from_fields(id: i64, fields: &Fields) -> GatewayResult<Self>;

    /// Resolves a caller-supplied field name to a known column.
    fn column(name: &str) -> Option<&'static str> {
        std::iter::once(ID_COLUMN)
            .chain(Self::COLUMNS.iter().copied())
            .find(|c| *c == name)
    }

    /// Rejects write maps that touch unknown or read-only columns.
    fn check_writable(fields: &Fields) -> GatewayResult<()> {
        match fields.iter().find(|(c, _)| !Self::COLUMNS.contains(c)) {
            Some((column, _)) => Err(GatewayError::UnknownField(column.to_string())),
            None => Ok(()),
        }
    }
}

/// Storage port for one entity type.
#[async_trait]
pub trait Gateway<E: Entity>: Send + Sync {
    async fn get(&self, id: i64) -> GatewayResult<Option<E>>;

    /// Rows matching every known filter, in insertion order, after skipping
    /// `offset` rows and returning at most `limit`.
    async fn list(&self, offset: i64, limit: i64, filters: &[Filter]) -> GatewayResult<Vec<E>>;

    async fn create(&self, fields: Fields) -> GatewayResult<E>;

    /// Overwrites exactly the supplied columns. `None` when `id` is absent.
    async fn update(&self, id: i64, fields: Fields) -> GatewayResult<Option<E>>;

    /// `false` when there was nothing to delete.
    async fn delete(&self, id: i64) -> GatewayResult<bool>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal entity used to exercise the gateways without the users domain.
    #[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
    pub struct Note {
        pub id: i64,
        pub title: String,
        pub pinned: bool,
    }

    impl Entity for Note {
        const TABLE: &'static str = "notes";
        const COLUMNS: &'static [&'static str] = &["title", "pinned"];
        const UNIQUE: &'static [&'static str] = &["title"];

        fn id(&self) -> i64 {
            self.id
        }

        fn get(&self, column: &str) -> Option<Value> {
            match column {
                "id" => Some(Value::Int(self.id)),
                "title" => Some(Value::Text(self.title.clone())),
                "pinned" => Some(Value::Bool(self.pinned)),
                _ => None,
            }
        }

        fn set(&mut self, column: &'static str, value: Value) -> GatewayResult<()> {
            match (column, value) {
                ("title", Value::Text(v)) => self.title = v,
                ("pinned", Value::Bool(v)) => self.pinned = v,
                ("title" | "pinned", _) => return Err(GatewayError::TypeMismatch(column)),
                _ => return Err(GatewayError::UnknownField(column.to_string())),
            }
            Ok(())
        }

        fn from_fields(id: i64, fields: &Fields) -> GatewayResult<Self> {
            let mut note = Note {
                id,
                title: String::new(),
                pinned: false,
            };
            if !fields.contains("title") {
                return Err(GatewayError::MissingField("title"));
            }
            for (column, value) in fields.iter() {
                note.set(column, value.clone())?;
            }
            Ok(note)
        }
    }

    #[test]
    fn fields_insert_replaces_existing_column() {
        let mut fields = Fields::new().with("title", "a").with("pinned", true);
        fields.insert("title", "b");
        assert_eq!(fields.iter().count(), 2);
        assert_eq!(fields.get("title"), Some(&Value::Text("b".into())));
    }

    #[test]
    fn column_resolves_id_and_known_columns_only() {
        assert_eq!(Note::column("id"), Some("id"));
        assert_eq!(Note::column("pinned"), Some("pinned"));
        assert_eq!(Note::column("colour"), None);
    }

    #[test]
    fn check_writable_rejects_id() {
        let err = Note::check_writable(&Fields::new().with("id", 3_i64)).unwrap_err();
        assert!(matches!(err, GatewayError::UnknownField(c) if c == "id"));
    }
}
