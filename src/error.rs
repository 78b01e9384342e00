use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] turso::Error),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Invalid config: {0}")]
    ConfigInvalid(&'static str),

    #[error("Statement table not set")]
    StatementTableNotSet,

    #[error("Statement kind not set")]
    StatementKindNotSet,

    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    #[error("Invalid condition on column {column}: {reason}")]
    InvalidCondition { column: String, reason: &'static str },

    #[error("Scanner destination must be a struct or a growable sequence of structs")]
    ScannerUnsupportedShape,

    #[error("Scanner destination was bound read-only")]
    ScannerNotWritable,

    #[error("Scanner has no cursor attached")]
    ScannerCursorMissing,

    #[error("Record not found")]
    RecordNotFound,

    #[error("Expected a sequence destination like Vec<Model>")]
    ExpectSlice,

    #[error("Expected a single struct destination")]
    ExpectStruct,

    #[error("Entity {0} has no primary key")]
    MissingPrimaryKey(&'static str),

    #[error("Entity {entity} declares more than one primary key: {first} and {second}")]
    DuplicatePrimaryKey { entity: &'static str, first: String, second: String },

    #[error("Can not convert field {field} from {raw:?}: {cause}")]
    FieldCoercionFailed { field: String, raw: String, cause: String },

    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single cell coercion, before the scanner attaches the field name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{raw:?}: {cause}")]
pub struct CoercionError {
    pub raw:   String,
    pub cause: String,
}

impl CoercionError {
    pub fn new(raw: impl Into<String>, cause: impl ToString) -> Self {
        Self { raw: raw.into(), cause: cause.to_string() }
    }

    pub(crate) fn for_field(self, field: &str) -> Error {
        Error::FieldCoercionFailed { field: field.to_string(), raw: self.raw, cause: self.cause }
    }
}
