//! Entity declarations and the models derived from them
//!
//! An entity is a plain struct whose fields map to table columns. The
//! [`Entity`] trait is normally produced by `#[derive(Entity)]`:
//!
//! ```ignore
//! use relorm::prelude::*;
//!
//! #[derive(Clone, Debug, Default, Entity)]
//! #[relorm(table_name = "notes")]
//! pub struct Note {
//!     #[relorm(sql = "pk,readOnly")]
//!     pub id:    i64,
//!     #[relorm(column_name = "body_text")]
//!     pub body:  String,
//!     pub draft: bool,
//! }
//! ```

mod model;
mod target;

use std::sync::Arc;

pub use model::EntityModel;
pub use model::Field;
pub use model::TagSet;
pub use target::ScanTarget;
pub use target::Shape;

use crate::error::CoercionError;
use crate::error::Result;
use crate::value::Value;

/// Declaration of one persisted field, in declaration order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDef {
    /// Rust identifier of the field
    pub ident: &'static str,
    /// Raw tag string, e.g. `"pk,columnName=id"`
    pub tag:   &'static str,
}

impl FieldDef {
    pub const fn new(ident: &'static str, tag: &'static str) -> Self {
        Self { ident, tag }
    }
}

/// Trait implemented by every type that maps to a table
pub trait Entity: Clone + Default + Send + Sync + 'static {
    /// Naming hook; `None` leaves the table to an explicit `from(...)`
    fn table_name() -> Option<&'static str> {
        None
    }

    /// Field declarations in declaration order
    fn field_defs() -> &'static [FieldDef];

    /// Value of the field at `position` as a statement parameter
    fn field_value(&self, position: usize) -> Value;

    /// Coerce `value` into the field at `position`
    fn set_field(&mut self, position: usize, value: &Value) -> std::result::Result<(), CoercionError>;

    /// Cached model for this type
    fn model() -> Result<Arc<EntityModel>> {
        EntityModel::of::<Self>()
    }
}

impl<E: Entity> Entity for Box<E> {
    fn table_name() -> Option<&'static str> {
        E::table_name()
    }

    fn field_defs() -> &'static [FieldDef] {
        E::field_defs()
    }

    fn field_value(&self, position: usize) -> Value {
        self.as_ref().field_value(position)
    }

    fn set_field(&mut self, position: usize, value: &Value) -> std::result::Result<(), CoercionError> {
        self.as_mut().set_field(position, value)
    }

    fn model() -> Result<Arc<EntityModel>> {
        E::model()
    }
}
