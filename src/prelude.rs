//! Prelude module for relorm
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```ignore
//! use relorm::prelude::*;
//! ```

// Re-export the derive macro
pub use relorm_macros::Entity;

pub use crate::connection::prelude::*;
pub use crate::entity::Entity;
pub use crate::entity::ScanTarget;
pub use crate::error::Error;
pub use crate::error::Result;
pub use crate::query::prelude::*;
pub use crate::session::Session;
pub use crate::value::FromValue;
pub use crate::value::IntoValue;
// Re-export optional types
#[cfg(feature = "with-json")]
pub use crate::value::Json;
pub use crate::value::Value;
