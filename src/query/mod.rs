//! Statement building for relorm

pub(crate) mod condition;
pub(crate) mod dialect;
pub(crate) mod statement;

pub use condition::Condition;
pub use dialect::Dialect;

pub mod prelude {
    pub use super::condition::ColumnMap;
    pub use super::condition::Condition;
    pub use super::condition::IntoOperand;
    pub use super::condition::Operand;
    pub use super::dialect::Dialect;
    pub use super::statement::Order;
    pub use super::statement::Statement;
    pub use super::statement::StatementKind;
}
