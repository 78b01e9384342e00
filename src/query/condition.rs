use std::collections::BTreeMap;

use crate::error::Error;
use crate::error::Result;
use crate::value::IntoValue;
use crate::value::Value;

/// Right-hand side of a column test
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Scalar(Value),
    List(Vec<Value>),
}

/// Conversion into an [`Operand`]
///
/// Scalars become [`Operand::Scalar`], vectors, slices and arrays become
/// [`Operand::List`]. `Vec<u8>` is a list too; wrap blobs in
/// [`Value::Bytes`] to compare them as a single value.
pub trait IntoOperand {
    fn into_operand(self) -> Operand;
}

macro_rules! impl_scalar_operand {
    ($($ty:ty),*) => {$(
        impl IntoOperand for $ty {
            fn into_operand(self) -> Operand {
                Operand::Scalar(self.into_value())
            }
        }
    )*};
}

impl_scalar_operand!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, String, &str, &String, Value);

#[cfg(feature = "with-chrono")]
impl_scalar_operand!(chrono::NaiveDateTime, chrono::NaiveDate, chrono::NaiveTime, chrono::DateTime<chrono::Utc>);

#[cfg(feature = "with-uuid")]
impl_scalar_operand!(uuid::Uuid);

impl<T: IntoValue> IntoOperand for Option<T> {
    fn into_operand(self) -> Operand {
        Operand::Scalar(self.into_value())
    }
}

impl<T: IntoValue> IntoOperand for Vec<T> {
    fn into_operand(self) -> Operand {
        Operand::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: IntoValue + Clone> IntoOperand for &[T] {
    fn into_operand(self) -> Operand {
        Operand::List(self.iter().cloned().map(IntoValue::into_value).collect())
    }
}

impl<T: IntoValue, const N: usize> IntoOperand for [T; N] {
    fn into_operand(self) -> Operand {
        Operand::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl IntoOperand for Operand {
    fn into_operand(self) -> Operand {
        self
    }
}

/// Column to operand mapping of a leaf condition
///
/// Columns render in name order so the same map always produces the same SQL.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnMap(BTreeMap<String, Operand>);

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, operand: impl IntoOperand) -> Self {
        self.0.insert(column.into(), operand.into_operand());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, operand: impl IntoOperand) {
        self.0.insert(column.into(), operand.into_operand());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Operand)> {
        self.0.iter().map(|(column, operand)| (column.as_str(), operand))
    }
}

impl<K: Into<String>, V: IntoOperand> FromIterator<(K, V)> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(column, operand)| (column.into(), operand.into_operand())).collect())
    }
}

/// Boolean expression over columns
///
/// ```ignore
/// let cond = Condition::eq("status", ["open", "blocked"])
///     .and(Condition::gt("priority", 2))
///     .or(Condition::eq("owner", None::<String>));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Eq(ColumnMap),
    Ne(ColumnMap),
    Like(ColumnMap),
    NotLike(ColumnMap),
    Lt(ColumnMap),
    Lte(ColumnMap),
    Gt(ColumnMap),
    Gte(ColumnMap),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn eq(column: impl Into<String>, operand: impl IntoOperand) -> Self {
        Condition::Eq(ColumnMap::new().with(column, operand))
    }

    pub fn ne(column: impl Into<String>, operand: impl IntoOperand) -> Self {
        Condition::Ne(ColumnMap::new().with(column, operand))
    }

    pub fn like(column: impl Into<String>, operand: impl IntoOperand) -> Self {
        Condition::Like(ColumnMap::new().with(column, operand))
    }

    pub fn not_like(column: impl Into<String>, operand: impl IntoOperand) -> Self {
        Condition::NotLike(ColumnMap::new().with(column, operand))
    }

    pub fn lt(column: impl Into<String>, operand: impl IntoOperand) -> Self {
        Condition::Lt(ColumnMap::new().with(column, operand))
    }

    pub fn lte(column: impl Into<String>, operand: impl IntoOperand) -> Self {
        Condition::Lte(ColumnMap::new().with(column, operand))
    }

    pub fn gt(column: impl Into<String>, operand: impl IntoOperand) -> Self {
        Condition::Gt(ColumnMap::new().with(column, operand))
    }

    pub fn gte(column: impl Into<String>, operand: impl IntoOperand) -> Self {
        Condition::Gte(ColumnMap::new().with(column, operand))
    }

    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::And(conditions.into_iter().collect())
    }

    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Or(conditions.into_iter().collect())
    }

    pub fn and(self, other: Condition) -> Self {
        match self {
            Condition::And(mut children) => {
                children.push(other);
                Condition::And(children)
            }
            this => Condition::And(vec![this, other]),
        }
    }

    pub fn or(self, other: Condition) -> Self {
        match self {
            Condition::Or(mut children) => {
                children.push(other);
                Condition::Or(children)
            }
            this => Condition::Or(vec![this, other]),
        }
    }

    /// Renders the condition with `?` placeholders
    ///
    /// An empty leaf renders as an empty string and is skipped by its parent.
    pub fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        match self {
            Condition::Eq(columns) => equality_sql(columns, false),
            Condition::Ne(columns) => equality_sql(columns, true),
            Condition::Like(columns) => comparison_sql(columns, "LIKE"),
            Condition::NotLike(columns) => comparison_sql(columns, "NOT LIKE"),
            Condition::Lt(columns) => comparison_sql(columns, "<"),
            Condition::Lte(columns) => comparison_sql(columns, "<="),
            Condition::Gt(columns) => comparison_sql(columns, ">"),
            Condition::Gte(columns) => comparison_sql(columns, ">="),
            Condition::And(children) => junction_sql(children, " AND ", "(1=1)"),
            Condition::Or(children) => junction_sql(children, " OR ", "(1=0)"),
        }
    }
}

pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn equality_sql(columns: &ColumnMap, negate: bool) -> Result<(String, Vec<Value>)> {
    let (equal, within, null_test, empty_list) =
        if negate { ("<>", "NOT IN", "IS NOT NULL", "(1=1)") } else { ("=", "IN", "IS NULL", "(1=0)") };

    let mut exprs = Vec::with_capacity(columns.len());
    let mut params = Vec::new();

    for (column, operand) in columns.iter() {
        match operand {
            Operand::Scalar(Value::Null) => exprs.push(format!("{} {}", column, null_test)),
            Operand::Scalar(value) => {
                exprs.push(format!("{} {} ?", column, equal));
                params.push(value.clone());
            }
            Operand::List(values) if values.is_empty() => exprs.push(empty_list.to_string()),
            Operand::List(values) => {
                exprs.push(format!("{} {} ({})", column, within, placeholders(values.len())));
                params.extend(values.iter().cloned());
            }
        }
    }

    Ok((exprs.join(" AND "), params))
}

fn comparison_sql(columns: &ColumnMap, operator: &str) -> Result<(String, Vec<Value>)> {
    let mut exprs = Vec::with_capacity(columns.len());
    let mut params = Vec::with_capacity(columns.len());

    for (column, operand) in columns.iter() {
        match operand {
            Operand::Scalar(Value::Null) => {
                return Err(Error::InvalidCondition { column: column.to_string(), reason: "cannot compare against NULL" });
            }
            Operand::List(_) => {
                return Err(Error::InvalidCondition { column: column.to_string(), reason: "cannot compare against a list" });
            }
            Operand::Scalar(value) => {
                exprs.push(format!("{} {} ?", column, operator));
                params.push(value.clone());
            }
        }
    }

    Ok((exprs.join(" AND "), params))
}

fn junction_sql(children: &[Condition], separator: &str, empty: &str) -> Result<(String, Vec<Value>)> {
    let mut parts = Vec::with_capacity(children.len());
    let mut params = Vec::new();

    for child in children {
        let (sql, values) = child.to_sql()?;
        if sql.is_empty() {
            continue;
        }
        parts.push(sql);
        params.extend(values);
    }

    if parts.is_empty() {
        return Ok((empty.to_string(), params));
    }

    Ok((format!("({})", parts.join(separator)), params))
}
