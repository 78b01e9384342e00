use super::Condition;
use super::Dialect;
use super::condition::placeholders;
use crate::error::Error;
use crate::error::Result;
use crate::value::Value;

/// Sort direction for [`Statement::order_by_asc`] and [`Statement::order_by_desc`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Asc,

    Desc,
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Asc => write!(f, "ASC"),
            Order::Desc => write!(f, "DESC"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatementKind {
    #[default]
    Unset,
    Select,
    Insert,
    Update,
    Delete,
}

/// Mutable accumulator rendered into one parameterized SQL statement
///
/// The kind selectors ([`select`](Self::select), [`insert`](Self::insert),
/// [`update`](Self::update), [`delete`](Self::delete)) reset everything
/// accumulated so far, table included. Only the dialect survives a reset.
///
/// ```ignore
/// let (sql, params) = Statement::default()
///     .select(["id", "name"])
///     .from("users")
///     .filter(Condition::eq("id", vec![1, 2, 3]))
///     .order_by("name DESC")
///     .limit(10)
///     .to_sql()?;
/// // SELECT id, name FROM users WHERE id IN (?, ?, ?) ORDER BY name DESC LIMIT 10
/// ```
#[derive(Clone, Debug, Default)]
pub struct Statement {
    kind:       StatementKind,
    table:      String,
    columns:    Vec<String>,
    limit:      u64,
    offset:     u64,
    order_by:   Vec<String>,
    conditions: Vec<Condition>,
    values:     Vec<Vec<Value>>,
    dialect:    Dialect,
}

impl Statement {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect, ..Self::default() }
    }

    pub fn reset(&mut self) -> &mut Self {
        *self = Self::new(self.dialect);
        self
    }

    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where I: IntoIterator<Item = S>, S: Into<String> {
        self.reset();
        self.kind = StatementKind::Select;
        self.columns(columns)
    }

    /// `select` with the `*` column list
    pub fn select_all(&mut self) -> &mut Self {
        self.reset();
        self.kind = StatementKind::Select;
        self
    }

    pub fn insert(&mut self) -> &mut Self {
        self.reset();
        self.kind = StatementKind::Insert;
        self
    }

    pub fn update(&mut self) -> &mut Self {
        self.reset();
        self.kind = StatementKind::Update;
        self
    }

    pub fn delete(&mut self) -> &mut Self {
        self.reset();
        self.kind = StatementKind::Delete;
        self
    }

    pub fn from(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = table.into();
        self
    }

    /// Replaces the column list
    ///
    /// Select columns are raw SQL; a `?` inside them is kept literally.
    pub fn columns<I, S>(&mut self, columns: I) -> &mut Self
    where I: IntoIterator<Item = S>, S: Into<String> {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a condition; top-level conditions are AND-ed
    pub fn filter(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    /// Appends a raw ORDER BY expression
    ///
    /// A `?` inside `expr` is literal SQL, never a bound placeholder.
    pub fn order_by(&mut self, expr: impl Into<String>) -> &mut Self {
        self.order_by.push(expr.into());
        self
    }

    pub fn order_by_asc(&mut self, column: impl AsRef<str>) -> &mut Self {
        self.order_by(format!("{} {}", column.as_ref(), Order::Asc))
    }

    pub fn order_by_desc(&mut self, column: impl AsRef<str>) -> &mut Self {
        self.order_by(format!("{} {}", column.as_ref(), Order::Desc))
    }

    /// Zero removes the limit
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = limit;
        self
    }

    /// Zero removes the offset
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = offset;
        self
    }

    /// Appends one row of values for insert or update
    pub fn values(&mut self, row: impl IntoIterator<Item = Value>) -> &mut Self {
        self.values.push(row.into_iter().collect());
        self
    }

    pub fn with_dialect(&mut self, dialect: Dialect) -> &mut Self {
        self.dialect = dialect;
        self
    }

    pub(crate) fn default_kind(&mut self, kind: StatementKind) -> &mut Self {
        if self.kind == StatementKind::Unset {
            self.kind = kind;
        }
        self
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Renders the statement into SQL and its ordered parameters
    pub fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        if self.table.is_empty() {
            return Err(Error::StatementTableNotSet);
        }

        let mut params = Vec::new();
        let sql = match self.kind {
            StatementKind::Unset => return Err(Error::StatementKindNotSet),
            StatementKind::Select => {
                let columns = if self.columns.is_empty() { "*".to_string() } else { self.raw_list(&self.columns) };
                let mut sql = format!("SELECT {} FROM {}", columns, self.table);
                self.write_tail(&mut sql, &mut params)?;
                sql
            }
            StatementKind::Insert => {
                self.check_rows("insert")?;
                let rows: Vec<String> = self
                    .values
                    .iter()
                    .map(|row| {
                        params.extend(row.iter().cloned());
                        format!("({})", placeholders(row.len()))
                    })
                    .collect();
                format!("INSERT INTO {} ({}) VALUES {}", self.table, self.columns.join(", "), rows.join(", "))
            }
            StatementKind::Update => {
                self.check_rows("update")?;
                let mut assignments = Vec::with_capacity(self.columns.len() * self.values.len());
                for row in &self.values {
                    for (column, value) in self.columns.iter().zip(row) {
                        assignments.push(format!("{} = ?", column));
                        params.push(value.clone());
                    }
                }
                let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));
                self.write_tail(&mut sql, &mut params)?;
                sql
            }
            StatementKind::Delete => {
                let mut sql = format!("DELETE FROM {}", self.table);
                self.write_tail(&mut sql, &mut params)?;
                sql
            }
        };

        Ok((self.dialect.replace_placeholders(&sql), params))
    }

    fn check_rows(&self, verb: &str) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::InvalidStatement(format!("{} statements must specify columns", verb)));
        }
        if self.values.is_empty() {
            return Err(Error::InvalidStatement(format!("{} statements must have at least one set of values", verb)));
        }
        for (idx, row) in self.values.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(Error::InvalidStatement(format!(
                    "row {} has {} values for {} columns",
                    idx,
                    row.len(),
                    self.columns.len()
                )));
            }
        }
        Ok(())
    }

    fn raw_list(&self, fragments: &[String]) -> String {
        fragments.iter().map(|fragment| self.dialect.escape_raw(fragment)).collect::<Vec<_>>().join(", ")
    }

    fn write_tail(&self, sql: &mut String, params: &mut Vec<Value>) -> Result<()> {
        let mut where_parts = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            let (part, values) = condition.to_sql()?;
            if part.is_empty() {
                continue;
            }
            where_parts.push(part);
            params.extend(values);
        }

        if !where_parts.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_parts.join(" AND "));
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.raw_list(&self.order_by));
        }

        sql.push_str(&self.dialect.limit_offset(self.limit, self.offset));
        Ok(())
    }
}
