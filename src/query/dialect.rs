use std::borrow::Cow;

/// SQL flavour a statement renders for
///
/// Statements are built with `?` placeholders and rewritten for the target
/// driver once rendering is done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `?` placeholders, `LIMIT -1` for an open-ended offset
    #[default]
    Sqlite,
    /// `$1`, `$2`, ... placeholders
    Postgres,
    /// `?` placeholders, maximum unsigned limit for an open-ended offset
    MySql,
}

impl Dialect {
    /// Rewrites `?` placeholders into the dialect's positional form
    ///
    /// `??` is an escaped literal question mark and always renders as `?`
    /// for numbered placeholders.
    pub fn replace_placeholders(&self, sql: &str) -> String {
        match self {
            Dialect::Sqlite | Dialect::MySql => sql.to_string(),
            Dialect::Postgres => {
                let mut out = String::with_capacity(sql.len() + 8);
                let mut position = 0;
                let mut chars = sql.chars().peekable();

                while let Some(c) = chars.next() {
                    if c != '?' {
                        out.push(c);
                        continue;
                    }
                    if chars.peek() == Some(&'?') {
                        chars.next();
                        out.push('?');
                        continue;
                    }
                    position += 1;
                    out.push('$');
                    out.push_str(&position.to_string());
                }

                out
            }
        }
    }

    /// Escapes `?` inside a raw fragment so it survives placeholder rewriting
    pub(crate) fn escape_raw<'a>(&self, fragment: &'a str) -> Cow<'a, str> {
        match self {
            Dialect::Postgres if fragment.contains('?') => Cow::Owned(fragment.replace('?', "??")),
            _ => Cow::Borrowed(fragment),
        }
    }

    /// Renders the LIMIT/OFFSET tail; zero means "not set" for both
    pub(crate) fn limit_offset(&self, limit: u64, offset: u64) -> String {
        match (limit, offset) {
            (0, 0) => String::new(),
            (limit, 0) => format!(" LIMIT {}", limit),
            (0, offset) => match self {
                Dialect::Sqlite => format!(" LIMIT -1 OFFSET {}", offset),
                Dialect::MySql => format!(" LIMIT {} OFFSET {}", u64::MAX, offset),
                Dialect::Postgres => format!(" OFFSET {}", offset),
            },
            (limit, offset) => format!(" LIMIT {} OFFSET {}", limit, offset),
        }
    }
}
