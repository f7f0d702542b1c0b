use serde::{Deserialize, Serialize};

use crate::page::{Direction, Pageable, Sort};

/// SQL flavour; decides placeholder style and identifier quoting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Generic SQL using `?` placeholders (default).
    #[default]
    Generic,
    /// SQLite-style `?` placeholders.
    Sqlite,
    /// MySQL-style `?` placeholders with backtick quoting.
    MySql,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    /// Placeholder for the `index`-th bound value (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" => Ok(Dialect::Generic),
            "sqlite" => Ok(Dialect::Sqlite),
            "mysql" => Ok(Dialect::MySql),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(format!("unknown SQL dialect: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierPolicy {
    /// Validate identifiers against a conservative pattern.
    #[default]
    Validate,
    /// Validate and quote identifiers using the dialect quoting style.
    Quote,
}

/// A fluent builder for parameterized SELECT / COUNT / DELETE / INSERT statements.
///
/// Predicates are kept as typed conditions and rendered on demand; bound
/// values never end up in the SQL text. Placeholder numbering (for dialects
/// that number them) follows the order values are bound, so the returned
/// parameter list always lines up with the placeholders left to right.
///
/// # Example
///
/// ```
/// use taskdef_data::QueryBuilder;
///
/// let (sql, params) = QueryBuilder::new("TASK_DEFINITIONS")
///     .where_eq("CREATOR", "alice")
///     .where_any_like_ignore_case(&["DEFINITION_NAME", "DEFINITION"], "foo")
///     .build_where()
///     .unwrap();
/// assert_eq!(
///     sql,
///     "WHERE CREATOR = ? AND (lower(DEFINITION_NAME) LIKE lower(?) OR lower(DEFINITION) LIKE lower(?))"
/// );
/// assert_eq!(params, vec!["alice", "%foo%", "%foo%"]);
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    conditions: Vec<Condition>,
    order: Vec<(String, bool)>,
    limit_val: Option<u64>,
    offset_val: Option<u64>,
    dialect: Dialect,
    identifier_policy: IdentifierPolicy,
}

#[derive(Debug, Clone)]
enum Condition {
    Eq(String, String),
    In(String, Vec<String>),
    /// `(lower(c1) LIKE lower(?) OR lower(c2) LIKE lower(?) ...)`, one bound pattern per column.
    AnyLikeIgnoreCase(Vec<String>, String),
}

impl QueryBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
            dialect: Dialect::Generic,
            identifier_policy: IdentifierPolicy::Validate,
        }
    }

    /// Create a new builder with an explicit SQL dialect.
    pub fn new_with_dialect(table: &str, dialect: Dialect) -> Self {
        Self::new(table).dialect(dialect)
    }

    /// Set the SQL dialect (affects placeholder style and quoting).
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Configure identifier validation/quoting behavior.
    pub fn identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier_policy = policy;
        self
    }

    pub fn where_eq(mut self, column: &str, value: &str) -> Self {
        self.conditions
            .push(Condition::Eq(column.to_string(), value.to_string()));
        self
    }

    pub fn where_in(mut self, column: &str, values: &[&str]) -> Self {
        self.conditions.push(Condition::In(
            column.to_string(),
            values.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Case-insensitive substring match of `text` against any of `columns`.
    ///
    /// No-op when `columns` is empty.
    pub fn where_any_like_ignore_case(mut self, columns: &[&str], text: &str) -> Self {
        if columns.is_empty() {
            return self;
        }
        self.conditions.push(Condition::AnyLikeIgnoreCase(
            columns.iter().map(|c| c.to_string()).collect(),
            format!("%{text}%"),
        ));
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    /// Append every order of `sort`, in sequence.
    pub fn sort(mut self, sort: &Sort) -> Self {
        for order in sort.iter() {
            self.order
                .push((order.property.clone(), order.direction == Direction::Asc));
        }
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_val = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_val = Some(offset);
        self
    }

    /// Apply the sort, window size and offset of `pageable`.
    pub fn paginate(self, pageable: &Pageable) -> Self {
        self.sort(&pageable.sort)
            .limit(pageable.size)
            .offset(pageable.offset())
    }

    /// Render only the filter: an empty string, or a clause starting with `WHERE`.
    pub fn build_where(&self) -> Result<(String, Vec<String>), QueryError> {
        let mut params = Vec::new();
        let clause = self.where_clause(&mut params)?;
        Ok((clause, params))
    }

    /// Build a SELECT query returning `(sql, bind_values)`.
    pub fn build_select(&self, columns: &[&str]) -> Result<(String, Vec<String>), QueryError> {
        let table = self.format_identifier(&self.table, false, "table")?;
        let columns = self.format_column_list(columns)?;

        let mut sql = format!("SELECT {columns} FROM {table}");
        let mut params = Vec::new();
        push_clause(&mut sql, &self.where_clause(&mut params)?);
        push_clause(&mut sql, &self.order_clause()?);
        self.append_limit_offset(&mut sql);
        Ok((sql, params))
    }

    /// Build a COUNT query over the same filter as [`build_select`](Self::build_select).
    pub fn build_count(&self) -> Result<(String, Vec<String>), QueryError> {
        let table = self.format_identifier(&self.table, false, "table")?;
        let mut sql = format!("SELECT COUNT(*) FROM {table}");
        let mut params = Vec::new();
        push_clause(&mut sql, &self.where_clause(&mut params)?);
        Ok((sql, params))
    }

    /// Build a DELETE statement; without conditions it removes every row.
    pub fn build_delete(&self) -> Result<(String, Vec<String>), QueryError> {
        let table = self.format_identifier(&self.table, false, "table")?;
        let mut sql = format!("DELETE FROM {table}");
        let mut params = Vec::new();
        push_clause(&mut sql, &self.where_clause(&mut params)?);
        Ok((sql, params))
    }

    /// Build a single-row INSERT from `(column, value)` pairs. Conditions are ignored.
    pub fn build_insert(&self, values: &[(&str, &str)]) -> Result<(String, Vec<String>), QueryError> {
        let table = self.format_identifier(&self.table, false, "table")?;
        let mut params = Vec::with_capacity(values.len());
        let mut columns = Vec::with_capacity(values.len());
        let mut placeholders = Vec::with_capacity(values.len());
        for (column, value) in values {
            columns.push(self.format_identifier(column, false, "column")?);
            placeholders.push(self.bind(&mut params, value.to_string()));
        }
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        Ok((sql, params))
    }

    fn bind(&self, params: &mut Vec<String>, value: String) -> String {
        params.push(value);
        self.dialect.placeholder(params.len())
    }

    fn where_clause(&self, params: &mut Vec<String>) -> Result<String, QueryError> {
        if self.conditions.is_empty() {
            return Ok(String::new());
        }
        let mut predicates = Vec::with_capacity(self.conditions.len());
        for cond in &self.conditions {
            predicates.push(self.render_condition(cond, params)?);
        }
        Ok(format!("WHERE {}", predicates.join(" AND ")))
    }

    fn render_condition(
        &self,
        cond: &Condition,
        params: &mut Vec<String>,
    ) -> Result<String, QueryError> {
        match cond {
            Condition::Eq(col, val) => {
                let col = self.format_identifier(col, false, "column")?;
                let placeholder = self.bind(params, val.clone());
                Ok(format!("{col} = {placeholder}"))
            }
            Condition::In(col, vals) => {
                let col = self.format_identifier(col, false, "column")?;
                if vals.is_empty() {
                    return Ok("1 = 0".to_string());
                }
                let placeholders: Vec<_> = vals
                    .iter()
                    .map(|val| self.bind(params, val.clone()))
                    .collect();
                Ok(format!("{col} IN ({})", placeholders.join(", ")))
            }
            Condition::AnyLikeIgnoreCase(cols, pattern) => {
                let mut alternatives = Vec::with_capacity(cols.len());
                for col in cols {
                    let col = self.format_identifier(col, false, "column")?;
                    let placeholder = self.bind(params, pattern.clone());
                    alternatives.push(format!("lower({col}) LIKE lower({placeholder})"));
                }
                Ok(format!("({})", alternatives.join(" OR ")))
            }
        }
    }

    fn order_clause(&self) -> Result<String, QueryError> {
        if self.order.is_empty() {
            return Ok(String::new());
        }
        let mut clauses = Vec::with_capacity(self.order.len());
        for (col, asc) in &self.order {
            let col = self.format_identifier(col, false, "column")?;
            if *asc {
                clauses.push(format!("{col} ASC"));
            } else {
                clauses.push(format!("{col} DESC"));
            }
        }
        Ok(format!("ORDER BY {}", clauses.join(", ")))
    }

    fn append_limit_offset(&self, sql: &mut String) {
        // Backends take signed 64-bit LIMIT/OFFSET values.
        if let Some(limit) = self.limit_val {
            sql.push_str(&format!(" LIMIT {}", limit.min(MAX_SQL_INTEGER)));
        }
        if let Some(offset) = self.offset_val {
            sql.push_str(&format!(" OFFSET {}", offset.min(MAX_SQL_INTEGER)));
        }
    }

    fn format_column_list(&self, columns: &[&str]) -> Result<String, QueryError> {
        let mut out = Vec::with_capacity(columns.len());
        for col in columns {
            out.push(self.format_identifier(col, true, "column")?);
        }
        Ok(out.join(", "))
    }

    fn format_identifier(
        &self,
        ident: &str,
        allow_star: bool,
        kind: &'static str,
    ) -> Result<String, QueryError> {
        if !is_valid_identifier(ident, allow_star) {
            return Err(QueryError::InvalidIdentifier {
                kind,
                ident: ident.to_string(),
            });
        }
        match self.identifier_policy {
            IdentifierPolicy::Quote => Ok(quote_identifier(ident, self.dialect, allow_star)),
            IdentifierPolicy::Validate => Ok(ident.to_string()),
        }
    }
}

const MAX_SQL_INTEGER: u64 = i64::MAX as u64;

fn push_clause(sql: &mut String, clause: &str) {
    if !clause.is_empty() {
        sql.push(' ');
        sql.push_str(clause);
    }
}

#[derive(Debug, Clone)]
pub enum QueryError {
    InvalidIdentifier { kind: &'static str, ident: String },
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
        }
    }
}

impl std::error::Error for QueryError {}

fn is_valid_identifier(ident: &str, allow_star: bool) -> bool {
    if ident.is_empty() {
        return false;
    }
    let parts: Vec<&str> = ident.split('.').collect();
    for (idx, part) in parts.iter().enumerate() {
        if allow_star && *part == "*" {
            return idx + 1 == parts.len();
        }
        if !is_valid_segment(part) {
            return false;
        }
    }
    true
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote_identifier(ident: &str, dialect: Dialect, allow_star: bool) -> String {
    let quote = dialect.quote_char();
    let parts: Vec<&str> = ident.split('.').collect();
    let last_idx = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .enumerate()
        .map(|(idx, part)| {
            if allow_star && part == "*" && idx == last_idx {
                part.to_string()
            } else {
                format!("{quote}{part}{quote}")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Order;

    const SEARCH_COLUMNS: &[&str] = &["DEFINITION_NAME", "DEFINITION"];

    #[test]
    fn test_simple_select() {
        let (sql, params) = QueryBuilder::new("TASK_DEFINITIONS")
            .build_select(&["*"])
            .unwrap();
        assert_eq!(sql, "SELECT * FROM TASK_DEFINITIONS");
        assert!(params.is_empty());
    }

    #[test]
    fn test_empty_filter_has_no_where() {
        let (clause, params) = QueryBuilder::new("TASK_DEFINITIONS").build_where().unwrap();
        assert_eq!(clause, "");
        assert!(params.is_empty());
    }

    #[test]
    fn test_owner_only() {
        let (clause, params) = QueryBuilder::new("TASK_DEFINITIONS")
            .where_eq("CREATOR", "alice")
            .build_where()
            .unwrap();
        assert_eq!(clause, "WHERE CREATOR = ?");
        assert_eq!(params, vec!["alice"]);
    }

    #[test]
    fn test_search_group_only() {
        let (clause, params) = QueryBuilder::new("TASK_DEFINITIONS")
            .where_any_like_ignore_case(SEARCH_COLUMNS, "FOO")
            .build_where()
            .unwrap();
        assert_eq!(
            clause,
            "WHERE (lower(DEFINITION_NAME) LIKE lower(?) OR lower(DEFINITION) LIKE lower(?))"
        );
        assert_eq!(params, vec!["%FOO%", "%FOO%"]);
    }

    #[test]
    fn test_owner_then_search_group() {
        let (clause, params) = QueryBuilder::new("TASK_DEFINITIONS")
            .where_eq("CREATOR", "alice")
            .where_any_like_ignore_case(&["DEFINITION_NAME"], "job")
            .build_where()
            .unwrap();
        assert_eq!(
            clause,
            "WHERE CREATOR = ? AND (lower(DEFINITION_NAME) LIKE lower(?))"
        );
        assert_eq!(params, vec!["alice", "%job%"]);
    }

    #[test]
    fn test_empty_search_columns_are_ignored() {
        let (clause, params) = QueryBuilder::new("TASK_DEFINITIONS")
            .where_eq("CREATOR", "alice")
            .where_any_like_ignore_case(&[], "job")
            .build_where()
            .unwrap();
        assert_eq!(clause, "WHERE CREATOR = ?");
        assert_eq!(params, vec!["alice"]);
    }

    #[test]
    fn test_search_text_is_bound_not_inlined() {
        let (sql, params) = QueryBuilder::new("TASK_DEFINITIONS")
            .where_any_like_ignore_case(&["DEFINITION"], "x' OR '1'='1")
            .build_select(&["DEFINITION_NAME"])
            .unwrap();
        assert!(!sql.contains("'1'='1"));
        assert_eq!(params, vec!["%x' OR '1'='1%"]);
    }

    #[test]
    fn test_paged_select() {
        let pageable = Pageable::new(2, 10).with_sort(Sort::by(vec![
            Order::desc("DEFINITION_NAME"),
            Order::asc("DEFINITION"),
        ]));
        let (sql, params) = QueryBuilder::new("TASK_DEFINITIONS")
            .where_eq("CREATOR", "bob")
            .paginate(&pageable)
            .build_select(&["DEFINITION_NAME", "DEFINITION"])
            .unwrap();
        assert_eq!(
            sql,
            "SELECT DEFINITION_NAME, DEFINITION FROM TASK_DEFINITIONS WHERE CREATOR = ? ORDER BY DEFINITION_NAME DESC, DEFINITION ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(params, vec!["bob"]);
    }

    #[test]
    fn test_huge_window_is_clamped_to_signed_range() {
        let (sql, _) = QueryBuilder::new("TASK_DEFINITIONS")
            .paginate(&Pageable::new(u64::MAX, u64::MAX))
            .build_select(&["*"])
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM TASK_DEFINITIONS LIMIT 9223372036854775807 OFFSET 9223372036854775807"
        );
    }

    #[test]
    fn test_count_shares_filter_and_ignores_window() {
        let builder = QueryBuilder::new("TASK_DEFINITIONS")
            .where_eq("CREATOR", "alice")
            .where_any_like_ignore_case(SEARCH_COLUMNS, "a")
            .paginate(&Pageable::new(1, 5));
        let (_, select_params) = builder.build_select(&["*"]).unwrap();
        let (sql, params) = builder.build_count().unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM TASK_DEFINITIONS WHERE CREATOR = ? AND (lower(DEFINITION_NAME) LIKE lower(?) OR lower(DEFINITION) LIKE lower(?))"
        );
        assert_eq!(params, select_params);
    }

    #[test]
    fn test_postgres_numbering_spans_search_group() {
        let (clause, params) = QueryBuilder::new_with_dialect("TASK_DEFINITIONS", Dialect::Postgres)
            .where_eq("CREATOR", "alice")
            .where_any_like_ignore_case(SEARCH_COLUMNS, "foo")
            .build_where()
            .unwrap();
        assert_eq!(
            clause,
            "WHERE CREATOR = $1 AND (lower(DEFINITION_NAME) LIKE lower($2) OR lower(DEFINITION) LIKE lower($3))"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_where_in() {
        let (sql, params) = QueryBuilder::new_with_dialect("TASK_DEFINITIONS", Dialect::Postgres)
            .where_eq("CREATOR", "alice")
            .where_in("DEFINITION_NAME", &["a", "b"])
            .build_select(&["*"])
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM TASK_DEFINITIONS WHERE CREATOR = $1 AND DEFINITION_NAME IN ($2, $3)"
        );
        assert_eq!(params, vec!["alice", "a", "b"]);
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let (clause, params) = QueryBuilder::new("TASK_DEFINITIONS")
            .where_in("DEFINITION_NAME", &[])
            .build_where()
            .unwrap();
        assert_eq!(clause, "WHERE 1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn test_delete_and_insert() {
        let (sql, params) = QueryBuilder::new("TASK_DEFINITIONS")
            .where_eq("DEFINITION_NAME", "taskA")
            .build_delete()
            .unwrap();
        assert_eq!(sql, "DELETE FROM TASK_DEFINITIONS WHERE DEFINITION_NAME = ?");
        assert_eq!(params, vec!["taskA"]);

        let (sql, params) = QueryBuilder::new_with_dialect("TASK_DEFINITIONS", Dialect::Postgres)
            .build_insert(&[
                ("DEFINITION_NAME", "taskA"),
                ("DEFINITION", "timestamp"),
                ("CREATOR", "alice"),
            ])
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO TASK_DEFINITIONS (DEFINITION_NAME, DEFINITION, CREATOR) VALUES ($1, $2, $3)"
        );
        assert_eq!(params, vec!["taskA", "timestamp", "alice"]);
    }

    #[test]
    fn test_quoting() {
        let (sql, params) = QueryBuilder::new("TASK_DEFINITIONS")
            .dialect(Dialect::MySql)
            .identifier_policy(IdentifierPolicy::Quote)
            .where_any_like_ignore_case(&["DEFINITION"], "x")
            .order_by("DEFINITION_NAME", true)
            .build_select(&["DEFINITION_NAME"])
            .unwrap();
        assert_eq!(
            sql,
            "SELECT `DEFINITION_NAME` FROM `TASK_DEFINITIONS` WHERE (lower(`DEFINITION`) LIKE lower(?)) ORDER BY `DEFINITION_NAME` ASC"
        );
        assert_eq!(params, vec!["%x%"]);
    }

    #[test]
    fn test_invalid_identifiers_are_rejected() {
        let err = QueryBuilder::new("TASK_DEFINITIONS;drop")
            .build_select(&["*"])
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier { kind: "table", .. }));

        let err = QueryBuilder::new("TASK_DEFINITIONS")
            .where_any_like_ignore_case(&["lower(x)"], "a")
            .build_where()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier { kind: "column", .. }));

        let err = QueryBuilder::new("TASK_DEFINITIONS")
            .order_by("1; --", false)
            .build_select(&["*"])
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("sqlite".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
