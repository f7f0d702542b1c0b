/// Trait representing a stored entity with a base table name, key column, and column list.
///
/// The base table name is combined with the configured prefix and suffix
/// (see [`RepositoryConfig::table_name`](crate::RepositoryConfig::table_name)).
///
/// # Example
///
/// ```ignore
/// impl Entity for TaskDefinition {
///     fn table_name() -> &'static str { "DEFINITIONS" }
///     fn id_column() -> &'static str { "DEFINITION_NAME" }
///     fn columns() -> &'static [&'static str] { &["DEFINITION_NAME", "DEFINITION"] }
/// }
/// ```
pub trait Entity: Send + Sync + Unpin + 'static {
    fn table_name() -> &'static str;
    fn id_column() -> &'static str;
    /// Public columns, in select order. Hidden columns (such as the owner) are not listed.
    fn columns() -> &'static [&'static str];

    /// Resolve a caller-supplied column name to its canonical spelling.
    ///
    /// Matching is case-insensitive; unknown names yield `None`.
    fn resolve_column(name: &str) -> Option<&'static str> {
        Self::columns()
            .iter()
            .copied()
            .find(|col| col.eq_ignore_ascii_case(name.trim()))
    }
}
