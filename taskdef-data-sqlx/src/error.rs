use taskdef_data::DataError;

/// Extension trait for converting `sqlx::Error` into `DataError`.
///
/// Due to Rust's orphan rules, we can't implement `From<sqlx::Error> for DataError`
/// in this crate. Instead, use `.into_data_error()`.
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        match &self {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DataError::DuplicateKey(db.message().to_string())
            }
            _ => DataError::database(self),
        }
    }
}

/// Convenience alias for data-layer results using `DataError`.
pub type SqlxResult<T> = Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = sqlx::Error::RowNotFound.into_data_error();
        assert!(matches!(err, DataError::NotFound(_)));
    }

    #[test]
    fn other_errors_are_wrapped_unchanged() {
        let err = sqlx::Error::Protocol("unexpected packet".into()).into_data_error();
        match err {
            DataError::Database(inner) => assert!(inner.to_string().contains("unexpected packet")),
            other => panic!("expected Database error, got {other:?}"),
        }
    }
}
