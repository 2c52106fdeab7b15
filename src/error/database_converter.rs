use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::error::{AppError, ConstraintMeaning, ConstraintParser};

/// Converts Diesel errors into structured `AppError` variants.
///
/// Constraints declared by our migrations are resolved by name first; anything
/// unknown falls back to parsing the PostgreSQL message, and finally to an
/// opaque `Database` error.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn diesel::result::DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        let message = info.message();
        let detail = info.details().unwrap_or(message);
        let constraint_name = info.constraint_name();

        if let Some(meaning) = ConstraintParser::lookup(constraint_name) {
            return Self::from_known_constraint(meaning, detail);
        }

        match kind {
            DatabaseErrorKind::UniqueViolation => {
                let (field, value) = ConstraintParser::extract_key_value(detail)
                    .unwrap_or_else(|| ("unknown".to_string(), "duplicate_value".to_string()));
                let entity = constraint_name
                    .and_then(ConstraintParser::split_constraint_name)
                    .map(|(entity, _)| entity)
                    .unwrap_or_else(|| "resource".to_string());
                AppError::Duplicate { entity, field, value }
            }
            DatabaseErrorKind::ForeignKeyViolation => {
                let entity = ConstraintParser::extract_table(detail)
                    .unwrap_or_else(|| "resource".to_string());
                let value = ConstraintParser::extract_key_value(detail)
                    .map(|(_, value)| value)
                    .unwrap_or_else(|| "unknown".to_string());
                AppError::NotFound {
                    entity,
                    field: "id".to_string(),
                    value,
                }
            }
            DatabaseErrorKind::NotNullViolation => AppError::Validation {
                field: ConstraintParser::extract_column(message)
                    .unwrap_or_else(|| "unknown".to_string()),
                reason: "Field is required".to_string(),
            },
            DatabaseErrorKind::CheckViolation => AppError::Validation {
                field: constraint_name
                    .and_then(ConstraintParser::split_constraint_name)
                    .map(|(_, field)| field)
                    .unwrap_or_else(|| "unknown".to_string()),
                reason: "Check constraint failed".to_string(),
            },
            _ => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::msg(format!("Database error: {}", message)),
            },
        }
    }

    fn from_known_constraint(meaning: ConstraintMeaning, detail: &str) -> AppError {
        match meaning {
            ConstraintMeaning::Unique { entity, field } => AppError::Duplicate {
                entity: entity.to_string(),
                field: field.to_string(),
                value: ConstraintParser::extract_key_value(detail)
                    .map(|(_, value)| value)
                    .unwrap_or_else(|| "duplicate_value".to_string()),
            },
            ConstraintMeaning::StateGuard { message } => AppError::conflict(message),
            ConstraintMeaning::Reference { entity } => AppError::NotFound {
                entity: entity.to_string(),
                field: "id".to_string(),
                value: ConstraintParser::extract_key_value(detail)
                    .map(|(_, value)| value)
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            ConstraintMeaning::Check { field, reason, .. } => AppError::Validation {
                field: field.to_string(),
                reason: reason.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDatabaseErrorInfo {
        message: String,
        details: Option<String>,
        constraint_name: Option<String>,
    }

    impl diesel::result::DatabaseErrorInformation for MockDatabaseErrorInfo {
        fn message(&self) -> &str {
            &self.message
        }

        fn details(&self) -> Option<&str> {
            self.details.as_deref()
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            None
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.constraint_name.as_deref()
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn db_error(
        kind: DatabaseErrorKind,
        message: &str,
        details: Option<&str>,
        constraint: Option<&str>,
    ) -> DieselError {
        DieselError::DatabaseError(
            kind,
            Box::new(MockDatabaseErrorInfo {
                message: message.to_string(),
                details: details.map(str::to_string),
                constraint_name: constraint.map(str::to_string),
            }),
        )
    }

    #[test]
    fn test_convert_not_found_error() {
        let result = DatabaseErrorConverter::convert_diesel_error(DieselError::NotFound, "find user");
        assert!(matches!(result, AppError::NotFound { ref entity, .. } if entity == "resource"));
    }

    #[test]
    fn test_duplicate_email_is_reported_as_duplicate() {
        let error = db_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"users_email_key\"",
            Some("Key (email)=(sam@illinois.edu) already exists."),
            Some("users_email_key"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "create user") {
            AppError::Duplicate { entity, field, value } => {
                assert_eq!(entity, "user");
                assert_eq!(field, "email");
                assert_eq!(value, "sam@illinois.edu");
            }
            other => panic!("Expected Duplicate, got {:?}", other),
        }
    }

    #[test]
    fn test_pending_purchase_index_is_a_conflict() {
        let error = db_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"purchases_listing_id_pending_key\"",
            Some("Key (listing_id)=(3) already exists."),
            Some("purchases_listing_id_pending_key"),
        );

        let result = DatabaseErrorConverter::convert_diesel_error(error, "mark sold");
        assert!(matches!(result, AppError::Conflict { .. }));
    }

    #[test]
    fn test_wishlist_foreign_key_is_not_found() {
        let error = db_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "insert or update on table \"wishlist\" violates foreign key constraint \"wishlist_listing_id_fkey\"",
            Some("Key (listing_id)=(999) is not present in table \"listings\"."),
            Some("wishlist_listing_id_fkey"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "add to wishlist") {
            AppError::NotFound { entity, value, .. } => {
                assert_eq!(entity, "listing");
                assert_eq!(value, "999");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_unique_violation_falls_back_to_message() {
        let error = db_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value",
            Some("Key (slug)=(abc) already exists."),
            Some("tags_slug_key"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "insert") {
            AppError::Duplicate { entity, field, value } => {
                assert_eq!(entity, "tags");
                assert_eq!(field, "slug");
                assert_eq!(value, "abc");
            }
            other => panic!("Expected Duplicate, got {:?}", other),
        }
    }

    #[test]
    fn test_rating_check_violation() {
        let error = db_error(
            DatabaseErrorKind::CheckViolation,
            "new row violates check constraint \"user_ratings_rating_check\"",
            None,
            Some("user_ratings_rating_check"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "rate") {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "rating");
                assert!(reason.contains("between 1 and 5"));
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_not_null_violation() {
        let error = db_error(
            DatabaseErrorKind::NotNullViolation,
            "null value in column \"title\" of relation \"listings\" violates not-null constraint",
            None,
            None,
        );

        assert!(matches!(
            DatabaseErrorConverter::convert_diesel_error(error, "create listing"),
            AppError::Validation { ref field, .. } if field == "title"
        ));
    }
}
