use std::sync::OnceLock;

use regex::Regex;

/// What a named constraint of our schema means to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintMeaning {
    /// A unique key: (entity, field)
    Unique { entity: &'static str, field: &'static str },
    /// A state-machine guard implemented as an index
    StateGuard { message: &'static str },
    /// A foreign key pointing at `entity`
    Reference { entity: &'static str },
    /// A check constraint on (entity, field)
    Check { entity: &'static str, field: &'static str, reason: &'static str },
}

/// Constraints declared in `migrations/`, keyed by name.
const KNOWN_CONSTRAINTS: &[(&str, ConstraintMeaning)] = &[
    (
        "users_email_key",
        ConstraintMeaning::Unique { entity: "user", field: "email" },
    ),
    (
        "purchases_listing_id_pending_key",
        ConstraintMeaning::StateGuard {
            message: "Listing already has a pending purchase for another buyer",
        },
    ),
    (
        "purchases_listing_id_buyer_id_key",
        ConstraintMeaning::Unique { entity: "purchase", field: "listing_id" },
    ),
    (
        "user_ratings_listing_id_rater_id_key",
        ConstraintMeaning::Unique { entity: "rating", field: "listing_id" },
    ),
    ("wishlist_listing_id_fkey", ConstraintMeaning::Reference { entity: "listing" }),
    ("wishlist_user_id_fkey", ConstraintMeaning::Reference { entity: "user" }),
    ("purchases_listing_id_fkey", ConstraintMeaning::Reference { entity: "listing" }),
    ("purchases_buyer_id_fkey", ConstraintMeaning::Reference { entity: "user" }),
    ("user_ratings_listing_id_fkey", ConstraintMeaning::Reference { entity: "listing" }),
    ("user_ratings_user_id_fkey", ConstraintMeaning::Reference { entity: "user" }),
    (
        "user_ratings_rating_check",
        ConstraintMeaning::Check {
            entity: "rating",
            field: "rating",
            reason: "rating must be between 1 and 5",
        },
    ),
    (
        "user_ratings_self_rating_check",
        ConstraintMeaning::Check {
            entity: "rating",
            field: "user_id",
            reason: "You cannot rate yourself",
        },
    ),
    (
        "purchases_buyer_seller_check",
        ConstraintMeaning::Check {
            entity: "purchase",
            field: "buyer_id",
            reason: "Seller cannot be the buyer",
        },
    ),
    (
        "listings_price_check",
        ConstraintMeaning::Check {
            entity: "listing",
            field: "price",
            reason: "price must be non-negative",
        },
    ),
];

/// Utility for reading PostgreSQL constraint violation messages.
pub struct ConstraintParser;

struct RegexPatterns {
    key_value: Regex,
    column_name: Regex,
    table_name: Regex,
}

static REGEX_PATTERNS: OnceLock<RegexPatterns> = OnceLock::new();

impl ConstraintParser {
    fn patterns() -> &'static RegexPatterns {
        REGEX_PATTERNS.get_or_init(|| RegexPatterns {
            // "Key (field)=(value)"
            key_value: Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").expect("valid regex"),
            column_name: Regex::new(r#"column "([^"]+)""#).expect("valid regex"),
            table_name: Regex::new(r#"table "([^"]+)""#).expect("valid regex"),
        })
    }

    /// Looks up a constraint declared by our migrations.
    pub fn lookup(constraint_name: Option<&str>) -> Option<ConstraintMeaning> {
        let name = constraint_name?;
        KNOWN_CONSTRAINTS
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, meaning)| meaning.clone())
    }

    /// Extracts `(field, value)` from a "Key (field)=(value)" detail line.
    pub fn extract_key_value(message: &str) -> Option<(String, String)> {
        Self::patterns().key_value.captures(message).and_then(|caps| {
            let field = caps.get(1)?.as_str().to_string();
            let value = caps.get(2)?.as_str().to_string();
            Some((field, value))
        })
    }

    /// Extracts the quoted column name of a not-null violation.
    pub fn extract_column(message: &str) -> Option<String> {
        Self::patterns()
            .column_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Extracts the quoted table name, e.g. the referenced table of a foreign key.
    pub fn extract_table(message: &str) -> Option<String> {
        Self::patterns()
            .table_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Falls back to the `<table>_<column>_key` naming convention.
    pub fn split_constraint_name(constraint_name: &str) -> Option<(String, String)> {
        let trimmed = constraint_name
            .strip_suffix("_key")
            .or_else(|| constraint_name.strip_suffix("_fkey"))
            .or_else(|| constraint_name.strip_suffix("_check"))?;
        let (entity, field) = trimmed.split_once('_')?;
        if field.is_empty() {
            return None;
        }
        Some((entity.to_string(), field.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_constraints() {
        assert_eq!(
            ConstraintParser::lookup(Some("users_email_key")),
            Some(ConstraintMeaning::Unique { entity: "user", field: "email" })
        );
        assert!(matches!(
            ConstraintParser::lookup(Some("purchases_listing_id_pending_key")),
            Some(ConstraintMeaning::StateGuard { .. })
        ));
        assert!(matches!(
            ConstraintParser::lookup(Some("wishlist_listing_id_fkey")),
            Some(ConstraintMeaning::Reference { entity: "listing" })
        ));
        assert_eq!(ConstraintParser::lookup(Some("something_else")), None);
        assert_eq!(ConstraintParser::lookup(None), None);
    }

    #[test]
    fn test_extract_key_value() {
        let message = "duplicate key value violates unique constraint \"users_email_key\"\nDETAIL: Key (email)=(a@illinois.edu) already exists.";
        assert_eq!(
            ConstraintParser::extract_key_value(message),
            Some(("email".to_string(), "a@illinois.edu".to_string()))
        );
        assert_eq!(ConstraintParser::extract_key_value("no detail here"), None);
    }

    #[test]
    fn test_extract_column_and_table() {
        let message = "null value in column \"title\" of relation \"listings\" violates not-null constraint";
        assert_eq!(ConstraintParser::extract_column(message), Some("title".to_string()));

        let fk = "Key (listing_id)=(42) is not present in table \"listings\".";
        assert_eq!(ConstraintParser::extract_table(fk), Some("listings".to_string()));
    }

    #[test]
    fn test_split_constraint_name() {
        assert_eq!(
            ConstraintParser::split_constraint_name("listings_owner_id_fkey"),
            Some(("listings".to_string(), "owner_id".to_string()))
        );
        assert_eq!(ConstraintParser::split_constraint_name("plain"), None);
    }
}
