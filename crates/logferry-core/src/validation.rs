//! Validation rules shared by exporters, importers and local logs.

use crate::error::ValidationError;

/// A dataset name becomes the remote key prefix, a staging file prefix and
/// the local log's file name.
///
/// It must start with an ASCII letter or digit and contain only ASCII letters,
/// digits, `.`, `_` and `-`. Object stores keep these verbatim, so the key an
/// exporter derives is the key an importer lists. `/` would also split the
/// key into path segments.
pub fn validate_dataset_name(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(ValidationError::EmptyName);
    };
    if !first.is_ascii_alphanumeric() {
        return Err(ValidationError::InvalidName(name.to_string()));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')) {
        return Err(ValidationError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Exported segments must carry a positive creation timestamp.
///
/// An empty local log reports `created_at == 0`, so zero can never name a
/// segment: the importer would list it again after every restart.
pub fn validate_created_at(created_at: i64) -> Result<(), ValidationError> {
    if created_at <= 0 {
        return Err(ValidationError::InvalidCreatedAt(created_at));
    }
    Ok(())
}

/// Merged segments must arrive in strictly increasing `created_at` order.
pub fn validate_merge_order(last: i64, got: i64) -> Result<(), ValidationError> {
    if got <= last {
        return Err(ValidationError::OutOfOrder { last, got });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_name() {
        assert!(validate_dataset_name("ds").is_ok());
        assert_eq!(validate_dataset_name(""), Err(ValidationError::EmptyName));
        assert!(validate_dataset_name("orders.eu-west_2").is_ok());
    }

    #[test]
    fn test_dataset_name_rejects_unsafe_characters() {
        let unsafe_names = [
            "team#1", "a/b", "100%", "x[0]", "~home", "a b", "caf\u{e9}", ".hidden", "-x",
        ];
        for name in unsafe_names {
            assert_eq!(
                validate_dataset_name(name),
                Err(ValidationError::InvalidName(name.to_string())),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_created_at() {
        assert!(validate_created_at(1).is_ok());
        assert_eq!(
            validate_created_at(0),
            Err(ValidationError::InvalidCreatedAt(0))
        );
        assert_eq!(
            validate_created_at(-5),
            Err(ValidationError::InvalidCreatedAt(-5))
        );
    }

    #[test]
    fn test_merge_order() {
        assert!(validate_merge_order(0, 100).is_ok());
        assert!(validate_merge_order(100, 200).is_ok());
        assert_eq!(
            validate_merge_order(200, 200),
            Err(ValidationError::OutOfOrder { last: 200, got: 200 })
        );
        assert!(validate_merge_order(200, 100).is_err());
    }
}
