//! Name validation and generated item names.

use uuid::Uuid;

use crate::error::IdError;

/// Longest name the store accepts (DNS subdomain limit).
pub const MAX_NAME_LEN: usize = 253;

/// Generates a managed-item name: `<owner>-<uuid v4>`.
///
/// The suffix is random, so two calls for the same owner differ with
/// overwhelming probability. Uniqueness is not checked against the store.
pub fn item_name(owner: &str) -> String {
    format!("{}-{}", owner, Uuid::new_v4())
}

pub(crate) fn validate_name(field: &'static str, value: &str) -> Result<(), IdError> {
    let invalid = |reason| IdError::InvalidName {
        field,
        value: value.to_string(),
        reason,
    };

    if value.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if value.len() > MAX_NAME_LEN {
        return Err(invalid("longer than 253 characters"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid("only lowercase alphanumerics, '-' and '.' are allowed"));
    }

    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    if !value.starts_with(alnum) || !value.ends_with(alnum) {
        return Err(invalid("must start and end with an alphanumeric character"));
    }

    Ok(())
}
