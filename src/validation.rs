//! Input validation and normalization for user payloads and list queries.
//!
//! Field errors are collected into a map keyed by field name so that one
//! response can report every problem at once.

use crate::error::{Result, SubforgeError};
use crate::types::{ListParams, NewUser, SortField, UserUpdate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;
pub const MAX_PAGE_SIZE: u64 = 100;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

static OBJECT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("object id pattern compiles"));

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

pub fn is_object_id(id: &str) -> bool {
    OBJECT_ID_RE.is_match(id)
}

/// Reject anything that is not a 24-hex ObjectId before it reaches storage.
pub fn require_object_id(id: &str) -> Result<()> {
    if is_object_id(id) {
        Ok(())
    } else {
        Err(SubforgeError::InvalidId(id.to_string()))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_name(name: &str, errors: &mut BTreeMap<String, String>) -> Option<String> {
    let name = name.trim();
    let chars = name.chars().count();
    if chars == 0 {
        errors.insert("name".into(), "Name is required".into());
        None
    } else if chars < NAME_MIN_CHARS {
        errors.insert(
            "name".into(),
            "Name must be at least 2 characters long".into(),
        );
        None
    } else if chars > NAME_MAX_CHARS {
        errors.insert("name".into(), "Name cannot exceed 50 characters".into());
        None
    } else {
        Some(name.to_string())
    }
}

fn check_email(email: &str, errors: &mut BTreeMap<String, String>) -> Option<String> {
    let email = normalize_email(email);
    if email.is_empty() {
        errors.insert("email".into(), "Email is required".into());
        None
    } else if !is_valid_email(&email) {
        errors.insert(
            "email".into(),
            "Please enter a valid email address".into(),
        );
        None
    } else {
        Some(email)
    }
}

pub fn validate_new_user(name: Option<&str>, email: Option<&str>) -> Result<NewUser> {
    let mut errors = BTreeMap::new();
    let name = check_name(name.unwrap_or(""), &mut errors);
    let email = check_email(email.unwrap_or(""), &mut errors);

    match (name, email) {
        (Some(name), Some(email)) if errors.is_empty() => Ok(NewUser { name, email }),
        _ => Err(SubforgeError::Validation(errors)),
    }
}

/// Blank fields count as absent, so `{"name": ""}` leaves the name unchanged.
pub fn validate_update(name: Option<&str>, email: Option<&str>) -> Result<UserUpdate> {
    let mut errors = BTreeMap::new();
    let name = name
        .filter(|n| !n.trim().is_empty())
        .and_then(|n| check_name(n, &mut errors));
    let email = email
        .filter(|e| !e.trim().is_empty())
        .and_then(|e| check_email(e, &mut errors));

    if errors.is_empty() {
        Ok(UserUpdate { name, email })
    } else {
        Err(SubforgeError::Validation(errors))
    }
}

/// Validate raw query-string values. Absent values fall back to defaults.
pub fn validate_list_params(
    page: Option<&str>,
    limit: Option<&str>,
    sort: Option<&str>,
) -> Result<ListParams> {
    let mut errors = BTreeMap::new();
    let defaults = ListParams::default();

    let page = match page {
        None | Some("") => Some(defaults.page),
        Some(raw) => match raw.parse::<u64>() {
            Ok(p) if p >= 1 => Some(p),
            _ => {
                errors.insert("page".into(), "Page must be a positive integer".into());
                None
            }
        },
    };

    let limit = match limit {
        None | Some("") => Some(defaults.limit),
        Some(raw) => match raw.parse::<u64>() {
            Ok(l) if (1..=MAX_PAGE_SIZE).contains(&l) => Some(l),
            _ => {
                errors.insert("limit".into(), "Limit must be between 1 and 100".into());
                None
            }
        },
    };

    let sort = match sort {
        None | Some("") => None,
        Some(raw) if !raw.chars().all(|c| c.is_ascii_alphabetic()) => {
            errors.insert(
                "sort".into(),
                "Sort field must contain only letters".into(),
            );
            None
        }
        Some(raw) => match SortField::parse(raw) {
            Some(field) => Some(field),
            None => {
                errors.insert(
                    "sort".into(),
                    "Sort field must be one of name, email, createdAt, updatedAt".into(),
                );
                None
            }
        },
    };

    match (page, limit) {
        (Some(page), Some(limit)) if errors.is_empty() => Ok(ListParams { page, limit, sort }),
        _ => Err(SubforgeError::Validation(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_errors(err: SubforgeError) -> BTreeMap<String, String> {
        match err {
            SubforgeError::Validation(fields) => fields,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_new_user_is_trimmed_and_lowercased() {
        let user = validate_new_user(Some("  Jane Doe "), Some(" Jane@Example.COM ")).unwrap();
        assert_eq!(user.name, "Jane Doe");
        assert_eq!(user.email, "jane@example.com");
    }

    #[test]
    fn test_new_user_reports_all_fields() {
        let errors = field_errors(validate_new_user(None, Some("not-an-email")).unwrap_err());
        assert_eq!(errors["name"], "Name is required");
        assert_eq!(errors["email"], "Please enter a valid email address");
    }

    #[test]
    fn test_name_length_bounds() {
        let errors = field_errors(validate_new_user(Some("J"), Some("j@x.io")).unwrap_err());
        assert!(errors["name"].contains("at least 2"));

        let long = "a".repeat(51);
        let errors = field_errors(validate_new_user(Some(&long), Some("j@x.io")).unwrap_err());
        assert!(errors["name"].contains("cannot exceed 50"));

        let exact = "é".repeat(50);
        assert!(validate_new_user(Some(&exact), Some("j@x.io")).is_ok());
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("john@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co.uk"));
        assert!(!is_valid_email("john@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("john@localhost"));
        assert!(!is_valid_email("john doe@example.com"));
    }

    #[test]
    fn test_update_ignores_blank_fields() {
        let update = validate_update(Some("   "), None).unwrap();
        assert!(update.is_empty());

        let update = validate_update(None, Some("NEW@example.com")).unwrap();
        assert_eq!(update.email.as_deref(), Some("new@example.com"));
        assert!(update.name.is_none());

        let errors = field_errors(validate_update(Some("x"), Some("nope")).unwrap_err());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_object_id() {
        assert!(is_object_id("60d725b4e2f7c91234567890"));
        assert!(!is_object_id("60d725b4e2f7c9123456789"));
        assert!(!is_object_id("zzd725b4e2f7c91234567890"));
        assert!(matches!(
            require_object_id("123"),
            Err(SubforgeError::InvalidId(_))
        ));
    }

    #[test]
    fn test_list_params_defaults_and_bounds() {
        let params = validate_list_params(None, None, None).unwrap();
        assert_eq!(params, ListParams::default());

        let params = validate_list_params(Some("3"), Some("100"), Some("createdAt")).unwrap();
        assert_eq!(params.page, 3);
        assert_eq!(params.limit, 100);
        assert_eq!(params.sort, Some(SortField::CreatedAt));

        let errors =
            field_errors(validate_list_params(Some("0"), Some("101"), Some("-name")).unwrap_err());
        assert!(errors.contains_key("page"));
        assert!(errors.contains_key("limit"));
        assert_eq!(errors["sort"], "Sort field must contain only letters");

        let errors = field_errors(validate_list_params(None, None, Some("password")).unwrap_err());
        assert!(errors["sort"].starts_with("Sort field must be one of"));
    }
}
