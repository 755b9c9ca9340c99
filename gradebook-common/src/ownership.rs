//! Ownership checks for parent-owned records
//!
//! A record that does not exist and a record that belongs to another parent
//! yield the same [`NotFoundOrForbidden`] outcome, so callers cannot discover
//! other parents' data.

use thiserror::Error;

/// Uniform failure for missing or foreign records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Resource not found")]
pub struct NotFoundOrForbidden;

/// Records that carry the subject id of their owning parent
pub trait Owned {
    fn owner_id(&self) -> &str;
}

/// Result of guarding a looked-up record
#[derive(Debug, Clone, PartialEq)]
pub enum Ownership<T> {
    Owned(T),
    NotFoundOrForbidden,
}

impl<T> Ownership<T> {
    pub fn into_result(self) -> Result<T, NotFoundOrForbidden> {
        match self {
            Ownership::Owned(resource) => Ok(resource),
            Ownership::NotFoundOrForbidden => Err(NotFoundOrForbidden),
        }
    }
}

/// Compare a record's declared owner with the caller
///
/// Empty ids never match.
pub fn check_ownership(
    resource_parent_id: &str,
    caller_id: &str,
) -> Result<(), NotFoundOrForbidden> {
    if resource_parent_id.is_empty() || caller_id.is_empty() {
        return Err(NotFoundOrForbidden);
    }
    if resource_parent_id != caller_id {
        return Err(NotFoundOrForbidden);
    }
    Ok(())
}

/// Guard the outcome of a lookup
///
/// ```
/// use gradebook_common::ownership::{guard, Owned, Ownership};
///
/// #[derive(Debug, PartialEq)]
/// struct Doc(&'static str);
/// impl Owned for Doc {
///     fn owner_id(&self) -> &str { self.0 }
/// }
///
/// assert_eq!(guard(Some(Doc("alice")), "alice"), Ownership::Owned(Doc("alice")));
/// assert_eq!(guard(Some(Doc("alice")), "bob"), Ownership::NotFoundOrForbidden);
/// assert_eq!(guard(None::<Doc>, "alice"), Ownership::NotFoundOrForbidden);
/// ```
pub fn guard<T: Owned>(resource: Option<T>, caller_id: &str) -> Ownership<T> {
    match resource {
        Some(resource) if check_ownership(resource.owner_id(), caller_id).is_ok() => {
            Ownership::Owned(resource)
        }
        _ => Ownership::NotFoundOrForbidden,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Record {
        parent_id: String,
    }

    impl Owned for Record {
        fn owner_id(&self) -> &str {
            &self.parent_id
        }
    }

    fn record(parent: &str) -> Record {
        Record {
            parent_id: parent.to_string(),
        }
    }

    #[test]
    fn test_matching_owner_allowed() {
        assert!(check_ownership("uid-1", "uid-1").is_ok());
    }

    #[test]
    fn test_other_owner_denied() {
        assert_eq!(check_ownership("uid-1", "uid-2"), Err(NotFoundOrForbidden));
    }

    #[test]
    fn test_empty_ids_denied() {
        assert!(check_ownership("", "").is_err());
        assert!(check_ownership("uid-1", "").is_err());
        assert!(check_ownership("", "uid-1").is_err());
    }

    #[test]
    fn test_missing_and_foreign_are_indistinguishable() {
        let missing = guard(None::<Record>, "uid-1").into_result();
        let foreign = guard(Some(record("uid-2")), "uid-1").into_result();
        assert_eq!(missing, foreign);
    }

    #[test]
    fn test_owned_record_is_returned() {
        let outcome = guard(Some(record("uid-1")), "uid-1");
        assert_eq!(outcome, Ownership::Owned(record("uid-1")));
    }
}
