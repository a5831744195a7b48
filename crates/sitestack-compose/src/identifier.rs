//! Deterministic identifier derivation.
//!
//! An identifier is the readable join `<prefix>-<role>` followed by a short
//! SHA-256 digest of the pair. The digest keeps pairs apart whose plain
//! join would coincide, e.g. `("a-b", "c")` and `("a", "b-c")`.
//!
//! Parts are restricted to lowercase ASCII letters, digits, and `-`, so an
//! identifier is always a valid bucket name and DNS label.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use sha2::{Digest, Sha256};
use sitestack_common::constants::IDENTIFIER_DIGEST_LENGTH;
use sitestack_common::error::{Result, SiteStackError};
use sitestack_common::types::Identifier;

/// Derives the identifier for `(prefix, role)`.
///
/// Pure: the same pair yields the same identifier in every process.
///
/// # Errors
///
/// Returns [`SiteStackError::InvalidInput`] if either part is empty or
/// contains anything but lowercase ASCII letters, digits, and `-`.
pub fn identify(prefix: &str, role: &str) -> Result<Identifier> {
    check_part("prefix", prefix)?;
    check_part("role", role)?;

    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update([0u8]);
    hasher.update(role.as_bytes());
    let digest = hasher.finalize();

    let mut id = format!("{prefix}-{role}-");
    for byte in digest.iter().take(IDENTIFIER_DIGEST_LENGTH / 2) {
        let _ = write!(id, "{byte:02x}");
    }
    Ok(Identifier::new(id))
}

fn check_part(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SiteStackError::invalid_input(format!(
            "identifier {what} must not be empty"
        )));
    }
    let valid = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(SiteStackError::invalid_input(format!(
            "identifier {what} \"{value}\" may only contain lowercase letters, digits and '-'"
        )));
    }
    Ok(())
}

/// Records every identifier issued within one deployment.
///
/// Re-issuing a pair returns the identifier handed out before; a distinct
/// pair mapping onto an issued identifier is reported instead of shared.
#[derive(Debug, Default, Clone)]
pub struct IdentifierRegistry {
    issued: BTreeMap<Identifier, (String, String)>,
}

impl IdentifierRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the identifier for `(prefix, role)`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::InvalidInput`] if the parts are invalid or
    /// the derived identifier already belongs to a different pair.
    pub fn issue(&mut self, prefix: &str, role: &str) -> Result<Identifier> {
        let id = identify(prefix, role)?;
        match self.issued.get(&id) {
            Some((p, r)) if p == prefix && r == role => {}
            Some((p, r)) => {
                return Err(SiteStackError::invalid_input(format!(
                    "identifier \"{id}\" for ({prefix}, {role}) collides with ({p}, {r})"
                )));
            }
            None => {
                tracing::debug!(%id, prefix, role, "issued identifier");
                let _ = self
                    .issued
                    .insert(id.clone(), (prefix.to_owned(), role.to_owned()));
            }
        }
        Ok(id)
    }

    /// Returns the number of distinct identifiers issued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    /// Returns whether nothing has been issued yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    /// Iterates issued identifiers in sorted order.
    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.issued.keys()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn identify_is_deterministic() {
        let a = identify("blog", "bucket-name").expect("identify");
        let b = identify("blog", "bucket-name").expect("identify");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("blog-bucket-name-"), "got: {a}");
        assert_eq!(a.as_str().len(), "blog-bucket-name-".len() + IDENTIFIER_DIGEST_LENGTH);
    }

    #[test]
    fn identify_separates_ambiguous_joins() {
        let left = identify("a-b", "c").expect("identify");
        let right = identify("a", "b-c").expect("identify");
        assert_ne!(left, right);
    }

    #[test]
    fn identify_distinct_pairs_never_collide() {
        let prefixes = ["blog", "docs", "a", "a-b", "site1"];
        let roles = ["bucket-name", "distribution-id", "b", "b-c", "c"];
        let mut seen = HashSet::new();
        for prefix in prefixes {
            for role in roles {
                let id = identify(prefix, role).expect("identify");
                assert!(seen.insert(id.clone()), "collision on {id}");
            }
        }
        assert_eq!(seen.len(), prefixes.len() * roles.len());
    }

    #[test]
    fn identify_rejects_empty_parts() {
        let err = identify("", "bucket-name").unwrap_err();
        assert!(matches!(err, SiteStackError::InvalidInput { .. }));
        let err = identify("blog", "").unwrap_err();
        assert!(err.to_string().contains("role"), "got: {err}");
    }

    #[test]
    fn identify_rejects_invalid_characters() {
        assert!(identify("Blog", "bucket").is_err());
        assert!(identify("blog", "bucket name").is_err());
        assert!(identify("blog", "bucket_name").is_err());
    }

    #[test]
    fn identify_rejects_uppercase_parts() {
        let err = identify("MyBlog", "BucketName").unwrap_err();
        assert!(matches!(err, SiteStackError::InvalidInput { .. }), "got: {err}");
        assert!(err.to_string().contains("lowercase"), "got: {err}");
        let id = identify("myblog", "bucketname").expect("identify");
        assert!(id.as_str().starts_with("myblog-bucketname-"), "got: {id}");
    }

    #[test]
    fn registry_reissues_same_pair() {
        let mut registry = IdentifierRegistry::new();
        let first = registry.issue("blog", "bucket-name").expect("issue");
        let second = registry.issue("blog", "bucket-name").expect("issue");
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_tracks_distinct_pairs() {
        let mut registry = IdentifierRegistry::new();
        assert!(registry.is_empty());
        let _ = registry.issue("blog", "bucket-name").expect("issue");
        let _ = registry.issue("blog", "distribution-id").expect("issue");
        assert_eq!(registry.identifiers().count(), 2);
    }
}
