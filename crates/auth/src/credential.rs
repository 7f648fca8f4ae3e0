//! Bearer credential extraction.
//!
//! Runs before any provider round-trip, so a malformed header never costs a
//! network call.

use crate::AuthError;

/// Extract the token from an `Authorization` header value.
///
/// The header must consist of exactly two whitespace-separated parts, the
/// first being `bearer` in any letter case.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or_else(|| AuthError::malformed("authorization header is missing"))?;

    let mut parts = header.split_whitespace();
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AuthError::malformed("invalid authorization header format"));
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::malformed("invalid authorization header format"));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bearer_in_any_case() {
        assert_eq!(extract_bearer(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(extract_bearer(Some("bearer abc")).unwrap(), "abc");
        assert_eq!(extract_bearer(Some("  BEARER   abc ")).unwrap(), "abc");
    }

    #[test]
    fn rejects_missing_header() {
        assert!(matches!(extract_bearer(None), Err(AuthError::MalformedCredential(_))));
    }

    #[test]
    fn rejects_wrong_scheme() {
        assert!(matches!(
            extract_bearer(Some("Basic xyz")),
            Err(AuthError::MalformedCredential(_))
        ));
    }

    #[test]
    fn rejects_wrong_part_count() {
        for header in ["Bearer", "Bearer a b", "", "   "] {
            assert!(
                matches!(extract_bearer(Some(header)), Err(AuthError::MalformedCredential(_))),
                "{header:?}"
            );
        }
    }
}
