//! Identity and URI model
//!
//! Every entity carries a URI identity. Identities are generated from a
//! namespace, a display id and an optional version, resolved against the
//! namespaces a document knows about, and re-based when an owner is renamed.

use serde::{Deserialize, Serialize};

use crate::error::{SbolError, SbolResult};

/// A namespace known to a document, optionally bound to a prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    /// Prefix used in `prefix:local` references
    pub prefix: Option<String>,
    /// Namespace URI
    pub uri: String,
}

impl Namespace {
    /// A namespace without a prefix
    pub fn new(uri: impl Into<String>) -> Self {
        Self { prefix: None, uri: uri.into() }
    }

    /// A namespace bound to `prefix`
    pub fn prefixed(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            uri: uri.into(),
        }
    }

    fn join(&self, local: &str) -> String {
        if self.uri.ends_with('/') || self.uri.ends_with('#') {
            format!("{}{}", self.uri, local)
        } else {
            format!("{}/{}", self.uri, local)
        }
    }
}

/// Whether `uri` starts with a URI scheme (`scheme:rest`)
pub fn is_absolute(uri: &str) -> bool {
    let Some((scheme, rest)) = uri.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    starts_alpha
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
}

/// Check a display id: letters, digits and underscores, not starting with a digit
pub fn validate_display_id(display_id: &str) -> SbolResult<()> {
    let mut chars = display_id.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SbolError::invalid(format!("'{display_id}' is not a valid display id")))
    }
}

/// Generate a display id for entities created without one
pub fn generate_display_id() -> String {
    format!("id_{}", uuid::Uuid::new_v4().simple())
}

/// Build `namespace/displayId[/version]`
///
/// A namespace ending in `#` is joined without a separator. A namespace ending
/// in `/` is rejected.
pub fn generate_uri(namespace: &str, display_id: &str, version: Option<&str>) -> SbolResult<String> {
    if namespace.is_empty() {
        return Err(SbolError::invalid("namespace must not be empty"));
    }
    if namespace.ends_with('/') {
        return Err(SbolError::invalid(format!(
            "namespace '{namespace}' must not end with a path separator"
        )));
    }
    validate_display_id(display_id)?;

    let mut uri = if namespace.ends_with('#') {
        format!("{namespace}{display_id}")
    } else {
        format!("{namespace}/{display_id}")
    };
    if let Some(version) = version.filter(|v| !v.is_empty()) {
        if version.contains('/') || version.contains('#') {
            return Err(SbolError::invalid(format!("'{version}' is not a valid version")));
        }
        uri.push('/');
        uri.push_str(version);
    }
    Ok(uri)
}

/// Resolve `uri` against `namespaces`
///
/// `prefix:local` references expand against the namespace bound to `prefix`.
/// Other absolute URIs are returned unchanged. Relative references are joined
/// to the first namespace without a prefix, or the first namespace if all are
/// prefixed.
pub fn resolve(uri: &str, namespaces: &[Namespace], require_absolute: bool) -> SbolResult<String> {
    if uri.is_empty() {
        return Err(SbolError::invalid("cannot resolve an empty URI"));
    }

    if let Some((prefix, local)) = uri.split_once(':') {
        if let Some(ns) = namespaces
            .iter()
            .find(|ns| ns.prefix.as_deref() == Some(prefix))
        {
            return Ok(format!("{}{}", ns.uri, local));
        }
    }

    if is_absolute(uri) {
        return Ok(uri.to_string());
    }

    let base = namespaces
        .iter()
        .find(|ns| ns.prefix.is_none())
        .or_else(|| namespaces.first());

    match base {
        Some(ns) => Ok(ns.join(uri.trim_start_matches('/'))),
        None if require_absolute => Err(SbolError::UnresolvedReference(uri.to_string())),
        None => Ok(uri.to_string()),
    }
}

/// Replace the `old_prefix` of `uri` with `new_prefix`
///
/// Only whole path segments match: `ns#A` re-bases `ns#A/child` but not
/// `ns#AB`. Returns `None` when `uri` does not live under `old_prefix`.
pub fn rebase(uri: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    let rest = uri.strip_prefix(old_prefix)?;
    if rest.is_empty() || rest.starts_with('/') || rest.starts_with('#') {
        Some(format!("{new_prefix}{rest}"))
    } else {
        None
    }
}

/// Best-effort display id recovered from the tail of a URI
///
/// A trailing segment that is not a valid display id (usually a version) is
/// skipped in favour of the one before it.
pub fn display_id_from_uri(uri: &str) -> Option<String> {
    uri.rsplit(|c| c == '/' || c == '#')
        .take(2)
        .find(|segment| validate_display_id(segment).is_ok())
        .map(str::to_string)
}

/// Display id named by `uri` once its `/version` suffix is removed
///
/// Unlike [`display_id_from_uri`] this never falls back to an earlier
/// segment, so `ns/parts/9lives` yields `None` rather than `parts`.
pub fn display_id_for(uri: &str, version: Option<&str>) -> Option<String> {
    let base = version
        .filter(|v| !v.is_empty())
        .and_then(|v| uri.strip_suffix(v)?.strip_suffix('/'))
        .unwrap_or(uri);
    base.rsplit(|c| c == '/' || c == '#')
        .next()
        .filter(|segment| validate_display_id(segment).is_ok())
        .map(str::to_string)
}

/// `identity` without its `/version` suffix
pub fn strip_version<'a>(identity: &'a str, version: Option<&str>) -> &'a str {
    version
        .filter(|v| !v.is_empty())
        .and_then(|v| identity.strip_suffix(v)?.strip_suffix('/'))
        .unwrap_or(identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_uri() {
        assert_eq!(
            generate_uri("http://examples.org", "c1", None).unwrap(),
            "http://examples.org/c1"
        );
        assert_eq!(
            generate_uri("http://examples.org", "c1", Some("1")).unwrap(),
            "http://examples.org/c1/1"
        );
        assert_eq!(
            generate_uri("http://examples.org#", "c1", None).unwrap(),
            "http://examples.org#c1"
        );
    }

    #[test]
    fn test_generate_uri_rejects_trailing_separator() {
        let result = generate_uri("http://examples.org/", "c1", None);
        assert!(matches!(result, Err(SbolError::InvalidArgument(_))));
    }

    #[test]
    fn test_generate_uri_rejects_bad_display_id() {
        assert!(generate_uri("http://examples.org", "1abc", None).is_err());
        assert!(generate_uri("http://examples.org", "a b", None).is_err());
        assert!(generate_uri("http://examples.org", "", None).is_err());
    }

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("http://examples.org/c1"));
        assert!(is_absolute("urn:uuid:1234"));
        assert!(!is_absolute("c1"));
        assert!(!is_absolute("c1/child"));
        assert!(!is_absolute("1http://x"));
    }

    #[test]
    fn test_resolve_absolute_unchanged() {
        let namespaces = vec![Namespace::new("http://examples.org")];
        assert_eq!(
            resolve("http://other.org/x", &namespaces, true).unwrap(),
            "http://other.org/x"
        );
    }

    #[test]
    fn test_resolve_relative_against_default() {
        let namespaces = vec![
            Namespace::prefixed("so", "http://identifiers.org/so/"),
            Namespace::new("http://examples.org"),
        ];
        assert_eq!(
            resolve("c1", &namespaces, true).unwrap(),
            "http://examples.org/c1"
        );
    }

    #[test]
    fn test_resolve_prefixed_reference() {
        let namespaces = vec![
            Namespace::new("http://examples.org"),
            Namespace::prefixed("so", "http://identifiers.org/so/"),
        ];
        assert_eq!(
            resolve("so:SO:0000167", &namespaces, true).unwrap(),
            "http://identifiers.org/so/SO:0000167"
        );
    }

    #[test]
    fn test_resolve_unresolved() {
        let result = resolve("c1", &[], true);
        assert_eq!(result, Err(SbolError::UnresolvedReference("c1".to_string())));
        assert_eq!(resolve("c1", &[], false).unwrap(), "c1");
    }

    #[test]
    fn test_rebase_respects_segments() {
        assert_eq!(rebase("ns#A/child1", "ns#A", "ns#B").as_deref(), Some("ns#B/child1"));
        assert_eq!(rebase("ns#A", "ns#A", "ns#B").as_deref(), Some("ns#B"));
        assert_eq!(rebase("ns#AB/child1", "ns#A", "ns#B"), None);
        assert_eq!(rebase("other#A/child1", "ns#A", "ns#B"), None);
    }

    #[test]
    fn test_display_id_from_uri() {
        assert_eq!(display_id_from_uri("http://examples.org/c1").as_deref(), Some("c1"));
        assert_eq!(display_id_from_uri("http://examples.org/c1/1").as_deref(), Some("c1"));
        assert_eq!(display_id_from_uri("http://examples.org#c1").as_deref(), Some("c1"));
    }

    #[test]
    fn test_display_id_for_strips_only_the_version() {
        assert_eq!(display_id_for("http://examples.org/c1/1", Some("1")).as_deref(), Some("c1"));
        assert_eq!(display_id_for("http://examples.org/c1", Some("1")).as_deref(), Some("c1"));
        assert_eq!(display_id_for("http://examples.org/ns#c1", None).as_deref(), Some("c1"));
        assert_eq!(display_id_for("http://examples.org/parts/9lives", None), None);
        assert_eq!(display_id_for("http://examples.org/9lives/1", Some("1")), None);
    }

    #[test]
    fn test_strip_version() {
        assert_eq!(strip_version("http://examples.org/cd/1", Some("1")), "http://examples.org/cd");
        assert_eq!(strip_version("http://examples.org/cd/11", Some("1")), "http://examples.org/cd/11");
        assert_eq!(strip_version("http://examples.org/cd", None), "http://examples.org/cd");
    }
}
