//! Namespace normalization.
//!
//! `None` and `""` both denote the default namespace.

/// Collapse the empty namespace into `None`.
#[inline]
pub fn normalize_ns(ns: Option<&str>) -> Option<&str> {
    ns.filter(|ns| !ns.is_empty())
}

/// Compare two optional namespaces, treating `None` and `""` as equal.
#[inline]
pub fn compare_ns(a: Option<&str>, b: Option<&str>) -> bool {
    normalize_ns(a) == normalize_ns(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [Option<&str>; 5] = [None, Some(""), Some("x"), Some("y"), Some("auth")];

    #[test]
    fn test_default_namespace_equivalence() {
        assert!(compare_ns(None, Some("")));
        assert!(compare_ns(Some(""), None));
        assert!(compare_ns(None, None));
        assert!(compare_ns(Some(""), Some("")));
    }

    #[test]
    fn test_named_namespaces() {
        assert!(compare_ns(Some("x"), Some("x")));
        assert!(!compare_ns(Some("x"), Some("y")));
        assert!(!compare_ns(Some("x"), None));
        assert!(!compare_ns(Some(""), Some("x")));
    }

    #[test]
    fn test_symmetry() {
        for a in SAMPLES {
            for b in SAMPLES {
                assert_eq!(compare_ns(a, b), compare_ns(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_reflexive_after_normalization() {
        for a in SAMPLES {
            assert!(compare_ns(a, a));
            assert!(compare_ns(a, normalize_ns(a)));
        }
    }
}
