//! Hostname pattern semantics
//!
//! Gateway servers and virtual services declare hosts as exact names
//! (`api.example.com`), suffix wildcards (`*.example.com`) or the full
//! wildcard `*`. Server hosts may additionally carry a namespace qualifier
//! (`team-a/api.example.com`, `*/api.example.com`) restricting which virtual
//! services may bind to them.

use std::cmp::{Ordering, Reverse};

/// The full wildcard host
pub const WILDCARD: &str = "*";

/// How narrowly a host pattern matches. Orders most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Specificity {
    /// A literal hostname
    Exact,
    /// A `*.suffix` wildcard; longer suffixes are more specific
    Wildcard(Reverse<usize>),
    /// The full wildcard `*`
    Any,
}

/// Classify a host pattern
pub fn specificity(host: &str) -> Specificity {
    if host == WILDCARD {
        Specificity::Any
    } else if let Some(suffix) = host.strip_prefix('*') {
        Specificity::Wildcard(Reverse(suffix.len()))
    } else {
        Specificity::Exact
    }
}

/// Whether `pattern` covers every name `host` can stand for.
///
/// `*.example.com` covers `a.example.com`, `a.b.example.com` and
/// `*.b.example.com`, but not `example.com`.
pub fn covers(pattern: &str, host: &str) -> bool {
    if pattern == WILDCARD {
        return true;
    }

    match pattern.strip_prefix('*') {
        Some(suffix) => match host.strip_prefix('*') {
            Some(host_suffix) => host_suffix.ends_with(suffix),
            None => host.len() > suffix.len() && host.ends_with(suffix),
        },
        None => pattern == host,
    }
}

/// Whether two host patterns can match at least one common name
pub fn overlaps(a: &str, b: &str) -> bool {
    covers(a, b) || covers(b, a)
}

/// The narrower of two overlapping patterns, `a` on ties
pub fn more_specific<'a>(a: &'a str, b: &'a str) -> &'a str {
    if covers(a, b) && !covers(b, a) {
        b
    } else if covers(b, a) && !covers(a, b) {
        a
    } else {
        match specificity(a).cmp(&specificity(b)) {
            Ordering::Greater => b,
            _ => a,
        }
    }
}

/// Split an optional `namespace/` qualifier off a server host
pub fn split_namespace(host: &str) -> (Option<&str>, &str) {
    match host.split_once('/') {
        Some((namespace, hostname)) => (Some(namespace), hostname),
        None => (None, host),
    }
}

/// Whether a server host namespace qualifier admits a virtual service namespace
pub fn namespace_admits(qualifier: Option<&str>, namespace: &str) -> bool {
    match qualifier {
        None | Some("*") => true,
        Some(qualifier) => qualifier == namespace,
    }
}

/// Order host patterns most specific first, then lexically
pub fn compare_specificity(a: &str, b: &str) -> Ordering {
    specificity(a).cmp(&specificity(b)).then_with(|| a.cmp(b))
}
