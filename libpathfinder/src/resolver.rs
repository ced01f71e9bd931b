use std::collections::BTreeSet;

use regex::Regex;

use crate::error::{PathFinderError, Result};
use crate::namespace::NamespacePath;

/// Outcome of matching a replica set against a namespace.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplicaMatches {
    /// Distinct `/<namespace>/...` suffixes. Exact duplicates collapse here;
    /// near-duplicates (different case, extra slashes) do not.
    pub candidates: BTreeSet<String>,
    /// URIs with no `/<namespace>/` segment at all.
    pub unmatched: Vec<String>,
}

impl ReplicaMatches {
    pub fn collect<I, S>(namespace: &str, replicas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pattern = namespace_pattern(namespace);
        let mut matches = ReplicaMatches::default();
        for uri in replicas {
            let uri = uri.as_ref();
            match pattern.find(uri) {
                Some(m) => {
                    matches.candidates.insert(m.as_str().to_string());
                }
                None => matches.unmatched.push(uri.to_string()),
            }
        }
        matches
    }
}

fn namespace_pattern(namespace: &str) -> Regex {
    // The namespace is escaped, so the pattern is always valid.
    Regex::new(&format!("/{}/.*$", regex::escape(namespace)))
        .unwrap_or_else(|e| unreachable!("escaped namespace pattern failed to compile: {e}"))
}

/// Derives the single on-disk location of `file_name` from its replica URIs.
///
/// Replicas outside `namespace` are tolerated and only logged. More than one
/// distinct location is refused outright: choosing the local one would need
/// site capability data that this crate does not have.
pub fn resolve<I, S>(namespace: &str, file_name: &str, replicas: I) -> Result<NamespacePath>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let ReplicaMatches {
        candidates,
        unmatched,
    } = ReplicaMatches::collect(namespace, replicas);

    for uri in &unmatched {
        tracing::warn!("No match found in URI '{uri}' for namespace '{namespace}'");
    }
    if !unmatched.is_empty() {
        tracing::warn!(
            "{} URIs did not match the expected pattern: {unmatched:?}",
            unmatched.len()
        );
    }

    let mut candidates = candidates.into_iter();
    match (candidates.next(), candidates.next()) {
        (None, _) => Err(PathFinderError::NotFound {
            namespace: namespace.to_string(),
            file_name: file_name.to_string(),
        }),
        (Some(path), None) => {
            tracing::debug!("resolved '{file_name}' in namespace '{namespace}' to {path}");
            NamespacePath::parse(&path)
        }
        (Some(first), Some(second)) => {
            let candidates: Vec<String> = [first, second].into_iter().chain(candidates).collect();
            tracing::warn!(
                "Multiple unique paths found for file '{file_name}' in namespace '{namespace}': {candidates:?}"
            );
            Err(PathFinderError::AmbiguousLocation {
                namespace: namespace.to_string(),
                file_name: file_name.to_string(),
                candidates,
            })
        }
    }
}
