//! Ordering and selection rules over version history
//!
//! Every store answers "latest" the same way: greatest `created_at`, and
//! when two versions share a timestamp, greatest insertion `sequence`. The
//! functions here work on plain slices so the in-memory store and tests use
//! exactly the rule the Postgres queries encode in `ORDER BY`.

use crate::core::{CredentialVersion, EncryptionKeyId, PageRequest, VersionSlice};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Ordering that puts the newest version first
pub fn newest_first(a: &CredentialVersion, b: &CredentialVersion) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.sequence.cmp(&a.sequence))
}

/// Sort a history newest first
pub fn sort_newest_first(versions: &mut [CredentialVersion]) {
    versions.sort_by(newest_first);
}

/// Latest version among those matching `predicate`
pub fn latest_matching<'a, I, P>(versions: I, mut predicate: P) -> Option<&'a CredentialVersion>
where
    I: IntoIterator<Item = &'a CredentialVersion>,
    P: FnMut(&CredentialVersion) -> bool,
{
    versions
        .into_iter()
        .filter(|v| predicate(*v))
        .min_by(|a, b| newest_first(a, b))
}

/// Latest certificate version with the given transitional flag
pub fn latest_certificate<'a, I>(versions: I, transitional: bool) -> Option<&'a CredentialVersion>
where
    I: IntoIterator<Item = &'a CredentialVersion>,
{
    latest_matching(versions, |v| v.is_certificate_with(transitional))
}

/// Version count per encryption key
pub fn count_by_key<'a, I>(versions: I) -> BTreeMap<EncryptionKeyId, u64>
where
    I: IntoIterator<Item = &'a CredentialVersion>,
{
    let mut counts = BTreeMap::new();
    for version in versions {
        *counts.entry(version.encryption_key).or_insert(0) += 1;
    }
    counts
}

/// Cut one page out of `versions` after ordering them by insertion sequence
pub fn page_by_sequence(mut versions: Vec<CredentialVersion>, page: PageRequest) -> VersionSlice {
    versions.sort_by_key(|v| v.sequence);
    let total = versions.len();
    let start = page.offset().min(total);
    let end = start.saturating_add(page.size).min(total);
    let content = versions.drain(start..end).collect();

    VersionSlice {
        content,
        page,
        has_next: end < total,
    }
}
