use std::{collections::HashSet, hash::Hash};

/// Returns a copy of `seq` with every element appearing only once.
///
/// The first occurrence of each element wins, so the relative order of the
/// input is kept.
#[must_use]
pub fn uniqify<T, I>(seq: I) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    T: Eq + Hash + Clone,
{
    uniqify_by_key(seq, Clone::clone)
}

/// Like [`uniqify`], but two elements count as duplicates when `key` maps
/// them to the same value.
pub fn uniqify_by_key<T, K, I, F>(seq: I, mut key: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();

    seq.into_iter().filter(|x| seen.insert(key(x))).collect()
}
