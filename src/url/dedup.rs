use std::collections::HashSet;

/// Deduplicates URLs by exact string, keeping first-seen order
///
/// Empty strings are dropped: they stand for a field the markup did not
/// provide.
///
/// # Examples
///
/// ```
/// use romstash::url::dedup_urls;
///
/// let urls = dedup_urls(["a", "a", "b", "", "a", "c"]);
/// assert_eq!(urls, vec!["a", "b", "c"]);
/// ```
pub fn dedup_urls<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter_map(|url| {
            let url = url.as_ref();
            if url.is_empty() || !seen.insert(url.to_string()) {
                None
            } else {
                Some(url.to_string())
            }
        })
        .collect()
}
