//! Slug generation
//!
//! Titles are lowercased and every run of characters other than letters and
//! digits becomes one hyphen. Letters outside ASCII are kept, so a Cyrillic
//! title produces a Cyrillic slug.

use anyhow::Result;
use std::future::Future;

/// Turn a title into a URL slug.
///
/// May return an empty string when the title has no letters or digits.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Cut `slug` to at most `max` characters without leaving a trailing hyphen.
pub fn truncate_slug(slug: &str, max: usize) -> String {
    let cut: String = slug.chars().take(max).collect();
    cut.trim_end_matches('-').to_string()
}

/// Normalised form of a slug typed in by an editor, `None` when blank.
pub fn explicit_slug(raw: Option<&str>, max: usize) -> Option<String> {
    let slug = truncate_slug(&slugify(raw?), max);
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

/// Pick a slug not yet taken.
///
/// Starts from `slugify(source)` (or `fallback` when that is empty), cut to
/// `max` characters, then tries `-2`, `-3`, ... until `taken` says no.
pub async fn unique_slug<F, Fut>(
    source: &str,
    fallback: &str,
    max: usize,
    mut taken: F,
) -> Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let mut base = slugify(source);
    if base.is_empty() {
        base = fallback.to_string();
    }
    let base = truncate_slug(&base, max);

    if !taken(base.clone()).await? {
        return Ok(base);
    }

    let mut n: u32 = 2;
    loop {
        let suffix = format!("-{}", n);
        let room = max.saturating_sub(suffix.chars().count());
        let candidate = format!("{}{}", truncate_slug(&base, room), suffix);
        if !taken(candidate.clone()).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}
