//! Page slug derivation from titles.
//!
//! ASCII slugification (`slug` crate) is combined with Chinese transliteration
//! (`pinyin` crate) so a title like “关于我们” becomes `guan-yu-wo-men`. The
//! uniqueness check is supplied by the caller, which keeps derivation itself pure.

use std::future::Future;

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

use super::pages::PageSlug;

const MAX_SUFFIX_ATTEMPTS: usize = 32;
const MAX_BASE_LEN: usize = 96;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Derive a base slug from a page title.
pub fn derive_slug(input: &str) -> Result<PageSlug, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let transliterated = transliterate_to_ascii(input);
    let candidate = truncate_on_dash(slugify(&transliterated), MAX_BASE_LEN);

    PageSlug::new(candidate).map_err(|_| SlugError::Unrepresentable {
        input: input.to_string(),
    })
}

/// Derive a slug that the `is_free` predicate accepts, suffixing `-2`, `-3`, … on collisions.
///
/// `is_free` must resolve to `true` when no page currently uses the candidate.
pub async fn generate_unique_slug_async<F, Fut, E>(
    input: &str,
    mut is_free: F,
) -> Result<PageSlug, SlugAsyncError<E>>
where
    F: FnMut(PageSlug) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    if is_free(base.clone()).await.map_err(SlugAsyncError::Predicate)? {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = PageSlug::new(format!("{base}-{attempt}")).map_err(|_| {
            SlugError::Unrepresentable {
                input: input.to_string(),
            }
        })?;
        if is_free(candidate.clone())
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted {
        base: base.to_string(),
    }))
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            None => output.push(ch),
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}

// slugify output is ASCII, so byte indices are char boundaries.
fn truncate_on_dash(slug: String, max: usize) -> String {
    if slug.len() <= max {
        return slug;
    }
    let cut = &slug[..max];
    match cut.rfind('-') {
        Some(idx) if idx > 0 => cut[..idx].to_string(),
        _ => cut.to_string(),
    }
}
