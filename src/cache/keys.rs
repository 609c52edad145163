//! Cache key derivation.
//!
//! Layout: `{prefix}:{resource}:item:{identity…}` for single records and
//! `{prefix}:{resource}:list[…]` for collections. Every user-supplied segment is
//! percent-escaped so that `:` cannot shift segment boundaries and glob
//! metacharacters cannot widen an invalidation pattern.

use std::borrow::Cow;

use crate::domain::ResourceKind;
use crate::domain::pages::PageSlug;
use crate::domain::seo::SeoIdentity;

const ITEM_SEGMENT: &str = "item";
const LIST_SEGMENT: &str = "list";

/// Pure key builder bound to a namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: escape_segment(prefix).into_owned(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn seo_item(&self, identity: &SeoIdentity) -> String {
        format!(
            "{}:{}:{ITEM_SEGMENT}:{}:{}",
            self.prefix,
            ResourceKind::Seo,
            escape_segment(identity.name()),
            escape_segment(identity.pk()),
        )
    }

    pub fn page_item(&self, slug: &PageSlug) -> String {
        format!(
            "{}:{}:{ITEM_SEGMENT}:{}",
            self.prefix,
            ResourceKind::Page,
            escape_segment(slug.as_str()),
        )
    }

    pub fn page_list(&self) -> String {
        self.list_key(ResourceKind::Page)
    }

    pub fn item(&self, target: &ItemRef<'_>) -> String {
        match target {
            ItemRef::Seo(identity) => self.seo_item(identity),
            ItemRef::Page(slug) => self.page_item(slug),
        }
    }

    /// Fixed collection key for a resource family.
    pub fn list_key(&self, kind: ResourceKind) -> String {
        format!("{}:{kind}:{LIST_SEGMENT}", self.prefix)
    }

    /// Pattern covering every collection key of a resource family.
    pub fn list_pattern(&self, kind: ResourceKind) -> String {
        format!("{}*", self.list_key(kind))
    }
}

/// Borrowed identity of a single cached record.
#[derive(Debug, Clone, Copy)]
pub enum ItemRef<'a> {
    Seo(&'a SeoIdentity),
    Page(&'a PageSlug),
}

impl ItemRef<'_> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ItemRef::Seo(_) => ResourceKind::Seo,
            ItemRef::Page(_) => ResourceKind::Page,
        }
    }
}

/// Percent-escape `%`, `:` and the Redis glob metacharacters.
pub fn escape_segment(raw: &str) -> Cow<'_, str> {
    if !raw.chars().any(needs_escape) {
        return Cow::Borrowed(raw);
    }

    let mut escaped = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            ':' => escaped.push_str("%3A"),
            '*' => escaped.push_str("%2A"),
            '?' => escaped.push_str("%3F"),
            '[' => escaped.push_str("%5B"),
            ']' => escaped.push_str("%5D"),
            '\\' => escaped.push_str("%5C"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

fn needs_escape(ch: char) -> bool {
    matches!(ch, '%' | ':' | '*' | '?' | '[' | ']' | '\\')
}

/// Redis-style glob matching over `*`, `?` and `\`-escaped literals.
pub(crate) fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut p, mut k) = (0usize, 0usize);
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, k));
                p += 1;
                continue;
            }
            Some('?') => {
                p += 1;
                k += 1;
                continue;
            }
            Some('\\') if pattern.get(p + 1) == Some(&key[k]) => {
                p += 2;
                k += 1;
                continue;
            }
            Some(&c) if c != '\\' && c == key[k] => {
                p += 1;
                k += 1;
                continue;
            }
            _ => {}
        }

        match backtrack {
            Some((star_p, star_k)) => {
                p = star_p + 1;
                k = star_k + 1;
                backtrack = Some((star_p, star_k + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seo(name: &str, pk: &str) -> SeoIdentity {
        SeoIdentity::parse(name, pk).expect("valid identity")
    }

    fn page(slug: &str) -> PageSlug {
        PageSlug::new(slug).expect("valid slug")
    }

    #[test]
    fn seo_item_key_layout() {
        let keys = CacheKeys::new("seo-svc");
        assert_eq!(
            keys.seo_item(&seo("product", "42")),
            "seo-svc:seo:item:product:42"
        );
        assert_eq!(keys.page_item(&page("about")), "seo-svc:page:item:about");
        assert_eq!(keys.page_list(), "seo-svc:page:list");
    }

    #[test]
    fn colon_in_identity_does_not_collide() {
        let keys = CacheKeys::new("ns");
        let left = keys.seo_item(&seo("a:b", "c"));
        let right = keys.seo_item(&seo("a", "b:c"));
        assert_ne!(left, right);
        assert_eq!(left, "ns:seo:item:a%3Ab:c");
        assert_eq!(right, "ns:seo:item:a:b%3Ac");
    }

    #[test]
    fn escaping_is_injective_for_percent_sequences() {
        let keys = CacheKeys::new("ns");
        let literal = keys.seo_item(&seo("a%3Ab", "c"));
        let escaped = keys.seo_item(&seo("a:b", "c"));
        assert_ne!(literal, escaped);
    }

    #[test]
    fn identical_requests_share_a_key() {
        let keys = CacheKeys::new("ns");
        assert_eq!(
            keys.seo_item(&seo("product", "42")),
            keys.seo_item(&seo("product", "42"))
        );
    }

    #[test]
    fn glob_characters_in_identity_are_neutralised() {
        let keys = CacheKeys::new("ns");
        let key = keys.page_item(&page("list*"));
        assert_eq!(key, "ns:page:item:list%2A");
        assert!(!key.contains('*'));
    }

    #[test]
    fn list_pattern_covers_lists_but_not_items() {
        let keys = CacheKeys::new("ns");
        let pattern = keys.list_pattern(ResourceKind::Page);

        assert!(glob_match(&pattern, &keys.page_list()));
        assert!(glob_match(&pattern, "ns:page:list:recent"));
        assert!(!glob_match(&pattern, &keys.page_item(&page("list"))));
        assert!(!glob_match(&pattern, "ns:seo:list"));
        assert!(!glob_match(
            &keys.list_pattern(ResourceKind::Seo),
            &keys.page_list()
        ));
    }

    #[test]
    fn prefix_is_escaped_too() {
        let keys = CacheKeys::new("a:b");
        assert_eq!(keys.page_list(), "a%3Ab:page:list");
    }

    #[test]
    fn glob_match_basics() {
        assert!(glob_match("*", ""));
        assert!(glob_match("a*c", "abbbc"));
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "ac"));
        assert!(glob_match(r"a\*c", "a*c"));
        assert!(!glob_match(r"a\*c", "abc"));
        assert!(glob_match("a*b*c", "a-b-b-c"));
        assert!(!glob_match("abc", "abcd"));
    }
}
