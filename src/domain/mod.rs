//! Domain layer types and invariants.

use std::fmt;

pub mod error;
pub mod pages;
pub mod seo;
pub mod slug;

/// Resource families served by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Seo,
    Page,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Seo => "seo",
            ResourceKind::Page => "page",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
