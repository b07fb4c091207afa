//! URL slug generation and sibling collision resolution.

use std::collections::HashSet;

use crate::types::Slug;

/// Convert a display string into a lowercase URL-safe token.
///
/// Characters outside `[a-z0-9]`, whitespace and `-` are dropped after
/// lowercasing; whitespace runs become a single `-`; repeated hyphens collapse
/// and leading/trailing hyphens are trimmed. The result is either empty or
/// matches `^[a-z0-9]+(-[a-z0-9]+)*$`.
pub fn slugify(text: &str) -> Slug {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else if ch == '-' || ch.is_whitespace() {
            pending_hyphen = true;
        }
    }
    slug
}

/// Hands out unique slugs among siblings of one parent (models of a make,
/// makes of a category).
///
/// Claims must be made in the siblings' stable order; the same order always
/// yields the same slugs.
#[derive(Debug)]
pub struct SlugAllocator {
    fallback_prefix: &'static str,
    taken: HashSet<Slug>,
}

impl SlugAllocator {
    /// Create an allocator whose empty-slug fallback is `"{prefix}-{ordinal}"`.
    pub fn new(fallback_prefix: &'static str) -> Self {
        Self {
            fallback_prefix,
            taken: HashSet::new(),
        }
    }

    /// Claim a unique slug for the sibling at `ordinal` displayed as `display`.
    ///
    /// The base slug is `slugify(display)` or the positional fallback when that
    /// is empty. A taken base gets `-{ordinal}` appended; if that is taken too,
    /// `-{ordinal}-{n}` for `n = 2, 3, …`.
    pub fn claim(&mut self, display: &str, ordinal: usize) -> Slug {
        let mut base = slugify(display);
        if base.is_empty() {
            base = format!("{}-{ordinal}", self.fallback_prefix);
        }
        if self.taken.insert(base.clone()) {
            return base;
        }
        let with_ordinal = format!("{base}-{ordinal}");
        if self.taken.insert(with_ordinal.clone()) {
            return with_ordinal;
        }
        let mut suffix = 2usize;
        loop {
            let candidate = format!("{with_ordinal}-{suffix}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Number of slugs claimed so far.
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    /// True when nothing has been claimed yet.
    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}
