//! Canonical tag string form and its pure transformations.
//!
//! # Responsibility
//! - Turn raw tag tokens into the stored comma-wrapped string.
//! - Rewrite one tag inside a stored string (rename or delete).
//!
//! # Invariants
//! - Canonical strings always start and end with `,`; the empty set is `,`.
//! - No whitespace is emitted next to a delimiter: `work, deep dive` is stored
//!   as `,work,deep dive,`, never `,work, deep dive,`.
//! - Tags are not deduplicated on canonicalization.

/// Canonical value of an untagged bookmark.
pub const EMPTY_TAGS: &str = ",";

const DELIM: char = ',';

/// Canonicalizes raw tag tokens into the stored tag string.
///
/// A token ending in `,` closes the tag it belongs to. Consecutive tokens
/// without a delimiter between them are joined with a single space, which
/// rebuilds multi-word tags split by a shell tokenizer. Tokens made only of
/// delimiters and whitespace are dropped.
///
/// ```
/// use markstash_core::canonicalize_tags;
///
/// assert_eq!(canonicalize_tags(&["work,", "deep", "dive"]), ",work,deep dive,");
/// assert_eq!(canonicalize_tags::<&str>(&[]), ",");
/// ```
pub fn canonicalize_tags<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut acc = String::from(DELIM);
    for token in tokens {
        let raw = token.as_ref().trim();
        let tag = trim_tag(raw);
        if tag.is_empty() {
            continue;
        }

        if !acc.ends_with(DELIM) {
            acc.push(' ');
        }
        acc.push_str(&normalize_inner(tag));
        if raw.ends_with(DELIM) {
            acc.push(DELIM);
        }
    }

    if !acc.ends_with(DELIM) {
        acc.push(DELIM);
    }
    acc
}

/// Returns the content of a canonical string without its wrapping commas.
///
/// `",a,b c,"` yields `"a,b c"`; the empty set yields `""`.
pub fn canonical_content(canonical: &str) -> &str {
    canonical.trim_matches(DELIM)
}

/// Iterates the individual tags of a stored string, trimmed of whitespace.
pub fn split_tags(tags: &str) -> impl Iterator<Item = &str> {
    tags.split(DELIM)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
}

/// Joins individual tags back into canonical form.
pub fn join_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> String {
    let mut acc = String::from(DELIM);
    for tag in tags {
        acc.push_str(tag);
        acc.push(DELIM);
    }
    acc
}

/// Builds the delimiter-bounded needle used to match one whole tag.
///
/// Returns `None` when the tag canonicalizes to the empty set.
pub fn tag_needle(tag: &str) -> Option<String> {
    let canonical = canonicalize_tags(&[tag]);
    if canonical == EMPTY_TAGS {
        None
    } else {
        Some(canonical)
    }
}

/// Rewrites every occurrence of `old` inside `tags`.
///
/// `replacement` is the canonical form of the new tags, or `None` to delete
/// `old`. When the replacement already occurs in `tags`, `old` is dropped
/// rather than creating a duplicate. Returns `None` when `old` is not present.
pub fn rewrite_tags(tags: &str, old: &str, replacement: Option<&str>) -> Option<String> {
    let old = trim_tag(old);
    if old.is_empty() || !split_tags(tags).any(|tag| tag == old) {
        return None;
    }

    let normalized = join_tags(split_tags(tags));
    let substitute = match replacement {
        Some(new) if new != EMPTY_TAGS && !normalized.contains(new) => canonical_content(new),
        _ => "",
    };

    let rewritten = join_tags(split_tags(tags).filter_map(|tag| {
        if tag != old {
            Some(tag)
        } else if substitute.is_empty() {
            None
        } else {
            Some(substitute)
        }
    }));
    Some(rewritten)
}

fn trim_tag(raw: &str) -> &str {
    raw.trim_matches(|c: char| c == DELIM || c.is_whitespace())
}

fn normalize_inner(tag: &str) -> String {
    // Inner delimiters split a token into several tags; drop the whitespace
    // around them so the stored form stays delimiter-tight.
    let mut parts = tag.split(DELIM).map(str::trim).filter(|part| !part.is_empty());
    let mut out = String::with_capacity(tag.len());
    if let Some(first) = parts.next() {
        out.push_str(first);
    }
    for part in parts {
        out.push(DELIM);
        out.push_str(part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{canonical_content, canonicalize_tags, rewrite_tags, split_tags, tag_needle};

    #[test]
    fn trailing_comma_closes_a_tag_and_words_are_joined() {
        assert_eq!(canonicalize_tags(&["work,", "deep dive"]), ",work,deep dive,");
        assert_eq!(canonicalize_tags(&["deep", "dive,", "work"]), ",deep dive,work,");
    }

    #[test]
    fn empty_and_noise_input_yield_empty_set() {
        assert_eq!(canonicalize_tags::<&str>(&[]), ",");
        assert_eq!(canonicalize_tags(&[","]), ",");
        assert_eq!(canonicalize_tags(&[",,", " , "]), ",");
    }

    #[test]
    fn duplicates_are_kept() {
        assert_eq!(canonicalize_tags(&["a,", "a"]), ",a,a,");
    }

    #[test]
    fn inner_delimiters_split_tags() {
        assert_eq!(canonicalize_tags(&["a, b ,c"]), ",a,b,c,");
    }

    #[test]
    fn content_and_split_strip_delimiters() {
        assert_eq!(canonical_content(",a,b c,"), "a,b c");
        assert_eq!(canonical_content(","), "");
        assert_eq!(split_tags(",a, b c ,").collect::<Vec<_>>(), vec!["a", "b c"]);
    }

    #[test]
    fn needle_requires_a_real_tag() {
        assert_eq!(tag_needle("work").as_deref(), Some(",work,"));
        assert_eq!(tag_needle(" , "), None);
    }

    #[test]
    fn rewrite_renames_every_occurrence() {
        assert_eq!(
            rewrite_tags(",work,x,work,", "work", Some(",job,")).as_deref(),
            Some(",job,x,job,")
        );
    }

    #[test]
    fn rewrite_avoids_duplicates() {
        assert_eq!(
            rewrite_tags(",work,urgent,work,", "work", Some(",urgent,")).as_deref(),
            Some(",urgent,")
        );
        assert_eq!(
            rewrite_tags(",work, urgent, work,", "work", Some(",urgent,")).as_deref(),
            Some(",urgent,")
        );
    }

    #[test]
    fn rewrite_deletes_tag() {
        assert_eq!(rewrite_tags(",a,b,", "a", None).as_deref(), Some(",b,"));
        assert_eq!(rewrite_tags(",a,", "a", None).as_deref(), Some(","));
    }

    #[test]
    fn rewrite_ignores_partial_matches() {
        assert_eq!(rewrite_tags(",homework,", "work", None), None);
    }
}
