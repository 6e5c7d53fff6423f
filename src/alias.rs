//! Alias and synonym expansion.
//!
//! Short campus shorthand ("cse", "hod", "os") rarely matches the store's
//! record fields. The resolver holds a table of surface form → canonical
//! phrase entries and, for every surface form present as a whole word in
//! the normalized query, appends the canonical phrase so both spellings
//! participate in scoring. Appending (rather than substituting) keeps the
//! user's original tokens in play.
//!
//! The table is built once at startup from the built-in entries plus any
//! `[ask] extra_aliases` from config, and never mutated afterwards.

use crate::normalize::normalize;

/// Surface form → canonical phrase, both stored normalized.
const BUILT_IN: &[(&str, &str)] = &[
    // Departments and branches
    ("cse", "computer science"),
    ("csd", "computer science and design"),
    ("ece", "electronics and communication"),
    ("eee", "electrical and electronics"),
    ("it", "information technology"),
    ("mech", "mechanical engineering"),
    ("civil", "civil engineering"),
    ("aiml", "artificial intelligence and machine learning"),
    ("mba", "business administration"),
    // Roles
    ("hod", "head of department"),
    ("vp", "vice principal"),
    ("prof", "professor"),
    ("asst", "assistant"),
    // Courses
    ("os", "operating systems"),
    ("dbms", "database management systems"),
    ("dsa", "data structures and algorithms"),
    ("ml", "machine learning"),
    ("dl", "deep learning"),
    ("ai", "artificial intelligence"),
    ("cn", "computer networks"),
    ("coa", "computer organization and architecture"),
    ("toc", "theory of computation"),
    ("oops", "object oriented programming"),
    ("se", "software engineering"),
    ("iot", "internet of things"),
    ("maths", "mathematics"),
];

/// Immutable alias table, shared across requests.
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(String, String)>,
}

/// Result of expanding a query against the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// The query with canonical phrases appended.
    pub expanded: String,
    /// Surface form of the first alias that matched, if any.
    pub matched_alias: Option<String>,
}

impl AliasTable {
    /// Table with the built-in entries only.
    pub fn built_in() -> Self {
        let entries = BUILT_IN
            .iter()
            .map(|(s, c)| (s.to_string(), c.to_string()))
            .collect();
        Self { entries }
    }

    /// Built-in entries followed by config-supplied extras. Both sides of
    /// every entry are normalized; entries that normalize to empty are
    /// dropped.
    pub fn with_extras(extras: &[(String, String)]) -> Self {
        let mut table = Self::built_in();
        for (surface, canonical) in extras {
            let surface = normalize(surface);
            let canonical = normalize(canonical);
            if !surface.is_empty() && !canonical.is_empty() {
                table.entries.push((surface, canonical));
            }
        }
        table
    }

    /// Expand a normalized query.
    ///
    /// Every entry whose surface form appears as a whole word (or whole
    /// phrase) appends its canonical phrase, unless the phrase is already
    /// present. Matching runs against the original query text, so one
    /// expansion cannot trigger another. Idempotent.
    pub fn expand(&self, normalized: &str) -> Expansion {
        let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
        let mut expanded = normalized.to_string();
        let mut matched_alias = None;

        for (surface, canonical) in &self.entries {
            let surface_tokens: Vec<&str> = surface.split(' ').collect();
            if !contains_phrase(&tokens, &surface_tokens) {
                continue;
            }
            if matched_alias.is_none() {
                matched_alias = Some(surface.clone());
            }
            let expanded_tokens: Vec<&str> =
                expanded.split(' ').filter(|t| !t.is_empty()).collect();
            let canonical_tokens: Vec<&str> = canonical.split(' ').collect();
            if !contains_phrase(&expanded_tokens, &canonical_tokens) {
                expanded.push(' ');
                expanded.push_str(canonical);
            }
        }

        Expansion {
            expanded,
            matched_alias,
        }
    }
}

/// Whole-word phrase containment: `needle` must appear as a contiguous run
/// of complete tokens inside `haystack`.
fn contains_phrase(haystack: &[&str], needle: &[&str]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_canonical_phrase() {
        let table = AliasTable::built_in();
        let exp = table.expand("who is the cse hod");
        assert_eq!(
            exp.expanded,
            "who is the cse hod computer science head of department"
        );
        assert_eq!(exp.matched_alias.as_deref(), Some("cse"));
    }

    #[test]
    fn test_whole_word_only() {
        let table = AliasTable::built_in();
        // "os" inside "cosmos" must not match.
        let exp = table.expand("tell me about cosmos");
        assert_eq!(exp.expanded, "tell me about cosmos");
        assert!(exp.matched_alias.is_none());
    }

    #[test]
    fn test_no_duplicate_append() {
        let table = AliasTable::built_in();
        let exp = table.expand("os operating systems syllabus");
        assert_eq!(exp.expanded, "os operating systems syllabus");
        assert_eq!(exp.matched_alias.as_deref(), Some("os"));
    }

    #[test]
    fn test_idempotent() {
        let table = AliasTable::built_in();
        let once = table.expand("cse hod");
        let twice = table.expand(&once.expanded);
        assert_eq!(twice.expanded, once.expanded);
    }

    #[test]
    fn test_multi_word_surface() {
        let extras = vec![("head of dept".to_string(), "head of department".to_string())];
        let table = AliasTable::with_extras(&extras);
        let exp = table.expand("who is head of dept for ece");
        assert!(exp.expanded.contains("head of department"));
    }

    #[test]
    fn test_extras_from_config() {
        let extras = vec![("rvs".to_string(), "dr r v subramanian".to_string())];
        let table = AliasTable::with_extras(&extras);
        let exp = table.expand("contact rvs");
        assert_eq!(exp.expanded, "contact rvs dr r v subramanian");
        assert_eq!(exp.matched_alias.as_deref(), Some("rvs"));
    }

    #[test]
    fn test_no_match_leaves_query_unchanged() {
        let table = AliasTable::built_in();
        let exp = table.expand("library opening hours");
        assert_eq!(exp.expanded, "library opening hours");
        assert!(exp.matched_alias.is_none());
    }
}
