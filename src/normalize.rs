//! Query text normalization.
//!
//! Every stage of the ask pipeline works on the normalized form produced
//! here: lowercase, punctuation stripped, whitespace collapsed. The
//! transform is deterministic and idempotent, so stages may re-normalize
//! defensively without changing the text.
//!
//! Also hosts the greeting guard: trivially short or purely social queries
//! are answered with a fixed greeting before any collaborator is contacted.

/// Fixed reply for greeting/too-short queries.
pub const GREETING_REPLY: &str =
    "Hello! Ask me about faculty, staff, departments, courses, placements, or admissions.";

/// Queries whose entire normalized form equals one of these are greetings.
const GREETING_TOKENS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "yo",
    "sup",
    "ok",
    "okay",
    "thanks",
    "thank",
    "thank you",
    "thankyou",
    "bye",
    "goodbye",
    "good morning",
    "good afternoon",
    "good evening",
];

/// Lowercase, replace every non-alphanumeric character with a space,
/// collapse whitespace runs, and trim.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = true;

    for ch in input.chars() {
        if ch.is_alphanumeric() {
            for lc in ch.to_lowercase() {
                out.push(lc);
            }
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }

    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Split a normalized query into non-empty tokens.
pub fn tokenize(normalized: &str) -> Vec<String> {
    normalized
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// True when the normalized query should short-circuit to the fixed
/// greeting: two characters or fewer, or an exact greeting phrase.
pub fn is_greeting(normalized: &str) -> bool {
    if normalized.chars().count() <= 2 {
        return true;
    }
    GREETING_TOKENS.contains(&normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Who teaches O.S.?"), "who teaches o s");
        assert_eq!(normalize("HOD, of CSE!!"), "hod of cse");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  what   about\tplacements \n"), "what about placements");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("Dr. A. Sharma -- (CSE dept)");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("?!., --"), "");
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("who teaches os"), vec!["who", "teaches", "os"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_greeting_guard() {
        assert!(is_greeting(&normalize("Hi!")));
        assert!(is_greeting(&normalize("Good Morning")));
        assert!(is_greeting(&normalize("ok")));
        // Two chars or fewer trips the guard even when not a greeting word.
        assert!(is_greeting("os"));
        assert!(!is_greeting(&normalize("who is the principal")));
        assert!(!is_greeting(&normalize("hello who teaches os")));
    }
}
