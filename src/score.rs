//! Fuzzy record scoring.
//!
//! The scorer turns one record and one token sequence into a non-negative
//! integer score plus a coverage ratio. It is a pure function of
//! `(record, tokens, weight table)`: no randomness, no state across calls.
//!
//! Signals per token, strongest first:
//!
//! | Signal | Condition | Default weight |
//! |--------|-----------|----------------|
//! | name exact | token equals a name component | 7 |
//! | name partial | token (≥3 chars) substring of the name | 4 |
//! | name fuzzy | edit distance ≤1 (token ≤3 chars) / ≤2 to a component | 4 |
//! | designation | token in designation, role-seeking queries only | 8 |
//! | course | token in any normalized course entry | 4 |
//! | department | token in department or specialization | 2 |
//! | notes | token in notes | 2 |
//! | contact | token in email or phone digits | 1 |
//!
//! The three name signals collapse to the best one. On top of the token
//! sum: a coverage bonus (+2 when ≥60% of tokens matched something, +1 at
//! ≥35%) and a flat department boost (+8) when a detected branch hint
//! matches the record's department. The boost is a nudge, not a filter, so
//! a strong name match in another department can still win.

use crate::config::ScoreWeights;
use crate::intent::DeptHint;
use crate::models::Record;
use crate::normalize::{normalize, tokenize};

/// Coverage thresholds for the two bonus tiers.
const COVERAGE_HIGH: f32 = 0.6;
const COVERAGE_LOW: f32 = 0.35;

/// Filler tokens that carry no matching signal. Skipped before scoring
/// and excluded from the coverage denominator.
const STOP_TOKENS: &[&str] = &[
    "who", "whom", "is", "are", "was", "the", "a", "an", "of", "in", "on", "at", "to", "for",
    "me", "my", "do", "does", "did", "what", "which", "when", "where", "how", "tell", "give",
    "show", "about", "please", "details", "info",
];

/// Query-side context the scorer needs beyond the tokens themselves.
#[derive(Debug, Clone, Default)]
pub struct ScoreContext {
    /// Query asks about a role holder; enables the designation signal.
    pub role_seeking: bool,
    /// Detected branch hint, if any; enables the department boost.
    pub dept_hint: Option<DeptHint>,
}

/// A record paired with its score for one query.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub record: Record,
    pub points: u32,
    pub coverage: f32,
}

/// Score one record. Pure; never panics on absent fields.
pub fn score_record(
    record: &Record,
    tokens: &[String],
    ctx: &ScoreContext,
    weights: &ScoreWeights,
) -> (u32, f32) {
    let tokens: Vec<&str> = tokens
        .iter()
        .map(|t| t.as_str())
        .filter(|t| !t.is_empty() && !STOP_TOKENS.contains(t))
        .collect();
    if tokens.is_empty() {
        return (0, 0.0);
    }

    let name_norm = record.name.as_deref().map(normalize).unwrap_or_default();
    let name_parts = tokenize(&name_norm);
    let designation_norm = record
        .designation
        .as_deref()
        .map(normalize)
        .unwrap_or_default();
    let department_norm = record
        .department
        .as_deref()
        .map(normalize)
        .unwrap_or_default();
    let specialization_norm = record
        .specialization
        .as_deref()
        .map(normalize)
        .unwrap_or_default();
    let notes_norm = record.notes.as_deref().map(normalize).unwrap_or_default();
    let email_lc = record
        .email
        .as_deref()
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    // punctuation and spacing in stored numbers never block a digit match
    let phone_digits: String = record
        .phone
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    let courses_norm: Vec<String> = record.courses.iter().map(|c| normalize(c)).collect();

    let mut points: u32 = 0;
    let mut matched: u32 = 0;

    for token in &tokens {
        let mut token_points: u32 = 0;

        // Name tiers collapse to the best one that fires.
        if name_parts.iter().any(|p| p == token) {
            token_points += weights.name_exact;
        } else if token.chars().count() >= 3 && name_norm.contains(token) {
            token_points += weights.name_partial;
        } else if fuzzy_matches_any(token, &name_parts) {
            token_points += weights.name_fuzzy;
        }

        if ctx.role_seeking && field_has(&designation_norm, token) {
            token_points += weights.designation;
        }
        if courses_norm.iter().any(|c| field_has(c, token)) {
            token_points += weights.course;
        }
        if field_has(&department_norm, token) || field_has(&specialization_norm, token) {
            token_points += weights.department;
        }
        if field_has(&notes_norm, token) {
            token_points += weights.notes;
        }
        if field_has(&email_lc, token) || field_has(&phone_digits, token) {
            token_points += weights.contact;
        }

        if token_points > 0 {
            matched += 1;
        }
        points += token_points;
    }

    let coverage = matched as f32 / tokens.len() as f32;
    if points > 0 {
        if coverage >= COVERAGE_HIGH {
            points += weights.coverage_high_bonus;
        } else if coverage >= COVERAGE_LOW {
            points += weights.coverage_low_bonus;
        }
    }

    if let Some(hint) = &ctx.dept_hint {
        if hint_matches_department(hint, &department_norm) {
            points += weights.dept_boost;
        }
    }

    (points, coverage)
}

/// Score and sort a record set, best first. Ordering is by points then
/// coverage; ties keep fetch order.
pub fn rank(
    records: Vec<Record>,
    tokens: &[String],
    ctx: &ScoreContext,
    weights: &ScoreWeights,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = records
        .into_iter()
        .map(|record| {
            let (points, coverage) = score_record(&record, tokens, ctx, weights);
            Candidate {
                record,
                points,
                coverage,
            }
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.coverage.total_cmp(&a.coverage))
    });
    candidates
}

/// Whether a detected hint matches a normalized department field.
pub fn hint_matches_department(hint: &DeptHint, department_norm: &str) -> bool {
    if department_norm.is_empty() {
        return false;
    }
    department_norm.contains(&hint.phrase)
        || department_norm.split(' ').any(|t| t == hint.token)
}

/// Token-in-field test: substring for tokens of three or more characters,
/// whole-word equality for shorter ones (two-letter tokens substring-match
/// far too much text to be useful).
fn field_has(field: &str, token: &str) -> bool {
    if field.is_empty() {
        return false;
    }
    if token.chars().count() >= 3 {
        field.contains(token)
    } else {
        field.split(' ').any(|t| t == token)
    }
}

/// Edit-distance match against any name component. The threshold scales
/// with token length: 1 for tokens of three or fewer characters, else 2.
fn fuzzy_matches_any(token: &str, parts: &[String]) -> bool {
    if token.chars().count() < 2 {
        return false;
    }
    let threshold = if token.chars().count() <= 3 { 1 } else { 2 };
    parts.iter().any(|part| {
        let len_gap = part.chars().count().abs_diff(token.chars().count());
        len_gap <= threshold && damerau_levenshtein(token, part) <= threshold
    })
}

/// Damerau-Levenshtein distance (optimal string alignment): insertions,
/// deletions, substitutions, and adjacent transpositions all cost 1.
pub fn damerau_levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());
    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut d = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        d[0][j] = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            let mut best = (d[i - 1][j] + 1).min(d[i][j - 1] + 1).min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[i - 2][j - 2] + 1);
            }
            d[i][j] = best;
        }
    }
    d[m][n]
}
