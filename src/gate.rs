//! Confidence gate over ranked candidates.
//!
//! Three terminal outcomes: a confident store answer, a suggestion list, or
//! fallback to the LLM. Confidence needs both an absolute score floor and a
//! margin over the runner-up, so near-ties never masquerade as answers.
//!
//! Role-seeking queries get a dedicated first pass: candidates whose
//! designation matches a role pattern are considered alone with a lower
//! floor, since a designation hit is high-precision. A role hit wins even
//! when a non-role record carries a higher raw score.

use crate::config::AskConfig;
use crate::normalize::normalize;
use crate::score::Candidate;

/// Designation substrings that mark a record as a role holder.
const ROLE_PATTERNS: &[&str] = &[
    "head of department",
    "head of the department",
    "hod",
    "principal",
    "vice principal",
    "dean",
    "director",
];

/// Outcome of gating one ranked candidate list.
#[derive(Debug)]
pub enum Decision {
    /// Answer from the store with this candidate.
    Confident(Candidate),
    /// Not confident enough to answer, but these looked close.
    Suggest(Vec<Candidate>),
    /// Nothing usable; defer to the LLM.
    Fallback,
}

/// Gate a ranked (best-first) candidate list.
pub fn decide(mut candidates: Vec<Candidate>, role_seeking: bool, cfg: &AskConfig) -> Decision {
    if role_seeking {
        if let Some(idx) = candidates
            .iter()
            .position(|c| c.points >= cfg.role_min && is_role_record(c))
        {
            return Decision::Confident(candidates.remove(idx));
        }
    }

    let best = match candidates.first() {
        Some(c) if c.points > 0 => c.points,
        _ => return Decision::Fallback,
    };
    let second = candidates.get(1).map(|c| c.points).unwrap_or(0);

    if best >= cfg.confident_min && (second == 0 || best as f32 >= second as f32 * cfg.safety_ratio)
    {
        return Decision::Confident(candidates.remove(0));
    }

    candidates.retain(|c| c.points > 0);
    candidates.truncate(cfg.suggestion_limit);
    Decision::Suggest(candidates)
}

/// Whether a candidate's designation marks it as a role holder.
pub fn is_role_record(candidate: &Candidate) -> bool {
    match candidate.record.designation.as_deref() {
        Some(d) => {
            let d = normalize(d);
            ROLE_PATTERNS.iter().any(|p| d.contains(p))
        }
        None => false,
    }
}
