//! Intent classification.
//!
//! Keyword sets are tested against the normalized pre-expansion query in a
//! fixed priority order; the first set with a hit wins and the default is
//! [`Intent::People`], since most campus questions are "who teaches X" /
//! "who is the HOD of Y" style. People queries additionally get an
//! optional department hint so the fetch can be narrowed and same-
//! department records nudged upward in scoring.

use crate::models::Collection;

/// The classified category of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    CollegeInfo,
    Placements,
    Subjects,
    Students,
    People,
    Branches,
}

impl Intent {
    /// Collections the fetcher queries for this intent.
    pub fn collections(&self) -> &'static [Collection] {
        match self {
            Intent::CollegeInfo => &[Collection::CollegeInfo],
            Intent::Placements => &[Collection::Placements],
            Intent::Subjects => &[Collection::Subjects],
            Intent::Students => &[Collection::Students],
            Intent::People => &[Collection::Faculty, Collection::Staff],
            Intent::Branches => &[Collection::Branches],
        }
    }

    /// Short label for logs and debug payloads.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::CollegeInfo => "college-info",
            Intent::Placements => "placements",
            Intent::Subjects => "subjects",
            Intent::Students => "students",
            Intent::People => "people",
            Intent::Branches => "branches",
        }
    }
}

const COLLEGE_INFO_KEYWORDS: &[&str] = &[
    "college",
    "institution",
    "campus",
    "admission",
    "admissions",
    "fee",
    "fees",
    "hostel",
    "library",
    "transport",
    "affiliated",
    "affiliation",
    "accreditation",
    "naac",
    "established",
    "founded",
    "address",
    "located",
    "location",
];

const PLACEMENTS_KEYWORDS: &[&str] = &[
    "placement",
    "placements",
    "placed",
    "recruit",
    "recruiter",
    "recruiters",
    "recruitment",
    "package",
    "ctc",
    "salary",
    "drive",
    "drives",
    "company",
    "companies",
    "offer",
    "offers",
    "internship",
    "internships",
];

const SUBJECTS_KEYWORDS: &[&str] = &[
    "subject",
    "subjects",
    "syllabus",
    "curriculum",
    "semester",
    "sem",
    "credits",
    "elective",
    "electives",
    "lab",
    "labs",
];

const STUDENTS_KEYWORDS: &[&str] = &[
    "student",
    "students",
    "roll",
    "batch",
    "topper",
    "toppers",
    "cgpa",
    "attendance",
];

const PEOPLE_KEYWORDS: &[&str] = &[
    "who",
    "whom",
    "faculty",
    "staff",
    "professor",
    "prof",
    "teacher",
    "teaches",
    "taught",
    "lecturer",
    "hod",
    "head",
    "principal",
    "dean",
    "director",
    "sir",
    "madam",
    "mam",
    "contact",
    "email",
    "phone",
    "cabin",
    "mentor",
];

const BRANCHES_KEYWORDS: &[&str] = &[
    "branch",
    "branches",
    "department",
    "departments",
    "dept",
    "depts",
    "stream",
    "streams",
    "offered",
];

/// Tokens that mark a query as role-seeking. Checked against the expanded
/// token set so "vp" style aliases count after expansion.
const ROLE_KEYWORDS: &[&str] = &["hod", "head", "principal", "dean", "director", "vp"];

/// Branch abbreviation/name → department phrase used for the fetch filter
/// and the scoring boost.
const DEPT_HINTS: &[(&str, &str)] = &[
    ("cse", "computer science"),
    ("cs", "computer science"),
    ("csd", "computer science and design"),
    ("ece", "electronics and communication"),
    ("eee", "electrical and electronics"),
    ("it", "information technology"),
    ("mech", "mechanical"),
    ("mechanical", "mechanical"),
    ("civil", "civil"),
    ("aiml", "artificial intelligence"),
    ("ai", "artificial intelligence"),
    ("mba", "business administration"),
];

/// A detected department/branch hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeptHint {
    /// The query token that fired.
    pub token: String,
    /// Department phrase the token stands for.
    pub phrase: String,
}

/// Classify a normalized pre-expansion query. First keyword set with any
/// token hit wins; no hit defaults to [`Intent::People`].
pub fn classify(tokens: &[String]) -> Intent {
    let sets: &[(&[&str], Intent)] = &[
        (COLLEGE_INFO_KEYWORDS, Intent::CollegeInfo),
        (PLACEMENTS_KEYWORDS, Intent::Placements),
        (SUBJECTS_KEYWORDS, Intent::Subjects),
        (STUDENTS_KEYWORDS, Intent::Students),
        (PEOPLE_KEYWORDS, Intent::People),
        (BRANCHES_KEYWORDS, Intent::Branches),
    ];
    for (keywords, intent) in sets {
        if tokens.iter().any(|t| keywords.contains(&t.as_str())) {
            return *intent;
        }
    }
    Intent::People
}

/// Detect a department hint: the first entry whose abbreviation appears as
/// a token or whose phrase appears whole in the query.
pub fn detect_dept_hint(tokens: &[String]) -> Option<DeptHint> {
    for (token, phrase) in DEPT_HINTS {
        if tokens.iter().any(|t| t == token) || contains_phrase(tokens, phrase) {
            return Some(DeptHint {
                token: token.to_string(),
                phrase: phrase.to_string(),
            });
        }
    }
    None
}

fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split(' ').collect();
    if needle.is_empty() || needle.len() > tokens.len() {
        return false;
    }
    tokens
        .windows(needle.len())
        .any(|w| w.iter().map(|s| s.as_str()).eq(needle.iter().copied()))
}

/// True when the (expanded) token set asks about a role holder.
pub fn is_role_seeking(tokens: &[String]) -> bool {
    tokens.iter().any(|t| ROLE_KEYWORDS.contains(&t.as_str()))
}
