//! Core data types: collections, records, and the field coercion that
//! turns the store's loosely typed rows into something scoring can trust.
//!
//! Course/skill lists arrive from the store in three shapes: a native JSON
//! array, a JSON-serialized array inside a string, or a plain delimited
//! string. [`ListField`] captures all three at deserialization time and
//! [`ListField::into_list`] resolves them to `Vec<String>` immediately
//! after fetch, so nothing downstream ever touches the raw shapes.

use serde::{Deserialize, Serialize};

/// The record collections the store exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Faculty,
    Staff,
    CollegeInfo,
    Placements,
    Subjects,
    Students,
    Branches,
}

impl Collection {
    /// Table name on the store side.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Faculty => "faculty",
            Collection::Staff => "staff",
            Collection::CollegeInfo => "college_info",
            Collection::Placements => "placements",
            Collection::Subjects => "subjects",
            Collection::Students => "students",
            Collection::Branches => "branches",
        }
    }

    /// Label used in the response `source` tag.
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Faculty => "faculty",
            Collection::Staff => "staff",
            Collection::CollegeInfo => "college-info",
            Collection::Placements => "placements",
            Collection::Subjects => "subjects",
            Collection::Students => "students",
            Collection::Branches => "branches",
        }
    }
}

/// A raw row as the store returns it. Field names vary a little across
/// collections; serde aliases fold the common variants onto one struct.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "title", alias = "full_name", alias = "company")]
    pub name: Option<String>,
    #[serde(default, alias = "role", alias = "position")]
    pub designation: Option<String>,
    #[serde(default, alias = "dept", alias = "branch")]
    pub department: Option<String>,
    #[serde(default, alias = "specialisation", alias = "expertise")]
    pub specialization: Option<String>,
    #[serde(
        default,
        alias = "courses",
        alias = "courses_taught",
        alias = "subjects",
        alias = "skills"
    )]
    pub course_list: ListField,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "mobile", alias = "contact")]
    pub phone: Option<String>,
    #[serde(default, alias = "description", alias = "details", alias = "info")]
    pub notes: Option<String>,
}

/// A course/skills field in any of the shapes the store produces.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    #[default]
    Absent,
    One(String),
    Many(Vec<String>),
}

impl ListField {
    /// Resolve to a normalized list of non-empty strings.
    ///
    /// A single string is first tried as a JSON-serialized array; failing
    /// that it is split on commas, semicolons, and pipes.
    pub fn into_list(self) -> Vec<String> {
        match self {
            ListField::Absent => Vec::new(),
            ListField::Many(items) => clean(items),
            ListField::One(s) => {
                let trimmed = s.trim();
                if trimmed.starts_with('[') {
                    if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
                        return clean(items);
                    }
                }
                clean(
                    trimmed
                        .split(|c| c == ',' || c == ';' || c == '|')
                        .map(|p| p.to_string())
                        .collect(),
                )
            }
        }
    }
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A fetched record after field coercion, tagged with its origin
/// collection. This is the only record shape the scorer and formatter see.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub collection_label: String,
    pub name: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub specialization: Option<String>,
    pub courses: Vec<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl Record {
    /// Coerce a raw row into the normalized form.
    pub fn from_raw(raw: RawRecord, collection: Collection) -> Self {
        Self {
            collection_label: collection.label().to_string(),
            name: clean_opt(raw.name),
            designation: clean_opt(raw.designation),
            department: clean_opt(raw.department),
            specialization: clean_opt(raw.specialization),
            courses: raw.course_list.into_list(),
            email: clean_opt(raw.email),
            phone: clean_opt(raw.phone),
            notes: clean_opt(raw.notes),
        }
    }
}

fn clean_opt(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_field_native_array() {
        let f = ListField::Many(vec!["Operating Systems".into(), " DBMS ".into(), "".into()]);
        assert_eq!(f.into_list(), vec!["Operating Systems", "DBMS"]);
    }

    #[test]
    fn test_list_field_serialized_array() {
        let f = ListField::One(r#"["Operating Systems", "Computer Networks"]"#.into());
        assert_eq!(f.into_list(), vec!["Operating Systems", "Computer Networks"]);
    }

    #[test]
    fn test_list_field_delimited_string() {
        let f = ListField::One("Operating Systems, DBMS; Machine Learning | AI".into());
        assert_eq!(
            f.into_list(),
            vec!["Operating Systems", "DBMS", "Machine Learning", "AI"]
        );
    }

    #[test]
    fn test_list_field_absent() {
        assert!(ListField::Absent.into_list().is_empty());
    }

    #[test]
    fn test_list_field_malformed_json_falls_back_to_split() {
        let f = ListField::One("[not json, at all".into());
        assert_eq!(f.into_list(), vec!["[not json", "at all"]);
    }

    #[test]
    fn test_raw_record_aliases() {
        let raw: RawRecord = serde_json::from_str(
            r#"{"full_name": "A. Rao", "dept": "CSE", "courses_taught": ["Operating Systems"]}"#,
        )
        .unwrap();
        let rec = Record::from_raw(raw, Collection::Faculty);
        assert_eq!(rec.name.as_deref(), Some("A. Rao"));
        assert_eq!(rec.department.as_deref(), Some("CSE"));
        assert_eq!(rec.courses, vec!["Operating Systems"]);
        assert_eq!(rec.collection_label, "faculty");
    }

    #[test]
    fn test_record_blank_fields_become_none() {
        let raw = RawRecord {
            name: Some("  ".into()),
            ..Default::default()
        };
        let rec = Record::from_raw(raw, Collection::Staff);
        assert!(rec.name.is_none());
        assert!(rec.courses.is_empty());
    }
}
