//! Rendering a winning record into a multi-line answer.
//!
//! Present fields only, fixed order, no placeholders for absent ones.

use crate::models::Record;

/// Course entries shown before the list is cut off.
const COURSE_DISPLAY_LIMIT: usize = 6;

/// Render a record as newline-joined lines: a name/designation header,
/// then department, specialization, courses, email, phone, and notes.
/// Absent fields are skipped. Never panics on malformed records.
pub fn format_record(record: &Record) -> String {
    let mut lines: Vec<String> = Vec::new();

    match (record.name.as_deref(), record.designation.as_deref()) {
        (Some(name), Some(designation)) => lines.push(format!("{} ({})", name, designation)),
        (Some(name), None) => lines.push(name.to_string()),
        (None, Some(designation)) => lines.push(designation.to_string()),
        (None, None) => {}
    }

    if let Some(department) = &record.department {
        lines.push(format!("Department: {}", department));
    }
    if let Some(specialization) = &record.specialization {
        lines.push(format!("Specialization: {}", specialization));
    }
    if !record.courses.is_empty() {
        let shown: Vec<&str> = record
            .courses
            .iter()
            .take(COURSE_DISPLAY_LIMIT)
            .map(|c| c.as_str())
            .collect();
        let mut line = format!("Courses: {}", shown.join(", "));
        let hidden = record.courses.len().saturating_sub(COURSE_DISPLAY_LIMIT);
        if hidden > 0 {
            line.push_str(&format!(" (+{} more)", hidden));
        }
        lines.push(line);
    }
    if let Some(email) = &record.email {
        lines.push(format!("Email: {}", email));
    }
    if let Some(phone) = &record.phone {
        lines.push(format!("Phone: {}", phone));
    }
    if let Some(notes) = &record.notes {
        lines.push(notes.to_string());
    }

    if lines.is_empty() {
        return "No details available.".to_string();
    }
    lines.join("\n")
}

/// Render a suggestion list as a short textual answer.
pub fn format_suggestions(names_scores: &[(String, u32)]) -> String {
    let names: Vec<&str> = names_scores.iter().map(|(n, _)| n.as_str()).collect();
    format!(
        "I could not find an exact match. Did you mean: {}?",
        names.join(", ")
    )
}
