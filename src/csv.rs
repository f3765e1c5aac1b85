use crate::errors::{AppError, AppResult};
use crate::models::{
    new_record_id, Attendee, AttendeeStatus, ContactInfo, EngagementLevel, LocationKind, Meeting,
    MeetingLocation, Priority, Project, ProjectStatus, Recurrence, Stakeholder, Task, TaskStatus,
};
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One imported row: declared header name mapped to its trimmed cell value.
pub type CsvRecord = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Projects,
    Tasks,
    Stakeholders,
    Meetings,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Tasks => "tasks",
            Self::Stakeholders => "stakeholders",
            Self::Meetings => "meetings",
        }
    }

    /// Canonical ordered column headers for this entity type. Template
    /// generation and import validation both read this list, so changing it
    /// changes both sides at once.
    pub fn template_headers(self) -> &'static [&'static str] {
        match self {
            Self::Projects => &[
                "Project Name",
                "Description",
                "Status",
                "Start Date",
                "End Date",
                "Priority",
                "Owner",
            ],
            Self::Tasks => &[
                "Task Name",
                "Description",
                "Status",
                "Due Date",
                "Priority",
                "Assigned To",
                "Project",
            ],
            Self::Stakeholders => &[
                "Name",
                "Role",
                "Organization",
                "Email",
                "Phone",
                "Influence Level",
                "Interest Level",
            ],
            Self::Meetings => &[
                "Meeting Title",
                "Date",
                "Time",
                "Location",
                "Organizer",
                "Attendees",
                "Agenda",
                "Notes",
            ],
        }
    }
}

/// Builds a downloadable template: the headers joined by commas, newline
/// terminated. Header names are written as-is, without quoting.
pub fn generate_template(headers: &[&str]) -> String {
    let mut template = headers.join(",");
    template.push('\n');
    template
}

/// Splits CSV text into records keyed by the declared headers.
///
/// Blank lines are discarded. The first remaining line is dropped when it
/// contains the first declared header, which is how an optional header row is
/// detected. Values are split on raw commas (no quoted-field support), zipped
/// positionally against the headers, and trimmed; missing trailing cells
/// become empty strings.
pub fn parse(content: &str, headers: &[&str]) -> Vec<CsvRecord> {
    let non_empty: Vec<&str> = content
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect();

    let has_header_row = match (non_empty.first(), headers.first()) {
        (Some(first_line), Some(first_header)) => first_line.contains(first_header),
        _ => false,
    };
    let data_lines = if has_header_row {
        &non_empty[1..]
    } else {
        &non_empty[..]
    };

    data_lines
        .iter()
        .map(|line| {
            let values: Vec<&str> = line.split(',').collect();
            headers
                .iter()
                .enumerate()
                .map(|(index, header)| {
                    let value = values.get(index).map(|raw| raw.trim()).unwrap_or("");
                    (header.to_string(), value.to_string())
                })
                .collect()
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Checks every record for a non-blank value under every required header.
/// Row numbering in the error messages is 1-based.
pub fn validate(records: &[CsvRecord], required_headers: &[&str]) -> CsvValidation {
    if records.is_empty() {
        return CsvValidation {
            valid: false,
            errors: vec!["CSV file contains no data".to_string()],
        };
    }

    let mut errors = Vec::new();
    for (index, record) in records.iter().enumerate() {
        for header in required_headers {
            let blank = record
                .get(*header)
                .map(|value| value.trim().is_empty())
                .unwrap_or(true);
            if blank {
                errors.push(format!(
                    "Row {}: Missing required field \"{}\"",
                    index + 1,
                    header
                ));
            }
        }
    }

    CsvValidation {
        valid: errors.is_empty(),
        errors,
    }
}

// ─── Row mapping ────────────────────────────────────────────────────────────
//
// Imported rows are mapped onto typed records here, next to the header
// registry they are keyed by. Enum-valued columns go through the closed-enum
// parsers; an unrecognized status or priority fails the import with a
// visible validation error.

fn field<'a>(row: &'a CsvRecord, header: &str) -> &'a str {
    row.get(header).map(String::as_str).unwrap_or("")
}

fn parse_date(raw: &str, header: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!(
            "invalid date '{}' in \"{}\" (expected YYYY-MM-DD)",
            raw, header
        ))
    })
}

fn parse_time(raw: &str, header: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
        AppError::Validation(format!(
            "invalid time '{}' in \"{}\" (expected HH:MM)",
            raw, header
        ))
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn project_from_row(row: &CsvRecord) -> AppResult<Project> {
    Ok(Project {
        id: new_record_id(),
        name: field(row, "Project Name").to_string(),
        description: field(row, "Description").to_string(),
        status: ProjectStatus::parse(field(row, "Status"))?,
        start_date: parse_date(field(row, "Start Date"), "Start Date")?,
        end_date: parse_date(field(row, "End Date"), "End Date")?,
        priority: Priority::parse(field(row, "Priority"))?,
        owner: field(row, "Owner").to_string(),
        progress: 0,
    })
}

pub fn task_from_row(row: &CsvRecord) -> AppResult<Task> {
    Ok(Task {
        id: new_record_id(),
        name: field(row, "Task Name").to_string(),
        description: field(row, "Description").to_string(),
        status: TaskStatus::parse(field(row, "Status"))?,
        due_date: parse_date(field(row, "Due Date"), "Due Date")?,
        priority: Priority::parse(field(row, "Priority"))?,
        assigned_to: field(row, "Assigned To").to_string(),
        project: field(row, "Project").to_string(),
        tags: Vec::new(),
        subtasks: Vec::new(),
    })
}

pub fn stakeholder_from_row(row: &CsvRecord, today: NaiveDate) -> AppResult<Stakeholder> {
    Ok(Stakeholder {
        id: new_record_id(),
        name: field(row, "Name").to_string(),
        role: field(row, "Role").to_string(),
        company: field(row, "Organization").to_string(),
        contact: ContactInfo {
            email: field(row, "Email").to_string(),
            phone: field(row, "Phone").to_string(),
            linkedin: None,
            slack: None,
        },
        tags: Vec::new(),
        projects: Vec::new(),
        influence_level: EngagementLevel::parse(field(row, "Influence Level"))?,
        interest_level: EngagementLevel::parse(field(row, "Interest Level"))?,
        notes: String::new(),
        last_contact: today,
        upcoming_interactions: Vec::new(),
    })
}

pub fn meeting_from_row(row: &CsvRecord) -> AppResult<Meeting> {
    let date = parse_date(field(row, "Date"), "Date")?;
    let time = parse_time(field(row, "Time"), "Time")?;
    let start = date.and_time(time).and_utc();
    let duration_minutes = 60;

    Ok(Meeting {
        id: new_record_id(),
        title: field(row, "Meeting Title").to_string(),
        description: field(row, "Notes").to_string(),
        date: start,
        end_date: start + Duration::minutes(i64::from(duration_minutes)),
        duration_minutes,
        location: MeetingLocation {
            kind: LocationKind::InPerson,
            details: field(row, "Location").to_string(),
        },
        organizer: field(row, "Organizer").to_string(),
        attendees: split_list(field(row, "Attendees"))
            .into_iter()
            .map(|name| Attendee {
                name,
                email: None,
                status: AttendeeStatus::Pending,
            })
            .collect(),
        agenda: split_list(field(row, "Agenda")),
        recurrence: Recurrence::default(),
    })
}
