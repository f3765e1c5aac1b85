use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    Planning,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "On Hold")]
    OnHold,
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        Self::Planning,
        Self::InProgress,
        Self::OnHold,
        Self::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::InProgress => "In Progress",
            Self::OnHold => "On Hold",
            Self::Completed => "Completed",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim() {
            "Planning" => Ok(Self::Planning),
            "In Progress" => Ok(Self::InProgress),
            "On Hold" => Ok(Self::OnHold),
            "Completed" => Ok(Self::Completed),
            other => Err(AppError::Validation(format!(
                "unrecognized project status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim() {
            "Not Started" => Ok(Self::NotStarted),
            "In Progress" => Ok(Self::InProgress),
            "Completed" => Ok(Self::Completed),
            other => Err(AppError::Validation(format!(
                "unrecognized task status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim() {
            "High" => Ok(Self::High),
            "Medium" => Ok(Self::Medium),
            "Low" => Ok(Self::Low),
            other => Err(AppError::Validation(format!(
                "unrecognized priority '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngagementLevel {
    High,
    Medium,
    Low,
}

impl EngagementLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(AppError::Validation(format!(
                "unrecognized engagement level '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    Meeting,
    Call,
    Email,
}

impl InteractionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meeting => "meeting",
            Self::Call => "call",
            Self::Email => "email",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "meeting" => Ok(Self::Meeting),
            "call" => Ok(Self::Call),
            "email" => Ok(Self::Email),
            other => Err(AppError::Validation(format!(
                "unrecognized interaction type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendeeStatus {
    Confirmed,
    Pending,
    Declined,
}

impl AttendeeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Pending => "pending",
            Self::Declined => "declined",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationKind {
    Virtual,
    InPerson,
}

impl LocationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Virtual => "virtual",
            Self::InPerson => "in-person",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "virtual" => Ok(Self::Virtual),
            "in-person" => Ok(Self::InPerson),
            other => Err(AppError::Validation(format!(
                "unrecognized location type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeWindow {
    Upcoming,
    Today,
    Week,
    Past,
}

// ─── Records ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub priority: Priority,
    pub owner: String,
    pub progress: u8,
}

impl Project {
    /// Baseline draft used by the create dialog and the per-column add action.
    pub fn draft(today: NaiveDate) -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            status: ProjectStatus::Planning,
            start_date: today,
            end_date: today + Duration::days(30),
            priority: Priority::Medium,
            owner: String::new(),
            progress: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub assigned_to: String,
    pub project: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Task>,
}

impl Task {
    pub fn draft(today: NaiveDate) -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            status: TaskStatus::NotStarted,
            due_date: today,
            priority: Priority::Medium,
            assigned_to: String::new(),
            project: String::new(),
            tags: Vec::new(),
            subtasks: Vec::new(),
        }
    }

    /// A task is overdue once its due date has passed and it is not completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Completed && self.due_date < today
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub linkedin: Option<String>,
    pub slack: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAssociation {
    pub project_id: String,
    pub title: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub date: NaiveDate,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stakeholder {
    pub id: String,
    pub name: String,
    pub role: String,
    pub company: String,
    pub contact: ContactInfo,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub projects: Vec<ProjectAssociation>,
    pub influence_level: EngagementLevel,
    pub interest_level: EngagementLevel,
    pub notes: String,
    pub last_contact: NaiveDate,
    #[serde(default)]
    pub upcoming_interactions: Vec<Interaction>,
}

impl Stakeholder {
    pub fn draft(today: NaiveDate) -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            role: String::new(),
            company: String::new(),
            contact: ContactInfo::default(),
            tags: Vec::new(),
            projects: Vec::new(),
            influence_level: EngagementLevel::Medium,
            interest_level: EngagementLevel::Medium,
            notes: String::new(),
            last_contact: today,
            upcoming_interactions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingLocation {
    #[serde(rename = "type")]
    pub kind: LocationKind,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub name: String,
    pub email: Option<String>,
    pub status: AttendeeStatus,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    pub is_recurring: bool,
    pub frequency: Option<RecurrenceFrequency>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub duration_minutes: u32,
    pub location: MeetingLocation,
    pub organizer: String,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub agenda: Vec<String>,
    #[serde(default)]
    pub recurrence: Recurrence,
}

impl Meeting {
    pub fn draft(now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            date: now,
            end_date: now + Duration::minutes(60),
            duration_minutes: 60,
            location: MeetingLocation {
                kind: LocationKind::Virtual,
                details: String::new(),
            },
            organizer: String::new(),
            attendees: Vec::new(),
            agenda: Vec::new(),
            recurrence: Recurrence::default(),
        }
    }
}

// ─── Filters ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFilters {
    pub search: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilters {
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub project: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StakeholderFilters {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub influence_level: Option<EngagementLevel>,
    pub interest_level: Option<EngagementLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MeetingFilters {
    pub search: Option<String>,
    pub window: Option<TimeWindow>,
}

// ─── Responses & settings ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub active_projects: u32,
    pub pending_tasks: u32,
    pub key_stakeholders: u32,
    pub upcoming_meetings: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub meetings: Vec<Meeting>,
    pub stakeholders: Vec<Stakeholder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub default_user_id: String,
    pub upcoming_window_days: u32,
    pub import_max_rows: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_user_id: "local".to_string(),
            upcoming_window_days: 7,
            import_max_rows: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serde_uses_display_strings() {
        let json = serde_json::to_string(&ProjectStatus::InProgress).expect("serialize");
        assert_eq!(json, "\"In Progress\"");
        let parsed: ProjectStatus = serde_json::from_str("\"On Hold\"").expect("deserialize");
        assert_eq!(parsed, ProjectStatus::OnHold);
    }

    #[test]
    fn engagement_level_serde_is_lowercase() {
        let json = serde_json::to_string(&EngagementLevel::High).expect("serialize");
        assert_eq!(json, "\"high\"");
        assert_eq!(EngagementLevel::parse(" HIGH ").expect("parse"), EngagementLevel::High);
    }

    #[test]
    fn unknown_status_text_is_a_validation_error() {
        let error = ProjectStatus::parse("Archived").expect_err("must reject");
        assert!(error.to_string().starts_with("VALIDATION:"));
    }

    #[test]
    fn record_json_is_camel_cased() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).expect("date");
        let mut task = Task::draft(today);
        task.assigned_to = "Ana".to_string();
        let json = serde_json::to_value(&task).expect("serialize");
        assert_eq!(json["assignedTo"], "Ana");
        assert_eq!(json["dueDate"], "2024-03-01");
        assert_eq!(json["status"], "Not Started");
    }

    #[test]
    fn task_due_today_is_not_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).expect("date");
        let mut task = Task::draft(today);
        assert!(!task.is_overdue(today));
        task.due_date = today - Duration::days(1);
        assert!(task.is_overdue(today));
        task.status = TaskStatus::Completed;
        assert!(!task.is_overdue(today));
    }

    #[test]
    fn project_draft_spans_thirty_days() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).expect("date");
        let draft = Project::draft(today);
        assert_eq!(draft.status, ProjectStatus::Planning);
        assert_eq!(draft.end_date - draft.start_date, Duration::days(30));
        assert_eq!(draft.progress, 0);
    }

    #[test]
    fn meeting_location_kind_serializes_under_type_key() {
        let location = MeetingLocation {
            kind: LocationKind::InPerson,
            details: "Room 4".to_string(),
        };
        let json = serde_json::to_value(&location).expect("serialize");
        assert_eq!(json["type"], "in-person");
    }
}
