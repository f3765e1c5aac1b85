use crate::errors::{AppError, AppResult};
use crate::models::{
    new_record_id, EngagementLevel, Interaction, InteractionKind, LocationKind, Meeting, Priority,
    Project, ProjectAssociation, ProjectStatus, Stakeholder, Task, TaskStatus,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

// Dialog editors. Each form stages a draft copy of one record; individual
// fields are written through a closed per-entity field enum, so every value
// entering the draft has already passed the matching parser. The draft only
// becomes a record when submit succeeds; dropping the form discards it.

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn require(missing: Vec<&'static str>) -> AppResult<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn parse_date(raw: &str, label: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!(
            "invalid {} '{}' (expected YYYY-MM-DD)",
            label, raw
        ))
    })
}

fn parse_date_time(raw: &str, label: &str) -> AppResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    // datetime-local inputs omit the offset.
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|_| AppError::Validation(format!("invalid {} '{}'", label, raw)))
}

// ─── Projects ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectField {
    Name,
    Description,
    Status,
    StartDate,
    EndDate,
    Priority,
    Owner,
    Progress,
}

#[derive(Debug, Clone)]
pub struct ProjectForm {
    draft: Project,
    editing: bool,
}

impl ProjectForm {
    pub fn create(today: NaiveDate) -> Self {
        Self {
            draft: Project::draft(today),
            editing: false,
        }
    }

    pub fn edit(project: &Project) -> Self {
        Self {
            draft: project.clone(),
            editing: true,
        }
    }

    /// Starts editing from a pre-filled draft, keeping create mode. Used by
    /// the per-column kanban add action, which seeds the status.
    pub fn create_from(draft: Project) -> Self {
        Self {
            draft,
            editing: false,
        }
    }

    /// Reloads the draft when an open dialog is handed a different record.
    pub fn load(&mut self, project: &Project) {
        if self.draft.id != project.id {
            self.draft = project.clone();
            self.editing = true;
        }
    }

    pub fn draft(&self) -> &Project {
        &self.draft
    }

    pub fn is_edit(&self) -> bool {
        self.editing
    }

    pub fn set(&mut self, field: ProjectField, value: &str) -> AppResult<()> {
        match field {
            ProjectField::Name => self.draft.name = value.to_string(),
            ProjectField::Description => self.draft.description = value.to_string(),
            ProjectField::Status => self.draft.status = ProjectStatus::parse(value)?,
            ProjectField::StartDate => self.draft.start_date = parse_date(value, "start date")?,
            ProjectField::EndDate => self.draft.end_date = parse_date(value, "end date")?,
            ProjectField::Priority => self.draft.priority = Priority::parse(value)?,
            ProjectField::Owner => self.draft.owner = value.to_string(),
            ProjectField::Progress => {
                let parsed: i64 = value.trim().parse().map_err(|_| {
                    AppError::Validation(format!("invalid progress value '{}'", value))
                })?;
                self.draft.progress = parsed.clamp(0, 100) as u8;
            }
        }
        Ok(())
    }

    pub fn submit(&mut self) -> AppResult<Project> {
        let mut missing = Vec::new();
        if blank(&self.draft.name) {
            missing.push("name");
        }
        if blank(&self.draft.owner) {
            missing.push("owner");
        }
        require(missing)?;
        let mut record = self.draft.clone();
        if !self.editing {
            record.id = new_record_id();
        }
        Ok(record)
    }
}

// ─── Tasks ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Name,
    Description,
    Status,
    DueDate,
    Priority,
    AssignedTo,
    Project,
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    draft: Task,
    editing: bool,
}

impl TaskForm {
    pub fn create(today: NaiveDate) -> Self {
        Self {
            draft: Task::draft(today),
            editing: false,
        }
    }

    pub fn edit(task: &Task) -> Self {
        Self {
            draft: task.clone(),
            editing: true,
        }
    }

    pub fn load(&mut self, task: &Task) {
        if self.draft.id != task.id {
            self.draft = task.clone();
            self.editing = true;
        }
    }

    pub fn draft(&self) -> &Task {
        &self.draft
    }

    pub fn is_edit(&self) -> bool {
        self.editing
    }

    pub fn set(&mut self, field: TaskField, value: &str) -> AppResult<()> {
        match field {
            TaskField::Name => self.draft.name = value.to_string(),
            TaskField::Description => self.draft.description = value.to_string(),
            TaskField::Status => self.draft.status = TaskStatus::parse(value)?,
            TaskField::DueDate => self.draft.due_date = parse_date(value, "due date")?,
            TaskField::Priority => self.draft.priority = Priority::parse(value)?,
            TaskField::AssignedTo => self.draft.assigned_to = value.to_string(),
            TaskField::Project => self.draft.project = value.to_string(),
        }
        Ok(())
    }

    /// Stages a tag: trimmed, ignored when empty or already present.
    pub fn add_tag(&mut self, raw: &str) -> bool {
        let tag = raw.trim();
        if tag.is_empty() || self.draft.tags.iter().any(|owned| owned == tag) {
            return false;
        }
        self.draft.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.draft.tags.retain(|owned| owned != tag);
    }

    pub fn submit(&mut self) -> AppResult<Task> {
        let mut missing = Vec::new();
        if blank(&self.draft.name) {
            missing.push("name");
        }
        if blank(&self.draft.assigned_to) {
            missing.push("assigned to");
        }
        require(missing)?;
        let mut record = self.draft.clone();
        if !self.editing {
            record.id = new_record_id();
        }
        Ok(record)
    }
}

// ─── Stakeholders ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeholderField {
    Name,
    Role,
    Company,
    Email,
    Phone,
    Linkedin,
    Slack,
    InfluenceLevel,
    InterestLevel,
    Notes,
    LastContact,
}

#[derive(Debug, Clone)]
pub struct StakeholderForm {
    draft: Stakeholder,
    editing: bool,
}

impl StakeholderForm {
    pub fn create(today: NaiveDate) -> Self {
        Self {
            draft: Stakeholder::draft(today),
            editing: false,
        }
    }

    pub fn edit(stakeholder: &Stakeholder) -> Self {
        Self {
            draft: stakeholder.clone(),
            editing: true,
        }
    }

    pub fn load(&mut self, stakeholder: &Stakeholder) {
        if self.draft.id != stakeholder.id {
            self.draft = stakeholder.clone();
            self.editing = true;
        }
    }

    pub fn draft(&self) -> &Stakeholder {
        &self.draft
    }

    pub fn is_edit(&self) -> bool {
        self.editing
    }

    pub fn set(&mut self, field: StakeholderField, value: &str) -> AppResult<()> {
        match field {
            StakeholderField::Name => self.draft.name = value.to_string(),
            StakeholderField::Role => self.draft.role = value.to_string(),
            StakeholderField::Company => self.draft.company = value.to_string(),
            StakeholderField::Email => self.draft.contact.email = value.to_string(),
            StakeholderField::Phone => self.draft.contact.phone = value.to_string(),
            StakeholderField::Linkedin => {
                self.draft.contact.linkedin = (!blank(value)).then(|| value.trim().to_string());
            }
            StakeholderField::Slack => {
                self.draft.contact.slack = (!blank(value)).then(|| value.trim().to_string());
            }
            StakeholderField::InfluenceLevel => {
                self.draft.influence_level = EngagementLevel::parse(value)?;
            }
            StakeholderField::InterestLevel => {
                self.draft.interest_level = EngagementLevel::parse(value)?;
            }
            StakeholderField::Notes => self.draft.notes = value.to_string(),
            StakeholderField::LastContact => {
                self.draft.last_contact = parse_date(value, "last contact date")?;
            }
        }
        Ok(())
    }

    pub fn add_tag(&mut self, raw: &str) -> bool {
        let tag = raw.trim();
        if tag.is_empty() || self.draft.tags.iter().any(|owned| owned == tag) {
            return false;
        }
        self.draft.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.draft.tags.retain(|owned| owned != tag);
    }

    /// Stages a project association. Needs both a selection and a role, the
    /// selected project must exist, and a project already associated is not
    /// added twice.
    pub fn add_project(&mut self, available: &[Project], project_id: &str, role: &str) -> bool {
        if project_id.is_empty() || blank(role) {
            return false;
        }
        let Some(project) = available.iter().find(|project| project.id == project_id) else {
            return false;
        };
        if self
            .draft
            .projects
            .iter()
            .any(|assoc| assoc.project_id == project_id)
        {
            return false;
        }
        self.draft.projects.push(ProjectAssociation {
            project_id: project_id.to_string(),
            title: project.name.clone(),
            role: role.trim().to_string(),
        });
        true
    }

    pub fn remove_project(&mut self, project_id: &str) {
        self.draft
            .projects
            .retain(|assoc| assoc.project_id != project_id);
    }

    pub fn submit(&mut self) -> AppResult<Stakeholder> {
        let mut missing = Vec::new();
        if blank(&self.draft.name) {
            missing.push("name");
        }
        if blank(&self.draft.role) {
            missing.push("role");
        }
        if blank(&self.draft.company) {
            missing.push("company");
        }
        if blank(&self.draft.contact.email) {
            missing.push("email");
        }
        if blank(&self.draft.contact.phone) {
            missing.push("phone");
        }
        require(missing)?;
        let mut record = self.draft.clone();
        if !self.editing {
            record.id = new_record_id();
        }
        Ok(record)
    }
}

// ─── Interactions ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionField {
    Kind,
    Date,
    Description,
}

/// Editor for logging an upcoming interaction against a stakeholder. Unlike
/// the record dialogs this one stays open for repeated entries, so it
/// resets itself to defaults after every successful submit.
#[derive(Debug, Clone)]
pub struct InteractionForm {
    draft: Interaction,
    today: NaiveDate,
}

impl InteractionForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            draft: Self::defaults(today),
            today,
        }
    }

    fn defaults(today: NaiveDate) -> Interaction {
        Interaction {
            kind: InteractionKind::Meeting,
            date: today,
            description: String::new(),
        }
    }

    pub fn draft(&self) -> &Interaction {
        &self.draft
    }

    pub fn set(&mut self, field: InteractionField, value: &str) -> AppResult<()> {
        match field {
            InteractionField::Kind => self.draft.kind = InteractionKind::parse(value)?,
            InteractionField::Date => self.draft.date = parse_date(value, "date")?,
            InteractionField::Description => self.draft.description = value.to_string(),
        }
        Ok(())
    }

    pub fn submit(&mut self) -> AppResult<Interaction> {
        let mut missing = Vec::new();
        if blank(&self.draft.description) {
            missing.push("description");
        }
        require(missing)?;
        let record = std::mem::replace(&mut self.draft, Self::defaults(self.today));
        Ok(record)
    }
}

// ─── Meetings ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingField {
    Title,
    Description,
    Date,
    DurationMinutes,
    LocationKind,
    LocationDetails,
    Organizer,
}

#[derive(Debug, Clone)]
pub struct MeetingForm {
    draft: Meeting,
    editing: bool,
}

impl MeetingForm {
    pub fn create(now: DateTime<Utc>) -> Self {
        Self {
            draft: Meeting::draft(now),
            editing: false,
        }
    }

    pub fn edit(meeting: &Meeting) -> Self {
        Self {
            draft: meeting.clone(),
            editing: true,
        }
    }

    pub fn load(&mut self, meeting: &Meeting) {
        if self.draft.id != meeting.id {
            self.draft = meeting.clone();
            self.editing = true;
        }
    }

    pub fn draft(&self) -> &Meeting {
        &self.draft
    }

    pub fn is_edit(&self) -> bool {
        self.editing
    }

    pub fn set(&mut self, field: MeetingField, value: &str) -> AppResult<()> {
        match field {
            MeetingField::Title => self.draft.title = value.to_string(),
            MeetingField::Description => self.draft.description = value.to_string(),
            MeetingField::Date => {
                self.draft.date = parse_date_time(value, "meeting date")?;
                self.sync_end();
            }
            MeetingField::DurationMinutes => {
                let minutes: u32 = value.trim().parse().map_err(|_| {
                    AppError::Validation(format!("invalid duration '{}'", value))
                })?;
                self.draft.duration_minutes = minutes;
                self.sync_end();
            }
            MeetingField::LocationKind => {
                self.draft.location.kind = LocationKind::parse(value)?;
            }
            MeetingField::LocationDetails => self.draft.location.details = value.to_string(),
            MeetingField::Organizer => self.draft.organizer = value.to_string(),
        }
        Ok(())
    }

    fn sync_end(&mut self) {
        self.draft.end_date =
            self.draft.date + Duration::minutes(i64::from(self.draft.duration_minutes));
    }

    pub fn submit(&mut self) -> AppResult<Meeting> {
        let mut missing = Vec::new();
        if blank(&self.draft.title) {
            missing.push("title");
        }
        require(missing)?;
        let mut record = self.draft.clone();
        if !self.editing {
            record.id = new_record_id();
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("date")
    }

    #[test]
    fn project_submit_rejects_blank_required_fields() {
        let mut form = ProjectForm::create(today());
        let error = form.submit().expect_err("blank name and owner");
        let message = error.to_string();
        assert!(message.contains("name"));
        assert!(message.contains("owner"));
        assert_eq!(form.draft().name, "");
    }

    #[test]
    fn project_submit_allocates_an_id_in_create_mode() {
        let mut form = ProjectForm::create(today());
        form.set(ProjectField::Name, "Atlas").expect("set name");
        form.set(ProjectField::Owner, "Ana").expect("set owner");
        let record = form.submit().expect("valid draft");
        assert!(!record.id.is_empty());
        assert_eq!(record.status, ProjectStatus::Planning);
    }

    #[test]
    fn project_edit_keeps_the_existing_id() {
        let mut existing = Project::draft(today());
        existing.id = "p1".to_string();
        existing.name = "Atlas".to_string();
        existing.owner = "Ana".to_string();
        let mut form = ProjectForm::edit(&existing);
        form.set(ProjectField::Status, "Completed").expect("set status");
        let record = form.submit().expect("valid draft");
        assert_eq!(record.id, "p1");
        assert_eq!(record.status, ProjectStatus::Completed);
    }

    #[test]
    fn project_progress_clamps_and_rejects_garbage() {
        let mut form = ProjectForm::create(today());
        form.set(ProjectField::Progress, "250").expect("set progress");
        assert_eq!(form.draft().progress, 100);
        form.set(ProjectField::Progress, "-5").expect("set progress");
        assert_eq!(form.draft().progress, 0);
        let error = form.set(ProjectField::Progress, "lots").expect_err("garbage");
        assert!(error.to_string().contains("invalid progress"));
    }

    #[test]
    fn project_status_field_goes_through_the_parser() {
        let mut form = ProjectForm::create(today());
        let error = form.set(ProjectField::Status, "Someday").expect_err("bad status");
        assert!(error.to_string().contains("unrecognized project status"));
        assert_eq!(form.draft().status, ProjectStatus::Planning);
    }

    #[test]
    fn load_replaces_the_draft_only_for_a_different_record() {
        let mut first = Project::draft(today());
        first.id = "p1".to_string();
        first.name = "Atlas".to_string();
        let mut form = ProjectForm::edit(&first);
        form.set(ProjectField::Name, "Atlas revised").expect("set name");

        form.load(&first);
        assert_eq!(form.draft().name, "Atlas revised");

        let mut second = Project::draft(today());
        second.id = "p2".to_string();
        second.name = "Borealis".to_string();
        form.load(&second);
        assert_eq!(form.draft().name, "Borealis");
    }

    #[test]
    fn task_tags_are_trimmed_and_deduplicated() {
        let mut form = TaskForm::create(today());
        assert!(form.add_tag("  urgent "));
        assert!(!form.add_tag("urgent"));
        assert!(!form.add_tag("   "));
        assert_eq!(form.draft().tags, vec!["urgent".to_string()]);
        form.remove_tag("urgent");
        assert!(form.draft().tags.is_empty());
    }

    #[test]
    fn task_submit_requires_assignee() {
        let mut form = TaskForm::create(today());
        form.set(TaskField::Name, "Write brief").expect("set name");
        let error = form.submit().expect_err("assignee blank");
        assert!(error.to_string().contains("assigned to"));
        form.set(TaskField::AssignedTo, "Ben").expect("set assignee");
        let record = form.submit().expect("valid draft");
        assert_eq!(record.assigned_to, "Ben");
        assert!(!record.id.is_empty());
    }

    #[test]
    fn stakeholder_association_needs_selection_role_and_known_project() {
        let mut project = Project::draft(today());
        project.id = "p1".to_string();
        project.name = "Atlas".to_string();
        let available = vec![project];

        let mut form = StakeholderForm::create(today());
        assert!(!form.add_project(&available, "", "Sponsor"));
        assert!(!form.add_project(&available, "p1", "  "));
        assert!(!form.add_project(&available, "p9", "Sponsor"));
        assert!(form.add_project(&available, "p1", " Sponsor "));
        assert!(!form.add_project(&available, "p1", "Reviewer"));

        let associations = &form.draft().projects;
        assert_eq!(associations.len(), 1);
        assert_eq!(associations[0].title, "Atlas");
        assert_eq!(associations[0].role, "Sponsor");

        form.remove_project("p1");
        assert!(form.draft().projects.is_empty());
    }

    #[test]
    fn stakeholder_optional_contact_fields_blank_to_none() {
        let mut form = StakeholderForm::create(today());
        form.set(StakeholderField::Linkedin, " linkedin.com/in/dana ")
            .expect("set linkedin");
        assert_eq!(
            form.draft().contact.linkedin.as_deref(),
            Some("linkedin.com/in/dana")
        );
        form.set(StakeholderField::Linkedin, "  ").expect("clear linkedin");
        assert_eq!(form.draft().contact.linkedin, None);
    }

    #[test]
    fn interaction_form_resets_after_submit() {
        let mut form = InteractionForm::new(today());
        form.set(InteractionField::Kind, "call").expect("set kind");
        form.set(InteractionField::Description, "Status sync")
            .expect("set description");
        let record = form.submit().expect("valid draft");
        assert_eq!(record.kind, InteractionKind::Call);
        assert_eq!(record.description, "Status sync");
        assert_eq!(form.draft().kind, InteractionKind::Meeting);
        assert!(form.draft().description.is_empty());
        assert_eq!(form.draft().date, today());
    }

    #[test]
    fn interaction_submit_requires_description() {
        let mut form = InteractionForm::new(today());
        let error = form.submit().expect_err("description blank");
        assert!(error.to_string().contains("description"));
    }

    #[test]
    fn meeting_duration_change_moves_the_end_date() {
        let now: DateTime<Utc> = "2024-03-01T10:00:00Z".parse().expect("timestamp");
        let mut form = MeetingForm::create(now);
        form.set(MeetingField::Title, "Kickoff").expect("set title");
        form.set(MeetingField::DurationMinutes, "90").expect("set duration");
        let record = form.submit().expect("valid draft");
        assert_eq!(record.duration_minutes, 90);
        assert_eq!(record.end_date - record.date, Duration::minutes(90));
    }

    #[test]
    fn meeting_date_accepts_datetime_local_input() {
        let now: DateTime<Utc> = "2024-03-01T10:00:00Z".parse().expect("timestamp");
        let mut form = MeetingForm::create(now);
        form.set(MeetingField::Date, "2024-03-05T14:30").expect("set date");
        assert_eq!(
            form.draft().date.to_rfc3339(),
            "2024-03-05T14:30:00+00:00"
        );
        assert!(form.set(MeetingField::Date, "next tuesday").is_err());
    }
}
