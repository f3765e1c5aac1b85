use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::collections::{self, contains_ci};
use crate::csv::{self, CsvRecord};
use crate::db::RecordStore;
use crate::errors::{AppError, AppResult};
use crate::kanban::{self, BoardColumn, DragEnd};
use crate::models::{
    DashboardSummary, Meeting, MeetingFilters, Project, ProjectFilters, SearchResults,
    Stakeholder, StakeholderFilters, Task, TaskFilters, TaskStatus,
};
use crate::tasks::TaskArena;

/// Projects page: owns the loaded collection, the active filters, and the
/// board derived from them. Store writes happen before memory mutation;
/// failures land in the error banner and leave memory untouched.
pub struct ProjectsPage {
    user_id: String,
    pub projects: Vec<Project>,
    pub filters: ProjectFilters,
    loading: bool,
    error: Option<String>,
}

impl ProjectsPage {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            projects: Vec::new(),
            filters: ProjectFilters::default(),
            loading: false,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn load(&mut self, store: &dyn RecordStore) -> bool {
        self.loading = true;
        let outcome = match store.list_projects(&self.user_id) {
            Ok(projects) => {
                self.projects = projects;
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        };
        self.loading = false;
        outcome
    }

    pub fn visible(&self) -> Vec<Project> {
        collections::filter_projects(&self.projects, &self.filters)
    }

    pub fn board(&self) -> [BoardColumn; 4] {
        kanban::partition(&self.visible())
    }

    pub fn save(&mut self, store: &dyn RecordStore, project: Project) -> bool {
        match store.save_project(&self.user_id, &project) {
            Ok(saved) => {
                let id = saved.id.clone();
                merge_record(&mut self.projects, saved, |candidate| candidate.id == id);
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        }
    }

    pub fn delete(&mut self, store: &dyn RecordStore, id: &str) -> bool {
        match store.delete_project(&self.user_id, id) {
            Ok(()) => {
                self.projects.retain(|project| project.id != id);
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        }
    }

    /// Applies a board drag. No-op drags return false without touching the
    /// banner; a real move persists the restatused project.
    pub fn apply_drag(&mut self, store: &dyn RecordStore, drag: &DragEnd) -> bool {
        let updated = match kanban::apply_drag_end(&self.projects, drag) {
            Some(updated) => updated,
            None => return false,
        };
        self.save(store, updated)
    }

    pub fn import_rows(&mut self, store: &dyn RecordStore, rows: &[CsvRecord]) -> bool {
        let converted = match convert_rows(rows, csv::project_from_row) {
            Ok(converted) => converted,
            Err(banner) => {
                self.error = Some(banner);
                return false;
            }
        };
        let count = converted.len();
        for project in converted {
            if !self.save(store, project) {
                return false;
            }
        }
        tracing::info!(count, "imported project rows");
        true
    }
}

/// Tasks page. Subtask edits (toggle, nested delete) rewrite the owning
/// root record, since the store persists whole task trees.
pub struct TasksPage {
    user_id: String,
    pub tasks: Vec<Task>,
    pub filters: TaskFilters,
    loading: bool,
    error: Option<String>,
}

impl TasksPage {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tasks: Vec::new(),
            filters: TaskFilters::default(),
            loading: false,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn load(&mut self, store: &dyn RecordStore) -> bool {
        self.loading = true;
        let outcome = match store.list_tasks(&self.user_id) {
            Ok(tasks) => {
                self.tasks = tasks;
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        };
        self.loading = false;
        outcome
    }

    pub fn visible(&self) -> Vec<Task> {
        collections::filter_tasks(&self.tasks, &self.filters)
    }

    pub fn save(&mut self, store: &dyn RecordStore, task: Task) -> bool {
        match store.save_task(&self.user_id, &task) {
            Ok(saved) => {
                let id = saved.id.clone();
                merge_record(&mut self.tasks, saved, |candidate| candidate.id == id);
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        }
    }

    /// Deletes a task at any depth. Roots are removed from the store
    /// outright (subtree included); nested nodes rewrite their root.
    pub fn delete(&mut self, store: &dyn RecordStore, task_id: &str) -> bool {
        if self.tasks.iter().any(|task| task.id == task_id) {
            return match store.delete_task(&self.user_id, task_id) {
                Ok(()) => {
                    self.tasks.retain(|task| task.id != task_id);
                    self.error = None;
                    true
                }
                Err(error) => {
                    self.error = Some(to_client_error(&error));
                    false
                }
            };
        }

        let root_id = match self.owning_root(task_id) {
            Some(root_id) => root_id,
            None => {
                let error = AppError::NotFound(format!("no task with id '{}'", task_id));
                self.error = Some(to_client_error(&error));
                return false;
            }
        };
        let mut arena = TaskArena::from_nested(&self.tasks);
        arena.remove(task_id);
        self.persist_root(store, &root_id, arena.to_nested())
    }

    /// Flips completion on exactly the identified node and persists the
    /// tree it lives in.
    pub fn toggle_completion(&mut self, store: &dyn RecordStore, task_id: &str) -> bool {
        let root_id = match self.owning_root(task_id) {
            Some(root_id) => root_id,
            None => {
                let error = AppError::NotFound(format!("no task with id '{}'", task_id));
                self.error = Some(to_client_error(&error));
                return false;
            }
        };
        let mut arena = TaskArena::from_nested(&self.tasks);
        arena.toggle_completion(task_id);
        self.persist_root(store, &root_id, arena.to_nested())
    }

    pub fn import_rows(&mut self, store: &dyn RecordStore, rows: &[CsvRecord]) -> bool {
        let converted = match convert_rows(rows, csv::task_from_row) {
            Ok(converted) => converted,
            Err(banner) => {
                self.error = Some(banner);
                return false;
            }
        };
        let count = converted.len();
        for task in converted {
            if !self.save(store, task) {
                return false;
            }
        }
        tracing::info!(count, "imported task rows");
        true
    }

    fn owning_root(&self, task_id: &str) -> Option<String> {
        self.tasks
            .iter()
            .find(|task| subtree_contains(task, task_id))
            .map(|task| task.id.clone())
    }

    fn persist_root(&mut self, store: &dyn RecordStore, root_id: &str, rebuilt: Vec<Task>) -> bool {
        let updated = match rebuilt.iter().find(|task| task.id == root_id) {
            Some(task) => task.clone(),
            None => {
                let error = AppError::Internal(format!("task tree lost root '{}'", root_id));
                self.error = Some(to_client_error(&error));
                return false;
            }
        };
        match store.save_task(&self.user_id, &updated) {
            Ok(_) => {
                self.tasks = rebuilt;
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        }
    }
}

pub struct StakeholdersPage {
    user_id: String,
    pub stakeholders: Vec<Stakeholder>,
    pub filters: StakeholderFilters,
    loading: bool,
    error: Option<String>,
}

impl StakeholdersPage {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            stakeholders: Vec::new(),
            filters: StakeholderFilters::default(),
            loading: false,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn load(&mut self, store: &dyn RecordStore) -> bool {
        self.loading = true;
        let outcome = match store.list_stakeholders(&self.user_id) {
            Ok(stakeholders) => {
                self.stakeholders = stakeholders;
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        };
        self.loading = false;
        outcome
    }

    pub fn visible(&self) -> Vec<Stakeholder> {
        collections::filter_stakeholders(&self.stakeholders, &self.filters)
    }

    pub fn save(&mut self, store: &dyn RecordStore, stakeholder: Stakeholder) -> bool {
        match store.save_stakeholder(&self.user_id, &stakeholder) {
            Ok(saved) => {
                let id = saved.id.clone();
                merge_record(&mut self.stakeholders, saved, |candidate| candidate.id == id);
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        }
    }

    pub fn delete(&mut self, store: &dyn RecordStore, id: &str) -> bool {
        match store.delete_stakeholder(&self.user_id, id) {
            Ok(()) => {
                self.stakeholders.retain(|stakeholder| stakeholder.id != id);
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        }
    }

    pub fn import_rows(&mut self, store: &dyn RecordStore, rows: &[CsvRecord]) -> bool {
        let today = Utc::now().date_naive();
        let converted = match convert_rows(rows, |row| csv::stakeholder_from_row(row, today)) {
            Ok(converted) => converted,
            Err(banner) => {
                self.error = Some(banner);
                return false;
            }
        };
        let count = converted.len();
        for stakeholder in converted {
            if !self.save(store, stakeholder) {
                return false;
            }
        }
        tracing::info!(count, "imported stakeholder rows");
        true
    }
}

pub struct MeetingsPage {
    user_id: String,
    pub meetings: Vec<Meeting>,
    pub filters: MeetingFilters,
    loading: bool,
    error: Option<String>,
}

impl MeetingsPage {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            meetings: Vec::new(),
            filters: MeetingFilters::default(),
            loading: false,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn load(&mut self, store: &dyn RecordStore) -> bool {
        self.loading = true;
        let outcome = match store.list_meetings(&self.user_id) {
            Ok(meetings) => {
                self.meetings = meetings;
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        };
        self.loading = false;
        outcome
    }

    pub fn visible(&self, now: DateTime<Utc>) -> Vec<Meeting> {
        collections::filter_meetings(&self.meetings, &self.filters, now)
    }

    /// The agenda view: visible meetings grouped by calendar day, ascending.
    pub fn grouped(&self, now: DateTime<Utc>) -> std::collections::BTreeMap<NaiveDate, Vec<Meeting>> {
        collections::group_by_day(&self.visible(now))
    }

    pub fn save(&mut self, store: &dyn RecordStore, meeting: Meeting) -> bool {
        match store.save_meeting(&self.user_id, &meeting) {
            Ok(saved) => {
                let id = saved.id.clone();
                merge_record(&mut self.meetings, saved, |candidate| candidate.id == id);
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        }
    }

    pub fn delete(&mut self, store: &dyn RecordStore, id: &str) -> bool {
        match store.delete_meeting(&self.user_id, id) {
            Ok(()) => {
                self.meetings.retain(|meeting| meeting.id != id);
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        }
    }

    pub fn import_rows(&mut self, store: &dyn RecordStore, rows: &[CsvRecord]) -> bool {
        let converted = match convert_rows(rows, csv::meeting_from_row) {
            Ok(converted) => converted,
            Err(banner) => {
                self.error = Some(banner);
                return false;
            }
        };
        let count = converted.len();
        for meeting in converted {
            if !self.save(store, meeting) {
                return false;
            }
        }
        tracing::info!(count, "imported meeting rows");
        true
    }
}

/// Landing page state: all four collections plus the settings-driven
/// upcoming window, loaded together.
pub struct DashboardPage {
    user_id: String,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub stakeholders: Vec<Stakeholder>,
    pub meetings: Vec<Meeting>,
    upcoming_window_days: u32,
    loading: bool,
    error: Option<String>,
}

impl DashboardPage {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            projects: Vec::new(),
            tasks: Vec::new(),
            stakeholders: Vec::new(),
            meetings: Vec::new(),
            upcoming_window_days: 7,
            loading: false,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn load(&mut self, store: &dyn RecordStore) -> bool {
        self.loading = true;
        let outcome = match self.fetch_all(store) {
            Ok(()) => {
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(to_client_error(&error));
                false
            }
        };
        self.loading = false;
        outcome
    }

    // All four lists land at once or not at all.
    fn fetch_all(&mut self, store: &dyn RecordStore) -> AppResult<()> {
        let settings = store.get_settings()?;
        let projects = store.list_projects(&self.user_id)?;
        let tasks = store.list_tasks(&self.user_id)?;
        let stakeholders = store.list_stakeholders(&self.user_id)?;
        let meetings = store.list_meetings(&self.user_id)?;
        self.upcoming_window_days = settings.upcoming_window_days;
        self.projects = projects;
        self.tasks = tasks;
        self.stakeholders = stakeholders;
        self.meetings = meetings;
        Ok(())
    }

    pub fn summary(&self, now: DateTime<Utc>) -> DashboardSummary {
        let horizon = now + Duration::days(i64::from(self.upcoming_window_days));
        DashboardSummary {
            active_projects: self.projects.len() as u32,
            pending_tasks: self
                .tasks
                .iter()
                .filter(|task| task.status != TaskStatus::Completed)
                .count() as u32,
            key_stakeholders: self.stakeholders.len() as u32,
            upcoming_meetings: self
                .meetings
                .iter()
                .filter(|meeting| meeting.date >= now && meeting.date <= horizon)
                .count() as u32,
        }
    }

    /// Case-insensitive substring search over every module at once,
    /// returning per-module hit lists.
    pub fn search_across_modules(&self, query: &str) -> SearchResults {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return SearchResults::default();
        }
        let needle = trimmed.to_lowercase();
        SearchResults {
            projects: self
                .projects
                .iter()
                .filter(|project| {
                    contains_ci(&project.name, &needle)
                        || contains_ci(&project.description, &needle)
                        || contains_ci(&project.owner, &needle)
                })
                .cloned()
                .collect(),
            tasks: self
                .tasks
                .iter()
                .filter(|task| {
                    contains_ci(&task.name, &needle)
                        || contains_ci(&task.description, &needle)
                        || contains_ci(&task.assigned_to, &needle)
                })
                .cloned()
                .collect(),
            meetings: self
                .meetings
                .iter()
                .filter(|meeting| {
                    contains_ci(&meeting.title, &needle)
                        || contains_ci(&meeting.description, &needle)
                })
                .cloned()
                .collect(),
            stakeholders: self
                .stakeholders
                .iter()
                .filter(|stakeholder| {
                    contains_ci(&stakeholder.name, &needle)
                        || contains_ci(&stakeholder.role, &needle)
                        || contains_ci(&stakeholder.company, &needle)
                })
                .cloned()
                .collect(),
        }
    }
}

fn to_client_error(error: &AppError) -> String {
    tracing::error!(error = %error, "store operation failed");
    error.to_string()
}

fn merge_record<T>(records: &mut Vec<T>, record: T, same: impl Fn(&T) -> bool) {
    if let Some(existing) = records.iter_mut().find(|candidate| same(candidate)) {
        *existing = record;
    } else {
        records.push(record);
    }
}

fn subtree_contains(task: &Task, id: &str) -> bool {
    task.id == id || task.subtasks.iter().any(|subtask| subtree_contains(subtask, id))
}

/// Converts every row before any store write; a single bad row blocks the
/// whole batch, with all row problems reported together.
fn convert_rows<T>(
    rows: &[CsvRecord],
    mut convert: impl FnMut(&CsvRecord) -> AppResult<T>,
) -> Result<Vec<T>, String> {
    let mut converted = Vec::with_capacity(rows.len());
    let mut problems = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        match convert(row) {
            Ok(record) => converted.push(record),
            Err(AppError::Validation(message)) => {
                problems.push(format!("Row {}: {}", index + 1, message));
            }
            Err(error) => problems.push(format!("Row {}: {}", index + 1, error)),
        }
    }
    if problems.is_empty() {
        Ok(converted)
    } else {
        Err(problems.join("\n"))
    }
}
