use crate::errors::{AppError, AppResult};
use crate::models::{
    AppSettings, Attendee, ContactInfo, EngagementLevel, Interaction, Meeting, MeetingLocation,
    Priority, Project, ProjectAssociation, ProjectStatus, Recurrence, Stakeholder, Task, TaskStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

mod memory;

pub use memory::{FixtureSet, MemoryStore};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Persistence surface shared by the SQLite store and the in-memory store.
///
/// `save_*` inserts or updates by record id and returns the stored record;
/// `delete_*` fails with `NotFound` when the id matches nothing for that user.
pub trait RecordStore: Send + Sync {
    fn list_projects(&self, user_id: &str) -> AppResult<Vec<Project>>;
    fn save_project(&self, user_id: &str, project: &Project) -> AppResult<Project>;
    fn delete_project(&self, user_id: &str, id: &str) -> AppResult<()>;

    fn list_tasks(&self, user_id: &str) -> AppResult<Vec<Task>>;
    fn save_task(&self, user_id: &str, task: &Task) -> AppResult<Task>;
    fn delete_task(&self, user_id: &str, id: &str) -> AppResult<()>;

    fn list_stakeholders(&self, user_id: &str) -> AppResult<Vec<Stakeholder>>;
    fn save_stakeholder(&self, user_id: &str, stakeholder: &Stakeholder) -> AppResult<Stakeholder>;
    fn delete_stakeholder(&self, user_id: &str, id: &str) -> AppResult<()>;

    fn list_meetings(&self, user_id: &str) -> AppResult<Vec<Meeting>>;
    fn save_meeting(&self, user_id: &str, meeting: &Meeting) -> AppResult<Meeting>;
    fn delete_meeting(&self, user_id: &str, id: &str) -> AppResult<()>;

    fn get_settings(&self) -> AppResult<AppSettings>;
    fn update_settings(&self, update: serde_json::Value) -> AppResult<AppSettings>;
}

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

impl RecordStore for Database {
    // ─── Projects CRUD ──────────────────────────────────────────────────────

    fn list_projects(&self, user_id: &str) -> AppResult<Vec<Project>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, status, start_date, end_date, priority, owner, progress
             FROM projects WHERE user_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let projects = stmt
            .query_map([user_id], parse_project_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    fn save_project(&self, user_id: &str, project: &Project) -> AppResult<Project> {
        require_id("project", &project.id)?;
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let exists = conn
            .query_row(
                "SELECT COUNT(1) FROM projects WHERE id = ?1 AND user_id = ?2",
                params![project.id, user_id],
                |row| row.get::<_, i64>(0),
            )
            .unwrap_or(0)
            > 0;
        let now = Utc::now().to_rfc3339();
        if exists {
            conn.execute(
                "UPDATE projects SET name = ?1, description = ?2, status = ?3, start_date = ?4,
                     end_date = ?5, priority = ?6, owner = ?7, progress = ?8, updated_at = ?9
                 WHERE id = ?10 AND user_id = ?11",
                params![
                    project.name,
                    project.description,
                    project.status.as_str(),
                    project.start_date.to_string(),
                    project.end_date.to_string(),
                    project.priority.as_str(),
                    project.owner,
                    project.progress,
                    now,
                    project.id,
                    user_id
                ],
            )?;
        } else {
            conn.execute(
                "INSERT INTO projects (id, user_id, name, description, status, start_date,
                     end_date, priority, owner, progress, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    project.id,
                    user_id,
                    project.name,
                    project.description,
                    project.status.as_str(),
                    project.start_date.to_string(),
                    project.end_date.to_string(),
                    project.priority.as_str(),
                    project.owner,
                    project.progress,
                    now
                ],
            )?;
        }
        Ok(project.clone())
    }

    fn delete_project(&self, user_id: &str, id: &str) -> AppResult<()> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let deleted = conn.execute(
            "DELETE FROM projects WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("no project with id '{}'", id)));
        }
        Ok(())
    }

    // ─── Tasks CRUD ─────────────────────────────────────────────────────────

    fn list_tasks(&self, user_id: &str) -> AppResult<Vec<Task>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, status, due_date, priority, assigned_to, project,
                 tags_json, subtasks_json
             FROM tasks WHERE user_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let tasks = stmt
            .query_map([user_id], parse_task_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn save_task(&self, user_id: &str, task: &Task) -> AppResult<Task> {
        require_id("task", &task.id)?;
        let tags_json = serde_json::to_string(&task.tags)?;
        let subtasks_json = serde_json::to_string(&task.subtasks)?;
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let exists = conn
            .query_row(
                "SELECT COUNT(1) FROM tasks WHERE id = ?1 AND user_id = ?2",
                params![task.id, user_id],
                |row| row.get::<_, i64>(0),
            )
            .unwrap_or(0)
            > 0;
        let now = Utc::now().to_rfc3339();
        if exists {
            conn.execute(
                "UPDATE tasks SET name = ?1, description = ?2, status = ?3, due_date = ?4,
                     priority = ?5, assigned_to = ?6, project = ?7, tags_json = ?8,
                     subtasks_json = ?9, updated_at = ?10
                 WHERE id = ?11 AND user_id = ?12",
                params![
                    task.name,
                    task.description,
                    task.status.as_str(),
                    task.due_date.to_string(),
                    task.priority.as_str(),
                    task.assigned_to,
                    task.project,
                    tags_json,
                    subtasks_json,
                    now,
                    task.id,
                    user_id
                ],
            )?;
        } else {
            conn.execute(
                "INSERT INTO tasks (id, user_id, name, description, status, due_date, priority,
                     assigned_to, project, tags_json, subtasks_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
                params![
                    task.id,
                    user_id,
                    task.name,
                    task.description,
                    task.status.as_str(),
                    task.due_date.to_string(),
                    task.priority.as_str(),
                    task.assigned_to,
                    task.project,
                    tags_json,
                    subtasks_json,
                    now
                ],
            )?;
        }
        Ok(task.clone())
    }

    fn delete_task(&self, user_id: &str, id: &str) -> AppResult<()> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let deleted = conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("no task with id '{}'", id)));
        }
        Ok(())
    }

    // ─── Stakeholders CRUD ──────────────────────────────────────────────────

    fn list_stakeholders(&self, user_id: &str) -> AppResult<Vec<Stakeholder>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT id, name, role, company, contact_json, tags_json, projects_json,
                 influence_level, interest_level, notes, last_contact, interactions_json
             FROM stakeholders WHERE user_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let stakeholders = stmt
            .query_map([user_id], parse_stakeholder_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stakeholders)
    }

    fn save_stakeholder(&self, user_id: &str, stakeholder: &Stakeholder) -> AppResult<Stakeholder> {
        require_id("stakeholder", &stakeholder.id)?;
        let contact_json = serde_json::to_string(&stakeholder.contact)?;
        let tags_json = serde_json::to_string(&stakeholder.tags)?;
        let projects_json = serde_json::to_string(&stakeholder.projects)?;
        let interactions_json = serde_json::to_string(&stakeholder.upcoming_interactions)?;
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let exists = conn
            .query_row(
                "SELECT COUNT(1) FROM stakeholders WHERE id = ?1 AND user_id = ?2",
                params![stakeholder.id, user_id],
                |row| row.get::<_, i64>(0),
            )
            .unwrap_or(0)
            > 0;
        let now = Utc::now().to_rfc3339();
        if exists {
            conn.execute(
                "UPDATE stakeholders SET name = ?1, role = ?2, company = ?3, contact_json = ?4,
                     tags_json = ?5, projects_json = ?6, influence_level = ?7, interest_level = ?8,
                     notes = ?9, last_contact = ?10, interactions_json = ?11, updated_at = ?12
                 WHERE id = ?13 AND user_id = ?14",
                params![
                    stakeholder.name,
                    stakeholder.role,
                    stakeholder.company,
                    contact_json,
                    tags_json,
                    projects_json,
                    stakeholder.influence_level.as_str(),
                    stakeholder.interest_level.as_str(),
                    stakeholder.notes,
                    stakeholder.last_contact.to_string(),
                    interactions_json,
                    now,
                    stakeholder.id,
                    user_id
                ],
            )?;
        } else {
            conn.execute(
                "INSERT INTO stakeholders (id, user_id, name, role, company, contact_json,
                     tags_json, projects_json, influence_level, interest_level, notes,
                     last_contact, interactions_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
                params![
                    stakeholder.id,
                    user_id,
                    stakeholder.name,
                    stakeholder.role,
                    stakeholder.company,
                    contact_json,
                    tags_json,
                    projects_json,
                    stakeholder.influence_level.as_str(),
                    stakeholder.interest_level.as_str(),
                    stakeholder.notes,
                    stakeholder.last_contact.to_string(),
                    interactions_json,
                    now
                ],
            )?;
        }
        Ok(stakeholder.clone())
    }

    fn delete_stakeholder(&self, user_id: &str, id: &str) -> AppResult<()> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let deleted = conn.execute(
            "DELETE FROM stakeholders WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("no stakeholder with id '{}'", id)));
        }
        Ok(())
    }

    // ─── Meetings CRUD ──────────────────────────────────────────────────────

    fn list_meetings(&self, user_id: &str) -> AppResult<Vec<Meeting>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT id, title, description, date, end_date, duration_minutes, location_json,
                 organizer, attendees_json, agenda_json, recurrence_json
             FROM meetings WHERE user_id = ?1 ORDER BY date ASC, id ASC",
        )?;
        let meetings = stmt
            .query_map([user_id], parse_meeting_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meetings)
    }

    fn save_meeting(&self, user_id: &str, meeting: &Meeting) -> AppResult<Meeting> {
        require_id("meeting", &meeting.id)?;
        let location_json = serde_json::to_string(&meeting.location)?;
        let attendees_json = serde_json::to_string(&meeting.attendees)?;
        let agenda_json = serde_json::to_string(&meeting.agenda)?;
        let recurrence_json = serde_json::to_string(&meeting.recurrence)?;
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let exists = conn
            .query_row(
                "SELECT COUNT(1) FROM meetings WHERE id = ?1 AND user_id = ?2",
                params![meeting.id, user_id],
                |row| row.get::<_, i64>(0),
            )
            .unwrap_or(0)
            > 0;
        let now = Utc::now().to_rfc3339();
        if exists {
            conn.execute(
                "UPDATE meetings SET title = ?1, description = ?2, date = ?3, end_date = ?4,
                     duration_minutes = ?5, location_json = ?6, organizer = ?7,
                     attendees_json = ?8, agenda_json = ?9, recurrence_json = ?10, updated_at = ?11
                 WHERE id = ?12 AND user_id = ?13",
                params![
                    meeting.title,
                    meeting.description,
                    meeting.date.to_rfc3339(),
                    meeting.end_date.to_rfc3339(),
                    meeting.duration_minutes,
                    location_json,
                    meeting.organizer,
                    attendees_json,
                    agenda_json,
                    recurrence_json,
                    now,
                    meeting.id,
                    user_id
                ],
            )?;
        } else {
            conn.execute(
                "INSERT INTO meetings (id, user_id, title, description, date, end_date,
                     duration_minutes, location_json, organizer, attendees_json, agenda_json,
                     recurrence_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
                params![
                    meeting.id,
                    user_id,
                    meeting.title,
                    meeting.description,
                    meeting.date.to_rfc3339(),
                    meeting.end_date.to_rfc3339(),
                    meeting.duration_minutes,
                    location_json,
                    meeting.organizer,
                    attendees_json,
                    agenda_json,
                    recurrence_json,
                    now
                ],
            )?;
        }
        Ok(meeting.clone())
    }

    fn delete_meeting(&self, user_id: &str, id: &str) -> AppResult<()> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let deleted = conn.execute(
            "DELETE FROM meetings WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("no meeting with id '{}'", id)));
        }
        Ok(())
    }

    // ─── Settings ───────────────────────────────────────────────────────────

    fn get_settings(&self) -> AppResult<AppSettings> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value_json FROM settings WHERE key = 'app'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(AppError::from)?;
        Ok(raw
            .map(|value| serde_json::from_str::<AppSettings>(&value).unwrap_or_default())
            .unwrap_or_default())
    }

    fn update_settings(&self, update: serde_json::Value) -> AppResult<AppSettings> {
        let current = self.get_settings()?;
        let mut merged = serde_json::to_value(&current)?;
        merge_json(&mut merged, update);
        let settings: AppSettings = serde_json::from_value(merged)?;
        let serialized = serde_json::to_string(&settings)?;
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO settings (key, value_json, updated_at) VALUES ('app', ?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json,
                 updated_at = excluded.updated_at",
            params![serialized, Utc::now().to_rfc3339()],
        )?;
        Ok(settings)
    }
}

fn parse_project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: parse_project_status(&row.get::<_, String>(3)?)?,
        start_date: parse_date(&row.get::<_, String>(4)?)?,
        end_date: parse_date(&row.get::<_, String>(5)?)?,
        priority: parse_priority(&row.get::<_, String>(6)?)?,
        owner: row.get(7)?,
        progress: row.get(8)?,
    })
}

fn parse_task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let tags_raw: String = row.get(8)?;
    let subtasks_raw: String = row.get(9)?;
    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: parse_task_status(&row.get::<_, String>(3)?)?,
        due_date: parse_date(&row.get::<_, String>(4)?)?,
        priority: parse_priority(&row.get::<_, String>(5)?)?,
        assigned_to: row.get(6)?,
        project: row.get(7)?,
        tags: serde_json::from_str::<Vec<String>>(&tags_raw).unwrap_or_default(),
        // Corrupt subtask JSON is an error, not an empty default.
        subtasks: serde_json::from_str::<Vec<Task>>(&subtasks_raw).map_err(invalid_column)?,
    })
}

fn parse_stakeholder_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Stakeholder> {
    let contact_raw: String = row.get(4)?;
    let tags_raw: String = row.get(5)?;
    let projects_raw: String = row.get(6)?;
    let interactions_raw: String = row.get(11)?;
    Ok(Stakeholder {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        company: row.get(3)?,
        contact: serde_json::from_str::<ContactInfo>(&contact_raw).unwrap_or_default(),
        tags: serde_json::from_str::<Vec<String>>(&tags_raw).unwrap_or_default(),
        projects: serde_json::from_str::<Vec<ProjectAssociation>>(&projects_raw).unwrap_or_default(),
        influence_level: parse_level(&row.get::<_, String>(7)?)?,
        interest_level: parse_level(&row.get::<_, String>(8)?)?,
        notes: row.get(9)?,
        last_contact: parse_date(&row.get::<_, String>(10)?)?,
        upcoming_interactions: serde_json::from_str::<Vec<Interaction>>(&interactions_raw)
            .unwrap_or_default(),
    })
}

fn parse_meeting_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Meeting> {
    let location_raw: String = row.get(6)?;
    let attendees_raw: String = row.get(8)?;
    let agenda_raw: String = row.get(9)?;
    let recurrence_raw: String = row.get(10)?;
    Ok(Meeting {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        date: parse_time(&row.get::<_, String>(3)?)?,
        end_date: parse_time(&row.get::<_, String>(4)?)?,
        duration_minutes: row.get(5)?,
        location: serde_json::from_str::<MeetingLocation>(&location_raw).map_err(invalid_column)?,
        organizer: row.get(7)?,
        attendees: serde_json::from_str::<Vec<Attendee>>(&attendees_raw).unwrap_or_default(),
        agenda: serde_json::from_str::<Vec<String>>(&agenda_raw).unwrap_or_default(),
        recurrence: serde_json::from_str::<Recurrence>(&recurrence_raw).unwrap_or_default(),
    })
}

fn parse_project_status(raw: &str) -> rusqlite::Result<ProjectStatus> {
    ProjectStatus::parse(raw).map_err(invalid_column)
}

fn parse_task_status(raw: &str) -> rusqlite::Result<TaskStatus> {
    TaskStatus::parse(raw).map_err(invalid_column)
}

fn parse_priority(raw: &str) -> rusqlite::Result<Priority> {
    Priority::parse(raw).map_err(invalid_column)
}

fn parse_level(raw: &str) -> rusqlite::Result<EngagementLevel> {
    EngagementLevel::parse(raw).map_err(invalid_column)
}

fn parse_date(raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(invalid_column)
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(invalid_column)
}

fn invalid_column(error: impl std::fmt::Display) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}

fn require_id(entity: &str, id: &str) -> AppResult<()> {
    if id.trim().is_empty() {
        return Err(AppError::Validation(format!("{} id is required", entity)));
    }
    Ok(())
}

fn merge_json(target: &mut serde_json::Value, update: serde_json::Value) {
    match (target, update) {
        (serde_json::Value::Object(target_map), serde_json::Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_json(target_map.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (target, update) => {
            *target = update;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Database, RecordStore};
    use crate::models::{
        new_record_id, Attendee, AttendeeStatus, EngagementLevel, Interaction, InteractionKind,
        LocationKind, Meeting, Priority, Project, ProjectAssociation, ProjectStatus, Recurrence,
        RecurrenceFrequency, Stakeholder, Task,
    };
    use chrono::{DateTime, Duration, NaiveDate, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("date")
    }

    fn now() -> DateTime<Utc> {
        "2024-03-01T12:00:00Z".parse().expect("timestamp")
    }

    fn sample_project(name: &str) -> Project {
        let mut project = Project::draft(today());
        project.id = new_record_id();
        project.name = name.to_string();
        project.owner = "Dana".to_string();
        project
    }

    #[test]
    fn project_save_list_delete_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");

        let mut project = sample_project("Atlas rollout");
        db.save_project("local", &project).expect("save");
        assert_eq!(db.list_projects("local").expect("list"), vec![project.clone()]);

        project.status = ProjectStatus::Completed;
        project.progress = 100;
        db.save_project("local", &project).expect("update");
        let listed = db.list_projects("local").expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, ProjectStatus::Completed);
        assert_eq!(listed[0].progress, 100);

        db.delete_project("local", &project.id).expect("delete");
        assert!(db.list_projects("local").expect("list").is_empty());
        let error = db.delete_project("local", &project.id).expect_err("already gone");
        assert!(error.to_string().starts_with("NOT_FOUND:"));
    }

    #[test]
    fn task_round_trip_preserves_subtask_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");

        let mut child = Task::draft(today());
        child.id = new_record_id();
        child.name = "Draft outline".to_string();
        child.assigned_to = "Ana".to_string();
        let mut task = Task::draft(today());
        task.id = new_record_id();
        task.name = "Write report".to_string();
        task.assigned_to = "Ana".to_string();
        task.tags = vec!["writing".to_string()];
        task.subtasks = vec![child];

        db.save_task("local", &task).expect("save");
        assert_eq!(db.list_tasks("local").expect("list"), vec![task]);
    }

    #[test]
    fn records_are_scoped_by_user() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");

        let mine = sample_project("Mine");
        let theirs = sample_project("Theirs");
        db.save_project("local", &mine).expect("save mine");
        db.save_project("guest", &theirs).expect("save theirs");

        assert_eq!(db.list_projects("local").expect("list"), vec![mine.clone()]);
        assert_eq!(db.list_projects("guest").expect("list"), vec![theirs]);

        let error = db.delete_project("guest", &mine.id).expect_err("wrong user");
        assert!(error.to_string().starts_with("NOT_FOUND:"));
    }

    #[test]
    fn stakeholder_round_trip_keeps_nested_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");

        let mut stakeholder = Stakeholder::draft(today());
        stakeholder.id = new_record_id();
        stakeholder.name = "Maria Velez".to_string();
        stakeholder.role = "Sponsor".to_string();
        stakeholder.company = "Northwind".to_string();
        stakeholder.contact.email = "maria@northwind.test".to_string();
        stakeholder.contact.phone = "555-0100".to_string();
        stakeholder.contact.linkedin = Some("maria-velez".to_string());
        stakeholder.tags = vec!["decision-maker".to_string()];
        stakeholder.projects = vec![ProjectAssociation {
            project_id: "p-1".to_string(),
            title: "Atlas rollout".to_string(),
            role: "Sponsor".to_string(),
        }];
        stakeholder.influence_level = EngagementLevel::High;
        stakeholder.upcoming_interactions = vec![Interaction {
            kind: InteractionKind::Call,
            date: today() + Duration::days(3),
            description: "Budget sync".to_string(),
        }];

        db.save_stakeholder("local", &stakeholder).expect("save");
        assert_eq!(db.list_stakeholders("local").expect("list"), vec![stakeholder]);
    }

    #[test]
    fn meetings_round_trip_and_list_in_date_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");

        let mut later = Meeting::draft(now() + Duration::days(2));
        later.id = new_record_id();
        later.title = "Retro".to_string();
        let mut earlier = Meeting::draft(now());
        earlier.id = new_record_id();
        earlier.title = "Kickoff".to_string();
        earlier.location.kind = LocationKind::InPerson;
        earlier.location.details = "Room 4".to_string();
        earlier.attendees = vec![Attendee {
            name: "Ravi".to_string(),
            email: None,
            status: AttendeeStatus::Confirmed,
        }];
        earlier.agenda = vec!["Scope".to_string(), "Timeline".to_string()];
        earlier.recurrence = Recurrence {
            is_recurring: true,
            frequency: Some(RecurrenceFrequency::Weekly),
            end_date: Some(today() + Duration::days(60)),
        };

        db.save_meeting("local", &later).expect("save later");
        db.save_meeting("local", &earlier).expect("save earlier");
        assert_eq!(db.list_meetings("local").expect("list"), vec![earlier, later]);
    }

    #[test]
    fn corrupt_status_text_surfaces_as_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");
        db.save_project("local", &sample_project("Atlas rollout")).expect("save");

        {
            let conn = db.conn.lock().expect("lock");
            conn.execute("UPDATE projects SET status = 'Archived'", [])
                .expect("corrupt row");
        }

        let error = db.list_projects("local").expect_err("corrupt status must not parse");
        assert!(error.to_string().contains("unrecognized project status"));
    }

    #[test]
    fn settings_updates_merge_over_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");

        assert_eq!(db.get_settings().expect("defaults").import_max_rows, 500);

        let updated = db
            .update_settings(serde_json::json!({ "importMaxRows": 50 }))
            .expect("update");
        assert_eq!(updated.import_max_rows, 50);
        assert_eq!(updated.default_user_id, "local");

        let reread = db.get_settings().expect("get");
        assert_eq!(reread.import_max_rows, 50);
        assert_eq!(reread.upcoming_window_days, 7);
    }

    #[test]
    fn save_rejects_a_blank_record_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");

        let error = db
            .save_project("local", &Project::draft(today()))
            .expect_err("draft ids are empty");
        assert!(error.to_string().starts_with("VALIDATION:"));
    }
}
