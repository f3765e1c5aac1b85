use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::{AppError, AppResult};
use crate::models::{AppSettings, Meeting, Project, Stakeholder, Task};

use super::{merge_json, require_id, RecordStore};

/// Seed records injected into a [`MemoryStore`] at construction time.
#[derive(Debug, Clone, Default)]
pub struct FixtureSet {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub stakeholders: Vec<Stakeholder>,
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Default)]
struct UserRecords {
    projects: Vec<Project>,
    tasks: Vec<Task>,
    stakeholders: Vec<Stakeholder>,
    meetings: Vec<Meeting>,
}

/// In-memory implementation of [`RecordStore`] for tests and offline sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserRecords>>,
    settings: Mutex<AppSettings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixtures(user_id: &str, fixtures: FixtureSet) -> Self {
        let mut users = HashMap::new();
        users.insert(
            user_id.to_string(),
            UserRecords {
                projects: fixtures.projects,
                tasks: fixtures.tasks,
                stakeholders: fixtures.stakeholders,
                meetings: fixtures.meetings,
            },
        );
        Self {
            users: Mutex::new(users),
            settings: Mutex::new(AppSettings::default()),
        }
    }
}

impl RecordStore for MemoryStore {
    fn list_projects(&self, user_id: &str) -> AppResult<Vec<Project>> {
        let users = self.users.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        Ok(users
            .get(user_id)
            .map(|records| records.projects.clone())
            .unwrap_or_default())
    }

    fn save_project(&self, user_id: &str, project: &Project) -> AppResult<Project> {
        require_id("project", &project.id)?;
        let mut users = self.users.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        let records = users.entry(user_id.to_string()).or_default();
        if let Some(existing) = records
            .projects
            .iter_mut()
            .find(|candidate| candidate.id == project.id)
        {
            *existing = project.clone();
        } else {
            records.projects.push(project.clone());
        }
        Ok(project.clone())
    }

    fn delete_project(&self, user_id: &str, id: &str) -> AppResult<()> {
        let mut users = self.users.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        let records = users.entry(user_id.to_string()).or_default();
        let before = records.projects.len();
        records.projects.retain(|candidate| candidate.id != id);
        if records.projects.len() == before {
            return Err(AppError::NotFound(format!("no project with id '{}'", id)));
        }
        Ok(())
    }

    fn list_tasks(&self, user_id: &str) -> AppResult<Vec<Task>> {
        let users = self.users.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        Ok(users
            .get(user_id)
            .map(|records| records.tasks.clone())
            .unwrap_or_default())
    }

    fn save_task(&self, user_id: &str, task: &Task) -> AppResult<Task> {
        require_id("task", &task.id)?;
        let mut users = self.users.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        let records = users.entry(user_id.to_string()).or_default();
        if let Some(existing) = records
            .tasks
            .iter_mut()
            .find(|candidate| candidate.id == task.id)
        {
            *existing = task.clone();
        } else {
            records.tasks.push(task.clone());
        }
        Ok(task.clone())
    }

    fn delete_task(&self, user_id: &str, id: &str) -> AppResult<()> {
        let mut users = self.users.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        let records = users.entry(user_id.to_string()).or_default();
        let before = records.tasks.len();
        records.tasks.retain(|candidate| candidate.id != id);
        if records.tasks.len() == before {
            return Err(AppError::NotFound(format!("no task with id '{}'", id)));
        }
        Ok(())
    }

    fn list_stakeholders(&self, user_id: &str) -> AppResult<Vec<Stakeholder>> {
        let users = self.users.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        Ok(users
            .get(user_id)
            .map(|records| records.stakeholders.clone())
            .unwrap_or_default())
    }

    fn save_stakeholder(&self, user_id: &str, stakeholder: &Stakeholder) -> AppResult<Stakeholder> {
        require_id("stakeholder", &stakeholder.id)?;
        let mut users = self.users.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        let records = users.entry(user_id.to_string()).or_default();
        if let Some(existing) = records
            .stakeholders
            .iter_mut()
            .find(|candidate| candidate.id == stakeholder.id)
        {
            *existing = stakeholder.clone();
        } else {
            records.stakeholders.push(stakeholder.clone());
        }
        Ok(stakeholder.clone())
    }

    fn delete_stakeholder(&self, user_id: &str, id: &str) -> AppResult<()> {
        let mut users = self.users.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        let records = users.entry(user_id.to_string()).or_default();
        let before = records.stakeholders.len();
        records.stakeholders.retain(|candidate| candidate.id != id);
        if records.stakeholders.len() == before {
            return Err(AppError::NotFound(format!("no stakeholder with id '{}'", id)));
        }
        Ok(())
    }

    fn list_meetings(&self, user_id: &str) -> AppResult<Vec<Meeting>> {
        let users = self.users.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        let mut meetings = users
            .get(user_id)
            .map(|records| records.meetings.clone())
            .unwrap_or_default();
        // Same contract as the SQLite store: meetings come back in date order.
        meetings.sort_by_key(|meeting| meeting.date);
        Ok(meetings)
    }

    fn save_meeting(&self, user_id: &str, meeting: &Meeting) -> AppResult<Meeting> {
        require_id("meeting", &meeting.id)?;
        let mut users = self.users.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        let records = users.entry(user_id.to_string()).or_default();
        if let Some(existing) = records
            .meetings
            .iter_mut()
            .find(|candidate| candidate.id == meeting.id)
        {
            *existing = meeting.clone();
        } else {
            records.meetings.push(meeting.clone());
        }
        Ok(meeting.clone())
    }

    fn delete_meeting(&self, user_id: &str, id: &str) -> AppResult<()> {
        let mut users = self.users.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        let records = users.entry(user_id.to_string()).or_default();
        let before = records.meetings.len();
        records.meetings.retain(|candidate| candidate.id != id);
        if records.meetings.len() == before {
            return Err(AppError::NotFound(format!("no meeting with id '{}'", id)));
        }
        Ok(())
    }

    fn get_settings(&self) -> AppResult<AppSettings> {
        let settings = self.settings.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        Ok(settings.clone())
    }

    fn update_settings(&self, update: serde_json::Value) -> AppResult<AppSettings> {
        let mut settings = self.settings.lock().map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))?;
        let mut merged = serde_json::to_value(&*settings)?;
        merge_json(&mut merged, update);
        *settings = serde_json::from_value(merged)?;
        Ok(settings.clone())
    }
}
