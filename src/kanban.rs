use crate::models::{Project, ProjectStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column order on the board, left to right.
pub const BOARD_COLUMNS: [ProjectStatus; 4] = ProjectStatus::ALL;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub status: ProjectStatus,
    pub projects: Vec<Project>,
}

/// Groups projects into the four fixed status columns. Status is a closed
/// enum, so every project lands in exactly one column.
pub fn partition(projects: &[Project]) -> [BoardColumn; 4] {
    BOARD_COLUMNS.map(|status| BoardColumn {
        status,
        projects: projects
            .iter()
            .filter(|project| project.status == status)
            .cloned()
            .collect(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragLocation {
    pub column: ProjectStatus,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragEnd {
    pub project_id: String,
    pub source: DragLocation,
    pub destination: Option<DragLocation>,
}

/// Resolves a completed drag into the updated project, if any.
///
/// Dropping outside every column, or back onto the exact source position,
/// changes nothing. Any other drop returns the dragged project with its
/// status set to the destination column; within-column reorder therefore
/// yields an unchanged record and is not persisted.
pub fn apply_drag_end(projects: &[Project], drag: &DragEnd) -> Option<Project> {
    let destination = drag.destination?;
    if destination == drag.source {
        return None;
    }
    let project = projects.iter().find(|project| project.id == drag.project_id)?;
    let mut updated = project.clone();
    updated.status = destination.column;
    Some(updated)
}

/// Draft for the per-column add button: default fields with the column's
/// status already applied.
pub fn seed_for_column(status: ProjectStatus, today: NaiveDate) -> Project {
    let mut draft = Project::draft(today);
    draft.status = status;
    draft
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueLabel {
    Overdue,
    DaysLeft(i64),
}

impl fmt::Display for DueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overdue => write!(f, "Overdue"),
            Self::DaysLeft(days) => write!(f, "{} days left", days),
        }
    }
}

/// Days until the end date. Zero or negative reads as overdue. Computed
/// fresh from the supplied dates on every call.
pub fn days_remaining(end_date: NaiveDate, today: NaiveDate) -> DueLabel {
    let days = (end_date - today).num_days();
    if days > 0 {
        DueLabel::DaysLeft(days)
    } else {
        DueLabel::Overdue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("date")
    }

    fn project(id: &str, name: &str, status: ProjectStatus) -> Project {
        let mut project = Project::draft(today());
        project.id = id.to_string();
        project.name = name.to_string();
        project.status = status;
        project
    }

    fn sample_board() -> Vec<Project> {
        vec![
            project("p1", "Atlas", ProjectStatus::Planning),
            project("p2", "Borealis", ProjectStatus::InProgress),
            project("p3", "Cascade", ProjectStatus::InProgress),
            project("p4", "Dunes", ProjectStatus::OnHold),
            project("p5", "Ember", ProjectStatus::Completed),
        ]
    }

    #[test]
    fn partition_covers_every_project_exactly_once() {
        let projects = sample_board();
        let columns = partition(&projects);
        let total: usize = columns.iter().map(|column| column.projects.len()).sum();
        assert_eq!(total, projects.len());
        for column in &columns {
            for project in &column.projects {
                assert_eq!(project.status, column.status);
            }
        }
        let statuses: Vec<ProjectStatus> = columns.iter().map(|column| column.status).collect();
        assert_eq!(statuses, BOARD_COLUMNS.to_vec());
    }

    #[test]
    fn drag_without_destination_changes_nothing() {
        let projects = sample_board();
        let drag = DragEnd {
            project_id: "p1".to_string(),
            source: DragLocation {
                column: ProjectStatus::Planning,
                index: 0,
            },
            destination: None,
        };
        assert_eq!(apply_drag_end(&projects, &drag), None);
    }

    #[test]
    fn drag_back_to_source_position_changes_nothing() {
        let projects = sample_board();
        let location = DragLocation {
            column: ProjectStatus::InProgress,
            index: 1,
        };
        let drag = DragEnd {
            project_id: "p3".to_string(),
            source: location,
            destination: Some(location),
        };
        assert_eq!(apply_drag_end(&projects, &drag), None);
    }

    #[test]
    fn drag_across_columns_changes_only_the_status() {
        let projects = sample_board();
        let drag = DragEnd {
            project_id: "p1".to_string(),
            source: DragLocation {
                column: ProjectStatus::Planning,
                index: 0,
            },
            destination: Some(DragLocation {
                column: ProjectStatus::Completed,
                index: 0,
            }),
        };
        let updated = apply_drag_end(&projects, &drag).expect("dragged project");
        assert_eq!(updated.status, ProjectStatus::Completed);
        let mut expected = projects[0].clone();
        expected.status = ProjectStatus::Completed;
        assert_eq!(updated, expected);
    }

    #[test]
    fn drag_within_a_column_keeps_the_record_unchanged() {
        let projects = sample_board();
        let drag = DragEnd {
            project_id: "p2".to_string(),
            source: DragLocation {
                column: ProjectStatus::InProgress,
                index: 0,
            },
            destination: Some(DragLocation {
                column: ProjectStatus::InProgress,
                index: 1,
            }),
        };
        let updated = apply_drag_end(&projects, &drag).expect("dragged project");
        assert_eq!(updated, projects[1]);
    }

    #[test]
    fn drag_of_unknown_project_changes_nothing() {
        let projects = sample_board();
        let drag = DragEnd {
            project_id: "missing".to_string(),
            source: DragLocation {
                column: ProjectStatus::Planning,
                index: 0,
            },
            destination: Some(DragLocation {
                column: ProjectStatus::Completed,
                index: 0,
            }),
        };
        assert_eq!(apply_drag_end(&projects, &drag), None);
    }

    #[test]
    fn column_seed_carries_the_column_status() {
        let seed = seed_for_column(ProjectStatus::OnHold, today());
        assert_eq!(seed.status, ProjectStatus::OnHold);
        assert_eq!(seed.progress, 0);
        assert!(seed.name.is_empty());
    }

    #[test]
    fn due_labels_treat_today_as_overdue() {
        assert_eq!(days_remaining(today(), today()), DueLabel::Overdue);
        assert_eq!(
            days_remaining(today() - chrono::Duration::days(3), today()),
            DueLabel::Overdue
        );
        let label = days_remaining(today() + chrono::Duration::days(5), today());
        assert_eq!(label, DueLabel::DaysLeft(5));
        assert_eq!(label.to_string(), "5 days left");
    }
}
