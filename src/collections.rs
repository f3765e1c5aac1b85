use crate::models::{
    Meeting, MeetingFilters, Project, ProjectFilters, Stakeholder, StakeholderFilters, Task,
    TaskFilters, TimeWindow,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

// Filters are pure projections: they never mutate their input, and with the
// same filter state the output is stable however often they run. Free-text
// search is case-insensitive substring containment; facets are exact matches
// with None meaning "All"; all active filters must hold at once.

pub(crate) fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

pub fn filter_projects(projects: &[Project], filters: &ProjectFilters) -> Vec<Project> {
    let search = filters.search.as_deref().map(str::to_lowercase);
    projects
        .iter()
        .filter(|project| {
            let matches_search = search.as_deref().map_or(true, |needle| {
                contains_ci(&project.name, needle)
                    || contains_ci(&project.description, needle)
                    || contains_ci(&project.owner, needle)
            });
            matches_search
                && filters.status.map_or(true, |status| project.status == status)
                && filters
                    .priority
                    .map_or(true, |priority| project.priority == priority)
        })
        .cloned()
        .collect()
}

pub fn filter_tasks(tasks: &[Task], filters: &TaskFilters) -> Vec<Task> {
    let search = filters.search.as_deref().map(str::to_lowercase);
    tasks
        .iter()
        .filter(|task| {
            let matches_search = search.as_deref().map_or(true, |needle| {
                contains_ci(&task.name, needle)
                    || contains_ci(&task.description, needle)
                    || contains_ci(&task.assigned_to, needle)
            });
            matches_search
                && filters.status.map_or(true, |status| task.status == status)
                && filters
                    .priority
                    .map_or(true, |priority| task.priority == priority)
                && filters
                    .project
                    .as_deref()
                    .map_or(true, |project| task.project == project)
        })
        .cloned()
        .collect()
}

pub fn filter_stakeholders(
    stakeholders: &[Stakeholder],
    filters: &StakeholderFilters,
) -> Vec<Stakeholder> {
    let search = filters.search.as_deref().map(str::to_lowercase);
    stakeholders
        .iter()
        .filter(|stakeholder| {
            let matches_search = search.as_deref().map_or(true, |needle| {
                contains_ci(&stakeholder.name, needle)
                    || contains_ci(&stakeholder.role, needle)
                    || contains_ci(&stakeholder.company, needle)
            });
            // The tag facet is membership, not equality: a stakeholder can
            // carry several tags and matches when the selected one is present.
            let matches_tag = filters
                .tag
                .as_deref()
                .map_or(true, |tag| stakeholder.tags.iter().any(|owned| owned == tag));
            matches_search
                && matches_tag
                && filters
                    .influence_level
                    .map_or(true, |level| stakeholder.influence_level == level)
                && filters
                    .interest_level
                    .map_or(true, |level| stakeholder.interest_level == level)
        })
        .cloned()
        .collect()
}

/// Whether the meeting start falls inside the selected window, relative to
/// the supplied clock. "Today" means the same calendar day even when the
/// start has already passed; "week" spans now through seven days out.
pub fn meeting_in_window(date: DateTime<Utc>, window: TimeWindow, now: DateTime<Utc>) -> bool {
    match window {
        TimeWindow::Upcoming => date >= now,
        TimeWindow::Today => date.date_naive() == now.date_naive(),
        TimeWindow::Week => date >= now && date <= now + Duration::days(7),
        TimeWindow::Past => date < now,
    }
}

pub fn filter_meetings(
    meetings: &[Meeting],
    filters: &MeetingFilters,
    now: DateTime<Utc>,
) -> Vec<Meeting> {
    let search = filters.search.as_deref().map(str::to_lowercase);
    meetings
        .iter()
        .filter(|meeting| {
            let matches_search = search.as_deref().map_or(true, |needle| {
                contains_ci(&meeting.title, needle)
                    || contains_ci(&meeting.description, needle)
                    || contains_ci(&meeting.organizer, needle)
            });
            matches_search
                && filters
                    .window
                    .map_or(true, |window| meeting_in_window(meeting.date, window, now))
        })
        .cloned()
        .collect()
}

/// Groups meetings by calendar day of their start. BTreeMap keys keep the
/// days in ascending order for rendering.
pub fn group_by_day(meetings: &[Meeting]) -> BTreeMap<NaiveDate, Vec<Meeting>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<Meeting>> = BTreeMap::new();
    for meeting in meetings {
        grouped
            .entry(meeting.date.date_naive())
            .or_default()
            .push(meeting.clone());
    }
    grouped
}

/// "45 min" under an hour, then "2h" on the hour and "1h 30m" otherwise.
pub fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        let hours = minutes / 60;
        let remaining = minutes % 60;
        if remaining > 0 {
            format!("{}h {}m", hours, remaining)
        } else {
            format!("{}h", hours)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EngagementLevel, Priority, ProjectStatus, TaskStatus};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("date")
    }

    fn project(name: &str, owner: &str, status: ProjectStatus, priority: Priority) -> Project {
        let mut project = Project::draft(today());
        project.id = crate::models::new_record_id();
        project.name = name.to_string();
        project.owner = owner.to_string();
        project.status = status;
        project.priority = priority;
        project
    }

    fn sample_projects() -> Vec<Project> {
        vec![
            project("Atlas", "Ana", ProjectStatus::Planning, Priority::High),
            project("Borealis", "Ben", ProjectStatus::InProgress, Priority::Low),
            project("Cascade", "ana torres", ProjectStatus::InProgress, Priority::High),
        ]
    }

    #[test]
    fn project_search_is_case_insensitive_over_owner() {
        let projects = sample_projects();
        let filters = ProjectFilters {
            search: Some("ANA".to_string()),
            ..ProjectFilters::default()
        };
        let visible = filter_projects(&projects, &filters);
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|project| project.owner.to_lowercase().contains("ana")));
    }

    #[test]
    fn project_facets_and_compose() {
        let projects = sample_projects();
        let filters = ProjectFilters {
            search: None,
            status: Some(ProjectStatus::InProgress),
            priority: Some(Priority::High),
        };
        let visible = filter_projects(&projects, &filters);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Cascade");
    }

    #[test]
    fn project_filtering_is_idempotent_and_facet_order_commutative() {
        let projects = sample_projects();
        let both = ProjectFilters {
            search: None,
            status: Some(ProjectStatus::InProgress),
            priority: Some(Priority::High),
        };
        let status_only = ProjectFilters {
            status: Some(ProjectStatus::InProgress),
            ..ProjectFilters::default()
        };
        let priority_only = ProjectFilters {
            priority: Some(Priority::High),
            ..ProjectFilters::default()
        };

        let once = filter_projects(&projects, &both);
        assert_eq!(filter_projects(&once, &both), once);

        let status_then_priority = filter_projects(&filter_projects(&projects, &status_only), &priority_only);
        let priority_then_status = filter_projects(&filter_projects(&projects, &priority_only), &status_only);
        assert_eq!(status_then_priority, once);
        assert_eq!(priority_then_status, once);
    }

    #[test]
    fn task_project_facet_is_exact() {
        let mut first = Task::draft(today());
        first.id = "t1".to_string();
        first.name = "Draft brief".to_string();
        first.project = "Atlas".to_string();
        let mut second = Task::draft(today());
        second.id = "t2".to_string();
        second.name = "Review brief".to_string();
        second.project = "Atlas II".to_string();
        second.status = TaskStatus::Completed;

        let filters = TaskFilters {
            project: Some("Atlas".to_string()),
            ..TaskFilters::default()
        };
        let visible = filter_tasks(&[first, second], &filters);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "t1");
    }

    #[test]
    fn stakeholder_tag_facet_is_membership() {
        let mut internal = Stakeholder::draft(today());
        internal.id = "s1".to_string();
        internal.name = "Dana".to_string();
        internal.tags = vec!["internal".to_string(), "engineering".to_string()];
        let mut client = Stakeholder::draft(today());
        client.id = "s2".to_string();
        client.name = "Eve".to_string();
        client.tags = vec!["client".to_string()];
        client.influence_level = EngagementLevel::High;

        let stakeholders = vec![internal, client];
        let filters = StakeholderFilters {
            tag: Some("internal".to_string()),
            ..StakeholderFilters::default()
        };
        let visible = filter_stakeholders(&stakeholders, &filters);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "s1");

        let filters = StakeholderFilters {
            influence_level: Some(EngagementLevel::High),
            ..StakeholderFilters::default()
        };
        let visible = filter_stakeholders(&stakeholders, &filters);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "s2");
    }

    fn meeting_at(id: &str, date: DateTime<Utc>) -> Meeting {
        let mut meeting = Meeting::draft(date);
        meeting.id = id.to_string();
        meeting.title = format!("Meeting {}", id);
        meeting
    }

    fn fixed_now() -> DateTime<Utc> {
        "2024-03-01T12:00:00Z".parse().expect("timestamp")
    }

    #[test]
    fn meeting_windows_partition_around_now() {
        let now = fixed_now();
        let earlier_today = meeting_at("m1", now - Duration::hours(3));
        let tomorrow = meeting_at("m2", now + Duration::days(1));
        let next_week = meeting_at("m3", now + Duration::days(10));
        let yesterday = meeting_at("m4", now - Duration::days(1));
        let meetings = vec![earlier_today, tomorrow, next_week, yesterday];

        let window = |window: TimeWindow| {
            let filters = MeetingFilters {
                search: None,
                window: Some(window),
            };
            filter_meetings(&meetings, &filters, now)
                .into_iter()
                .map(|meeting| meeting.id)
                .collect::<Vec<_>>()
        };

        assert_eq!(window(TimeWindow::Upcoming), vec!["m2", "m3"]);
        assert_eq!(window(TimeWindow::Today), vec!["m1"]);
        assert_eq!(window(TimeWindow::Week), vec!["m2"]);
        assert_eq!(window(TimeWindow::Past), vec!["m1", "m4"]);
    }

    #[test]
    fn meetings_group_by_day_in_ascending_order() {
        let now = fixed_now();
        let meetings = vec![
            meeting_at("m1", now + Duration::days(2)),
            meeting_at("m2", now),
            meeting_at("m3", now + Duration::days(2) + Duration::hours(1)),
        ];
        let grouped = group_by_day(&meetings);
        let days: Vec<NaiveDate> = grouped.keys().copied().collect();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"),
                NaiveDate::from_ymd_opt(2024, 3, 3).expect("date"),
            ]
        );
        assert_eq!(grouped[&days[1]].len(), 2);
    }

    #[test]
    fn duration_formatting_boundaries() {
        assert_eq!(format_duration(45), "45 min");
        assert_eq!(format_duration(59), "59 min");
        assert_eq!(format_duration(60), "1h");
        assert_eq!(format_duration(90), "1h 30m");
        assert_eq!(format_duration(120), "2h");
    }
}
