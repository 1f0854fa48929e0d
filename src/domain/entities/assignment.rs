use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::kanban::{DUE_DATE, TASK_ID, TITLE as TASK_TITLE};
use crate::domain::entities::project::{PROJECT_ID, PROJECT_TITLE, START_DATE};
use crate::domain::entities::sheet::{cell_at, SheetData, SheetRow, KANBAN_TASKS, PROJECTS, TICKETS};
use crate::domain::entities::ticket::{ASSIGNEE, CREATED_DATE, STATUS, STATUS_IN_REVIEW, TICKET_ID, TITLE as TICKET_TITLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskSource {
    Ticket,
    Project,
    #[serde(rename = "Kanban Task")]
    KanbanTask,
}

impl TaskSource {
    pub fn sheet_name(self) -> &'static str {
        match self {
            TaskSource::Ticket => TICKETS,
            TaskSource::Project => PROJECTS,
            TaskSource::KanbanTask => KANBAN_TASKS,
        }
    }

    fn layout(self) -> SourceLayout {
        match self {
            TaskSource::Ticket => SourceLayout {
                id: TICKET_ID,
                title: TICKET_TITLE,
                title_suffix: TICKET_ID,
                date: CREATED_DATE,
                untitled: "Untitled Ticket",
                fallback_id: "ticket",
                default_status: STATUS_IN_REVIEW,
            },
            TaskSource::Project => SourceLayout {
                id: PROJECT_ID,
                title: PROJECT_TITLE,
                title_suffix: PROJECT_ID,
                date: START_DATE,
                untitled: "Untitled Project",
                fallback_id: "project",
                default_status: STATUS_IN_REVIEW,
            },
            TaskSource::KanbanTask => SourceLayout {
                id: TASK_ID,
                title: TASK_TITLE,
                title_suffix: PROJECT_ID,
                date: DUE_DATE,
                untitled: "Untitled Task",
                fallback_id: "kanban",
                default_status: "todo",
            },
        }
    }
}

struct SourceLayout {
    id: &'static str,
    title: &'static str,
    title_suffix: &'static str,
    date: &'static str,
    untitled: &'static str,
    fallback_id: &'static str,
    default_status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTask {
    pub id: String,
    pub title: String,
    pub status: String,
    pub source: TaskSource,
    pub sheet_row: SheetRow,
    pub date: String,
}

/// Rows of one sheet assigned to `assignee`, compared case-insensitively.
/// Sheets without an `Assignee` column contribute nothing.
pub fn collect_assigned(source: TaskSource, sheet: &SheetData, assignee: &str) -> Vec<AssignedTask> {
    let Some(assignee_idx) = sheet.column_index(ASSIGNEE) else {
        return Vec::new();
    };
    let layout = source.layout();
    let id_idx = sheet.column_index(layout.id);
    let title_idx = sheet.column_index(layout.title);
    let suffix_idx = sheet.column_index(layout.title_suffix);
    let status_idx = sheet.column_index(STATUS);
    let date_idx = sheet.column_index(layout.date);
    let wanted = assignee.to_lowercase();

    sheet
        .data_rows()
        .enumerate()
        .filter(|(_, (_, row))| cell_at(row, Some(assignee_idx)).to_lowercase() == wanted)
        .map(|(position, (sheet_row, row))| {
            let id = cell_at(row, id_idx);
            let title = cell_at(row, title_idx);
            let status = cell_at(row, status_idx);
            AssignedTask {
                id: if id.is_empty() {
                    format!("{}-{position}", layout.fallback_id)
                } else {
                    id.to_string()
                },
                title: format!(
                    "{} / {}",
                    if title.is_empty() { layout.untitled } else { title },
                    cell_at(row, suffix_idx)
                ),
                status: if status.is_empty() {
                    layout.default_status.to_string()
                } else {
                    status.to_string()
                },
                source,
                sheet_row,
                date: normalize_timestamp(cell_at(row, date_idx)),
            }
        })
        .collect()
}

/// RFC 3339 (UTC, milliseconds) or empty when the value does not parse.
/// Zone-less values are read as UTC.
pub fn normalize_timestamp(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    parse_timestamp(value)
        .map(|parsed| parsed.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|parsed| parsed.and_utc());
        }
    }
    None
}
