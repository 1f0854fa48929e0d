use chrono::{DateTime, Utc};

use crate::domain::entities::sheet::Record;
use crate::domain::entities::ticket::{ASSIGNEE, STATUS, STATUS_IN_REVIEW, TICKET_ID};

pub const PROJECT_ID: &str = "Project ID";
pub const PROJECT_TITLE: &str = "Project Title";
pub const START_DATE: &str = "Start Date";
pub const END_DATE: &str = "End Date";
pub const KANBAN_INITIALIZED: &str = "Kanban Initialized";

pub const PROJECT_HEADERS: [&str; 8] = [
    PROJECT_ID,
    PROJECT_TITLE,
    TICKET_ID,
    STATUS,
    START_DATE,
    END_DATE,
    ASSIGNEE,
    KANBAN_INITIALIZED,
];

/// Columns that must exist before a project row is written.
pub const REQUIRED_PROJECT_COLUMNS: [&str; 2] = [PROJECT_TITLE, STATUS];

pub fn project_id(now: DateTime<Utc>) -> String {
    format!("PROJ-{}", now.timestamp_millis())
}

pub fn new_project_record(id: &str, title: &str, ticket_id: &str) -> Record {
    Record::new()
        .with(PROJECT_ID, id)
        .with(PROJECT_TITLE, title)
        .with(TICKET_ID, ticket_id)
        .with(STATUS, STATUS_IN_REVIEW)
        .with(START_DATE, "")
        .with(END_DATE, "")
        .with(ASSIGNEE, "")
        .with(KANBAN_INITIALIZED, "No")
}

/// Copies ticket cells whose headers also exist on the projects sheet.
/// The ticket id is carried separately and never copied here.
pub fn carry_ticket_columns(
    record: &mut Record,
    ticket_headers: &[String],
    ticket_values: &[String],
    project_headers: &[String],
) {
    for (idx, header) in ticket_headers.iter().enumerate() {
        if header == TICKET_ID || !project_headers.contains(header) {
            continue;
        }
        let value = ticket_values.get(idx).map(String::as_str).unwrap_or("");
        record.set(header.as_str(), value);
    }
}
