use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::sheet::Record;

pub const TICKET_ID: &str = "Ticket ID";
pub const CREATED_DATE: &str = "Created Date";
pub const STATUS: &str = "Status";
pub const ASSIGNEE: &str = "Assignee";
pub const TEAM: &str = "Team";
pub const WORK_TYPE: &str = "Work Type";
pub const TITLE: &str = "Product/Course/Requisition Name";

pub const STATUS_IN_REVIEW: &str = "In Review";
pub const STATUS_COMPLETED: &str = "Completed";

pub fn ticket_id(now: DateTime<Utc>) -> String {
    format!("TICKET-{}", now.timestamp_millis())
}

/// `YYYY-MM-DD HH:MM:SS` shifted by `utc_offset_hours`.
pub fn created_date(now: DateTime<Utc>, utc_offset_hours: i32) -> String {
    let local = now + Duration::hours(i64::from(utc_offset_hours));
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Submitted answers plus the generated bookkeeping columns. Generated
/// values win over answers with the same header.
pub fn new_ticket_record(answers: Record, id: &str, created: &str) -> Record {
    answers
        .with(TICKET_ID, id)
        .with(CREATED_DATE, created)
        .with(STATUS, STATUS_IN_REVIEW)
        .with(ASSIGNEE, "")
}
