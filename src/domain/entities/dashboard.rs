use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::domain::entities::project::{PROJECT_ID, PROJECT_TITLE};
use crate::domain::entities::sheet::{cell_at, header_index, SheetData, SheetRow};
use crate::domain::entities::ticket::{CREATED_DATE, STATUS, TEAM, TICKET_ID, WORK_TYPE};

const TEAM_QUESTION_PREFIX: &str = "the requisition is for which team";

/// A data row as displayed, still pointing at its sheet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub sheet_row: SheetRow,
    pub values: Vec<String>,
}

/// Data rows newest first. Display positions no longer match sheet rows,
/// so each row carries its own.
pub fn newest_first(sheet: &SheetData) -> Vec<DisplayRow> {
    let mut rows: Vec<DisplayRow> = sheet
        .data_rows()
        .map(|(sheet_row, values)| DisplayRow {
            sheet_row,
            values: values.to_vec(),
        })
        .collect();
    rows.reverse();
    rows
}

/// Ticket headers with `Team` guaranteed: a team question column is
/// renamed to `Team`, otherwise an empty `Team` column is assumed.
pub fn ticket_headers(headers: &[String]) -> Vec<String> {
    let mut resolved = headers.to_vec();
    if header_index(&resolved, TEAM).is_some() {
        return resolved;
    }
    match resolved
        .iter()
        .position(|header| header.to_lowercase().starts_with(TEAM_QUESTION_PREFIX))
    {
        Some(idx) => resolved[idx] = TEAM.to_string(),
        None => resolved.push(TEAM.to_string()),
    }
    resolved
}

/// `None` on a facet means "All".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub search: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<String>,
    pub team: Option<String>,
    pub work_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: usize,
    pub solved: usize,
    pub in_progress: usize,
    pub pending: usize,
}

/// Rows passing every facet. `now` closes the date range when `to` is unset.
pub fn filter_tickets(
    headers: &[String],
    rows: &[DisplayRow],
    filter: &TicketFilter,
    now: NaiveDateTime,
) -> Vec<DisplayRow> {
    let id_idx = header_index(headers, TICKET_ID);
    let created_idx = header_index(headers, CREATED_DATE);
    let status_idx = header_index(headers, STATUS);
    let team_idx = header_index(headers, TEAM);
    let work_type_idx = header_index(headers, WORK_TYPE);
    let query = filter.search.to_lowercase();

    rows.iter()
        .filter(|row| {
            let values = row.values.as_slice();
            let matches_search = query.is_empty()
                || id_idx.is_none()
                || cell_at(values, id_idx).to_lowercase().contains(&query);
            let within_dates = (filter.from.is_none() && filter.to.is_none())
                || created_idx.is_none()
                || within_range(cell_at(values, created_idx), filter.from, filter.to, now);
            let has_status = filter
                .status
                .as_deref()
                .map_or(true, |status| status_idx.is_some() && cell_at(values, status_idx) == status);
            let has_team = filter.team.as_deref().map_or(true, |team| {
                team_idx.is_some() && cell_at(values, team_idx).split(", ").any(|t| t == team)
            });
            let has_work_type = filter.work_type.as_deref().map_or(true, |work_type| {
                work_type_idx.is_some() && cell_at(values, work_type_idx) == work_type
            });
            matches_search && within_dates && has_status && has_team && has_work_type
        })
        .cloned()
        .collect()
}

fn within_range(value: &str, from: Option<NaiveDate>, to: Option<NaiveDate>, now: NaiveDateTime) -> bool {
    let Some(created) = parse_created(value) else {
        return false;
    };
    let start = from
        .map(|date| date.and_time(NaiveTime::MIN))
        .unwrap_or(NaiveDateTime::MIN);
    let end = match to {
        Some(date) => date.and_hms_milli_opt(23, 59, 59, 999).unwrap_or(now),
        None => now,
    };
    start <= created && created <= end
}

fn parse_created(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

pub fn ticket_stats(headers: &[String], rows: &[DisplayRow]) -> TicketStats {
    let status_idx = header_index(headers, STATUS);
    let mut stats = TicketStats {
        total: rows.len(),
        ..TicketStats::default()
    };
    for row in rows {
        match cell_at(&row.values, status_idx) {
            "Done" => stats.solved += 1,
            "In Progress" => stats.in_progress += 1,
            "Open" => stats.pending += 1,
            _ => {}
        }
    }
    stats
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Matched against project id and title.
    pub search: String,
    pub ticket_id: String,
    pub status: Option<String>,
}

pub fn filter_projects(headers: &[String], rows: &[DisplayRow], filter: &ProjectFilter) -> Vec<DisplayRow> {
    let id_idx = header_index(headers, PROJECT_ID);
    let title_idx = header_index(headers, PROJECT_TITLE);
    let ticket_idx = header_index(headers, TICKET_ID);
    let status_idx = header_index(headers, STATUS);
    let query = filter.search.to_lowercase();
    let ticket_query = filter.ticket_id.to_lowercase();

    rows.iter()
        .filter(|row| {
            let values = row.values.as_slice();
            let matches_search = query.is_empty()
                || cell_at(values, id_idx).to_lowercase().contains(&query)
                || cell_at(values, title_idx).to_lowercase().contains(&query);
            let matches_ticket = cell_at(values, ticket_idx)
                .to_lowercase()
                .contains(&ticket_query);
            let matches_status = filter
                .status
                .as_deref()
                .map_or(true, |status| status_idx.is_some() && cell_at(values, status_idx) == status);
            matches_search && matches_ticket && matches_status
        })
        .cloned()
        .collect()
}
