use serde::Serialize;

use crate::domain::entities::sheet::{cell_at, Record, SheetData, SheetRow};
use crate::domain::entities::ticket::TEAM;

pub const NAME: &str = "Name";
pub const MEMBER_HEADERS: [&str; 2] = [NAME, TEAM];
pub const TEAM_DEFAULT_MEMBER: &str = "Team Default";

pub const DEFAULT_WORK_TYPE_QUESTION: &str = "What type of work is this?";
pub const DEFAULT_WORK_TYPE_OPTIONS: [&str; 2] = ["Urgent", "Regular"];

pub fn member_record(name: &str, team: &str) -> Record {
    Record::new().with(NAME, name).with(TEAM, team)
}

/// Predefined teams that have no member row yet, in configured order.
pub fn teams_missing_members<'a>(members: &SheetData, predefined: &'a [String]) -> Vec<&'a str> {
    let team_idx = members.column_index(TEAM).or(Some(1));
    predefined
        .iter()
        .filter(|team| {
            !members
                .data_rows()
                .any(|(_, row)| cell_at(row, team_idx) == team.as_str())
        })
        .map(String::as_str)
        .collect()
}

/// Work-type question (header cell) and its options (first column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkTypes {
    pub question: String,
    pub options: Vec<String>,
}

impl WorkTypes {
    pub fn from_sheet(sheet: &SheetData) -> Option<Self> {
        let header = sheet.headers().first()?;
        let options = sheet
            .data_rows()
            .map(|(_, row)| cell_at(row, Some(0)))
            .filter(|option| !option.is_empty())
            .map(str::to_string)
            .collect();
        Some(Self {
            question: header.clone(),
            options,
        })
    }
}

pub fn find_work_type_row(sheet: &SheetData, option: &str) -> Option<SheetRow> {
    sheet
        .data_rows()
        .find(|(_, row)| cell_at(row, Some(0)) == option)
        .map(|(sheet_row, _)| sheet_row)
}
