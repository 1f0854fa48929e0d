use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

pub const TICKETS: &str = "Tickets";
pub const PROJECTS: &str = "Projects";
pub const KANBAN_TASKS: &str = "KanbanTasks";
pub const MEMBERS: &str = "Members";
pub const FORM_QUESTIONS: &str = "FormQuestions";
pub const WORK_TYPES: &str = "WorkTypes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetId(pub i64);

impl From<i64> for SheetId {
    fn from(value: i64) -> Self {
        SheetId(value)
    }
}

impl From<SheetId> for i64 {
    fn from(value: SheetId) -> Self {
        value.0
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 1-based row number as a spreadsheet shows it: the header is row 1 and
/// the first data row is row 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetRow(pub usize);

impl SheetRow {
    pub const HEADER: SheetRow = SheetRow(1);

    /// Row of the `position`-th data row (0-based, header excluded).
    pub fn from_data_position(position: usize) -> Self {
        SheetRow(position + 2)
    }

    pub fn from_grid_index(index: usize) -> Self {
        SheetRow(index + 1)
    }

    /// 0-based grid index used by batch requests.
    pub fn grid_index(self) -> usize {
        self.0.saturating_sub(1)
    }

    pub fn is_data_row(self) -> bool {
        self.0 >= 2
    }
}

impl fmt::Display for SheetRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a sheet holds, header row included at index 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetData {
    pub values: Vec<Vec<String>>,
}

impl SheetData {
    pub fn new(values: Vec<Vec<String>>) -> Self {
        Self { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        self.values.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        header_index(self.headers(), header)
    }

    /// Data rows paired with their sheet row numbers.
    pub fn data_rows(&self) -> impl Iterator<Item = (SheetRow, &[String])> + '_ {
        self.values
            .iter()
            .skip(1)
            .enumerate()
            .map(|(position, row)| (SheetRow::from_data_position(position), row.as_slice()))
    }

    pub fn data_row_count(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    pub fn row(&self, row: SheetRow) -> Option<&[String]> {
        self.values.get(row.grid_index()).map(Vec::as_slice)
    }
}

pub fn header_index(headers: &[String], header: &str) -> Option<usize> {
    headers.iter().position(|candidate| candidate == header)
}

/// Cell text at `idx`, empty when the column is unknown or the row is short.
pub fn cell_at(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|idx| row.get(idx))
        .map(String::as_str)
        .unwrap_or("")
}

/// Header/value pairs in insertion order, the shape rows are written in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(header, value);
        self
    }

    /// Replaces the value in place when the header is already present.
    pub fn set(&mut self, header: impl Into<String>, value: impl Into<String>) {
        let header = header.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == header) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((header, value)),
        }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == header)
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|(header, _)| header.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.fields
            .iter()
            .map(|(header, value)| (header.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<H, V> FromIterator<(H, V)> for Record
where
    H: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (H, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (header, value) in iter {
            record.set(header, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (header, value) in &self.fields {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetMeta {
    pub id: SheetId,
    pub name: String,
    pub row_count: i64,
    pub column_count: i64,
    pub updated_at: String,
}
