use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::project::PROJECT_ID;
use crate::domain::entities::sheet::{cell_at, Record, SheetData, SheetRow};
use crate::domain::entities::ticket::{ASSIGNEE, STATUS};

pub const SEQUENCE: &str = "Sequence";
pub const TASK_ID: &str = "Task ID";
pub const TITLE: &str = "Title";
pub const DUE_DATE: &str = "Due Date";
pub const DESCRIPTION: &str = "Description";
pub const TYPE: &str = "Type";
pub const PRIORITY: &str = "Priority";
pub const TAGS: &str = "Tags";

pub const KANBAN_HEADERS: [&str; 11] = [
    PROJECT_ID,
    SEQUENCE,
    TASK_ID,
    TITLE,
    STATUS,
    ASSIGNEE,
    DUE_DATE,
    DESCRIPTION,
    TYPE,
    PRIORITY,
    TAGS,
];

pub const DEFAULT_TYPE: &str = "Task";
pub const DEFAULT_PRIORITY: &str = "Medium";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "inprogress")]
    InProgress,
    #[serde(rename = "review")]
    Review,
    #[serde(rename = "done")]
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "inprogress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
    }

    pub fn title(self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Review => "Review",
            TaskStatus::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanTask {
    pub sheet_row: SheetRow,
    pub id: String,
    pub project_id: String,
    pub sequence: u32,
    pub title: String,
    pub status: String,
    pub assignee: String,
    pub due_date: String,
    pub description: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub priority: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub priority: String,
    pub assignee: String,
    pub due_date: String,
    pub tags: Vec<String>,
}

/// Partial update; `None` leaves the cell untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub sequence: Option<u32>,
    pub status: Option<String>,
}

impl TaskPatch {
    /// Header/value pairs for the fields that are set.
    pub fn to_record(&self) -> Record {
        let fields = [
            (TITLE, self.title.clone()),
            (DESCRIPTION, self.description.clone()),
            (TYPE, self.task_type.clone()),
            (PRIORITY, self.priority.clone()),
            (ASSIGNEE, self.assignee.clone()),
            (DUE_DATE, self.due_date.clone()),
            (TAGS, self.tags.as_ref().map(|tags| tags.join(","))),
            (SEQUENCE, self.sequence.map(|sequence| sequence.to_string())),
            (STATUS, self.status.clone()),
        ];
        fields
            .into_iter()
            .filter_map(|(header, value)| value.map(|value| (header, value)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceUpdate {
    pub sheet_row: SheetRow,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Required columns (Project ID, Task ID, Status) not found in KanbanTasks.")]
pub struct MissingTaskColumns;

pub fn task_id(now: DateTime<Utc>) -> String {
    format!("TASK-{}", now.timestamp_millis())
}

pub fn split_tags(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(str::to_string).collect()
}

/// Typed tasks of one project. Sequence falls back to the 1-based data
/// position when the column is missing or not a number.
pub fn parse_tasks(sheet: &SheetData, project_id: &str) -> Result<Vec<KanbanTask>, MissingTaskColumns> {
    if sheet.is_empty() {
        return Ok(Vec::new());
    }
    let project_idx = sheet.column_index(PROJECT_ID);
    let task_idx = sheet.column_index(TASK_ID);
    let status_idx = sheet.column_index(STATUS);
    if project_idx.is_none() || task_idx.is_none() || status_idx.is_none() {
        return Err(MissingTaskColumns);
    }
    let sequence_idx = sheet.column_index(SEQUENCE);
    let title_idx = sheet.column_index(TITLE);
    let assignee_idx = sheet.column_index(ASSIGNEE);
    let due_idx = sheet.column_index(DUE_DATE);
    let description_idx = sheet.column_index(DESCRIPTION);
    let type_idx = sheet.column_index(TYPE);
    let priority_idx = sheet.column_index(PRIORITY);
    let tags_idx = sheet.column_index(TAGS);

    let tasks = sheet
        .data_rows()
        .enumerate()
        .filter(|(_, (_, row))| cell_at(row, project_idx) == project_id)
        .map(|(position, (sheet_row, row))| {
            let fallback = position as u32 + 1;
            let sequence = cell_at(row, sequence_idx)
                .trim()
                .parse::<u32>()
                .unwrap_or(fallback);
            KanbanTask {
                sheet_row,
                id: cell_at(row, task_idx).to_string(),
                project_id: cell_at(row, project_idx).to_string(),
                sequence,
                title: cell_at(row, title_idx).to_string(),
                status: cell_at(row, status_idx).to_string(),
                assignee: cell_at(row, assignee_idx).to_string(),
                due_date: cell_at(row, due_idx).to_string(),
                description: cell_at(row, description_idx).to_string(),
                task_type: non_empty_or(cell_at(row, type_idx), DEFAULT_TYPE),
                priority: non_empty_or(cell_at(row, priority_idx), DEFAULT_PRIORITY),
                tags: split_tags(cell_at(row, tags_idx)),
            }
        })
        .collect();
    Ok(tasks)
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

pub fn new_task_record(project_id: &str, sequence: u32, id: &str, draft: &TaskDraft) -> Record {
    Record::new()
        .with(PROJECT_ID, project_id)
        .with(SEQUENCE, sequence.to_string())
        .with(TASK_ID, id)
        .with(TITLE, draft.title.as_str())
        .with(STATUS, TaskStatus::Todo.as_str())
        .with(DESCRIPTION, draft.description.as_str())
        .with(TYPE, draft.task_type.as_str())
        .with(PRIORITY, draft.priority.as_str())
        .with(ASSIGNEE, draft.assignee.as_str())
        .with(DUE_DATE, draft.due_date.as_str())
        .with(TAGS, draft.tags.join(","))
}

pub fn kickoff_task_record(project_id: &str, id: &str) -> Record {
    let draft = TaskDraft {
        title: "Project Kick-off".to_string(),
        description: "Initial setup and planning for the project.".to_string(),
        task_type: "Planning".to_string(),
        priority: "High".to_string(),
        assignee: String::new(),
        due_date: String::new(),
        tags: vec!["kickoff".to_string(), "planning".to_string()],
    };
    new_task_record(project_id, 1, id, &draft)
}

pub fn next_sequence(tasks: &[KanbanTask]) -> u32 {
    tasks.iter().map(|task| task.sequence).max().unwrap_or(0) + 1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardColumn {
    pub status: TaskStatus,
    pub title: &'static str,
    pub tasks: Vec<KanbanTask>,
}

/// Tasks grouped by status column, each column ordered by sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    pub columns: Vec<BoardColumn>,
}

impl Board {
    /// Unknown statuses land in the `todo` column.
    pub fn from_tasks(mut tasks: Vec<KanbanTask>) -> Self {
        tasks.sort_by_key(|task| task.sequence);
        let mut columns: Vec<BoardColumn> = TaskStatus::ALL
            .into_iter()
            .map(|status| BoardColumn {
                status,
                title: status.title(),
                tasks: Vec::new(),
            })
            .collect();
        for task in tasks {
            let status = TaskStatus::parse(&task.status).unwrap_or(TaskStatus::Todo);
            columns[column_slot(status)].tasks.push(task);
        }
        Self { columns }
    }

    pub fn column(&self, status: TaskStatus) -> &[KanbanTask] {
        &self.columns[column_slot(status)].tasks
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|column| column.tasks.len()).sum()
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Vec<KanbanTask> {
        &mut self.columns[column_slot(status)].tasks
    }
}

fn column_slot(status: TaskStatus) -> usize {
    match status {
        TaskStatus::Todo => 0,
        TaskStatus::InProgress => 1,
        TaskStatus::Review => 2,
        TaskStatus::Done => 3,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BoardPosition {
    pub status: TaskStatus,
    pub index: usize,
}

/// Writes needed to persist one drag-and-drop move, plus the board as it
/// should look afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePlan {
    pub moved_row: SheetRow,
    pub new_status: Option<TaskStatus>,
    pub sequence_updates: Vec<SequenceUpdate>,
    pub board: Board,
}

/// `None` when nothing moves or the source slot is empty. The destination
/// index is clamped to the column length.
pub fn plan_move(board: &Board, from: BoardPosition, to: BoardPosition) -> Option<MovePlan> {
    if from == to {
        return None;
    }
    let mut next = board.clone();
    let source = next.column_mut(from.status);
    if from.index >= source.len() {
        return None;
    }
    let mut moved = source.remove(from.index);
    let moved_row = moved.sheet_row;

    let new_status = if from.status == to.status {
        None
    } else {
        moved.status = to.status.as_str().to_string();
        Some(to.status)
    };

    let destination = next.column_mut(to.status);
    let index = to.index.min(destination.len());
    destination.insert(index, moved);

    let mut sequence_updates = Vec::new();
    if new_status.is_some() {
        sequence_updates.extend(renumber(next.column_mut(from.status)));
    }
    sequence_updates.extend(renumber(next.column_mut(to.status)));

    Some(MovePlan {
        moved_row,
        new_status,
        sequence_updates,
        board: next,
    })
}

fn renumber(tasks: &mut [KanbanTask]) -> Vec<SequenceUpdate> {
    tasks
        .iter_mut()
        .enumerate()
        .map(|(idx, task)| {
            task.sequence = idx as u32 + 1;
            SequenceUpdate {
                sheet_row: task.sheet_row,
                sequence: task.sequence,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardFilter {
    pub team: Option<String>,
    pub priority: Option<String>,
    pub search: String,
}

/// Keeps tasks matching every set facet. Team is resolved through the
/// assignee's member row (`Name`, `Team`).
pub fn filter_board(board: &Board, members: &SheetData, filter: &BoardFilter) -> Board {
    let query = filter.search.to_lowercase();
    let team_of = |assignee: &str| -> String {
        members
            .data_rows()
            .find(|(_, row)| cell_at(row, Some(0)) == assignee)
            .map(|(_, row)| cell_at(row, Some(1)).to_string())
            .unwrap_or_default()
    };
    let columns = board
        .columns
        .iter()
        .map(|column| BoardColumn {
            status: column.status,
            title: column.title,
            tasks: column
                .tasks
                .iter()
                .filter(|task| {
                    let team_ok = filter
                        .team
                        .as_deref()
                        .map_or(true, |team| team_of(&task.assignee) == team);
                    let priority_ok = filter
                        .priority
                        .as_deref()
                        .map_or(true, |priority| task.priority == priority);
                    let search_ok = query.is_empty()
                        || task.title.to_lowercase().contains(&query)
                        || task.description.to_lowercase().contains(&query);
                    team_ok && priority_ok && search_ok
                })
                .cloned()
                .collect(),
        })
        .collect();
    Board { columns }
}
