use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::entities::grid::BatchRequest;
use crate::domain::entities::kanban::{
    filter_board, new_task_record, next_sequence, parse_tasks, plan_move, task_id, Board,
    BoardFilter, BoardPosition, KanbanTask, SequenceUpdate, TaskDraft, TaskPatch, SEQUENCE,
    KANBAN_HEADERS,
};
use crate::domain::entities::sheet::{header_index, SheetData, SheetId, SheetRow, KANBAN_TASKS, MEMBERS};
use crate::domain::entities::ticket::STATUS;
use crate::usecase::action::{ActionError, ActionResult};
use crate::usecase::ports::clock::Clock;
use crate::usecase::ports::row_store::RowStore;
use crate::usecase::services::{require_data_row, require_existing_row};

const NO_KANBAN_DATA: &str = "No kanban data found to update.";

pub struct KanbanService {
    store: Arc<dyn RowStore>,
    clock: Arc<dyn Clock>,
}

impl KanbanService {
    pub fn new(store: Arc<dyn RowStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn tasks(&self, project_id: &str) -> ActionResult<Vec<KanbanTask>> {
        let sheet = self.store.sheet_data(KANBAN_TASKS)?;
        Ok(parse_tasks(&sheet, project_id)?)
    }

    pub fn board(&self, project_id: &str) -> ActionResult<Board> {
        Ok(Board::from_tasks(self.tasks(project_id)?))
    }

    pub fn filtered_board(&self, project_id: &str, filter: &BoardFilter) -> ActionResult<Board> {
        let board = self.board(project_id)?;
        let members = self.store.sheet_data(MEMBERS)?;
        Ok(filter_board(&board, &members, filter))
    }

    /// Appends a `todo` task after the last sequence of the project. Returns
    /// the new task id.
    pub fn add_task(&self, project_id: &str, draft: &TaskDraft) -> ActionResult<String> {
        if draft.title.trim().is_empty() {
            return Err(ActionError::invalid("Task title is required."));
        }
        let existing = self.tasks(project_id)?;
        let sequence = next_sequence(&existing);
        let id = task_id(self.clock.now());

        self.store.ensure_headers(KANBAN_TASKS, &KANBAN_HEADERS)?;
        self.store
            .append_row(KANBAN_TASKS, &new_task_record(project_id, sequence, &id, draft))?;
        info!(project_id, task_id = %id, sequence, "task added");
        Ok(id)
    }

    /// Writes the fields set in `patch`. Fields whose column is missing are
    /// skipped.
    pub fn update_task(&self, row: SheetRow, patch: &TaskPatch) -> ActionResult<()> {
        require_data_row(row)?;
        let (sheet_id, data) = self.kanban_sheet()?;
        require_existing_row(&data, row)?;
        let requests: Vec<BatchRequest> = patch
            .to_record()
            .iter()
            .filter_map(|(header, value)| {
                header_index(data.headers(), header)
                    .map(|col| BatchRequest::set_cell(sheet_id, row, col, value))
            })
            .collect();
        if requests.is_empty() {
            debug!(%row, "task patch had nothing to write");
            return Ok(());
        }
        self.store.batch_update(&requests)?;
        Ok(())
    }

    /// Writes many sequence numbers in one batch.
    pub fn resequence(&self, updates: &[SequenceUpdate]) -> ActionResult<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let (sheet_id, data) = self.kanban_sheet()?;
        let requests = sequence_requests(sheet_id, &data, updates)?;
        self.store.batch_update(&requests)?;
        Ok(())
    }

    pub fn update_status(&self, row: SheetRow, status: &str) -> ActionResult<()> {
        require_data_row(row)?;
        if status.trim().is_empty() {
            return Err(ActionError::invalid("Status is required."));
        }
        let (sheet_id, data) = self.kanban_sheet()?;
        require_existing_row(&data, row)?;
        let status_idx = status_column(&data)?;
        self.store
            .batch_update(&[BatchRequest::set_cell(sheet_id, row, status_idx, status)])?;
        Ok(())
    }

    pub fn delete_task(&self, row: SheetRow) -> ActionResult<()> {
        let (sheet_id, data) = self.kanban_sheet()?;
        require_existing_row(&data, row)?;
        self.store
            .batch_update(&[BatchRequest::delete_row(sheet_id, row)])?;
        info!(%row, "task deleted");
        Ok(())
    }

    /// Applies a drag-and-drop move. The status change and the renumbering
    /// land in one batch. Returns the board after the move.
    pub fn move_task(
        &self,
        project_id: &str,
        from: BoardPosition,
        to: BoardPosition,
    ) -> ActionResult<Board> {
        let board = self.board(project_id)?;
        let Some(plan) = plan_move(&board, from, to) else {
            return Ok(board);
        };

        let (sheet_id, data) = self.kanban_sheet()?;
        let mut requests = Vec::new();
        if let Some(status) = plan.new_status {
            let status_idx = status_column(&data)?;
            requests.push(BatchRequest::set_cell(
                sheet_id,
                plan.moved_row,
                status_idx,
                status.as_str(),
            ));
        }
        requests.extend(sequence_requests(sheet_id, &data, &plan.sequence_updates)?);
        self.store.batch_update(&requests)?;

        debug!(
            project_id,
            row = %plan.moved_row,
            writes = requests.len(),
            "task moved"
        );
        Ok(plan.board)
    }

    fn kanban_sheet(&self) -> ActionResult<(SheetId, SheetData)> {
        let data = self.store.sheet_data(KANBAN_TASKS)?;
        if data.is_empty() {
            return Err(ActionError::not_found(NO_KANBAN_DATA));
        }
        Ok((self.store.sheet_id(KANBAN_TASKS)?, data))
    }
}

fn status_column(data: &SheetData) -> ActionResult<usize> {
    data.column_index(STATUS)
        .ok_or_else(|| ActionError::missing_column("Status column not found in KanbanTasks."))
}

fn sequence_requests(
    sheet_id: SheetId,
    data: &SheetData,
    updates: &[SequenceUpdate],
) -> ActionResult<Vec<BatchRequest>> {
    let Some(sequence_idx) = data.column_index(SEQUENCE) else {
        return Err(ActionError::missing_column("Sequence column not found."));
    };
    updates
        .iter()
        .map(|update| {
            require_existing_row(data, update.sheet_row)?;
            Ok(BatchRequest::set_cell(
                sheet_id,
                update.sheet_row,
                sequence_idx,
                update.sequence.to_string(),
            ))
        })
        .collect()
}
