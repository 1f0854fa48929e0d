use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::entities::assignment::{collect_assigned, AssignedTask, TaskSource};
use crate::domain::entities::grid::BatchRequest;
use crate::domain::entities::sheet::SheetRow;
use crate::domain::entities::ticket::STATUS;
use crate::usecase::action::{ActionError, ActionResult};
use crate::usecase::ports::row_store::RowStore;
use crate::usecase::services::require_existing_row;

const SOURCES: [TaskSource; 3] = [TaskSource::Ticket, TaskSource::Project, TaskSource::KanbanTask];

/// "My tasks": everything assigned to one person across tickets, projects
/// and Kanban tasks.
pub struct AssignmentService {
    store: Arc<dyn RowStore>,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub fn assigned_tasks(&self, assignee: &str) -> ActionResult<Vec<AssignedTask>> {
        if assignee.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut tasks = Vec::new();
        for source in SOURCES {
            let sheet = self.store.sheet_data(source.sheet_name())?;
            let found = collect_assigned(source, &sheet, assignee);
            debug!(?source, count = found.len(), "assigned rows collected");
            tasks.extend(found);
        }
        Ok(tasks)
    }

    /// Sets `Status` on a row of the source sheet, creating the column first
    /// when the sheet has none.
    pub fn update_assigned_status(
        &self,
        source: TaskSource,
        row: SheetRow,
        status: &str,
    ) -> ActionResult<()> {
        let sheet_name = source.sheet_name();
        let mut data = self.store.sheet_data(sheet_name)?;
        if data.is_empty() {
            return Err(ActionError::not_found(format!(
                "Sheet \"{sheet_name}\" not found or is empty."
            )));
        }
        require_existing_row(&data, row)?;

        let status_idx = match data.column_index(STATUS) {
            Some(idx) => idx,
            None => {
                self.store.add_column(sheet_name, STATUS)?;
                info!(sheet = sheet_name, "status column created");
                data = self.store.sheet_data(sheet_name)?;
                data.column_index(STATUS).ok_or_else(|| {
                    ActionError::missing_column(format!(
                        "Failed to create and find Status column in \"{sheet_name}\"."
                    ))
                })?
            }
        };

        let sheet_id = self.store.sheet_id(sheet_name)?;
        self.store
            .batch_update(&[BatchRequest::set_cell(sheet_id, row, status_idx, status)])?;
        Ok(())
    }
}
