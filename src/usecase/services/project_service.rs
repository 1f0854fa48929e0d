use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::entities::grid::BatchRequest;
use crate::domain::entities::kanban::{kickoff_task_record, task_id, KANBAN_HEADERS};
use crate::domain::entities::project::{new_project_record, project_id, KANBAN_INITIALIZED};
use crate::domain::entities::sheet::{header_index, Record, SheetData, SheetRow, KANBAN_TASKS, PROJECTS};
use crate::usecase::action::{ActionError, ActionResult};
use crate::usecase::ports::clock::Clock;
use crate::usecase::ports::row_store::RowStore;
use crate::usecase::services::{prepare_project_sheet, require_data_row, require_existing_row};

pub struct ProjectService {
    store: Arc<dyn RowStore>,
    clock: Arc<dyn Clock>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn RowStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn projects(&self) -> ActionResult<SheetData> {
        Ok(self.store.sheet_data(PROJECTS)?)
    }

    /// Creates a project with no source ticket. Returns the new project id.
    pub fn create_manual_project(&self, title: &str) -> ActionResult<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ActionError::invalid("Project title is required."));
        }
        prepare_project_sheet(self.store.as_ref())?;
        let project_id = project_id(self.clock.now());
        self.store
            .append_row(PROJECTS, &new_project_record(&project_id, title, ""))?;
        info!(%project_id, "manual project created");
        Ok(project_id)
    }

    /// Writes the given cells into a project row. Headers the sheet does not
    /// have are skipped.
    pub fn update_project(&self, row: SheetRow, values: &Record) -> ActionResult<()> {
        require_data_row(row)?;
        let data = self.store.sheet_data(PROJECTS)?;
        if data.is_empty() {
            return Err(ActionError::not_found("No projects found to update."));
        }
        require_existing_row(&data, row)?;
        let sheet_id = self.store.sheet_id(PROJECTS)?;
        let requests: Vec<BatchRequest> = values
            .iter()
            .filter_map(|(header, value)| match header_index(data.headers(), header) {
                Some(col) => Some(BatchRequest::set_cell(sheet_id, row, col, value)),
                None => {
                    debug!(header, "project column not found, skipped");
                    None
                }
            })
            .collect();
        if requests.is_empty() {
            return Ok(());
        }
        self.store.batch_update(&requests)?;
        Ok(())
    }

    /// Seeds the Kanban sheet with a kick-off task for the project and flags
    /// the project row as initialized.
    pub fn initialize_kanban(&self, row: SheetRow, project_id: &str) -> ActionResult<()> {
        require_data_row(row)?;
        if project_id.trim().is_empty() {
            return Err(ActionError::invalid("Project ID is required."));
        }
        self.store.ensure_headers(KANBAN_TASKS, &KANBAN_HEADERS)?;
        let task = kickoff_task_record(project_id, &task_id(self.clock.now()));
        self.store.append_row(KANBAN_TASKS, &task)?;

        self.update_project(row, &Record::new().with(KANBAN_INITIALIZED, "Yes"))?;
        info!(project_id, "kanban initialized");
        Ok(())
    }
}
