pub mod assignment_service;
pub mod dashboard_service;
pub mod form_service;
pub mod kanban_service;
pub mod member_service;
pub mod project_service;
pub mod ticket_service;
pub mod work_type_service;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::entities::project::{PROJECT_HEADERS, REQUIRED_PROJECT_COLUMNS};
use crate::domain::entities::roster::WorkTypes;
use crate::domain::entities::sheet::{header_index, SheetData, SheetRow, PROJECTS};
use crate::usecase::action::{ActionError, ActionResult};
use crate::usecase::ports::clock::Clock;
use crate::usecase::ports::row_store::RowStore;

use assignment_service::AssignmentService;
use dashboard_service::DashboardService;
use form_service::FormService;
use kanban_service::KanbanService;
use member_service::MemberService;
use project_service::ProjectService;
use ticket_service::TicketService;
use work_type_service::WorkTypeService;

/// Every action service, wired to one store and clock.
pub struct Services {
    pub tickets: TicketService,
    pub projects: ProjectService,
    pub kanban: KanbanService,
    pub forms: FormService,
    pub members: MemberService,
    pub work_types: WorkTypeService,
    pub assignments: AssignmentService,
    pub dashboards: DashboardService,
}

impl Services {
    pub fn new(store: Arc<dyn RowStore>, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        let defaults = WorkTypes {
            question: config.work_type_question.clone(),
            options: config.work_type_options.clone(),
        };
        Self {
            tickets: TicketService::new(store.clone(), clock.clone(), config.utc_offset_hours),
            projects: ProjectService::new(store.clone(), clock.clone()),
            kanban: KanbanService::new(store.clone(), clock.clone()),
            forms: FormService::new(store.clone()),
            members: MemberService::new(store.clone(), config.predefined_teams.clone()),
            work_types: WorkTypeService::new(store.clone(), defaults),
            assignments: AssignmentService::new(store.clone()),
            dashboards: DashboardService::new(store, clock, config.utc_offset_hours),
        }
    }
}

/// Row-level writes never touch the header row.
pub(crate) fn require_data_row(row: SheetRow) -> ActionResult<()> {
    if row.is_data_row() {
        Ok(())
    } else {
        Err(ActionError::invalid(format!(
            "Row {row} is not a data row."
        )))
    }
}

/// The target row must already exist in `data`. Writes past the last row
/// would otherwise grow the sheet.
pub(crate) fn require_existing_row(data: &SheetData, row: SheetRow) -> ActionResult<()> {
    require_data_row(row)?;
    if row.grid_index() < data.values.len() {
        Ok(())
    } else {
        Err(ActionError::not_found(format!("Row {row} not found.")))
    }
}

/// Gives the projects sheet its header row, or adds the columns a project
/// row cannot do without. Returns the resulting headers.
pub(crate) fn prepare_project_sheet(store: &dyn RowStore) -> ActionResult<Vec<String>> {
    if !store.ensure_headers(PROJECTS, &PROJECT_HEADERS)? {
        let headers = store.sheet_data(PROJECTS)?.headers().to_vec();
        for required in REQUIRED_PROJECT_COLUMNS {
            if header_index(&headers, required).is_none() {
                store.add_column(PROJECTS, required)?;
            }
        }
    }
    Ok(store.sheet_data(PROJECTS)?.headers().to_vec())
}
