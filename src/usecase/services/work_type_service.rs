use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::entities::grid::BatchRequest;
use crate::domain::entities::roster::{find_work_type_row, WorkTypes};
use crate::domain::entities::sheet::{Record, SheetRow, WORK_TYPES};
use crate::usecase::action::{ActionError, ActionResult};
use crate::usecase::ports::row_store::RowStore;

/// Work-type question and options. The question is the header cell of the
/// `WorkTypes` sheet and each option is a row in its first column.
pub struct WorkTypeService {
    store: Arc<dyn RowStore>,
    defaults: WorkTypes,
}

impl WorkTypeService {
    pub fn new(store: Arc<dyn RowStore>, defaults: WorkTypes) -> Self {
        Self { store, defaults }
    }

    /// Never fails: store errors are logged and the defaults returned.
    pub fn work_types(&self) -> WorkTypes {
        match self.load_or_seed() {
            Ok(work_types) => work_types,
            Err(err) => {
                warn!(error = %err, "falling back to default work types");
                self.defaults.clone()
            }
        }
    }

    fn load_or_seed(&self) -> ActionResult<WorkTypes> {
        let mut sheet = self.store.sheet_data(WORK_TYPES)?;
        if sheet.is_empty() {
            let question = self.defaults.question.as_str();
            self.store.ensure_headers(WORK_TYPES, &[question])?;
            for option in &self.defaults.options {
                self.store
                    .append_row(WORK_TYPES, &Record::new().with(question, option.as_str()))?;
            }
            info!(options = self.defaults.options.len(), "work types seeded");
            sheet = self.store.sheet_data(WORK_TYPES)?;
        }

        let mut work_types = WorkTypes::from_sheet(&sheet).ok_or_else(|| {
            ActionError::not_found("Work types sheet is not configured correctly.")
        })?;
        if work_types.question.is_empty() {
            work_types.question = self.defaults.question.clone();
        }
        Ok(work_types)
    }

    pub fn add_option(&self, option: &str) -> ActionResult<()> {
        if option.trim().is_empty() {
            return Err(ActionError::invalid("Work type option cannot be empty."));
        }
        let sheet = self.store.sheet_data(WORK_TYPES)?;
        let Some(question) = sheet.headers().first() else {
            return Err(ActionError::not_found(
                "Work types sheet not found or is empty.",
            ));
        };
        self.store
            .append_row(WORK_TYPES, &Record::new().with(question.as_str(), option))?;
        Ok(())
    }

    pub fn update_option(&self, original: &str, new_option: &str) -> ActionResult<()> {
        if new_option.trim().is_empty() {
            return Err(ActionError::invalid("Work type option cannot be empty."));
        }
        let row = self.find_option(original)?;
        let sheet_id = self.store.sheet_id(WORK_TYPES)?;
        self.store
            .batch_update(&[BatchRequest::set_cell(sheet_id, row, 0, new_option)])?;
        Ok(())
    }

    pub fn delete_option(&self, option: &str) -> ActionResult<()> {
        let row = self.find_option(option)?;
        let sheet_id = self.store.sheet_id(WORK_TYPES)?;
        self.store
            .batch_update(&[BatchRequest::delete_row(sheet_id, row)])?;
        Ok(())
    }

    pub fn update_question(&self, question: &str) -> ActionResult<()> {
        if question.trim().is_empty() {
            return Err(ActionError::invalid("Work type question cannot be empty."));
        }
        let sheet_id = self.store.sheet_id(WORK_TYPES)?;
        self.store.batch_update(&[BatchRequest::set_cell(
            sheet_id,
            SheetRow::HEADER,
            0,
            question,
        )])?;
        Ok(())
    }

    fn find_option(&self, option: &str) -> ActionResult<SheetRow> {
        let sheet = self.store.sheet_data(WORK_TYPES)?;
        if sheet.is_empty() {
            return Err(ActionError::not_found("WorkTypes is empty."));
        }
        find_work_type_row(&sheet, option)
            .ok_or_else(|| ActionError::not_found(format!("Option \"{option}\" not found.")))
    }
}
