use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::entities::form::{build_submission, questions_for_team, Answer, FormQuestion};
use crate::domain::entities::grid::BatchRequest;
use crate::domain::entities::project::{carry_ticket_columns, new_project_record, project_id};
use crate::domain::entities::sheet::{
    header_index, Record, SheetData, SheetRow, FORM_QUESTIONS, PROJECTS, TICKETS,
};
use crate::domain::entities::ticket::{
    created_date, new_ticket_record, ticket_id, STATUS, STATUS_COMPLETED, TICKET_ID,
};
use crate::usecase::action::{ActionError, ActionResult};
use crate::usecase::ports::clock::Clock;
use crate::usecase::ports::row_store::RowStore;
use crate::usecase::services::{prepare_project_sheet, require_data_row, require_existing_row};

pub struct TicketService {
    store: Arc<dyn RowStore>,
    clock: Arc<dyn Clock>,
    utc_offset_hours: i32,
}

impl TicketService {
    pub fn new(store: Arc<dyn RowStore>, clock: Arc<dyn Clock>, utc_offset_hours: i32) -> Self {
        Self {
            store,
            clock,
            utc_offset_hours,
        }
    }

    /// Appends the answers with a generated id and timestamp. Returns the
    /// row as written.
    pub fn submit_ticket(&self, answers: Record) -> ActionResult<Record> {
        let now = self.clock.now();
        let record = new_ticket_record(
            answers,
            &ticket_id(now),
            &created_date(now, self.utc_offset_hours),
        );
        self.store.append_row(TICKETS, &record)?;
        info!(ticket_id = record.get(TICKET_ID).unwrap_or(""), "ticket submitted");
        Ok(record)
    }

    /// Validates answers against the questions of every selected team, then
    /// submits them.
    pub fn submit_form(
        &self,
        teams: &[String],
        work_type: &str,
        answers: &BTreeMap<String, Answer>,
    ) -> ActionResult<Record> {
        if teams.is_empty() {
            return Err(ActionError::invalid("At least one team is required."));
        }
        let sheet = self.store.sheet_data(FORM_QUESTIONS)?;
        let mut questions: Vec<FormQuestion> = Vec::new();
        for team in teams {
            for question in questions_for_team(&sheet, team)? {
                if !questions
                    .iter()
                    .any(|existing| existing.question_text == question.question_text)
                {
                    questions.push(question);
                }
            }
        }
        let record = build_submission(&questions, teams, work_type, answers)?;
        self.submit_ticket(record)
    }

    pub fn all_tickets(&self) -> ActionResult<SheetData> {
        Ok(self.store.sheet_data(TICKETS)?)
    }

    /// Writes each header/value pair into `row`, creating missing columns.
    pub fn update_ticket(&self, row: SheetRow, values: &Record) -> ActionResult<()> {
        require_data_row(row)?;
        let data = self.store.sheet_data(TICKETS)?;
        if data.is_empty() {
            return Err(ActionError::not_found("No tickets found to update."));
        }
        require_existing_row(&data, row)?;
        let sheet_id = self.store.sheet_id(TICKETS)?;
        let mut headers = data.headers().to_vec();

        let mut requests = Vec::new();
        for (header, value) in values.iter() {
            let col = match header_index(&headers, header) {
                Some(col) => col,
                None => {
                    self.store.add_column(TICKETS, header)?;
                    headers = self.store.sheet_data(TICKETS)?.headers().to_vec();
                    match header_index(&headers, header) {
                        Some(col) => col,
                        None => {
                            warn!(header, "could not find or create ticket column");
                            continue;
                        }
                    }
                }
            };
            requests.push(BatchRequest::set_cell(sheet_id, row, col, value));
        }

        if requests.is_empty() {
            return Ok(());
        }
        self.store.batch_update(&requests)?;
        Ok(())
    }

    /// Turns a ticket into a project row and marks the ticket completed.
    /// Returns the new project id.
    pub fn create_project_from_ticket(
        &self,
        row: SheetRow,
        ticket_values: &[String],
        title: &str,
    ) -> ActionResult<String> {
        require_data_row(row)?;
        if title.trim().is_empty() {
            return Err(ActionError::invalid("Project title is required."));
        }
        let tickets = self.store.sheet_data(TICKETS)?;
        require_existing_row(&tickets, row)?;
        let ticket_headers = tickets.headers();
        let Some(ticket_id_idx) = header_index(ticket_headers, TICKET_ID) else {
            return Err(ActionError::missing_column(
                "Ticket ID column not found in the source sheet.",
            ));
        };
        let ticket_id = ticket_values
            .get(ticket_id_idx)
            .map(String::as_str)
            .unwrap_or("");

        let project_headers = prepare_project_sheet(self.store.as_ref())?;
        let project_id = project_id(self.clock.now());
        let mut record = new_project_record(&project_id, title, ticket_id);
        carry_ticket_columns(&mut record, ticket_headers, ticket_values, &project_headers);

        self.store.append_row(PROJECTS, &record)?;
        self.update_ticket(row, &Record::new().with(STATUS, STATUS_COMPLETED))?;
        info!(%project_id, ticket_id, "project created from ticket");
        Ok(project_id)
    }

    /// Same as [`Self::create_project_from_ticket`] with the ticket read
    /// from the sheet.
    pub fn promote_ticket(&self, row: SheetRow, title: &str) -> ActionResult<String> {
        let tickets = self.store.sheet_data(TICKETS)?;
        let values = tickets
            .row(row)
            .map(<[String]>::to_vec)
            .ok_or_else(|| ActionError::not_found(format!("Ticket row {row} not found.")))?;
        self.create_project_from_ticket(row, &values, title)
    }
}
