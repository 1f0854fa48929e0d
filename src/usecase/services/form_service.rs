use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::entities::form::{
    distinct_teams, questions_for_team, FormQuestion, FORM_HEADERS, PLACEHOLDER_QUESTION,
    QUESTION_TEXT,
};
use crate::domain::entities::grid::BatchRequest;
use crate::domain::entities::sheet::{cell_at, Record, SheetRow, FORM_QUESTIONS};
use crate::domain::entities::ticket::TEAM;
use crate::usecase::action::{ActionError, ActionResult};
use crate::usecase::ports::row_store::RowStore;

/// Per-team question lists kept in the `FormQuestions` sheet, one
/// `(Team, QuestionText)` row per question.
pub struct FormService {
    store: Arc<dyn RowStore>,
}

impl FormService {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    /// Questions for one team. An empty sheet gets its header row and yields
    /// no questions; so does a sheet without the expected columns.
    pub fn form_questions(&self, team: &str) -> ActionResult<Vec<FormQuestion>> {
        if team.is_empty() {
            return Ok(Vec::new());
        }
        let sheet = self.store.sheet_data(FORM_QUESTIONS)?;
        if sheet.is_empty() {
            self.store.ensure_headers(FORM_QUESTIONS, &FORM_HEADERS)?;
            return Ok(Vec::new());
        }
        match questions_for_team(&sheet, team) {
            Ok(questions) => Ok(questions),
            Err(err) => {
                warn!(team, error = %err, "form questions sheet is malformed");
                Ok(Vec::new())
            }
        }
    }

    pub fn teams(&self) -> ActionResult<Vec<String>> {
        let sheet = self.store.sheet_data(FORM_QUESTIONS)?;
        Ok(distinct_teams(&sheet))
    }

    /// A team exists once it has a question, so this adds a placeholder.
    pub fn add_team(&self, name: &str) -> ActionResult<()> {
        self.add_question(name, PLACEHOLDER_QUESTION)?;
        info!(team = name, "team added");
        Ok(())
    }

    pub fn add_question(&self, team: &str, text: &str) -> ActionResult<()> {
        if team.is_empty() || text.is_empty() {
            return Err(ActionError::invalid(
                "Team and question text cannot be empty.",
            ));
        }
        self.store.ensure_headers(FORM_QUESTIONS, &FORM_HEADERS)?;
        self.store.append_row(
            FORM_QUESTIONS,
            &Record::new().with(TEAM, team).with(QUESTION_TEXT, text),
        )?;
        Ok(())
    }

    pub fn update_question(&self, team: &str, original: &str, new_text: &str) -> ActionResult<()> {
        if new_text.is_empty() {
            return Err(ActionError::invalid("New question text cannot be empty."));
        }
        let (row, text_idx) = self.find_question(team, original)?;
        let sheet_id = self.store.sheet_id(FORM_QUESTIONS)?;
        self.store
            .batch_update(&[BatchRequest::set_cell(sheet_id, row, text_idx, new_text)])?;
        Ok(())
    }

    pub fn delete_question(&self, team: &str, text: &str) -> ActionResult<()> {
        let (row, _) = self.find_question(team, text)?;
        let sheet_id = self.store.sheet_id(FORM_QUESTIONS)?;
        self.store
            .batch_update(&[BatchRequest::delete_row(sheet_id, row)])?;
        Ok(())
    }

    fn find_question(&self, team: &str, text: &str) -> ActionResult<(SheetRow, usize)> {
        let sheet = self.store.sheet_data(FORM_QUESTIONS)?;
        if sheet.is_empty() {
            return Err(ActionError::not_found("FormQuestions is empty or not found."));
        }
        let (Some(team_idx), Some(text_idx)) =
            (sheet.column_index(TEAM), sheet.column_index(QUESTION_TEXT))
        else {
            return Err(ActionError::missing_column(
                "Required columns (Team, QuestionText) not found in FormQuestions.",
            ));
        };
        let row = sheet
            .data_rows()
            .find(|(_, row)| {
                cell_at(row, Some(team_idx)) == team && cell_at(row, Some(text_idx)) == text
            })
            .map(|(sheet_row, _)| sheet_row)
            .ok_or_else(|| {
                ActionError::not_found(format!(
                    "Question \"{text}\" for team \"{team}\" not found."
                ))
            })?;
        Ok((row, text_idx))
    }
}
