use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::entities::sheet::{cell_at, Record, SheetData};
use crate::domain::entities::ticket::{TEAM, WORK_TYPE};

pub const QUESTION_TEXT: &str = "QuestionText";
pub const FORM_HEADERS: [&str; 2] = [TEAM, QUESTION_TEXT];
pub const PLACEHOLDER_QUESTION: &str = "Default placeholder question (can be deleted)";

static SELECT_OPTIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(select:\s*(.*?)\)").expect("select pattern is valid"));
static CHECKBOX_OPTIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(checkbox:\s*(.*?)\)").expect("checkbox pattern is valid"));
static OPTION_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s\((select:|checkbox:).*?\)").expect("option suffix pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    Text,
    Textarea,
    Select,
    Checkbox,
    Date,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormQuestion {
    pub id: String,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
}

impl FormQuestion {
    pub fn is_required(&self) -> bool {
        self.question_text.ends_with('*')
    }

    /// Question text without the required marker or option list.
    pub fn label(&self) -> String {
        let text = self.question_text.strip_suffix('*').unwrap_or(&self.question_text);
        OPTION_SUFFIX.replace_all(text, "").into_owned()
    }
}

/// Field type implied by a header. Explicit markers win over keywords.
pub fn infer_question_type(header: &str) -> (QuestionType, Vec<String>) {
    let lower = header.to_lowercase();

    if lower.contains("(select:") {
        return (QuestionType::Select, captured_options(&SELECT_OPTIONS, header));
    }
    if lower.contains("(checkbox:") {
        return (QuestionType::Checkbox, captured_options(&CHECKBOX_OPTIONS, header));
    }
    if lower.contains("(textarea)") {
        return (QuestionType::Textarea, Vec::new());
    }
    if lower.contains("(url)") {
        return (QuestionType::Url, Vec::new());
    }
    if lower.contains("date") {
        return (QuestionType::Date, Vec::new());
    }
    if lower.contains("describe") || lower.contains("detail") {
        return (QuestionType::Textarea, Vec::new());
    }
    if lower.contains("link") {
        return (QuestionType::Url, Vec::new());
    }
    (QuestionType::Text, Vec::new())
}

fn captured_options(pattern: &Regex, header: &str) -> Vec<String> {
    pattern
        .captures(header)
        .and_then(|captures| captures.get(1))
        .map(|options| {
            options
                .as_str()
                .split(';')
                .map(|option| option.trim().to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Required columns (Team, QuestionText) not found in FormQuestions.")]
pub struct MissingFormColumns;

/// Questions configured for `team`, ids taken from the data position.
pub fn questions_for_team(sheet: &SheetData, team: &str) -> Result<Vec<FormQuestion>, MissingFormColumns> {
    let (Some(team_idx), Some(text_idx)) =
        (sheet.column_index(TEAM), sheet.column_index(QUESTION_TEXT))
    else {
        return Err(MissingFormColumns);
    };

    let questions = sheet
        .data_rows()
        .enumerate()
        .filter(|(_, (_, row))| cell_at(row, Some(team_idx)) == team)
        .map(|(position, (_, row))| {
            let text = cell_at(row, Some(text_idx)).to_string();
            let (question_type, options) = infer_question_type(&text);
            FormQuestion {
                id: format!("col-{}", position + 1),
                question_text: text,
                question_type,
                options,
            }
        })
        .collect();
    Ok(questions)
}

/// Distinct non-empty team names in first-seen order.
pub fn distinct_teams(sheet: &SheetData) -> Vec<String> {
    let team_idx = sheet.column_index(TEAM).unwrap_or(0);
    let mut teams: Vec<String> = Vec::new();
    for (_, row) in sheet.data_rows() {
        let team = cell_at(row, Some(team_idx));
        if !team.is_empty() && !teams.iter().any(|existing| existing == team) {
            teams.push(team.to_string());
        }
    }
    teams
}

/// One submitted value for a question.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Choices(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("\"{0}\" is required.")]
    MissingAnswer(String),
    #[error("\"{question}\" expects a date, got \"{value}\".")]
    InvalidDate { question: String, value: String },
    #[error("\"{question}\" has no option \"{value}\".")]
    UnknownOption { question: String, value: String },
    #[error("\"{0}\" takes a single option.")]
    SingleChoice(String),
}

/// Builds the ticket answers for a form submission: team and work type
/// first, then one column per question in question order.
pub fn build_submission(
    questions: &[FormQuestion],
    teams: &[String],
    work_type: &str,
    answers: &BTreeMap<String, Answer>,
) -> Result<Record, SubmissionError> {
    let mut record = Record::new()
        .with(TEAM, teams.join(", "))
        .with(WORK_TYPE, work_type);

    for question in questions {
        let value = match answers.get(&question.question_text) {
            None => String::new(),
            Some(Answer::Text(text)) => match question.question_type {
                QuestionType::Date if !text.trim().is_empty() => normalize_answer_date(text)
                    .ok_or_else(|| SubmissionError::InvalidDate {
                        question: question.label(),
                        value: text.clone(),
                    })?,
                QuestionType::Checkbox | QuestionType::Select => {
                    checked_options(question, std::slice::from_ref(text))?
                }
                _ => text.trim().to_string(),
            },
            Some(Answer::Choices(choices)) => {
                let picked = choices.iter().filter(|choice| !choice.trim().is_empty()).count();
                if question.question_type == QuestionType::Select && picked > 1 {
                    return Err(SubmissionError::SingleChoice(question.label()));
                }
                checked_options(question, choices)?
            }
        };
        if value.is_empty() && question.is_required() {
            return Err(SubmissionError::MissingAnswer(question.label()));
        }
        record.set(question.question_text.as_str(), value);
    }
    Ok(record)
}

fn checked_options(question: &FormQuestion, choices: &[String]) -> Result<String, SubmissionError> {
    let mut picked = Vec::new();
    for choice in choices.iter().map(|choice| choice.trim()).filter(|c| !c.is_empty()) {
        if !question.options.is_empty() && !question.options.iter().any(|option| option == choice) {
            return Err(SubmissionError::UnknownOption {
                question: question.label(),
                value: choice.to_string(),
            });
        }
        picked.push(choice);
    }
    // Options keep the order they are declared in, not the order picked.
    if !question.options.is_empty() {
        picked.sort_by_key(|choice| question.options.iter().position(|option| option == choice));
    }
    Ok(picked.join(", "))
}

/// `YYYY-MM-DD` from an ISO date, an RFC 3339 timestamp, or `MM/DD/YYYY`.
pub fn normalize_answer_date(value: &str) -> Option<String> {
    let value = value.trim();
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(value, "%m/%d/%Y").ok())?;
    Some(date.format("%Y-%m-%d").to_string())
}
