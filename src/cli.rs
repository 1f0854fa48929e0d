use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::config;
use crate::domain::entities::assignment::TaskSource;
use crate::domain::entities::dashboard::{ProjectFilter, TicketFilter};
use crate::domain::entities::form::Answer;
use crate::domain::entities::kanban::{
    split_tags, BoardFilter, BoardPosition, SequenceUpdate, TaskDraft, TaskPatch, TaskStatus,
    DEFAULT_PRIORITY, DEFAULT_TYPE,
};
use crate::domain::entities::sheet::{Record, SheetRow};
use crate::infra::import::csv::{export_csv_sheet, import_csv_sheet};
use crate::infra::import::xlsx::import_xlsx_sheets;
use crate::infra::sqlite::repo::SqliteRowStore;
use crate::usecase::action::{ActionError, ActionOutcome};
use crate::usecase::ports::clock::SystemClock;
use crate::usecase::ports::row_store::{RowStore, StoreError};
use crate::usecase::services::Services;

#[derive(Debug, Parser)]
#[command(name = "sheetflow")]
#[command(about = "Tickets, projects and Kanban boards kept in spreadsheet rows", long_about = None)]
pub struct Cli {
    /// JSON config file (defaults to config.json in the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Workbook file, overrides SHEETFLOW_DB and the config file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the sheets of the workbook
    Sheets,
    /// Print every row of a sheet
    Show { sheet: String },
    /// Replace a sheet with the contents of a CSV file
    ImportCsv {
        path: PathBuf,
        /// Target sheet (defaults to the file stem)
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Replace sheets with the tabs of an XLSX workbook
    ImportXlsx {
        path: PathBuf,
        /// Tabs to import (all when omitted)
        #[arg(long = "sheet")]
        sheets: Vec<String>,
    },
    /// Write a sheet to a CSV file
    ExportCsv { sheet: String, path: PathBuf },
    AddColumn { sheet: String, header: String },
    RenameColumn { sheet: String, old: String, new: String },
    DeleteColumn { sheet: String, header: String },

    /// Append a ticket from raw HEADER=VALUE pairs
    SubmitTicket {
        #[arg(long = "set", value_parser = parse_pair)]
        values: Vec<(String, String)>,
    },
    /// Validate answers against the team forms, then append a ticket
    SubmitForm {
        #[arg(long = "team", required = true)]
        teams: Vec<String>,
        #[arg(long)]
        work_type: String,
        /// QUESTION=VALUE; repeat a question to pick several checkboxes
        #[arg(long = "answer", value_parser = parse_pair)]
        answers: Vec<(String, String)>,
    },
    Tickets,
    UpdateTicket {
        row: usize,
        #[arg(long = "set", value_parser = parse_pair)]
        values: Vec<(String, String)>,
    },
    /// Create a project from a ticket row and complete the ticket
    PromoteTicket { row: usize, title: String },

    Projects,
    CreateProject { title: String },
    UpdateProject {
        row: usize,
        #[arg(long = "set", value_parser = parse_pair)]
        values: Vec<(String, String)>,
    },
    InitKanban { row: usize, project_id: String },

    Tasks { project_id: String },
    Board {
        project_id: String,
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
    },
    AddTask(AddTaskArgs),
    UpdateTask(UpdateTaskArgs),
    /// Rewrite sequence numbers, given as ROW=SEQUENCE
    Resequence {
        #[arg(value_parser = parse_sequence)]
        updates: Vec<SequenceUpdate>,
    },
    UpdateStatus { row: usize, status: String },
    DeleteTask { row: usize },
    MoveTask {
        project_id: String,
        #[arg(value_parser = parse_status)]
        from_status: TaskStatus,
        from_index: usize,
        #[arg(value_parser = parse_status)]
        to_status: TaskStatus,
        to_index: usize,
    },

    Questions { team: String },
    Teams,
    AddTeam { name: String },
    AddQuestion { team: String, text: String },
    UpdateQuestion { team: String, original: String, new_text: String },
    DeleteQuestion { team: String, text: String },

    Members,
    AddMember { name: String, team: String },

    WorkTypes,
    AddWorkType { option: String },
    UpdateWorkType { original: String, new_option: String },
    DeleteWorkType { option: String },
    UpdateWorkTypeQuestion { question: String },

    MyTasks { name: String },
    UpdateMyStatus {
        #[arg(value_enum)]
        source: SourceArg,
        row: usize,
        status: String,
    },

    TicketDashboard(TicketDashboardArgs),
    ProjectDashboard {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "")]
        ticket_id: String,
        #[arg(long)]
        status: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct AddTaskArgs {
    pub project_id: String,
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long = "type", default_value = DEFAULT_TYPE)]
    pub task_type: String,
    #[arg(long, default_value = DEFAULT_PRIORITY)]
    pub priority: String,
    #[arg(long, default_value = "")]
    pub assignee: String,
    #[arg(long, default_value = "")]
    pub due_date: String,
    /// Comma-separated
    #[arg(long, default_value = "")]
    pub tags: String,
}

#[derive(Debug, Args)]
pub struct UpdateTaskArgs {
    pub row: usize,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "type")]
    pub task_type: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub due_date: Option<String>,
    #[arg(long)]
    pub tags: Option<String>,
    #[arg(long)]
    pub sequence: Option<u32>,
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Debug, Args)]
pub struct TicketDashboardArgs {
    #[arg(long, default_value = "")]
    pub search: String,
    #[arg(long)]
    pub from: Option<NaiveDate>,
    #[arg(long)]
    pub to: Option<NaiveDate>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub team: Option<String>,
    #[arg(long)]
    pub work_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Ticket,
    Project,
    Kanban,
}

impl From<SourceArg> for TaskSource {
    fn from(source: SourceArg) -> Self {
        match source {
            SourceArg::Ticket => TaskSource::Ticket,
            SourceArg::Project => TaskSource::Project,
            SourceArg::Kanban => TaskSource::KanbanTask,
        }
    }
}

fn parse_pair(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{value}`"))
}

fn parse_sequence(value: &str) -> Result<SequenceUpdate, String> {
    let (row, sequence) = value
        .split_once('=')
        .ok_or_else(|| format!("expected ROW=SEQUENCE, got `{value}`"))?;
    let row = row.trim().parse::<usize>().map_err(|err| err.to_string())?;
    let sequence = sequence.trim().parse::<u32>().map_err(|err| err.to_string())?;
    Ok(SequenceUpdate {
        sheet_row: SheetRow(row),
        sequence,
    })
}

fn parse_status(value: &str) -> Result<TaskStatus, String> {
    TaskStatus::parse(value).ok_or_else(|| {
        format!("unknown status `{value}` (expected todo, inprogress, review or done)")
    })
}

fn to_record(values: Vec<(String, String)>) -> Record {
    values.into_iter().collect()
}

/// Repeated questions become a checkbox answer.
fn to_answers(pairs: Vec<(String, String)>) -> BTreeMap<String, Answer> {
    let mut answers: BTreeMap<String, Answer> = BTreeMap::new();
    for (question, value) in pairs {
        let next = match answers.remove(&question) {
            None => Answer::Text(value),
            Some(Answer::Text(previous)) => Answer::Choices(vec![previous, value]),
            Some(Answer::Choices(mut choices)) => {
                choices.push(value);
                Answer::Choices(choices)
            }
        };
        answers.insert(question, next);
    }
    answers
}

/// `All` (any case) disables a facet.
fn facet(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.eq_ignore_ascii_case("all"))
}

fn adapter_error(err: anyhow::Error) -> ActionError {
    ActionError::Store(StoreError::Backend(format!("{err:#}")))
}

/// Runs one command. Configuration and store setup failures are returned as
/// errors; failures of the action itself come back inside the outcome.
pub fn run(cli: Cli) -> Result<ActionOutcome> {
    let config = config::load(cli.config.as_deref())?;
    let db_path = config.resolve_db_path(cli.db.as_deref())?;
    debug!(db = %db_path.display(), "workbook resolved");

    let store: Arc<dyn RowStore> = Arc::new(SqliteRowStore::open(&db_path)?);
    let services = Services::new(store.clone(), Arc::new(SystemClock), &config);

    Ok(dispatch(cli.command, &db_path, store.as_ref(), &services))
}

fn dispatch(
    command: Commands,
    db_path: &Path,
    store: &dyn RowStore,
    services: &Services,
) -> ActionOutcome {
    match command {
        Commands::Sheets => {
            ActionOutcome::from_result("sheets", store.list_sheets().map_err(ActionError::from))
        }
        Commands::Show { sheet } => ActionOutcome::from_result(
            "show",
            store
                .sheet_data(&sheet)
                .map(|data| data.values)
                .map_err(ActionError::from),
        ),
        Commands::ImportCsv { path, sheet } => ActionOutcome::from_result(
            "import_csv",
            import_csv_sheet(db_path, &path, sheet.as_deref()).map_err(adapter_error),
        ),
        Commands::ImportXlsx { path, sheets } => ActionOutcome::from_result(
            "import_xlsx",
            import_xlsx_sheets(db_path, &path, &sheets).map_err(adapter_error),
        ),
        Commands::ExportCsv { sheet, path } => ActionOutcome::from_result(
            "export_csv",
            export_csv_sheet(db_path, &sheet, &path).map_err(adapter_error),
        ),
        Commands::AddColumn { sheet, header } => ActionOutcome::from_result(
            "add_column",
            store.add_column(&sheet, &header).map_err(ActionError::from),
        ),
        Commands::RenameColumn { sheet, old, new } => ActionOutcome::from_result(
            "rename_column",
            store.rename_column(&sheet, &old, &new).map_err(ActionError::from),
        ),
        Commands::DeleteColumn { sheet, header } => ActionOutcome::from_result(
            "delete_column",
            store.delete_column(&sheet, &header).map_err(ActionError::from),
        ),

        Commands::SubmitTicket { values } => ActionOutcome::from_result(
            "submit_ticket",
            services.tickets.submit_ticket(to_record(values)),
        ),
        Commands::SubmitForm {
            teams,
            work_type,
            answers,
        } => ActionOutcome::from_result(
            "submit_form",
            services
                .tickets
                .submit_form(&teams, &work_type, &to_answers(answers)),
        ),
        Commands::Tickets => {
            ActionOutcome::from_result("all_tickets", services.tickets.all_tickets())
        }
        Commands::UpdateTicket { row, values } => ActionOutcome::from_result(
            "update_ticket",
            services
                .tickets
                .update_ticket(SheetRow(row), &to_record(values)),
        ),
        Commands::PromoteTicket { row, title } => ActionOutcome::from_result(
            "create_project_from_ticket",
            services.tickets.promote_ticket(SheetRow(row), &title),
        ),

        Commands::Projects => ActionOutcome::from_result("projects", services.projects.projects()),
        Commands::CreateProject { title } => ActionOutcome::from_result(
            "create_manual_project",
            services.projects.create_manual_project(&title),
        ),
        Commands::UpdateProject { row, values } => ActionOutcome::from_result(
            "update_project",
            services
                .projects
                .update_project(SheetRow(row), &to_record(values)),
        ),
        Commands::InitKanban { row, project_id } => ActionOutcome::from_result(
            "initialize_kanban",
            services
                .projects
                .initialize_kanban(SheetRow(row), &project_id),
        ),

        Commands::Tasks { project_id } => {
            ActionOutcome::from_result("tasks", services.kanban.tasks(&project_id))
        }
        Commands::Board {
            project_id,
            team,
            priority,
            search,
        } => {
            let filter = BoardFilter {
                team: facet(team),
                priority: facet(priority),
                search,
            };
            ActionOutcome::from_result(
                "board",
                services.kanban.filtered_board(&project_id, &filter),
            )
        }
        Commands::AddTask(args) => {
            let draft = TaskDraft {
                title: args.title,
                description: args.description,
                task_type: args.task_type,
                priority: args.priority,
                assignee: args.assignee,
                due_date: args.due_date,
                tags: split_tags(&args.tags),
            };
            ActionOutcome::from_result("add_task", services.kanban.add_task(&args.project_id, &draft))
        }
        Commands::UpdateTask(args) => {
            let patch = TaskPatch {
                title: args.title,
                description: args.description,
                task_type: args.task_type,
                priority: args.priority,
                assignee: args.assignee,
                due_date: args.due_date,
                tags: args.tags.as_deref().map(split_tags),
                sequence: args.sequence,
                status: args.status,
            };
            ActionOutcome::from_result(
                "update_task",
                services.kanban.update_task(SheetRow(args.row), &patch),
            )
        }
        Commands::Resequence { updates } => {
            ActionOutcome::from_result("resequence", services.kanban.resequence(&updates))
        }
        Commands::UpdateStatus { row, status } => ActionOutcome::from_result(
            "update_status",
            services.kanban.update_status(SheetRow(row), &status),
        ),
        Commands::DeleteTask { row } => {
            ActionOutcome::from_result("delete_task", services.kanban.delete_task(SheetRow(row)))
        }
        Commands::MoveTask {
            project_id,
            from_status,
            from_index,
            to_status,
            to_index,
        } => {
            let from = BoardPosition {
                status: from_status,
                index: from_index,
            };
            let to = BoardPosition {
                status: to_status,
                index: to_index,
            };
            ActionOutcome::from_result("move_task", services.kanban.move_task(&project_id, from, to))
        }

        Commands::Questions { team } => {
            ActionOutcome::from_result("form_questions", services.forms.form_questions(&team))
        }
        Commands::Teams => ActionOutcome::from_result("teams", services.forms.teams()),
        Commands::AddTeam { name } => {
            ActionOutcome::from_result("add_team", services.forms.add_team(&name))
        }
        Commands::AddQuestion { team, text } => ActionOutcome::from_result(
            "add_question",
            services.forms.add_question(&team, &text),
        ),
        Commands::UpdateQuestion {
            team,
            original,
            new_text,
        } => ActionOutcome::from_result(
            "update_question",
            services.forms.update_question(&team, &original, &new_text),
        ),
        Commands::DeleteQuestion { team, text } => ActionOutcome::from_result(
            "delete_question",
            services.forms.delete_question(&team, &text),
        ),

        Commands::Members => ActionOutcome::from_result("members", services.members.members()),
        Commands::AddMember { name, team } => ActionOutcome::from_result(
            "add_member",
            services.members.add_member(&name, &team),
        ),

        Commands::WorkTypes => ActionOutcome::with_data(&services.work_types.work_types()),
        Commands::AddWorkType { option } => ActionOutcome::from_result(
            "add_work_type_option",
            services.work_types.add_option(&option),
        ),
        Commands::UpdateWorkType {
            original,
            new_option,
        } => ActionOutcome::from_result(
            "update_work_type_option",
            services.work_types.update_option(&original, &new_option),
        ),
        Commands::DeleteWorkType { option } => ActionOutcome::from_result(
            "delete_work_type_option",
            services.work_types.delete_option(&option),
        ),
        Commands::UpdateWorkTypeQuestion { question } => ActionOutcome::from_result(
            "update_work_type_question",
            services.work_types.update_question(&question),
        ),

        Commands::MyTasks { name } => ActionOutcome::from_result(
            "assigned_tasks",
            services.assignments.assigned_tasks(&name),
        ),
        Commands::UpdateMyStatus {
            source,
            row,
            status,
        } => ActionOutcome::from_result(
            "update_assigned_status",
            services
                .assignments
                .update_assigned_status(source.into(), SheetRow(row), &status),
        ),

        Commands::TicketDashboard(args) => {
            let filter = TicketFilter {
                search: args.search,
                from: args.from,
                to: args.to,
                status: facet(args.status),
                team: facet(args.team),
                work_type: facet(args.work_type),
            };
            ActionOutcome::from_result(
                "ticket_dashboard",
                services.dashboards.ticket_dashboard(&filter),
            )
        }
        Commands::ProjectDashboard {
            search,
            ticket_id,
            status,
        } => {
            let filter = ProjectFilter {
                search,
                ticket_id,
                status: facet(status),
            };
            ActionOutcome::from_result(
                "project_dashboard",
                services.dashboards.project_dashboard(&filter),
            )
        }
    }
}
