use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;

use crate::config::{self, AppConfig};
use crate::domain::entities::assignment::TaskSource;
use crate::domain::entities::dashboard::{ProjectFilter, TicketFilter};
use crate::domain::entities::form::{Answer, SubmissionError, PLACEHOLDER_QUESTION};
use crate::domain::entities::grid::{BatchRequest, SheetError};
use crate::domain::entities::kanban::{BoardPosition, SequenceUpdate, TaskDraft, TaskPatch, TaskStatus};
use crate::domain::entities::sheet::{Record, SheetId, SheetRow, KANBAN_TASKS, MEMBERS, PROJECTS, TICKETS, WORK_TYPES};
use crate::infra::import::csv::{export_csv_sheet, import_csv_sheet};
use crate::infra::sqlite::repo::SqliteRowStore;
use crate::infra::sqlite::schema::init_db;
use crate::usecase::action::ActionError;
use crate::usecase::ports::clock::Clock;
use crate::usecase::ports::row_store::{RowStore, StoreError};
use crate::usecase::services::Services;

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("sheetflow-{prefix}-{nanos}"))
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 20, 15, 7)
        .single()
        .expect("fixed time should be valid")
}

struct Workbook {
    dir: PathBuf,
    db_path: PathBuf,
    store: Arc<SqliteRowStore>,
    services: Services,
}

impl Workbook {
    fn new(prefix: &str) -> Self {
        let dir = unique_test_dir(prefix);
        fs::create_dir_all(&dir).expect("should create temp dir");
        let db_path = dir.join("workbook.sqlite");
        let store = Arc::new(SqliteRowStore::open(&db_path).expect("store should open"));
        let services = Services::new(
            store.clone(),
            Arc::new(FixedClock(fixed_now())),
            &AppConfig::default(),
        );
        Self {
            dir,
            db_path,
            store,
            services,
        }
    }

    fn cell(&self, sheet: &str, row: SheetRow, header: &str) -> String {
        let data = self.store.sheet_data(sheet).expect("sheet should load");
        let col = data.column_index(header).expect("header should exist");
        data.row(row).expect("row should exist")[col].clone()
    }

    fn cleanup(self) {
        fs::remove_dir_all(&self.dir).expect("should cleanup temp dir");
    }
}

fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("should write csv fixture");
    path
}

#[test]
fn init_db_creates_required_tables() {
    let temp_dir = unique_test_dir("init-db");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("workbook.sqlite");

    let result = init_db(&db_path);

    assert!(result.is_ok(), "init_db should succeed: {result:?}");

    let conn = Connection::open(&db_path).expect("should open sqlite db");
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('sheet','cell')",
            [],
            |row| row.get(0),
        )
        .expect("table count query should succeed");

    assert_eq!(table_count, 2, "required tables should exist");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn append_row_writes_headers_then_grows_columns() {
    let workbook = Workbook::new("append-row");
    let store = &workbook.store;

    store
        .append_row("Notes", &Record::new().with("Name", "Ada").with("Team", "CM"))
        .expect("first append should succeed");
    store
        .append_row("Notes", &Record::new().with("Team", "QAC").with("Room", "B2"))
        .expect("second append should succeed");

    let data = store.sheet_data("Notes").expect("sheet should load");
    assert_eq!(
        data.values,
        vec![
            vec!["Name".to_string(), "Team".to_string(), "Room".to_string()],
            vec!["Ada".to_string(), "CM".to_string(), String::new()],
            vec![String::new(), "QAC".to_string(), "B2".to_string()],
        ]
    );

    let conn = Connection::open(&workbook.db_path).expect("should open sqlite db");
    let empty_cells: i64 = conn
        .query_row("SELECT COUNT(*) FROM cell WHERE value = ''", [], |row| row.get(0))
        .expect("empty cell query should succeed");
    assert_eq!(empty_cells, 0, "empty cells should not be stored");

    workbook.cleanup();
}

#[test]
fn missing_sheet_reads_as_empty() {
    let workbook = Workbook::new("missing-sheet");

    let data = workbook
        .store
        .sheet_data("Nowhere")
        .expect("missing sheet should read");

    assert!(data.is_empty());
    assert!(workbook
        .store
        .list_sheets()
        .expect("sheets should list")
        .is_empty());

    workbook.cleanup();
}

#[test]
fn batch_update_rolls_back_on_failure() {
    let workbook = Workbook::new("batch-atomic");
    let store = &workbook.store;
    store
        .append_row("Log", &Record::new().with("Entry", "first"))
        .expect("append should succeed");
    let sheet_id = store.sheet_id("Log").expect("sheet id should resolve");

    let result = store.batch_update(&[
        BatchRequest::set_cell(sheet_id, SheetRow(2), 0, "changed"),
        BatchRequest::delete_row(sheet_id, SheetRow(9)),
    ]);

    assert!(
        matches!(result, Err(StoreError::Sheet(SheetError::OutOfBounds { .. }))),
        "out of range delete should fail: {result:?}"
    );
    assert_eq!(workbook.cell("Log", SheetRow(2), "Entry"), "first");

    workbook.cleanup();
}

#[test]
fn batch_update_deletes_rows_and_unknown_sheet_fails() {
    let workbook = Workbook::new("batch-delete");
    let store = &workbook.store;
    for entry in ["a", "b", "c"] {
        store
            .append_row("Log", &Record::new().with("Entry", entry))
            .expect("append should succeed");
    }
    let sheet_id = store.sheet_id("Log").expect("sheet id should resolve");

    store
        .batch_update(&[BatchRequest::delete_row(sheet_id, SheetRow(3))])
        .expect("delete should succeed");

    let data = store.sheet_data("Log").expect("sheet should load");
    assert_eq!(data.data_row_count(), 2);
    assert_eq!(workbook.cell("Log", SheetRow(3), "Entry"), "c");

    let missing = store.batch_update(&[BatchRequest::delete_row(SheetId(999), SheetRow(2))]);
    assert!(
        matches!(missing, Err(StoreError::Sheet(SheetError::UnknownSheet(SheetId(999))))),
        "unknown sheet id should fail: {missing:?}"
    );

    workbook.cleanup();
}

#[test]
fn column_operations_edit_the_header_row() {
    let workbook = Workbook::new("columns");
    let store = &workbook.store;
    store
        .append_row("Roster", &Record::new().with("Name", "Ada").with("Desk", "4"))
        .expect("append should succeed");

    store.add_column("Roster", "Team").expect("add column should succeed");
    store
        .rename_column("Roster", "Desk", "Seat")
        .expect("rename should succeed");
    store
        .delete_column("Roster", "Name")
        .expect("delete should succeed");

    let data = store.sheet_data("Roster").expect("sheet should load");
    assert_eq!(data.headers(), ["Seat".to_string(), "Team".to_string()]);
    assert_eq!(workbook.cell("Roster", SheetRow(2), "Seat"), "4");

    let missing = store.delete_column("Roster", "Name");
    assert!(matches!(
        missing,
        Err(StoreError::Sheet(SheetError::ColumnNotFound(_)))
    ));

    workbook.cleanup();
}

#[test]
fn import_csv_replaces_sheet_and_export_writes_it_back() {
    let workbook = Workbook::new("csv");
    let csv_path = write_fixture(
        &workbook.dir,
        "members.csv",
        "Name,Team\nAda,CM\nGrace,QAC\n",
    );

    let imported = import_csv_sheet(&workbook.db_path, &csv_path, Some(MEMBERS))
        .expect("import should succeed");
    assert_eq!(imported.sheet_name, MEMBERS);
    assert_eq!(imported.row_count, 3, "header row counts as a sheet row");

    let again = import_csv_sheet(&workbook.db_path, &csv_path, Some(MEMBERS))
        .expect("re-import should succeed");
    assert_eq!(again.sheet_id, imported.sheet_id);
    let members = workbook.services.members.members().expect("members should load");
    assert_eq!(members.data_row_count(), 2, "import should replace, not append");

    let out_path = workbook.dir.join("out.csv");
    let written = export_csv_sheet(&workbook.db_path, MEMBERS, &out_path)
        .expect("export should succeed");
    assert_eq!(written, 3);
    let exported = fs::read_to_string(&out_path).expect("should read exported csv");
    assert_eq!(exported, "Name,Team\nAda,CM\nGrace,QAC\n");

    workbook.cleanup();
}

#[test]
fn import_csv_rejects_empty_file() {
    let workbook = Workbook::new("csv-empty");
    let csv_path = write_fixture(&workbook.dir, "empty.csv", "");

    let result = import_csv_sheet(&workbook.db_path, &csv_path, None);

    assert!(result.is_err(), "empty csv should be rejected");

    workbook.cleanup();
}

#[test]
fn submit_ticket_generates_id_and_timestamp() {
    let workbook = Workbook::new("submit-ticket");

    let record = workbook
        .services
        .tickets
        .submit_ticket(Record::new().with("Team", "CM").with("Details", "Broken link"))
        .expect("submit should succeed");

    let expected_id = format!("TICKET-{}", fixed_now().timestamp_millis());
    assert_eq!(record.get("Ticket ID"), Some(expected_id.as_str()));
    assert_eq!(record.get("Created Date"), Some("2024-03-10 02:15:07"));

    let tickets = workbook.services.tickets.all_tickets().expect("tickets should load");
    assert_eq!(
        tickets.headers(),
        [
            "Team",
            "Details",
            "Ticket ID",
            "Created Date",
            "Status",
            "Assignee"
        ]
        .map(str::to_string)
    );
    assert_eq!(workbook.cell(TICKETS, SheetRow(2), "Status"), "In Review");
    assert_eq!(workbook.cell(TICKETS, SheetRow(2), "Assignee"), "");

    workbook.cleanup();
}

#[test]
fn submit_form_validates_against_team_questions() {
    let workbook = Workbook::new("submit-form");
    let forms = &workbook.services.forms;
    forms
        .add_question("CM", "Course title*")
        .expect("question should be added");
    forms
        .add_question("CM", "Launch date")
        .expect("question should be added");
    forms
        .add_question("CM", "Formats (checkbox: PDF; Video; Slides)")
        .expect("question should be added");
    let teams = vec!["CM".to_string()];

    let missing = workbook
        .services
        .tickets
        .submit_form(&teams, "Urgent", &BTreeMap::new())
        .expect_err("required answer should be enforced");
    assert_eq!(
        missing,
        ActionError::Submission(SubmissionError::MissingAnswer("Course title".to_string()))
    );

    let answers = BTreeMap::from([
        ("Course title*".to_string(), Answer::Text("Algebra".to_string())),
        ("Launch date".to_string(), Answer::Text("03/15/2024".to_string())),
        (
            "Formats (checkbox: PDF; Video; Slides)".to_string(),
            Answer::Choices(vec!["Slides".to_string(), "PDF".to_string()]),
        ),
    ]);
    let record = workbook
        .services
        .tickets
        .submit_form(&teams, "Urgent", &answers)
        .expect("valid form should submit");

    assert_eq!(record.get("Team"), Some("CM"));
    assert_eq!(record.get("Work Type"), Some("Urgent"));
    assert_eq!(record.get("Launch date"), Some("2024-03-15"));
    assert_eq!(
        record.get("Formats (checkbox: PDF; Video; Slides)"),
        Some("PDF, Slides")
    );
    assert_eq!(workbook.cell(TICKETS, SheetRow(2), "Course title*"), "Algebra");

    workbook.cleanup();
}

#[test]
fn update_ticket_creates_missing_columns() {
    let workbook = Workbook::new("update-ticket");
    let tickets = &workbook.services.tickets;
    tickets
        .submit_ticket(Record::new().with("Team", "CM"))
        .expect("submit should succeed");

    tickets
        .update_ticket(
            SheetRow(2),
            &Record::new().with("Status", "Open").with("Priority", "High"),
        )
        .expect("update should succeed");

    assert_eq!(workbook.cell(TICKETS, SheetRow(2), "Status"), "Open");
    assert_eq!(workbook.cell(TICKETS, SheetRow(2), "Priority"), "High");

    tickets
        .update_ticket(SheetRow(2), &Record::new())
        .expect("empty update should be a no-op");

    let header = tickets.update_ticket(SheetRow::HEADER, &Record::new().with("Status", "x"));
    assert!(matches!(header, Err(ActionError::Invalid(_))));

    workbook.cleanup();
}

#[test]
fn update_ticket_fails_without_tickets() {
    let workbook = Workbook::new("update-ticket-empty");

    let result = workbook
        .services
        .tickets
        .update_ticket(SheetRow(2), &Record::new().with("Status", "Open"));

    assert_eq!(
        result,
        Err(ActionError::not_found("No tickets found to update."))
    );

    workbook.cleanup();
}

#[test]
fn row_writes_past_the_last_row_fail_and_leave_sheets_untouched() {
    let workbook = Workbook::new("row-bounds");
    let services = &workbook.services;
    services
        .tickets
        .submit_ticket(Record::new().with("Team", "CM"))
        .expect("submit should succeed");
    let project_id = services
        .projects
        .create_manual_project("Onboarding")
        .expect("manual project should be created");
    services
        .projects
        .initialize_kanban(SheetRow(2), &project_id)
        .expect("kanban should initialize");

    let snapshot = |sheet: &str| workbook.store.sheet_data(sheet).expect("sheet should load");
    let tickets_before = snapshot(TICKETS);
    let projects_before = snapshot(PROJECTS);
    let kanban_before = snapshot(KANBAN_TASKS);
    let status = Record::new().with("Status", "Done");

    assert_eq!(
        services.tickets.update_ticket(SheetRow(25), &status),
        Err(ActionError::not_found("Row 25 not found."))
    );
    assert!(matches!(
        services.tickets.update_ticket(SheetRow(usize::MAX), &status),
        Err(ActionError::NotFound(_))
    ));
    assert!(matches!(
        services
            .tickets
            .create_project_from_ticket(SheetRow(9), &[], "Ghost"),
        Err(ActionError::NotFound(_))
    ));
    assert_eq!(
        services.projects.update_project(SheetRow(3), &status),
        Err(ActionError::not_found("Row 3 not found."))
    );
    assert!(matches!(
        services.kanban.update_status(SheetRow(40), "done"),
        Err(ActionError::NotFound(_))
    ));
    assert!(matches!(
        services.kanban.update_task(
            SheetRow(40),
            &TaskPatch {
                priority: Some("High".to_string()),
                ..TaskPatch::default()
            }
        ),
        Err(ActionError::NotFound(_))
    ));
    assert!(matches!(
        services.kanban.resequence(&[
            SequenceUpdate {
                sheet_row: SheetRow(2),
                sequence: 2,
            },
            SequenceUpdate {
                sheet_row: SheetRow(7),
                sequence: 1,
            },
        ]),
        Err(ActionError::NotFound(_))
    ));
    assert!(matches!(
        services.kanban.delete_task(SheetRow(40)),
        Err(ActionError::NotFound(_))
    ));
    assert!(matches!(
        services
            .assignments
            .update_assigned_status(TaskSource::Ticket, SheetRow(usize::MAX), "done"),
        Err(ActionError::NotFound(_))
    ));

    assert_eq!(snapshot(TICKETS), tickets_before);
    assert_eq!(snapshot(PROJECTS), projects_before);
    assert_eq!(snapshot(KANBAN_TASKS), kanban_before);

    workbook.cleanup();
}

#[test]
fn create_project_from_ticket_carries_columns_and_completes_ticket() {
    let workbook = Workbook::new("promote-ticket");
    let ticket = workbook
        .services
        .tickets
        .submit_ticket(
            Record::new()
                .with("Team", "CM")
                .with("Product/Course/Requisition Name", "Algebra I"),
        )
        .expect("submit should succeed");

    let project_id = workbook
        .services
        .tickets
        .promote_ticket(SheetRow(2), "Algebra rollout")
        .expect("project should be created");

    assert_eq!(project_id, format!("PROJ-{}", fixed_now().timestamp_millis()));
    let projects = workbook.services.projects.projects().expect("projects should load");
    assert_eq!(projects.headers()[0], "Project ID");
    assert_eq!(projects.data_row_count(), 1);
    assert_eq!(workbook.cell(PROJECTS, SheetRow(2), "Project Title"), "Algebra rollout");
    assert_eq!(
        workbook.cell(PROJECTS, SheetRow(2), "Ticket ID"),
        ticket.get("Ticket ID").expect("ticket id should be set")
    );
    assert_eq!(workbook.cell(PROJECTS, SheetRow(2), "Status"), "In Review");
    assert_eq!(workbook.cell(PROJECTS, SheetRow(2), "Kanban Initialized"), "No");
    assert!(projects.column_index("Team").is_none(), "ticket-only columns stay behind");
    assert_eq!(workbook.cell(TICKETS, SheetRow(2), "Status"), "Completed");

    workbook.cleanup();
}

#[test]
fn create_project_adds_required_columns_to_existing_sheet() {
    let workbook = Workbook::new("project-columns");
    let csv_path = write_fixture(&workbook.dir, "projects.csv", "Project ID,Owner\nPROJ-1,Ada\n");
    import_csv_sheet(&workbook.db_path, &csv_path, Some(PROJECTS)).expect("import should succeed");

    workbook
        .services
        .projects
        .create_manual_project("Onboarding")
        .expect("manual project should be created");

    let projects = workbook.services.projects.projects().expect("projects should load");
    assert!(projects.column_index("Project Title").is_some());
    assert!(projects.column_index("Status").is_some());
    assert_eq!(workbook.cell(PROJECTS, SheetRow(3), "Project Title"), "Onboarding");

    let blank = workbook.services.projects.create_manual_project("  ");
    assert_eq!(blank, Err(ActionError::invalid("Project title is required.")));

    workbook.cleanup();
}

#[test]
fn update_project_skips_unknown_headers() {
    let workbook = Workbook::new("update-project");
    let projects = &workbook.services.projects;
    projects
        .create_manual_project("Onboarding")
        .expect("manual project should be created");

    projects
        .update_project(
            SheetRow(2),
            &Record::new().with("Status", "Active").with("Budget", "100"),
        )
        .expect("update should succeed");

    let data = projects.projects().expect("projects should load");
    assert!(data.column_index("Budget").is_none());
    assert_eq!(workbook.cell(PROJECTS, SheetRow(2), "Status"), "Active");

    workbook.cleanup();
}

#[test]
fn initialize_kanban_seeds_kickoff_task() {
    let workbook = Workbook::new("init-kanban");
    let project_id = workbook
        .services
        .projects
        .create_manual_project("Onboarding")
        .expect("manual project should be created");

    workbook
        .services
        .projects
        .initialize_kanban(SheetRow(2), &project_id)
        .expect("kanban should initialize");

    assert_eq!(workbook.cell(PROJECTS, SheetRow(2), "Kanban Initialized"), "Yes");
    let tasks = workbook.services.kanban.tasks(&project_id).expect("tasks should load");
    assert_eq!(tasks.len(), 1);
    let kickoff = &tasks[0];
    assert_eq!(kickoff.title, "Project Kick-off");
    assert_eq!(kickoff.sequence, 1);
    assert_eq!(kickoff.status, "todo");
    assert_eq!(kickoff.task_type, "Planning");
    assert_eq!(kickoff.priority, "High");
    assert_eq!(kickoff.tags, vec!["kickoff".to_string(), "planning".to_string()]);

    workbook.cleanup();
}

#[test]
fn kanban_tasks_can_be_added_moved_and_deleted() {
    let workbook = Workbook::new("kanban-flow");
    let project_id = workbook
        .services
        .projects
        .create_manual_project("Onboarding")
        .expect("manual project should be created");
    workbook
        .services
        .projects
        .initialize_kanban(SheetRow(2), &project_id)
        .expect("kanban should initialize");
    let kanban = &workbook.services.kanban;

    kanban
        .add_task(
            &project_id,
            &TaskDraft {
                title: "Write outline".to_string(),
                task_type: "Task".to_string(),
                priority: "Low".to_string(),
                assignee: "Ada".to_string(),
                ..TaskDraft::default()
            },
        )
        .expect("task should be added");

    let board = kanban.board(&project_id).expect("board should load");
    let todo: Vec<&str> = board
        .column(TaskStatus::Todo)
        .iter()
        .map(|task| task.title.as_str())
        .collect();
    assert_eq!(todo, vec!["Project Kick-off", "Write outline"]);
    assert_eq!(board.column(TaskStatus::Todo)[1].sequence, 2);

    let moved = kanban
        .move_task(
            &project_id,
            BoardPosition {
                status: TaskStatus::Todo,
                index: 0,
            },
            BoardPosition {
                status: TaskStatus::Done,
                index: 0,
            },
        )
        .expect("move should succeed");
    assert_eq!(moved.column(TaskStatus::Done)[0].title, "Project Kick-off");

    let reloaded = kanban.board(&project_id).expect("board should reload");
    assert_eq!(reloaded, moved, "stored board should match the planned board");
    assert_eq!(workbook.cell(KANBAN_TASKS, SheetRow(2), "Status"), "done");
    assert_eq!(workbook.cell(KANBAN_TASKS, SheetRow(3), "Sequence"), "1");

    kanban
        .update_task(
            SheetRow(3),
            &TaskPatch {
                priority: Some("High".to_string()),
                tags: Some(vec!["docs".to_string(), "draft".to_string()]),
                ..TaskPatch::default()
            },
        )
        .expect("patch should succeed");
    assert_eq!(workbook.cell(KANBAN_TASKS, SheetRow(3), "Tags"), "docs,draft");

    kanban
        .update_status(SheetRow(3), "review")
        .expect("status should update");
    kanban.delete_task(SheetRow(2)).expect("delete should succeed");

    let tasks = kanban.tasks(&project_id).expect("tasks should load");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Write outline");
    assert_eq!(tasks[0].status, "review");
    assert_eq!(tasks[0].priority, "High");
    assert_eq!(tasks[0].sheet_row, SheetRow(2));

    workbook.cleanup();
}

#[test]
fn kanban_writes_report_missing_data_and_columns() {
    let workbook = Workbook::new("kanban-errors");
    let kanban = &workbook.services.kanban;

    assert_eq!(
        kanban.update_status(SheetRow(2), "done"),
        Err(ActionError::not_found("No kanban data found to update."))
    );
    kanban
        .resequence(&[])
        .expect("empty resequence should succeed");

    let csv_path = write_fixture(
        &workbook.dir,
        "kanban.csv",
        "Project ID,Task ID,Status\nP-1,T-1,todo\n",
    );
    import_csv_sheet(&workbook.db_path, &csv_path, Some(KANBAN_TASKS)).expect("import should succeed");

    let result = kanban.resequence(&[SequenceUpdate {
        sheet_row: SheetRow(2),
        sequence: 1,
    }]);
    assert_eq!(
        result,
        Err(ActionError::missing_column("Sequence column not found."))
    );

    let tasks = kanban.tasks("P-1").expect("tasks should parse");
    assert_eq!(tasks[0].sequence, 1, "missing sequence falls back to position");
    assert_eq!(tasks[0].task_type, "Task");
    assert_eq!(tasks[0].priority, "Medium");

    workbook.cleanup();
}

#[test]
fn form_questions_and_teams_round_through_the_sheet() {
    let workbook = Workbook::new("form-questions");
    let forms = &workbook.services.forms;

    assert!(forms.form_questions("").expect("empty team is fine").is_empty());
    assert!(forms.form_questions("CM").expect("empty sheet is fine").is_empty());
    let sheet = workbook
        .store
        .sheet_data("FormQuestions")
        .expect("sheet should load");
    assert_eq!(sheet.headers(), ["Team".to_string(), "QuestionText".to_string()]);

    forms
        .add_question("CM", "Course name*")
        .expect("question should be added");
    forms.add_team("QAC").expect("team should be added");
    assert_eq!(
        forms.teams().expect("teams should load"),
        vec!["CM".to_string(), "QAC".to_string()]
    );

    let cm = forms.form_questions("CM").expect("questions should load");
    assert_eq!(cm.len(), 1);
    assert_eq!(cm[0].id, "col-1");
    assert!(cm[0].is_required());
    let qac = forms.form_questions("QAC").expect("questions should load");
    assert_eq!(qac[0].id, "col-2");
    assert_eq!(qac[0].question_text, PLACEHOLDER_QUESTION);

    forms
        .update_question("CM", "Course name*", "Course title*")
        .expect("question should update");
    forms
        .delete_question("QAC", PLACEHOLDER_QUESTION)
        .expect("question should delete");
    assert_eq!(forms.teams().expect("teams should load"), vec!["CM".to_string()]);
    assert_eq!(
        forms.form_questions("CM").expect("questions should load")[0].question_text,
        "Course title*"
    );

    assert_eq!(
        forms.delete_question("CM", "Missing"),
        Err(ActionError::not_found(
            "Question \"Missing\" for team \"CM\" not found."
        ))
    );
    assert_eq!(
        forms.add_question("", "Text"),
        Err(ActionError::invalid("Team and question text cannot be empty."))
    );

    workbook.cleanup();
}

#[test]
fn add_member_seeds_predefined_teams_once() {
    let workbook = Workbook::new("members");
    let members = &workbook.services.members;

    members.add_member("Rafi", "QAC").expect("member should be added");

    let data = members.members().expect("members should load");
    assert_eq!(data.headers(), ["Name".to_string(), "Team".to_string()]);
    let rows: Vec<(String, String)> = data
        .data_rows()
        .map(|(_, row)| (row[0].clone(), row[1].clone()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Team Default".to_string(), "CM".to_string()),
            ("Team Default".to_string(), "SMD".to_string()),
            ("Team Default".to_string(), "QAC".to_string()),
            ("Team Default".to_string(), "Class Ops".to_string()),
            ("Rafi".to_string(), "QAC".to_string()),
        ]
    );

    members
        .add_member("Team Default", "CM")
        .expect("seeding call should succeed");
    assert_eq!(members.members().expect("members should load").data_row_count(), 5);

    assert_eq!(
        members.add_member("", "CM"),
        Err(ActionError::invalid("Name and team are required."))
    );

    workbook.cleanup();
}

#[test]
fn work_types_seed_and_edit() {
    let workbook = Workbook::new("work-types");
    let work_types = &workbook.services.work_types;

    let seeded = work_types.work_types();
    assert_eq!(seeded.question, "What type of work is this?");
    assert_eq!(seeded.options, vec!["Urgent".to_string(), "Regular".to_string()]);
    let sheet = workbook.store.sheet_data(WORK_TYPES).expect("sheet should load");
    assert_eq!(sheet.values.len(), 3);

    work_types.add_option("Project").expect("option should be added");
    work_types
        .update_option("Regular", "Routine")
        .expect("option should update");
    work_types.delete_option("Urgent").expect("option should delete");
    work_types
        .update_question("Kind of work?")
        .expect("question should update");

    let edited = work_types.work_types();
    assert_eq!(edited.question, "Kind of work?");
    assert_eq!(edited.options, vec!["Routine".to_string(), "Project".to_string()]);

    assert_eq!(
        work_types.delete_option("Nope"),
        Err(ActionError::not_found("Option \"Nope\" not found."))
    );

    workbook.cleanup();
}

#[test]
fn work_types_fall_back_to_defaults_when_store_fails() {
    let temp_dir = unique_test_dir("work-types-fallback");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    // A directory is not a workbook, so every read fails.
    let store = Arc::new(SqliteRowStore::new(&temp_dir));
    let services = Services::new(store, Arc::new(FixedClock(fixed_now())), &AppConfig::default());

    let work_types = services.work_types.work_types();

    assert_eq!(work_types.question, "What type of work is this?");
    assert_eq!(work_types.options, vec!["Urgent".to_string(), "Regular".to_string()]);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn assigned_tasks_span_every_source() {
    let workbook = Workbook::new("my-tasks");
    let services = &workbook.services;
    let ticket = services
        .tickets
        .submit_ticket(Record::new().with("Product/Course/Requisition Name", "Algebra I"))
        .expect("submit should succeed");
    services
        .tickets
        .update_ticket(SheetRow(2), &Record::new().with("Assignee", "Rafi"))
        .expect("ticket update should succeed");
    services
        .projects
        .create_manual_project("Onboarding")
        .expect("project should be created");
    services
        .projects
        .update_project(SheetRow(2), &Record::new().with("Assignee", "rafi"))
        .expect("project update should succeed");

    let tasks = services
        .assignments
        .assigned_tasks("RAFI")
        .expect("assigned tasks should load");

    assert_eq!(tasks.len(), 2);
    let ticket_id = ticket.get("Ticket ID").expect("ticket id should be set");
    assert_eq!(tasks[0].source, TaskSource::Ticket);
    assert_eq!(tasks[0].id, ticket_id);
    assert_eq!(tasks[0].title, format!("Algebra I / {ticket_id}"));
    assert_eq!(tasks[0].status, "In Review");
    assert_eq!(tasks[0].date, "2024-03-10T02:15:07.000Z");
    assert_eq!(tasks[1].source, TaskSource::Project);
    assert_eq!(tasks[1].sheet_row, SheetRow(2));
    assert_eq!(tasks[1].date, "", "empty start date stays empty");

    assert!(services
        .assignments
        .assigned_tasks("")
        .expect("empty name is fine")
        .is_empty());

    workbook.cleanup();
}

#[test]
fn update_assigned_status_creates_status_column() {
    let workbook = Workbook::new("my-task-status");
    let csv_path = write_fixture(
        &workbook.dir,
        "kanban.csv",
        "Task ID,Assignee\nT-1,Rafi\n",
    );
    import_csv_sheet(&workbook.db_path, &csv_path, Some(KANBAN_TASKS)).expect("import should succeed");

    workbook
        .services
        .assignments
        .update_assigned_status(TaskSource::KanbanTask, SheetRow(2), "done")
        .expect("status should update");

    assert_eq!(workbook.cell(KANBAN_TASKS, SheetRow(2), "Status"), "done");

    let empty = workbook
        .services
        .assignments
        .update_assigned_status(TaskSource::Project, SheetRow(2), "done");
    assert_eq!(
        empty,
        Err(ActionError::not_found("Sheet \"Projects\" not found or is empty."))
    );

    workbook.cleanup();
}

#[test]
fn dashboards_list_newest_first_with_stats() {
    let workbook = Workbook::new("dashboards");
    let services = &workbook.services;
    for team in ["CM", "CM, QAC"] {
        services
            .tickets
            .submit_ticket(Record::new().with("Team", team).with("Work Type", "Urgent"))
            .expect("submit should succeed");
    }
    services
        .tickets
        .update_ticket(SheetRow(2), &Record::new().with("Status", "Done"))
        .expect("update should succeed");

    let all = services
        .dashboards
        .ticket_dashboard(&TicketFilter::default())
        .expect("dashboard should load");
    assert_eq!(all.rows.len(), 2);
    assert_eq!(all.rows[0].sheet_row, SheetRow(3));
    assert_eq!(all.stats.total, 2);
    assert_eq!(all.stats.solved, 1);

    let qac = services
        .dashboards
        .ticket_dashboard(&TicketFilter {
            team: Some("QAC".to_string()),
            from: chrono::NaiveDate::from_ymd_opt(2024, 3, 10),
            ..TicketFilter::default()
        })
        .expect("dashboard should load");
    assert_eq!(qac.rows.len(), 1);
    assert_eq!(qac.rows[0].sheet_row, SheetRow(3));

    services
        .projects
        .create_manual_project("Onboarding")
        .expect("project should be created");
    let projects = services
        .dashboards
        .project_dashboard(&ProjectFilter {
            search: "onboard".to_string(),
            ..ProjectFilter::default()
        })
        .expect("project dashboard should load");
    assert_eq!(projects.rows.len(), 1);

    workbook.cleanup();
}

#[test]
fn default_db_path_uses_app_directory() {
    let db_path = config::default_db_path().expect("default db path should resolve");

    assert_eq!(
        db_path.file_name().and_then(|name| name.to_str()),
        Some("workbook.sqlite")
    );
    assert!(
        db_path
            .components()
            .any(|part| part.as_os_str().to_string_lossy().contains("sheetflow")),
        "data directory should be the sheetflow one: {}",
        db_path.display()
    );
}

#[test]
fn config_file_fills_missing_fields_with_defaults() {
    let temp_dir = unique_test_dir("config");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let config_path = temp_dir.join("config.json");
    fs::write(
        &config_path,
        r#"{ "utc_offset_hours": 0, "predefined_teams": ["Ops"] }"#,
    )
    .expect("should write config fixture");

    let loaded = config::load(Some(&config_path)).expect("config should load");

    assert_eq!(loaded.utc_offset_hours, 0);
    assert_eq!(loaded.predefined_teams, vec!["Ops".to_string()]);
    assert_eq!(loaded.work_type_question, "What type of work is this?");
    let flag = temp_dir.join("flag.sqlite");
    assert_eq!(
        loaded
            .resolve_db_path(Some(&flag))
            .expect("flag path should resolve"),
        flag
    );

    let missing = config::load(Some(&temp_dir.join("absent.json")));
    assert!(missing.is_err(), "an explicit config file must exist");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}
