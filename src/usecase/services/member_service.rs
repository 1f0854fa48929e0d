use std::sync::Arc;

use tracing::info;

use crate::domain::entities::roster::{
    member_record, teams_missing_members, MEMBER_HEADERS, TEAM_DEFAULT_MEMBER,
};
use crate::domain::entities::sheet::{SheetData, MEMBERS};
use crate::usecase::action::{ActionError, ActionResult};
use crate::usecase::ports::row_store::RowStore;

pub struct MemberService {
    store: Arc<dyn RowStore>,
    predefined_teams: Vec<String>,
}

impl MemberService {
    pub fn new(store: Arc<dyn RowStore>, predefined_teams: Vec<String>) -> Self {
        Self {
            store,
            predefined_teams,
        }
    }

    pub fn members(&self) -> ActionResult<SheetData> {
        Ok(self.store.sheet_data(MEMBERS)?)
    }

    /// Adds a member after making sure every predefined team has its
    /// `Team Default` row. A `Team Default` call for a predefined team only
    /// seeds.
    pub fn add_member(&self, name: &str, team: &str) -> ActionResult<()> {
        if name.is_empty() || team.is_empty() {
            return Err(ActionError::invalid("Name and team are required."));
        }

        self.store.ensure_headers(MEMBERS, &MEMBER_HEADERS)?;
        let members = self.store.sheet_data(MEMBERS)?;
        for missing in teams_missing_members(&members, &self.predefined_teams) {
            self.store
                .append_row(MEMBERS, &member_record(TEAM_DEFAULT_MEMBER, missing))?;
            info!(team = missing, "team default member seeded");
        }

        if name == TEAM_DEFAULT_MEMBER && self.predefined_teams.iter().any(|t| t == team) {
            return Ok(());
        }

        self.store.append_row(MEMBERS, &member_record(name, team))?;
        info!(name, team, "member added");
        Ok(())
    }
}
