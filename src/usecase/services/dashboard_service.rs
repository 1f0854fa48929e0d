use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::domain::entities::dashboard::{
    filter_projects, filter_tickets, newest_first, ticket_headers, ticket_stats, DisplayRow,
    ProjectFilter, TicketFilter, TicketStats,
};
use crate::domain::entities::sheet::{PROJECTS, TICKETS};
use crate::usecase::action::ActionResult;
use crate::usecase::ports::clock::Clock;
use crate::usecase::ports::row_store::RowStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketDashboard {
    pub headers: Vec<String>,
    pub rows: Vec<DisplayRow>,
    pub stats: TicketStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDashboard {
    pub headers: Vec<String>,
    pub rows: Vec<DisplayRow>,
}

/// Read-only views over the tickets and projects sheets, newest row first.
pub struct DashboardService {
    store: Arc<dyn RowStore>,
    clock: Arc<dyn Clock>,
    utc_offset_hours: i32,
}

impl DashboardService {
    pub fn new(store: Arc<dyn RowStore>, clock: Arc<dyn Clock>, utc_offset_hours: i32) -> Self {
        Self {
            store,
            clock,
            utc_offset_hours,
        }
    }

    /// Stats cover the filtered rows.
    pub fn ticket_dashboard(&self, filter: &TicketFilter) -> ActionResult<TicketDashboard> {
        let sheet = self.store.sheet_data(TICKETS)?;
        let headers = ticket_headers(sheet.headers());
        let rows = filter_tickets(&headers, &newest_first(&sheet), filter, self.local_now());
        let stats = ticket_stats(&headers, &rows);
        Ok(TicketDashboard {
            headers,
            rows,
            stats,
        })
    }

    pub fn project_dashboard(&self, filter: &ProjectFilter) -> ActionResult<ProjectDashboard> {
        let sheet = self.store.sheet_data(PROJECTS)?;
        let headers = sheet.headers().to_vec();
        let rows = filter_projects(&headers, &newest_first(&sheet), filter);
        Ok(ProjectDashboard { headers, rows })
    }

    /// Wall-clock time in the zone ticket timestamps are written in.
    fn local_now(&self) -> NaiveDateTime {
        (self.clock.now() + Duration::hours(i64::from(self.utc_offset_hours))).naive_utc()
    }
}
