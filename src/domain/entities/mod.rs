pub mod assignment;
pub mod dashboard;
pub mod form;
pub mod grid;
pub mod kanban;
pub mod project;
pub mod roster;
pub mod sheet;
pub mod ticket;
