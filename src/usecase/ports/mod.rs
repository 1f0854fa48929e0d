pub mod clock;
pub mod row_store;
