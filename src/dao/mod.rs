/// Read-only catalog of game templates.
pub mod catalog;
