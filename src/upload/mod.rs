//! Upload collaborator: admissions spreadsheets.

pub mod reader;

pub use reader::*;
