//! Fetch collaborator: one page of records from the open-data API.

pub mod client;

pub use client::*;
