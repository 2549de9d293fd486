// src/lib.rs

//! Rental listing search library
//!
//! Fetches every page of a rental search from one upstream site, projects
//! the records onto a single listing schema, fills in missing descriptions,
//! and answers filter/sort/page queries over the result set in memory.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod sources;
pub mod utils;
