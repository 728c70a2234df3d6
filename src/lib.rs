//! Live filtering and click-to-sort for every table of a document

pub mod app;
pub mod batch;
pub mod classify;
pub mod config;
pub mod dom;
pub mod driver;
pub mod error;
pub mod fileio;
pub mod filter;
pub mod header;
pub mod sort;
pub mod style;
pub mod ui;
