//! CLI client for the AlphaGenome variant prediction API.
//!
//! The crate is organized around one reusable core, [`runner::ToolRunner`],
//! which wraps any asynchronous operation with a uniform
//! status/progress/result/error contract. The analysis engine, batch
//! pipeline, and metadata commands are all consumers of that contract; the
//! CLI layer renders their event streams and owns local history, exports,
//! and preferences.

pub mod cli;
pub mod engine;
pub mod interpret;
pub mod logging;
pub mod model;
pub mod registry;
pub mod runner;
pub mod storage;
pub mod text_summary;
