//! # EDH Stats
//!
//! Statistics engine for a Commander (EDH) play group.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (matches, participants, keys, stat records, colors)
//! - **calculate**: Accumulation, finalization, medals, color groups, retrospectives
//! - **query**: Search, window filtering and table sorting
//! - **ingest**: Match validation at the ingestion boundary
//! - **storage**: Local match dataset and derived JSONL outputs
//! - **report**: Plain-text tables
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod ingest;
pub mod models;
pub mod query;
pub mod report;
pub mod storage;

pub use models::*;
