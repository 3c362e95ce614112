//! Feed aggregation for Gator.
//!
//! This module provides:
//! - Interval argument parsing
//! - Ingestion of fetched documents into posts
//! - The polling scheduler

pub mod interval;
pub mod reconciler;
pub mod scheduler;

pub use interval::parse_interval;
pub use reconciler::{ingest, IngestReport, MAX_CONSECUTIVE_STORE_FAILURES};
pub use scheduler::{CycleFailure, CycleReport, Scheduler, SchedulerSettings};
