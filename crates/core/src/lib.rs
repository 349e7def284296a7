//! Domain types and pure logic for the editorial-to-tracker bridge.
//!
//! Nothing in this crate performs network I/O. It provides:
//!
//! - Typed tracker entities and a query builder for the tracker's
//!   expression language
//! - Shot records as collected from the host timeline
//! - Status-name normalization and task-type parsing
//! - The aggregated batch result model
//! - Thumbnail / preview video discovery on the local filesystem

pub mod batch;
pub mod entity;
pub mod error;
pub mod media;
pub mod query;
pub mod shot_record;
pub mod status;
pub mod task_type;
pub mod types;
