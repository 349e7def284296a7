//! Entity store abstraction over the production tracker.
//!
//! [`EntityStore`] is the only seam between the pipeline and the tracker.
//! Two implementations ship here:
//!
//! - [`HttpStore`](http::HttpStore) speaks the tracker JSON API.
//! - [`MemoryStore`](memory::MemoryStore) keeps everything in process, for
//!   tests and offline dry runs.

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod store;

pub use config::TrackerConfig;
pub use error::StoreError;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use store::EntityStore;
