/*!
 * Content Store
 * Repository interface over section-keyed portfolio content
 */
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

use crate::content::{ContentError, Mutation, Section};

pub use memory::MemoryContentStore;
pub use postgres::PgContentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Backing store for portfolio sections.
///
/// Every section always has a value; a backend that has never seen a section
/// reports its default. `mutate` is an atomic read-modify-write of one section.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Short backend name for health output and logs.
    fn backend(&self) -> &'static str;

    /// All sections keyed by name.
    async fn snapshot(&self) -> Result<Map<String, Value>, StoreError>;

    async fn section(&self, section: Section) -> Result<Value, StoreError>;

    /// Apply a mutation and return the value it touched, or `None` when the
    /// mutation matched nothing and the section was left as it was.
    async fn mutate(&self, section: Section, mutation: Mutation) -> Result<Option<Value>, StoreError>;

    /// Round-trip time of a trivial operation against the backend.
    async fn ping(&self) -> Result<Duration, StoreError>;
}
