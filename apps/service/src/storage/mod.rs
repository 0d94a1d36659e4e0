/// Record storage abstraction
///
/// The engine only needs `read`, `update` and `list`. `create` and `delete`
/// exist for the CRUD layer and for seeding stores in tests.
pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Named record collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Checks,
    Users,
    Tokens,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Checks => "checks",
            Collection::Users => "users",
            Collection::Tokens => "tokens",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage trait for abstracting record persistence
///
/// Implementations must tolerate many concurrent callers working on distinct ids.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a record, or `StoreError::NotFound`
    async fn read(&self, collection: Collection, id: &str) -> Result<Value, StoreError>;

    /// Replace an existing record
    async fn update(&self, collection: Collection, id: &str, record: &Value) -> Result<(), StoreError>;

    /// Ids of every record in the collection, in no particular order
    async fn list(&self, collection: Collection) -> Result<Vec<String>, StoreError>;

    /// Insert a new record, failing if the id is taken
    async fn create(&self, collection: Collection, id: &str, record: &Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
}

/// Ids end up in file names, so only a conservative alphabet is accepted
pub(crate) fn check_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'));
    if valid { Ok(()) } else { Err(StoreError::InvalidId(id.to_string())) }
}
