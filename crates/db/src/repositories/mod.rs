use async_trait::async_trait;

use loadline_core::{CallLogEntry, CallLogId, Load, NewCallLog, RepositoryError};

pub mod call_log;
pub mod load;
pub mod memory;

pub use call_log::SqlCallLogRepository;
pub use load::SqlLoadRepository;
pub use memory::{InMemoryCallLogRepository, InMemoryLoadRepository};

/// Filters for the load search surface. Each value is matched as a
/// case-insensitive substring; booked loads are never returned.
#[derive(Clone, Debug, Default)]
pub struct LoadFilters {
    pub origin: String,
    pub destination: String,
    pub equipment_type: String,
}

#[async_trait]
pub trait LoadSearch: Send + Sync {
    async fn search(&self, filters: &LoadFilters) -> Result<Vec<Load>, RepositoryError>;
}

#[async_trait]
pub trait CallLogRepository: Send + Sync {
    async fn create(&self, new_entry: NewCallLog) -> Result<CallLogEntry, RepositoryError>;

    async fn find_by_id(
        &self,
        call_id: &CallLogId,
    ) -> Result<Option<CallLogEntry>, RepositoryError>;

    /// Newest-first page plus the total row count for the pagination header.
    async fn list(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<CallLogEntry>, u64), RepositoryError>;

    /// Newest-first slice for metrics aggregation; `None` means all rows.
    async fn fetch_recent(&self, limit: Option<u32>)
        -> Result<Vec<CallLogEntry>, RepositoryError>;
}
