//! Domain record persistence abstraction.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::DomainRecord;

/// Persistence collaborator for [`DomainRecord`]s.
///
/// The storage itself (SQL, key-value, in-memory) lives outside this crate;
/// the platform layer injects an implementation through
/// [`ServiceContext`](crate::services::ServiceContext). A record may be
/// deleted concurrently by the registration subsystem, so lookups return
/// `Option` and callers treat a vanished record as "skip silently".
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// All registered domains.
    async fn find_all(&self) -> CoreResult<Vec<DomainRecord>>;

    /// Looks a domain up by its hostname.
    async fn find_by_name(&self, domain: &str) -> CoreResult<Option<DomainRecord>>;

    /// Domains with `auto_renew` enabled (the renewal scanner's input set).
    async fn find_auto_renew(&self) -> CoreResult<Vec<DomainRecord>>;

    /// Persists the record, replacing the stored version.
    async fn save(&self, record: &DomainRecord) -> CoreResult<()>;
}
