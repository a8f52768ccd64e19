use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use pipeline::{PublicationLedger, StoreError, TopicCatalog, TopicRepository};

const LEDGER_DOCUMENT: &str = "memory:published";

/// Both documents held in process memory.
///
/// Ledger writes can be made to fail on demand, to exercise callers that must
/// tolerate a lost publication record.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
    fail_ledger_writes: AtomicBool,
}

#[derive(Debug, Default)]
struct State {
    catalog: TopicCatalog,
    ledger: PublicationLedger,
}

impl MemoryRepository {
    /// Creates a repository holding `catalog` and `ledger`.
    pub fn new(catalog: TopicCatalog, ledger: PublicationLedger) -> Self {
        Self {
            state: Mutex::new(State { catalog, ledger }),
            fail_ledger_writes: AtomicBool::new(false),
        }
    }

    /// Creates a repository with the seeded catalog and an empty ledger.
    pub fn seeded() -> Self {
        Self::new(TopicCatalog::seeded(), PublicationLedger::default())
    }

    /// Makes every subsequent [`TopicRepository::save_ledger`] fail (or succeed again).
    pub fn fail_ledger_writes(&self, fail: bool) {
        self.fail_ledger_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of the catalog.
    pub fn catalog(&self) -> TopicCatalog {
        self.lock().catalog.clone()
    }

    /// Snapshot of the ledger.
    pub fn ledger(&self) -> PublicationLedger {
        self.lock().ledger.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TopicRepository for MemoryRepository {
    async fn load_catalog(&self) -> Result<TopicCatalog, StoreError> {
        Ok(self.catalog())
    }

    async fn save_catalog(&self, catalog: &TopicCatalog) -> Result<(), StoreError> {
        self.lock().catalog = catalog.clone();
        Ok(())
    }

    async fn load_ledger(&self) -> Result<PublicationLedger, StoreError> {
        Ok(self.ledger())
    }

    async fn save_ledger(&self, ledger: &PublicationLedger) -> Result<(), StoreError> {
        if self.fail_ledger_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                document: LEDGER_DOCUMENT.to_owned(),
                reason: "writes disabled".to_owned(),
            });
        }
        self.lock().ledger = ledger.clone();
        Ok(())
    }
}
