//! Transaction storage behind a single trait, with a SQLite backend, a local
//! JSON cache backend, and a wrapper that falls back from the first to the
//! second when the database fails.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::db::queries::transactions as queries;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewTransaction, Transaction, TransactionPatch};

pub trait TransactionRepository: Send + Sync {
    fn list(&self) -> AppResult<Vec<Transaction>>;
    fn create(&self, transaction: NewTransaction) -> AppResult<Transaction>;
    fn update(&self, id: i64, patch: &TransactionPatch) -> AppResult<Transaction>;
    fn delete(&self, id: i64) -> AppResult<()>;
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Transaction {} not found", id))
}

pub struct SqliteRepository {
    db: DbPool,
}

impl SqliteRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

impl TransactionRepository for SqliteRepository {
    fn list(&self) -> AppResult<Vec<Transaction>> {
        let conn = self.db.get()?;
        Ok(queries::list_transactions(&conn)?)
    }

    fn create(&self, transaction: NewTransaction) -> AppResult<Transaction> {
        let conn = self.db.get()?;
        let id = queries::create_transaction(&conn, &transaction)?;
        Ok(transaction.into_transaction(id))
    }

    fn update(&self, id: i64, patch: &TransactionPatch) -> AppResult<Transaction> {
        let conn = self.db.get()?;
        queries::update_transaction(&conn, id, patch)?.ok_or_else(|| not_found(id))
    }

    fn delete(&self, id: i64) -> AppResult<()> {
        let conn = self.db.get()?;
        if queries::delete_transaction(&conn, id)? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }
}

/// Whole snapshot kept in one JSON file. A missing file reads as empty.
pub struct LocalCacheRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalCacheRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> AppResult<Vec<Transaction>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, transactions: &[Transaction]) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(transactions)?)?;
        debug!(path = %self.path.display(), count = transactions.len(), "Wrote transaction cache");
        Ok(())
    }

    /// Replace the cached snapshot.
    pub fn store_snapshot(&self, transactions: &[Transaction]) -> AppResult<()> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        self.write(transactions)
    }
}

fn poisoned() -> AppError {
    AppError::Internal("Transaction cache lock poisoned".into())
}

impl TransactionRepository for LocalCacheRepository {
    fn list(&self) -> AppResult<Vec<Transaction>> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut transactions = self.read()?;
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(transactions)
    }

    fn create(&self, transaction: NewTransaction) -> AppResult<Transaction> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut transactions = self.read()?;
        let id = transactions.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let created = transaction.into_transaction(id);
        transactions.push(created.clone());
        self.write(&transactions)?;
        Ok(created)
    }

    fn update(&self, id: i64, patch: &TransactionPatch) -> AppResult<Transaction> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut transactions = self.read()?;
        let transaction = transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found(id))?;
        patch.apply(transaction);
        let updated = transaction.clone();
        self.write(&transactions)?;
        Ok(updated)
    }

    fn delete(&self, id: i64) -> AppResult<()> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut transactions = self.read()?;
        let before = transactions.len();
        transactions.retain(|t| t.id != id);
        if transactions.len() == before {
            return Err(not_found(id));
        }
        self.write(&transactions)
    }
}

/// Serves from `primary` and mirrors successful reads into `cache`. When the
/// primary fails with a storage error, the operation is logged and carried
/// out on the cache instead. Validation and not-found errors are returned
/// unchanged.
///
/// Writes made during an outage are not replayed into the primary. Ids for
/// records created on the cache are `max(id) + 1` over the cache snapshot, so
/// the primary may later hand out the same id. The first successful `list`
/// after recovery replaces the cache with the primary's snapshot, and any
/// cache-only records are lost.
pub struct FallbackRepository<P> {
    primary: P,
    cache: LocalCacheRepository,
}

impl<P: TransactionRepository> FallbackRepository<P> {
    pub fn new(primary: P, cache: LocalCacheRepository) -> Self {
        Self { primary, cache }
    }

    fn refresh_cache(&self) {
        match self.primary.list() {
            Ok(snapshot) => {
                if let Err(e) = self.cache.store_snapshot(&snapshot) {
                    warn!(error = %e, "Failed to refresh transaction cache");
                }
            }
            Err(e) => warn!(error = %e, "Failed to reload transactions for cache"),
        }
    }
}

impl<P: TransactionRepository> TransactionRepository for FallbackRepository<P> {
    fn list(&self) -> AppResult<Vec<Transaction>> {
        match self.primary.list() {
            Ok(transactions) => {
                if let Err(e) = self.cache.store_snapshot(&transactions) {
                    warn!(error = %e, "Failed to refresh transaction cache");
                }
                Ok(transactions)
            }
            Err(e) if e.is_storage_failure() => {
                warn!(error = %e, "Primary store unavailable, reading local cache");
                self.cache.list()
            }
            Err(e) => Err(e),
        }
    }

    fn create(&self, transaction: NewTransaction) -> AppResult<Transaction> {
        match self.primary.create(transaction.clone()) {
            Ok(created) => {
                self.refresh_cache();
                Ok(created)
            }
            Err(e) if e.is_storage_failure() => {
                warn!(error = %e, "Primary store unavailable, writing to local cache");
                self.cache.create(transaction)
            }
            Err(e) => Err(e),
        }
    }

    fn update(&self, id: i64, patch: &TransactionPatch) -> AppResult<Transaction> {
        match self.primary.update(id, patch) {
            Ok(updated) => {
                self.refresh_cache();
                Ok(updated)
            }
            Err(e) if e.is_storage_failure() => {
                warn!(error = %e, transaction_id = id, "Primary store unavailable, updating local cache");
                self.cache.update(id, patch)
            }
            Err(e) => Err(e),
        }
    }

    fn delete(&self, id: i64) -> AppResult<()> {
        match self.primary.delete(id) {
            Ok(()) => {
                self.refresh_cache();
                Ok(())
            }
            Err(e) if e.is_storage_failure() => {
                warn!(error = %e, transaction_id = id, "Primary store unavailable, deleting from local cache");
                self.cache.delete(id)
            }
            Err(e) => Err(e),
        }
    }
}
