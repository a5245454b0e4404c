use crate::domain::ports::RefundLedger;
use crate::domain::records::{BatchId, WithdrawalId};
use crate::domain::refund::{BatchStatus, RefundBatch};
use crate::error::{RefundError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for refund batch records, keyed by batch id.
pub const CF_BATCHES: &str = "refund_batches";
/// Column Family mapping withdrawal id to batch id.
pub const CF_WITHDRAWAL_INDEX: &str = "withdrawal_index";

/// A persistent refund ledger backed by RocksDB.
///
/// Batches are stored as JSON in a dedicated column family with a
/// secondary index for the by-withdrawal lookup. A single write mutex
/// serializes insert/claim/update so the `begin_processing`
/// compare-and-transition stays atomic.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbLedger {
    /// Opens or creates a RocksDB instance at the specified path,
    /// ensuring both column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_batches = ColumnFamilyDescriptor::new(CF_BATCHES, Options::default());
        let cf_index = ColumnFamilyDescriptor::new(CF_WITHDRAWAL_INDEX, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_batches, cf_index])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            RefundError::Internal(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn read_batch(&self, batch_id: &BatchId) -> Result<Option<RefundBatch>> {
        let cf = self.cf(CF_BATCHES)?;
        let Some(bytes) = self.db.get_cf(&cf, batch_id.as_str())? else {
            return Ok(None);
        };
        let batch = serde_json::from_slice(&bytes).map_err(|e| {
            RefundError::Internal(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Deserialization error: {e}"),
            )))
        })?;
        Ok(Some(batch))
    }

    fn write_batch(&self, batch: &RefundBatch) -> Result<()> {
        let cf = self.cf(CF_BATCHES)?;
        let value = serde_json::to_vec(batch).map_err(|e| {
            RefundError::Internal(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Serialization error: {e}"),
            )))
        })?;
        self.db.put_cf(&cf, batch.id.as_str(), value)?;
        Ok(())
    }
}

#[async_trait]
impl RefundLedger for RocksDbLedger {
    async fn insert(&self, batch: RefundBatch) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let index = self.cf(CF_WITHDRAWAL_INDEX)?;
        let duplicate = self.read_batch(&batch.id)?.is_some()
            || self
                .db
                .get_pinned_cf(&index, batch.withdrawal_id.as_str())?
                .is_some();
        if duplicate {
            return Err(RefundError::Conflict(format!(
                "refund batch already exists for withdrawal {}",
                batch.withdrawal_id
            )));
        }

        self.write_batch(&batch)?;
        self.db
            .put_cf(&index, batch.withdrawal_id.as_str(), batch.id.as_str())?;
        Ok(())
    }

    async fn get(&self, batch_id: &BatchId) -> Result<Option<RefundBatch>> {
        self.read_batch(batch_id)
    }

    async fn find_by_withdrawal(
        &self,
        withdrawal_id: &WithdrawalId,
    ) -> Result<Option<RefundBatch>> {
        let index = self.cf(CF_WITHDRAWAL_INDEX)?;
        let Some(bytes) = self.db.get_cf(&index, withdrawal_id.as_str())? else {
            return Ok(None);
        };
        let batch_id = BatchId::new(String::from_utf8_lossy(&bytes).into_owned());
        self.read_batch(&batch_id)
    }

    async fn begin_processing(&self, batch_id: &BatchId) -> Result<RefundBatch> {
        let _guard = self.write_lock.lock().await;

        let mut batch = self
            .read_batch(batch_id)?
            .ok_or_else(|| RefundError::NotFound(format!("refund batch {batch_id}")))?;

        match batch.status {
            BatchStatus::Processing => Err(RefundError::Conflict(format!(
                "refund batch {batch_id} is already being processed"
            ))),
            BatchStatus::Completed => Err(RefundError::Conflict(format!(
                "refund batch {batch_id} is already completed"
            ))),
            BatchStatus::Pending | BatchStatus::Partial | BatchStatus::Failed => {
                batch.status = BatchStatus::Processing;
                self.write_batch(&batch)?;
                Ok(batch)
            }
        }
    }

    async fn update(&self, batch: RefundBatch) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.read_batch(&batch.id)?.is_none() {
            return Err(RefundError::NotFound(format!("refund batch {}", batch.id)));
        }
        self.write_batch(&batch)
    }
}
