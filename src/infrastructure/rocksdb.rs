use crate::domain::ports::{IssuedPayment, PaymentLog};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family for issued payments.
pub const CF_PAYMENTS: &str = "payments";

/// A persistent payment log backed by RocksDB.
///
/// Keys are the big-endian issue timestamp (nanoseconds) followed by the user id, so a
/// forward iteration returns payments in issue order.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbPaymentLog {
    db: Arc<DB>,
}

impl RocksDbPaymentLog {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn key(payment: &IssuedPayment) -> Vec<u8> {
        let nanos = payment.issued_at.timestamp_nanos_opt().unwrap_or_default();
        let mut key = Vec::with_capacity(16);
        key.extend_from_slice(&nanos.to_be_bytes());
        key.extend_from_slice(&payment.user_id.0.to_be_bytes());
        key
    }

    fn missing_cf() -> PaymentError {
        PaymentError::InternalError(Box::new(std::io::Error::other(
            "Payments column family not found",
        )))
    }
}

#[async_trait]
impl PaymentLog for RocksDbPaymentLog {
    async fn append(&self, payment: IssuedPayment) -> Result<()> {
        let cf = self.db.cf_handle(CF_PAYMENTS).ok_or_else(Self::missing_cf)?;

        let value = serde_json::to_vec(&payment).map_err(|e| {
            PaymentError::InternalError(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Serialization error: {}", e),
            )))
        })?;

        self.db.put_cf(&cf, Self::key(&payment), value)?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<IssuedPayment>> {
        let cf = self.db.cf_handle(CF_PAYMENTS).ok_or_else(Self::missing_cf)?;

        let mut payments = Vec::new();
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let payment: IssuedPayment = serde_json::from_slice(&value).map_err(|e| {
                PaymentError::InternalError(Box::new(std::io::Error::other(format!(
                    "Failed to deserialize payment: {}",
                    e
                ))))
            })?;
            payments.push(payment);
        }

        Ok(payments)
    }
}
