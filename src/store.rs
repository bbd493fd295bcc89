//! Memory-resident sale repository backed by a temporary sled database
use super::config::StoreConfig;
use super::error::SaleError;
use super::sale::{Metadata, Sale, Status, TimeStamp};
use super::utils;
use sled::{CompareAndSwapError, Tree};

const SALES_TREE: &str = "sales";

// Stored shape of a sale. Status is kept as text and validated on every read.
#[derive(Debug, minicbor::Encode, minicbor::Decode)]
struct SaleRecord {
    #[n(0)]
    id: String,
    #[n(1)]
    user_id: String,
    #[n(2)]
    amount: f64,
    #[n(3)]
    status: String,
    #[n(4)]
    created_at: TimeStamp,
    #[n(5)]
    updated_at: TimeStamp,
    #[n(6)]
    version: u64,
}

impl From<&Sale> for SaleRecord {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id.clone(),
            user_id: sale.user_id.clone(),
            amount: sale.amount,
            status: sale.status.as_str().to_string(),
            created_at: sale.created_at,
            updated_at: sale.updated_at,
            version: sale.version,
        }
    }
}

impl TryFrom<SaleRecord> for Sale {
    type Error = SaleError;

    fn try_from(record: SaleRecord) -> Result<Self, Self::Error> {
        Ok(Sale {
            status: SaleStore::validate_status(&record.status)?,
            id: record.id,
            user_id: record.user_id,
            amount: record.amount,
            created_at: record.created_at,
            updated_at: record.updated_at,
            version: record.version,
        })
    }
}

fn encode(sale: &Sale) -> Result<Vec<u8>, SaleError> {
    minicbor::to_vec(SaleRecord::from(sale)).map_err(|e| SaleError::Codec(e.to_string()))
}

fn decode_record(bytes: &[u8]) -> Result<SaleRecord, SaleError> {
    minicbor::decode(bytes).map_err(|e| SaleError::Codec(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Sale, SaleError> {
    decode_record(bytes)?.try_into()
}

/// Keyed repository of sales. Cloning shares the same underlying tree.
///
/// Every operation goes through sled, which is safe to call from many threads
/// at once. Read-modify-write sequences use [`SaleStore::update_with`].
#[derive(Clone)]
pub struct SaleStore {
    sales: Tree,
    id_prefix: String,
}

impl SaleStore {
    pub fn new() -> Result<Self, SaleError> {
        Self::with_config(&StoreConfig::default())
    }

    pub fn with_config(config: &StoreConfig) -> Result<Self, SaleError> {
        let db = config.to_sled().open()?;
        let sales = db.open_tree(SALES_TREE)?;

        Ok(Self {
            sales,
            id_prefix: config.id_prefix.clone(),
        })
    }

    /// Allocate an identifier for a new sale.
    pub fn next_id(&self) -> Result<String, SaleError> {
        Ok(utils::new_id(&self.id_prefix)?)
    }

    /// Insert or replace the sale stored under `sale.id`.
    pub fn put(&self, sale: &Sale) -> Result<(), SaleError> {
        if sale.id.is_empty() {
            return Err(SaleError::EmptyKey);
        }
        self.sales.insert(sale.id.as_bytes(), encode(sale)?)?;
        Ok(())
    }

    /// Look a sale up by id, whatever its status.
    pub fn get_by_id(&self, id: &str) -> Result<Sale, SaleError> {
        match self.sales.get(id)? {
            Some(bytes) => decode(&bytes),
            None => Err(SaleError::NotFound),
        }
    }

    pub fn list_by_user(&self, user_id: &str) -> Result<Vec<Sale>, SaleError> {
        self.scan_user(user_id, None)
    }

    pub fn list_by_user_and_status(
        &self,
        user_id: &str,
        status: &str,
    ) -> Result<Vec<Sale>, SaleError> {
        let status = Self::validate_status(status)?;
        self.scan_user(user_id, Some(status))
    }

    pub fn validate_status(status: &str) -> Result<Status, SaleError> {
        status.parse()
    }

    pub fn aggregate(sales: &[Sale]) -> Metadata {
        Metadata::from_sales(sales)
    }

    /// Atomically read, modify and write back the sale stored under `id`.
    ///
    /// `apply` may run more than once: when another writer commits between the
    /// read and the write, the swap fails and `apply` sees the newer record.
    /// An error from `apply` aborts without writing anything. `apply` must not
    /// change the sale's id.
    pub fn update_with<F>(&self, id: &str, mut apply: F) -> Result<Sale, SaleError>
    where
        F: FnMut(&mut Sale) -> Result<(), SaleError>,
    {
        let mut current = self.sales.get(id)?.ok_or(SaleError::NotFound)?;

        loop {
            let mut sale = decode(&current)?;
            apply(&mut sale)?;
            let proposed = encode(&sale)?;

            match self
                .sales
                .compare_and_swap(id, Some(&current), Some(proposed))?
            {
                Ok(()) => return Ok(sale),
                Err(CompareAndSwapError {
                    current: Some(latest),
                    ..
                }) => {
                    tracing::debug!(sale_id = id, "sale changed underneath update, retrying");
                    current = latest;
                }
                Err(CompareAndSwapError { current: None, .. }) => {
                    return Err(SaleError::NotFound);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }

    fn scan_user(&self, user_id: &str, status: Option<Status>) -> Result<Vec<Sale>, SaleError> {
        let mut found = Vec::new();
        for entry in self.sales.iter() {
            let (key, bytes) = entry?;
            // an unreadable record has no known owner, so it cannot fail this user's listing
            let record = match decode_record(&bytes) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(
                        sale_id = %String::from_utf8_lossy(&key),
                        error = %e,
                        "skipping undecodable sale record"
                    );
                    continue;
                }
            };
            if record.user_id != user_id {
                continue;
            }
            let sale = Sale::try_from(record)?;
            if status.is_none_or(|s| s == sale.status) {
                found.push(sale);
            }
        }

        if found.is_empty() {
            return Err(SaleError::NotFound);
        }
        Ok(found)
    }
}
