//! Service layer API for sale workflow operations
use super::error::SaleError;
use super::sale::{Metadata, Sale, Status};
use super::store::SaleStore;
use super::user::UserLookup;
use rand::seq::SliceRandom;

/// Chooses the status a new sale starts in.
pub trait StatusPicker: Send + Sync {
    fn pick(&self) -> Status;
}

/// Uniform choice over every status, standing in for downstream adjudication.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomStatus;

impl StatusPicker for RandomStatus {
    fn pick(&self) -> Status {
        *Status::ALL
            .choose(&mut rand::thread_rng())
            .unwrap_or(&Status::Pending)
    }
}

/// Always starts sales in the same status.
#[derive(Debug, Clone, Copy)]
pub struct FixedStatus(pub Status);

impl StatusPicker for FixedStatus {
    fn pick(&self) -> Status {
        self.0
    }
}

pub struct SaleService<U> {
    store: SaleStore,
    users: U,
    picker: Box<dyn StatusPicker>,
}

impl<U: UserLookup> SaleService<U> {
    pub fn new(store: SaleStore, users: U) -> Self {
        Self::with_picker(store, users, RandomStatus)
    }

    pub fn with_picker(store: SaleStore, users: U, picker: impl StatusPicker + 'static) -> Self {
        Self {
            store,
            users,
            picker: Box::new(picker),
        }
    }

    pub fn store(&self) -> &SaleStore {
        &self.store
    }

    /// Record a new sale for an existing user
    pub fn create_sale(&self, user_id: &str, amount: f64) -> Result<Sale, SaleError> {
        if let Err(e) = self.users.get(user_id) {
            let e = SaleError::from(e);
            if matches!(e, SaleError::UserNotFound) {
                tracing::warn!(user_id, "user not found for sale");
            }
            return Err(e);
        }

        if !amount.is_finite() || amount <= 0.0 {
            tracing::warn!(user_id, amount, "invalid sale amount");
            return Err(SaleError::InvalidAmount);
        }

        let sale = Sale::new(self.store.next_id()?, user_id.to_string(), amount, self.picker.pick());

        if let Err(e) = self.store.put(&sale) {
            tracing::error!(error = %e, sale_id = %sale.id, "failed to save sale");
            return Err(e);
        }

        tracing::info!(sale_id = %sale.id, user_id, status = %sale.status, "sale created");
        Ok(sale)
    }

    /// Move a pending sale to `approved` or `rejected`
    pub fn update_sale_status(&self, sale_id: &str, status: &str) -> Result<Sale, SaleError> {
        match self
            .store
            .update_with(sale_id, |sale| sale.transition_to(status))
        {
            Ok(sale) => {
                tracing::info!(
                    sale_id,
                    status = %sale.status,
                    version = sale.version,
                    "sale status updated"
                );
                Ok(sale)
            }
            Err(e) => {
                match &e {
                    SaleError::NotFound => tracing::warn!(sale_id, "sale not found for update"),
                    SaleError::SaleMustBePending => {
                        tracing::warn!(sale_id, "sale must be pending for status update")
                    }
                    SaleError::InvalidTransition(_) => {
                        tracing::warn!(sale_id, new_status = status, "invalid sale state transition")
                    }
                    other => tracing::error!(error = %other, sale_id, "failed to update sale status"),
                }
                Err(e)
            }
        }
    }

    /// All sales of a user, optionally narrowed to one status, with their metadata
    pub fn query_sales(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<(Vec<Sale>, Metadata), SaleError> {
        let sales = match status {
            Some(status) => {
                SaleStore::validate_status(status)?;
                self.store.list_by_user_and_status(user_id, status)?
            }
            None => self.store.list_by_user(user_id)?,
        };

        let metadata = SaleStore::aggregate(&sales);
        Ok((sales, metadata))
    }
}
