//! Sale lifecycle engine: creation against known users, the pending to
//! approved/rejected state machine and per-user aggregate queries.

pub mod config;
pub mod error;
pub mod logging;
pub mod sale;
pub mod service;
pub mod store;
pub mod user;
pub mod utils;

pub use config::StoreConfig;
pub use error::{LookupError, SaleError};
pub use sale::{Metadata, Sale, SalesReport, Status, TimeStamp};
pub use service::{FixedStatus, RandomStatus, SaleService, StatusPicker};
pub use store::SaleStore;
pub use user::{User, UserDirectory, UserLookup};
