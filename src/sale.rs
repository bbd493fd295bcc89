//! Core sale record, its status lifecycle and the derived metadata
use super::error::SaleError;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Approved,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::Approved, Status::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
        }
    }

    /// Approved and rejected sales never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Exact, case-sensitive match only. "Pending" is not a status.
impl FromStr for Status {
    type Err = SaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "approved" => Ok(Status::Approved),
            "rejected" => Ok(Status::Rejected),
            other => Err(SaleError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeStamp(DateTime<Utc>);

impl TimeStamp {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(TimeStamp)
    }
    /// Current time, nudged forward when the clock has not moved past `prev`.
    pub fn after(prev: &TimeStamp) -> Self {
        let now = Utc::now();
        if now > prev.0 {
            Self(now)
        } else {
            Self(prev.0 + TimeDelta::nanoseconds(1))
        }
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp {
    fn default() -> Self {
        Self::new()
    }
}

impl From<DateTime<Utc>> for TimeStamp {
    fn from(value: DateTime<Utc>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    pub status: Status,
    pub created_at: TimeStamp,
    pub updated_at: TimeStamp,
    pub version: u64, // optimistic concurrency token, starts at 1
}

impl Sale {
    /// A freshly created sale: version 1, both timestamps set to now.
    pub fn new(id: String, user_id: String, amount: f64, status: Status) -> Self {
        let now = TimeStamp::new();
        Self {
            id,
            user_id,
            amount,
            status,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Move a pending sale to `target`, which must be `approved` or `rejected`.
    ///
    /// Leaves the sale untouched on failure. On success the status is replaced,
    /// `updated_at` moves forward and `version` goes up by exactly one.
    pub fn transition_to(&mut self, target: &str) -> Result<(), SaleError> {
        if self.status != Status::Pending {
            return Err(SaleError::SaleMustBePending);
        }
        let next = match target {
            "approved" => Status::Approved,
            "rejected" => Status::Rejected,
            other => return Err(SaleError::InvalidTransition(other.to_string())),
        };

        self.status = next;
        self.updated_at = TimeStamp::after(&self.updated_at);
        self.version += 1;
        Ok(())
    }
}

/// Aggregate view over a set of sales. Never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub quantity: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
    pub total_amount: f64,
}

impl Metadata {
    /// Counts per status and the amount total. An empty slice yields all zeros.
    pub fn from_sales(sales: &[Sale]) -> Self {
        sales.iter().fold(Metadata::default(), |mut meta, sale| {
            meta.quantity += 1;
            meta.total_amount += sale.amount;
            match sale.status {
                Status::Pending => meta.pending += 1,
                Status::Approved => meta.approved += 1,
                Status::Rejected => meta.rejected += 1,
            }
            meta
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    pub user_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSaleRequest {
    pub status: String,
}

/// Body returned for a sales query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    pub metadata: Metadata,
    pub results: Vec<Sale>,
}

impl SalesReport {
    pub fn new(results: Vec<Sale>, metadata: Metadata) -> Self {
        Self { metadata, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_sale() -> Sale {
        Sale::new("sale_1".into(), "user_1".into(), 10.0, Status::Pending)
    }

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::new();

        let encoding = minicbor::to_vec(original).unwrap();
        let decode: TimeStamp = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn status_parsing_is_case_sensitive() {
        assert_eq!("approved".parse::<Status>().unwrap(), Status::Approved);
        assert!(matches!(
            "Approved".parse::<Status>(),
            Err(SaleError::InvalidStatus(s)) if s == "Approved"
        ));
        assert!("active".parse::<Status>().is_err());
    }

    #[test]
    fn pending_to_rejected() {
        let mut sale = pending_sale();
        let before = sale.updated_at;

        sale.transition_to("rejected").unwrap();

        assert_eq!(sale.status, Status::Rejected);
        assert_eq!(sale.version, 2);
        assert!(sale.updated_at > before);
    }

    #[test]
    fn pending_is_not_a_transition_target() {
        let mut sale = pending_sale();
        let before = sale.clone();

        let err = sale.transition_to("pending").unwrap_err();

        assert!(matches!(err, SaleError::InvalidTransition(_)));
        assert_eq!(sale, before);
    }

    #[test]
    fn terminal_sales_do_not_move() {
        let mut sale = pending_sale();
        sale.transition_to("approved").unwrap();
        let before = sale.clone();

        let err = sale.transition_to("rejected").unwrap_err();

        assert!(matches!(err, SaleError::SaleMustBePending));
        assert_eq!(sale, before);
    }

    #[test]
    fn empty_metadata_is_zeroed() {
        assert_eq!(Metadata::from_sales(&[]), Metadata::default());
        assert_eq!(Metadata::from_sales(&[]).total_amount, 0.0);
    }

    #[test]
    fn timestamp_after_is_strictly_later() {
        let far_future = TimeStamp::new_with(2999, 1, 1, 0, 0, 0).unwrap();
        assert!(TimeStamp::after(&far_future) > far_future);
    }
}
