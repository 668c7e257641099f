use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadId(pub String);

impl std::fmt::Display for LoadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A freight shipment record open for carrier booking.
///
/// `listed_rate` is the shipper's asking price. `agreed_rate` is set exactly
/// when `booked` is true; the pair never diverges in persisted rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub load_id: LoadId,
    pub origin: String,
    pub destination: String,
    pub equipment_type: String,
    pub listed_rate: Decimal,
    pub booked: bool,
    pub agreed_rate: Option<Decimal>,
    pub pickup_at: Option<DateTime<Utc>>,
    pub delivery_at: Option<DateTime<Utc>>,
    pub weight_lbs: Option<i64>,
    pub commodity: Option<String>,
    pub num_pieces: Option<i64>,
    pub miles: Option<i64>,
    pub dimensions: Option<String>,
    pub notes: Option<String>,
}

impl Load {
    /// The booking invariant: an agreed rate exists iff the load is booked.
    pub fn booking_consistent(&self) -> bool {
        self.booked == self.agreed_rate.is_some()
    }
}
