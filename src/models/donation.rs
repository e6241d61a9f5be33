use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: i64,
    /// Donor
    pub user_id: i64,
    pub amount: Decimal,
    #[serde(default)]
    pub coupon_type_id: Option<i64>,
    #[serde(default)]
    pub need_id: Option<i64>,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Donation {
    pub fn is_coupon_donation(&self) -> bool {
        self.coupon_type_id.is_some()
    }
}

/// Coupon donations only, newest first. Undated donations sort last.
pub fn coupon_donations(donations: Vec<Donation>) -> Vec<Donation> {
    let mut filtered: Vec<Donation> = donations
        .into_iter()
        .filter(Donation::is_coupon_donation)
        .collect();
    filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    filtered
}
