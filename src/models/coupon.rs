use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::timestamp;

/// One row of the `/items` showcase: a coupon type joined with its funding pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowcaseItem {
    pub id: i64,
    #[serde(default)]
    pub pool_id: Option<i64>,
    #[serde(default)]
    pub coupon_type_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub category: String,
    /// Pool target
    #[serde(rename = "totalAmount", default)]
    pub total_amount: Decimal,
    /// Pool current balance
    #[serde(default)]
    pub collected: Decimal,
    /// Coupons ever issued for the type
    #[serde(default)]
    pub coupon_count: u32,
    /// Coupons still unassigned
    #[serde(default)]
    pub available_coupons: u32,
    #[serde(default)]
    pub potential_coupons: u32,
    #[serde(default)]
    pub is_completed: bool,
}

impl ShowcaseItem {
    /// Coupon type this row belongs to: `coupon_type_id`, falling back to `id`.
    pub fn type_key(&self) -> i64 {
        self.coupon_type_id.unwrap_or(self.id)
    }

    /// A type is claimable once its pool is flagged complete or the balance reached the target.
    pub fn is_claimable(&self) -> bool {
        self.is_completed || self.collected >= self.total_amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    Created,
    Assigned,
    Used,
}

impl CouponStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponStatus::Created => "created",
            CouponStatus::Assigned => "assigned",
            CouponStatus::Used => "used",
        }
    }
}

impl fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoolSummary {
    #[serde(default)]
    pub target_amount: Option<Decimal>,
    #[serde(default)]
    pub current_balance: Option<Decimal>,
}

/// A single redeemable coupon instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: i64,
    pub coupon_type_id: i64,
    #[serde(default)]
    pub coupon_type_name: Option<String>,
    #[serde(default)]
    pub coupon_type_amount: Option<Decimal>,
    #[serde(default)]
    pub coupon_type_category: Option<String>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub merchant_id: Option<i64>,
    #[serde(default)]
    pub beneficiary_id: Option<i64>,
    #[serde(default)]
    pub beneficiary_name: Option<String>,
    pub status: CouponStatus,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::lenient")]
    pub used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pool: Option<PoolSummary>,
}

impl Coupon {
    pub fn is_assigned(&self) -> bool {
        self.status == CouponStatus::Assigned
    }

    pub fn is_used(&self) -> bool {
        self.status == CouponStatus::Used
    }
}

/// Query for `GET /coupons`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CouponQuery {
    pub status: Option<CouponStatus>,
    pub beneficiary_id: Option<i64>,
}

impl CouponQuery {
    pub fn unassigned() -> Self {
        Self {
            status: Some(CouponStatus::Created),
            beneficiary_id: None,
        }
    }

    pub fn held_by(beneficiary_id: i64) -> Self {
        Self {
            status: None,
            beneficiary_id: Some(beneficiary_id),
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(beneficiary_id) = self.beneficiary_id {
            pairs.push(("beneficiary_id", beneficiary_id.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignCouponRequest {
    pub coupon_id: i64,
    pub beneficiary_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCouponRequest {
    pub coupon_id: i64,
}

/// Status envelope returned by the coupon mutation endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl OperationStatus {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}
