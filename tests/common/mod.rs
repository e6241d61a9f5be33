#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use payda_client::{
    api::{ApiResult, PaydaBackend},
    config::ClientConfig,
    dashboard::{CurrentUser, DashboardSession},
    errors::ClientError,
    models::{
        AssignCouponRequest, Coupon, CouponQuery, CouponStatus, CreatedNeed, Donation, Need,
        NeedStatus, NewNeed, OperationStatus, ShowcaseItem, UseCouponRequest,
    },
};
use rust_decimal::Decimal;

pub const ITEMS: &str = "items";
pub const NEEDS: &str = "needs";
pub const NEED: &str = "need";
pub const COUPONS: &str = "coupons";
pub const ASSIGN: &str = "assign";
pub const USE: &str = "use";
pub const DONATIONS: &str = "donations";
pub const CREATE_NEED: &str = "create_need";

/// In-memory stand-in for the REST backend that records every call.
#[derive(Default)]
pub struct FakeBackend {
    pub items: Mutex<Vec<ShowcaseItem>>,
    pub needs: Mutex<Vec<Need>>,
    pub coupons: Mutex<Vec<Coupon>>,
    pub donations: Mutex<Vec<Donation>>,
    failing: Mutex<HashSet<&'static str>>,
    rejections: Mutex<HashMap<&'static str, String>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().remove(endpoint);
        self.rejections.lock().unwrap().remove(endpoint);
    }

    /// Makes `endpoint` answer with a 400 carrying `message`.
    pub fn reject(&self, endpoint: &'static str, message: &str) {
        self.rejections
            .lock()
            .unwrap()
            .insert(endpoint, message.to_string());
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == endpoint)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn set_items(&self, items: Vec<ShowcaseItem>) {
        *self.items.lock().unwrap() = items;
    }

    fn record(&self, endpoint: &'static str) -> ApiResult<()> {
        self.calls.lock().unwrap().push(endpoint);
        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(ClientError::Unreachable {
                base_url: self.base_url().to_string(),
            });
        }
        if let Some(message) = self.rejections.lock().unwrap().get(endpoint) {
            return Err(ClientError::Backend {
                status: 400,
                message: message.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PaydaBackend for FakeBackend {
    async fn list_items(&self) -> ApiResult<Vec<ShowcaseItem>> {
        self.record(ITEMS)?;
        Ok(self.items.lock().unwrap().clone())
    }

    async fn list_needs(&self, status: Option<NeedStatus>) -> ApiResult<Vec<Need>> {
        self.record(NEEDS)?;
        Ok(self
            .needs
            .lock()
            .unwrap()
            .iter()
            .filter(|n| status.map_or(true, |s| n.status == s))
            .cloned()
            .collect())
    }

    async fn get_need(&self, need_id: i64) -> ApiResult<Need> {
        self.record(NEED)?;
        self.needs
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == need_id)
            .cloned()
            .ok_or_else(|| ClientError::Backend {
                status: 404,
                message: "Need not found".into(),
            })
    }

    async fn list_coupons(&self, query: &CouponQuery) -> ApiResult<Vec<Coupon>> {
        self.record(COUPONS)?;
        Ok(self
            .coupons
            .lock()
            .unwrap()
            .iter()
            .filter(|c| query.status.map_or(true, |s| c.status == s))
            .filter(|c| query.beneficiary_id.map_or(true, |id| c.beneficiary_id == Some(id)))
            .cloned()
            .collect())
    }

    async fn assign_coupon(&self, request: &AssignCouponRequest) -> ApiResult<OperationStatus> {
        self.record(ASSIGN)?;
        let mut coupons = self.coupons.lock().unwrap();
        let coupon = coupons
            .iter_mut()
            .find(|c| c.id == request.coupon_id)
            .ok_or_else(|| ClientError::Backend {
                status: 404,
                message: "Coupon not found".into(),
            })?;
        if coupon.status != CouponStatus::Created {
            return Err(ClientError::Backend {
                status: 400,
                message: "Only created coupons can be assigned".into(),
            });
        }
        coupon.status = CouponStatus::Assigned;
        coupon.beneficiary_id = Some(request.beneficiary_id);
        Ok(OperationStatus {
            status: Some("success".into()),
            message: Some("Coupon assigned".into()),
        })
    }

    async fn use_coupon(&self, request: &UseCouponRequest) -> ApiResult<OperationStatus> {
        self.record(USE)?;
        let mut coupons = self.coupons.lock().unwrap();
        let outcome = match coupons.iter_mut().find(|c| c.id == request.coupon_id) {
            None => ("error", "Coupon not found"),
            Some(coupon) if coupon.status == CouponStatus::Used => ("error", "Coupon already used"),
            Some(coupon) => {
                coupon.status = CouponStatus::Used;
                ("success", "Coupon used")
            }
        };
        Ok(OperationStatus {
            status: Some(outcome.0.into()),
            message: Some(outcome.1.into()),
        })
    }

    async fn list_donations(&self) -> ApiResult<Vec<Donation>> {
        self.record(DONATIONS)?;
        Ok(self.donations.lock().unwrap().clone())
    }

    async fn create_need(&self, need: &NewNeed) -> ApiResult<CreatedNeed> {
        self.record(CREATE_NEED)?;
        let mut needs = self.needs.lock().unwrap();
        let id = needs.len() as i64 + 1;
        needs.push(Need {
            id,
            user_id: need.user_id,
            user_name: None,
            title: need.title.clone(),
            description: need.description.clone(),
            category: need.category.clone(),
            target_amount: need.target_amount,
            current_amount: Decimal::ZERO,
            status: NeedStatus::Active,
            created_at: Some(Utc::now()),
            completed_at: None,
        });
        Ok(CreatedNeed {
            id,
            title: need.title.clone(),
            description: need.description.clone(),
            category: need.category.clone(),
            target_amount: need.target_amount,
            current_amount: Decimal::ZERO,
            status: NeedStatus::Active,
            created_at: Some(Utc::now()),
            message: Some("Need created".into()),
        })
    }

    fn base_url(&self) -> &str {
        "http://fake.payda.test"
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::default()
}

pub fn session_for(backend: &Arc<FakeBackend>, user_id: Option<i64>) -> Arc<DashboardSession> {
    let backend: Arc<dyn PaydaBackend> = backend.clone();
    DashboardSession::new(backend, config(), user_id.map(CurrentUser::new))
}

pub fn item(type_id: i64, available: u32, collected: Decimal) -> ShowcaseItem {
    ShowcaseItem {
        id: type_id,
        pool_id: Some(type_id),
        coupon_type_id: Some(type_id),
        title: format!("Coupon type {}", type_id),
        description: None,
        company: "Lezzet Dunyasi".into(),
        category: "yemek".into(),
        total_amount: Decimal::from(500),
        collected,
        coupon_count: available,
        available_coupons: available,
        potential_coupons: 0,
        is_completed: false,
    }
}

pub fn coupon(id: i64, type_id: i64, status: CouponStatus, beneficiary_id: Option<i64>) -> Coupon {
    Coupon {
        id,
        coupon_type_id: type_id,
        coupon_type_name: Some(format!("Coupon type {}", type_id)),
        coupon_type_amount: Some(Decimal::from(50)),
        coupon_type_category: Some("yemek".into()),
        merchant_name: Some("Lezzet Dunyasi".into()),
        merchant_id: Some(1),
        beneficiary_id,
        beneficiary_name: None,
        status,
        created_at: Some(Utc::now()),
        used_at: None,
        pool: None,
    }
}

pub fn need(id: i64, title: &str, current: Decimal, target: Decimal) -> Need {
    Need {
        id,
        user_id: 3,
        user_name: Some("Ahmet Yilmaz".into()),
        title: title.into(),
        description: None,
        category: "kirtasiye".into(),
        target_amount: target,
        current_amount: current,
        status: NeedStatus::Active,
        created_at: Some(Utc::now()),
        completed_at: None,
    }
}

/// Donation made `minutes` after a fixed reference time.
pub fn donation(id: i64, need_id: Option<i64>, coupon_type_id: Option<i64>, minutes: i64) -> Donation {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
    Donation {
        id,
        user_id: 2,
        amount: Decimal::from(25),
        coupon_type_id,
        need_id,
        created_at: Some(base + ChronoDuration::minutes(minutes)),
    }
}
