//! Access to the PAYDA REST backend.
//!
//! [`PaydaBackend`] is the seam the dashboard talks through; [`HttpBackend`]
//! is the production implementation over `reqwest`.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;

use crate::errors::ClientError;
use crate::models::{
    AssignCouponRequest, Coupon, CouponQuery, CreatedNeed, Donation, Need, NeedStatus, NewNeed,
    OperationStatus, ShowcaseItem, UseCouponRequest,
};

pub type ApiResult<T> = Result<T, ClientError>;

#[async_trait]
pub trait PaydaBackend: Send + Sync {
    /// `GET /items`
    async fn list_items(&self) -> ApiResult<Vec<ShowcaseItem>>;

    /// `GET /needs`, optionally narrowed by status
    async fn list_needs(&self, status: Option<NeedStatus>) -> ApiResult<Vec<Need>>;

    /// `GET /needs/{id}`
    async fn get_need(&self, need_id: i64) -> ApiResult<Need>;

    /// `GET /coupons`
    async fn list_coupons(&self, query: &CouponQuery) -> ApiResult<Vec<Coupon>>;

    /// `POST /coupons/assign`
    async fn assign_coupon(&self, request: &AssignCouponRequest) -> ApiResult<OperationStatus>;

    /// `POST /coupons/use`. Domain failures come back as a non-success status
    /// in the envelope rather than as an HTTP error.
    async fn use_coupon(&self, request: &UseCouponRequest) -> ApiResult<OperationStatus>;

    /// `GET /donations`
    async fn list_donations(&self) -> ApiResult<Vec<Donation>>;

    /// `POST /needs`
    async fn create_need(&self, need: &NewNeed) -> ApiResult<CreatedNeed>;

    /// Base address, used in diagnostics
    fn base_url(&self) -> &str;
}
